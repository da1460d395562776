// src/utils/mailer.rs

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::MailConfig;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const SUBJECT: &str = "Whisperbox verification code";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Out-of-band delivery of verification codes.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailError>;
}

/// Picks the Resend mailer when an API key is configured, else the log mailer.
pub fn from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match &config.resend_api_key {
        Some(api_key) => Arc::new(ResendMailer::new(api_key.clone(), config.from.clone())),
        None => {
            tracing::warn!("RESEND_API_KEY not set, verification codes will only be logged");
            Arc::new(LogMailer)
        }
    }
}

fn render_text(username: &str, code: &str) -> String {
    format!(
        "Hello {username},\n\n\
         Thank you for registering. Use the following code to verify your account:\n\n\
         {code}\n\n\
         The code expires in one hour. If you did not request it, ignore this email."
    )
}

#[derive(Debug, Serialize)]
struct ResendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: String,
}

/// Sends mail through the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send_verification_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailError> {
        let body = ResendEmailBody {
            from: &self.from,
            to: [email],
            subject: SUBJECT,
            text: render_text(username, code),
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Verification email sent to {}", email);
        Ok(())
    }
}

/// Development mailer: writes the code to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), MailError> {
        tracing::info!(%email, %username, %code, "verification code issued");
        Ok(())
    }
}
