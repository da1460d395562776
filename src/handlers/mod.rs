// src/handlers/mod.rs

pub mod acceptance;
pub mod auth;
pub mod messages;
