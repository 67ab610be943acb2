//! Shared database models and schema initialization

pub mod models;

#[cfg(feature = "sqlx")]
pub mod init;
