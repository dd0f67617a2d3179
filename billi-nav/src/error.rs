//! Error types for BilliNav

use thiserror::Error;

/// BilliNav error type
#[derive(Error, Debug)]
pub enum NavError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Actuator error: {0}")]
    Actuator(String),

    #[error("Message bus error: {0}")]
    Bus(String),

    #[error("Sensor error: {0}")]
    Sensor(String),

    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
