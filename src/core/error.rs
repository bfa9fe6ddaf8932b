//! Defines the custom error types for the claw-login application.

use fantoccini::error::{CmdError, NewSessionError};
use std::io;
use thiserror::Error;
use url::ParseError as UrlParseError;

/// The primary error type for the login automation process.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error initializing necessary components (e.g., WebDriver service, clients).
    #[error("Initialization Error: {0}")]
    Initialization(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a URL.
    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] UrlParseError),

    /// Error making HTTP requests via reqwest.
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// The configured TOTP shared secret is not valid base32.
    #[error("Invalid TOTP Secret: {0}")]
    InvalidSecret(String),

    /// A two-factor challenge was detected but no TOTP secret is configured.
    /// Nothing past this point can succeed without the code, so the flow aborts.
    #[error("Second Factor Required: 2FA challenge detected but no TOTP secret is configured")]
    SecondFactorRequired,

    /// A mandatory flow step failed (e.g., entering the 2FA code after the
    /// prompt was positively detected).
    #[error("Mandatory Step Failed: {0}")]
    MandatoryStep(String),

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),

    /// Error connecting to the WebDriver instance.
    #[error("WebDriver Connection Error: {0}")]
    WebDriverConnection(String),

    /// Error executing a command via WebDriver (Fantoccini).
    #[error("WebDriver Command Error: {0}")]
    FantocciniCmd(String),
}

// From implementations for Fantoccini errors
impl From<CmdError> for AppError {
    fn from(err: CmdError) -> Self {
        AppError::FantocciniCmd(err.to_string())
    }
}

impl From<NewSessionError> for AppError {
    fn from(err: NewSessionError) -> Self {
        AppError::WebDriverConnection(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
