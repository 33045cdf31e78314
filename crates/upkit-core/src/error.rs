//! Error types for upkit

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid timestamp '{input}': expected format YYYY-MM-DD HH:MM:SS")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Account not found: {name} (known accounts: {})", .known.join(", "))]
    AccountNotFound { name: String, known: Vec<String> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
