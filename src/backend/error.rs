//! Backend RPC error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned an error response: {status}: {message}")]
    Api { status: u16, message: String },

    #[error("backend response did not match the expected schema: {0}")]
    SchemaDrift(String),

    #[error("no city matches slug or name '{0}'; available: {1}")]
    UnknownCity(String, String),
}
