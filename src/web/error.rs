use salvo::prelude::*;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::DatabaseError;
use crate::quotes::QuoteError;

pub const READ_FAILED: &str = "Failed to retrieve visitor count";
pub const INCREMENT_FAILED: &str = "Failed to increment visitor count";

/// Failures surfaced at the HTTP boundary. The client only ever sees the
/// `Display` text; sources are logged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    StorageUnavailable {
        message: &'static str,
        #[source]
        source: DatabaseError,
    },
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: DatabaseError,
    },
    #[error("Failed to load quote: {0}")]
    QuoteUnavailable(#[from] QuoteError),
    #[error("application state is not initialized")]
    MissingState,
}

impl ApiError {
    pub fn storage(message: &'static str, source: DatabaseError) -> Self {
        if source.is_unavailable() {
            ApiError::StorageUnavailable { message, source }
        } else {
            ApiError::Internal { message, source }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::QuoteUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::StorageUnavailable { .. }
            | ApiError::Internal { .. }
            | ApiError::MissingState => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn render(self, res: &mut Response) {
        match &self {
            ApiError::StorageUnavailable { message, source } => {
                error!(kind = "storage_unavailable", "{}: {}", message, source)
            }
            ApiError::Internal { message, source } => {
                error!(kind = "internal", "{}: {}", message, source)
            }
            ApiError::QuoteUnavailable(source) => {
                error!(kind = "upstream", "quote fetch failed: {}", source)
            }
            ApiError::MissingState => error!(kind = "internal", "{}", self),
        }

        res.status_code(self.status_code());
        res.render(Json(json!({ "error": self.to_string() })));
    }
}
