use thiserror::Error;

use crate::api_client::GatewayError;
use crate::store::StoreError;

/// Application-level error type.
/// Every failure a user action can hit ends up here; none of them is fatal.
#[derive(Debug, Error)]
pub enum AppError {
    /// A client-side precondition failed before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The provider refused a submitted API key.
    #[error("API key rejected: {0}")]
    CredentialRejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A normalized backend failure. Displays as the backend's own message.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("State error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short machine-readable code, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::CredentialRejected(_) => "credential_rejected",
            AppError::NotFound(_) => "not_found",
            AppError::Gateway(e) => match e.kind {
                crate::api_client::GatewayErrorKind::Transport => "transport_error",
                crate::api_client::GatewayErrorKind::Http { .. } => "http_error",
                crate::api_client::GatewayErrorKind::Payload => "payload_error",
            },
            AppError::Store(_) => "store_error",
            AppError::Export(_) => "export_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}
