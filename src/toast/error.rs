//! Error taxonomy for the Toast gateway.

use reqwest::StatusCode;
use thiserror::Error;

use crate::crypto::CryptoError;

/// Upper bound on vendor response bodies kept for diagnostics.
const BODY_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ToastError {
    /// Integration not ready: missing restaurant id or credentials, or not enabled/connected.
    #[error("integration not configured: {0}")]
    Config(String),

    /// No credential available to obtain a token.
    #[error("authentication unavailable: {0}")]
    Auth(String),

    /// Non-2xx vendor response.
    #[error("Toast API returned {status}: {body}")]
    Vendor { status: u16, body: String },

    #[error("Toast API call timed out after {0}s")]
    Timeout(u64),

    #[error("{0} not found")]
    NotFound(String),

    /// Local order cannot be expressed as a vendor order.
    #[error("order cannot be pushed: {0}")]
    Unpushable(String),

    #[error("network error calling Toast: {0}")]
    Network(String),

    #[error("malformed Toast response: {0}")]
    Decode(String),

    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),

    #[error("credential decryption failed: {0}")]
    Crypto(#[from] CryptoError),
}

impl ToastError {
    pub fn vendor(status: StatusCode, body: &str) -> Self {
        ToastError::Vendor {
            status: status.as_u16(),
            body: snippet(body),
        }
    }

    /// Drives the one-shot refresh-and-retry.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ToastError::Vendor { status: 401, .. })
    }

    /// Short machine-readable label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ToastError::Config(_) => "config",
            ToastError::Auth(_) => "auth",
            ToastError::Vendor { .. } => "vendor",
            ToastError::Timeout(_) => "timeout",
            ToastError::NotFound(_) => "not_found",
            ToastError::Unpushable(_) => "unpushable",
            ToastError::Network(_) => "network",
            ToastError::Decode(_) => "decode",
            ToastError::Store(_) => "store",
            ToastError::Crypto(_) => "crypto",
        }
    }
}

impl From<anyhow::Error> for ToastError {
    fn from(error: anyhow::Error) -> Self {
        ToastError::Store(error)
    }
}

impl From<sea_orm::DbErr> for ToastError {
    fn from(error: sea_orm::DbErr) -> Self {
        ToastError::Store(error.into())
    }
}

fn snippet(body: &str) -> String {
    if body.chars().count() > BODY_SNIPPET_CHARS {
        let truncated: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
        format!("{}...", truncated)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_body_is_truncated() {
        let body = "x".repeat(500);
        let error = ToastError::vendor(StatusCode::BAD_REQUEST, &body);

        match error {
            ToastError::Vendor { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body.chars().count(), BODY_SNIPPET_CHARS + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_only_401_is_unauthorized() {
        assert!(ToastError::vendor(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(!ToastError::vendor(StatusCode::FORBIDDEN, "").is_unauthorized());
        assert!(!ToastError::Timeout(30).is_unauthorized());
        assert!(!ToastError::Auth("no credentials".into()).is_unauthorized());
    }
}
