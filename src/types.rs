//! Error taxonomy for Papergate
//!
//! Every workflow failure is one of these kinds. The HTTP boundary logs the
//! kind and maps it onto the legacy status/shape contract; the kinds exist
//! so that logs and tests can distinguish causes the wire format cannot.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GatewayError>;

/// All failure kinds surfaced by the workflow service and its clients
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No user record for the submitting identity
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// A paper record already exists for this content identifier
    #[error("paper already exists: {0}")]
    DuplicatePaper(String),

    /// The content store could not accept or serve the payload
    #[error("content store unavailable: {0}")]
    StorageUnavailable(String),

    /// The ledger rejected the account unlock credential
    #[error("account unlock rejected for {0}")]
    AuthenticationRejected(String),

    /// The reward transfer to the collection account failed
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// The ledger rejected a contract invocation
    #[error("ledger rejected call: {0}")]
    LedgerRejected(String),

    /// A read against the ledger or metadata store failed
    #[error("lookup failed: {0}")]
    LookupFailed(String),

    /// MongoDB error
    #[error("database error: {0}")]
    Database(String),

    /// Invalid or missing session credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed request payload
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Invalid startup configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Short machine-readable kind, used in request logs
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::UserNotFound(_) => "user_not_found",
            GatewayError::DuplicatePaper(_) => "duplicate_paper",
            GatewayError::StorageUnavailable(_) => "storage_unavailable",
            GatewayError::AuthenticationRejected(_) => "authentication_rejected",
            GatewayError::TransferFailed(_) => "transfer_failed",
            GatewayError::LedgerRejected(_) => "ledger_rejected",
            GatewayError::LookupFailed(_) => "lookup_failed",
            GatewayError::Database(_) => "database",
            GatewayError::Unauthorized(_) => "unauthorized",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_per_variant() {
        assert_eq!(
            GatewayError::DuplicatePaper("Qm123".into()).kind(),
            "duplicate_paper"
        );
        assert_eq!(
            GatewayError::AuthenticationRejected("0xA1".into()).kind(),
            "authentication_rejected"
        );
    }

    #[test]
    fn display_includes_context() {
        let err = GatewayError::UserNotFound("a@x.com".into());
        assert!(err.to_string().contains("a@x.com"));
    }
}
