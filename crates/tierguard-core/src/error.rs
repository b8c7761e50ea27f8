use thiserror::Error;

/// A convenience `Result` alias using [`TierguardError`].
pub type TierguardResult<T> = Result<T, TierguardError>;

/// Top-level error type for Tierguard.
///
/// Logical access denial is never an error; evaluators return `false` instead.
#[derive(Error, Debug)]
pub enum TierguardError {
    /// The backing store failed (query error, connectivity, missing table).
    #[error("Store error: {0}")]
    Store(String),

    /// A framework, module, tier or billing code that is not in the policy tables.
    #[error("Unknown {kind} '{value}'")]
    UnknownPolicyKey {
        /// Which kind of key failed to parse (e.g. "framework").
        kind: &'static str,
        /// The offending raw value.
        value: String,
    },

    /// No `organizations` row exists for the requested id.
    #[error("Organization not found: {0}")]
    OrganizationNotFound(String),

    /// The organization row exists but carries no licensing columns.
    #[error("Licensing columns missing for organization {0}")]
    LicensingSchemaMissing(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from the HTTP gateway layer.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TierguardError {
    /// Shorthand for an [`TierguardError::UnknownPolicyKey`] error.
    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownPolicyKey {
            kind,
            value: value.into(),
        }
    }

    /// Whether the loader may recover from this error with a fallback snapshot.
    ///
    /// Unknown policy keys are configuration errors and must surface.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::OrganizationNotFound(_) | Self::LicensingSchemaMissing(_)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_policy_key_display() {
        let err = TierguardError::unknown("framework", "sox");
        assert_eq!(err.to_string(), "Unknown framework 'sox'");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_store_errors_are_recoverable() {
        assert!(TierguardError::Store("connection reset".into()).is_recoverable());
        assert!(TierguardError::OrganizationNotFound("org-1".into()).is_recoverable());
        assert!(TierguardError::LicensingSchemaMissing("org-1".into()).is_recoverable());
        assert!(!TierguardError::Config("bad".into()).is_recoverable());
    }
}
