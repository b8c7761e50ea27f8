use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tierguard_core::TierguardError;
use tracing::error;

/// Error response with a JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Message placed in the `error` field.
    pub message: String,
}

impl ApiError {
    /// Error with an explicit status.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 401 error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl From<TierguardError> for ApiError {
    fn from(err: TierguardError) -> Self {
        let status = match &err {
            TierguardError::UnknownPolicyKey { .. } => StatusCode::BAD_REQUEST,
            TierguardError::OrganizationNotFound(_) => StatusCode::NOT_FOUND,
            TierguardError::Store(_) | TierguardError::LicensingSchemaMissing(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "Licensing request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(TierguardError::unknown("framework", "sox")).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(TierguardError::OrganizationNotFound("org-1".into())).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(TierguardError::Store("down".into())).status,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(TierguardError::Config("bad".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
