//! Error conversions - HTTP rendering of [`AppError`]

#[cfg(feature = "axum")]
use super::app_error::AppError;

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details for HTTP APIs
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.title(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
            "transient": self.is_transient(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(all(test, feature = "axum"))]
mod tests {
    use super::*;
    use crate::error::kind::ErrorKind;
    use axum::response::IntoResponse;

    #[test]
    fn test_into_response_status() {
        let response = AppError::new(ErrorKind::GatewayTimeout, "slow upstream").into_response();
        assert_eq!(response.status().as_u16(), 504);

        let response = AppError::new(ErrorKind::TooManyRequests, "wait").into_response();
        assert_eq!(response.status().as_u16(), 429);
    }
}
