//! HTTP rendering of [`EcommerceError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::EcommerceError;

impl EcommerceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EcommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Storage(detail) => {
                tracing::error!(error = %detail, "storage failure");
                "internal server error".to_string()
            }
            Self::ExternalService(detail) => {
                tracing::error!(error = %detail, "upstream failure");
                self.to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(EcommerceError::not_found("cart").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(EcommerceError::Conflict("dup".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(EcommerceError::Validation("bad".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(EcommerceError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(EcommerceError::ExternalService("down".into()).status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_storage_details_hidden() {
        let response = EcommerceError::Storage("password authentication failed for user shop".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "internal server error");
    }
}
