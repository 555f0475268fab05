//! Consistent `{"msg": ...}` error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use storefront_infra::ServiceError;
use storefront_orders::OrderError;

const SERVER_ERROR: &str = "Server error";

#[derive(Debug, Error)]
#[error("{status}: {msg}")]
pub struct ApiError {
    pub status: StatusCode,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status, self.msg)
    }
}

pub fn json_error(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "msg": msg.into() }))).into_response()
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        let status = match &err {
            OrderError::Validation(_) | OrderError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            OrderError::ProductNotFound { .. } | OrderError::OrderNotFound => StatusCode::NOT_FOUND,
            OrderError::Conflict => StatusCode::CONFLICT,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::bad_request(msg),
            ServiceError::Unauthenticated(msg) => Self::unauthorized(msg),
            ServiceError::Forbidden(e) => Self::new(StatusCode::FORBIDDEN, e.to_string()),
            ServiceError::NotFound(msg) => Self::not_found(msg),
            ServiceError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            ServiceError::Order(e) => e.into(),
            ServiceError::Store(e) => Self::internal(e),
            ServiceError::Internal(msg) => Self::internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_auth::AuthzError;
    use storefront_infra::store::StoreError;

    #[test]
    fn order_errors_map_to_documented_statuses() {
        let cases = [
            (OrderError::validation("No items in order"), StatusCode::BAD_REQUEST),
            (
                OrderError::InsufficientStock {
                    item: "Tee".to_string(),
                    available: 1,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                OrderError::ProductNotFound {
                    item: "Tee".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (OrderError::OrderNotFound, StatusCode::NOT_FOUND),
            (OrderError::Conflict, StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn store_failures_hide_details() {
        let err = ApiError::from(ServiceError::Store(StoreError::Backend("pool timed out".to_string())));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.msg, "Server error");
    }

    #[test]
    fn access_denied_is_forbidden() {
        let err = ApiError::from(ServiceError::Forbidden(AuthzError::AdminOnly));
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.msg, "Access denied. Admin only.");
    }
}
