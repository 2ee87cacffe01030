use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::uploads::UploadError;

/// Service-level errors for the review system
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Review not found
    #[error("Review not found")]
    NotFound,

    /// The listing matched no reviews at all
    #[error("No reviews found")]
    NoReviews,

    /// Referenced business does not exist
    #[error("Business not found")]
    BusinessNotFound,

    /// Validation error with the first violation's message
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Create/update requires an uploaded image file
    #[error("Review image file is required")]
    MissingImage,

    /// Image could not be stored
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Error response structure for API responses
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            details: None,
        }
    }
}

/// Convert ServiceError to ErrorResponse
impl From<ServiceError> for ErrorResponse {
    fn from(err: ServiceError) -> Self {
        let (error_type, message) = match &err {
            ServiceError::NotFound => ("NOT_FOUND", "Review not found".to_string()),
            ServiceError::NoReviews => ("NOT_FOUND", "No reviews found".to_string()),
            ServiceError::BusinessNotFound => {
                ("BUSINESS_NOT_FOUND", "Business not found".to_string())
            }
            ServiceError::ValidationError(msg) => ("VALIDATION_ERROR", msg.clone()),
            ServiceError::MissingImage => (
                "VALIDATION_ERROR",
                "Review image file is required".to_string(),
            ),
            ServiceError::Upload(UploadError::UnsupportedType(name)) => (
                "VALIDATION_ERROR",
                format!("Unsupported image type: {}", name),
            ),
            ServiceError::Upload(UploadError::Io(e)) => {
                tracing::error!("Image storage error: {:?}", e);
                ("UPLOAD_ERROR", "Failed to store review image".to_string())
            }
            ServiceError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                ("DATABASE_ERROR", "An internal error occurred".to_string())
            }
        };

        ErrorResponse::new(error_type.to_string(), message)
    }
}

/// Convert ErrorResponse to HTTP response
impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.error.as_str() {
            "NOT_FOUND" | "BUSINESS_NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Convert ServiceError to HTTP response
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let response: ErrorResponse = self.into();
        response.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_not_found_code() {
        let response: ErrorResponse = ServiceError::NotFound.into();
        assert_eq!(response.error, "NOT_FOUND");
        assert_eq!(response.message, "Review not found");
    }

    #[test]
    fn test_empty_listing_maps_to_not_found_code() {
        let response: ErrorResponse = ServiceError::NoReviews.into();
        assert_eq!(response.error, "NOT_FOUND");
        assert_eq!(response.message, "No reviews found");
    }

    #[test]
    fn test_validation_error_keeps_message() {
        let response: ErrorResponse =
            ServiceError::ValidationError("Star rating must be between 1 and 5".to_string()).into();
        assert_eq!(response.error, "VALIDATION_ERROR");
        assert_eq!(response.message, "Star rating must be between 1 and 5");
    }

    #[test]
    fn test_database_error_is_not_leaked() {
        let response: ErrorResponse = ServiceError::DatabaseError(sqlx::Error::RowNotFound).into();
        assert_eq!(response.error, "DATABASE_ERROR");
        assert_eq!(response.message, "An internal error occurred");
    }
}
