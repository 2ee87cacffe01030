// HTTP handlers for review endpoints

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::auth::middleware::AuthenticatedUser;
use crate::reviews::{
    error::ErrorResponse,
    models::{
        CreateReviewRequest, MessageResponse, ReviewDetailResponse, ReviewListResponse,
        ReviewMessageResponse, ReviewResponse, UpdateReviewRequest,
    },
    ServiceError,
};
use crate::validation::first_validation_message;
use crate::AppState;

/// Image file carried in a multipart form
struct UploadedImage {
    file_name: String,
    data: Bytes,
}

/// Fields collected from the create/update multipart forms
#[derive(Default)]
struct ReviewForm {
    title: Option<String>,
    description: Option<String>,
    star_rating: Option<i16>,
    tags: Vec<i32>,
    business_id: Option<i32>,
    image: Option<UploadedImage>,
}

impl ReviewForm {
    /// Drain a multipart stream into the known form fields
    ///
    /// Unknown fields are ignored; malformed numeric fields are reported
    /// as validation errors rather than 500s.
    async fn parse(mut multipart: Multipart) -> Result<Self, ServiceError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServiceError::ValidationError(format!("Malformed form data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => form.title = Some(Self::text(field).await?),
                "description" => form.description = Some(Self::text(field).await?),
                "star_rating" => {
                    let value = Self::text(field).await?;
                    let rating = value.trim().parse::<i16>().map_err(|_| {
                        ServiceError::ValidationError("Star rating must be an integer".to_string())
                    })?;
                    form.star_rating = Some(rating);
                }
                "business_id" => {
                    let value = Self::text(field).await?;
                    let id = value.trim().parse::<i32>().map_err(|_| {
                        ServiceError::ValidationError("business_id must be an integer".to_string())
                    })?;
                    form.business_id = Some(id);
                }
                // The tags field repeats, and each occurrence may hold a
                // comma-separated list.
                "tags" => {
                    let value = Self::text(field).await?;
                    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                        let tag = part.parse::<i32>().map_err(|_| {
                            ServiceError::ValidationError("Tags must be integer ids".to_string())
                        })?;
                        form.tags.push(tag);
                    }
                }
                "image" => {
                    let file_name = field.file_name().unwrap_or("image").to_string();
                    let data = field.bytes().await.map_err(|e| {
                        ServiceError::ValidationError(format!("Failed to read image upload: {}", e))
                    })?;
                    form.image = Some(UploadedImage { file_name, data });
                }
                _ => {}
            }
        }

        Ok(form)
    }

    async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ServiceError> {
        field
            .text()
            .await
            .map_err(|e| ServiceError::ValidationError(format!("Malformed form field: {}", e)))
    }
}

/// List all reviews
/// GET /api/reviews
#[utoipa::path(
    get,
    path = "/api/reviews",
    responses(
        (status = 200, description = "All reviews with tags and author expanded", body = ReviewListResponse),
        (status = 404, description = "No reviews exist"),
        (status = 500, description = "Internal server error")
    ),
    tag = "reviews"
)]
pub async fn list_reviews_handler(
    State(state): State<AppState>,
) -> Result<Json<ReviewListResponse>, ErrorResponse> {
    tracing::debug!("Fetching all reviews");

    let reviews = state.review_service.list_reviews().await?;

    tracing::debug!("Retrieved {} reviews", reviews.len());
    Ok(Json(ReviewListResponse { reviews }))
}

/// Get a single review by id
/// GET /api/reviews/{id}
#[utoipa::path(
    get,
    path = "/api/reviews/{id}",
    params(("id" = i32, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review found", body = ReviewDetailResponse),
        (status = 404, description = "Review not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "reviews"
)]
pub async fn get_review_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ReviewDetailResponse>, ErrorResponse> {
    tracing::debug!("Fetching review with id: {}", id);

    let review = state.review_service.get_review(id).await?;

    Ok(Json(ReviewDetailResponse { review }))
}

/// Create a new review
/// POST /api/reviews
#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body(content = CreateReviewRequest, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Review created", body = ReviewMessageResponse),
        (status = 400, description = "Invalid input data"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Referenced business not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "reviews"
)]
pub async fn create_review_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ReviewMessageResponse>), ErrorResponse> {
    tracing::debug!("Creating review for user {}", user.user_id);

    let form = ReviewForm::parse(multipart).await?;
    let request = CreateReviewRequest {
        title: form.title.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        star_rating: form.star_rating.unwrap_or(0),
        tags: form.tags,
        business_id: form
            .business_id
            .ok_or_else(|| ServiceError::ValidationError("business_id is required".to_string()))?,
    };

    // Validate before touching disk so a rejected request writes nothing
    request
        .validate()
        .map_err(|e| ServiceError::ValidationError(first_validation_message(&e)))?;

    let image = form.image.ok_or(ServiceError::MissingImage)?;
    let image_path = state
        .uploads
        .store_image(&image.file_name, &image.data)
        .await
        .map_err(ServiceError::from)?;

    let (review, tags) = state
        .review_service
        .create_review(user.user_id, request, &image_path)
        .await?;

    tracing::info!("User {} created review {}", user.user_id, review.id);
    Ok((
        StatusCode::CREATED,
        Json(ReviewMessageResponse {
            review: ReviewResponse::from_parts(review, tags),
            message: "Review successfully created!".to_string(),
        }),
    ))
}

/// Update an existing review
/// PUT /api/reviews/{id}
#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    params(("id" = i32, Path, description = "Review id")),
    request_body(content = UpdateReviewRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Review updated, response carries the new values", body = ReviewMessageResponse),
        (status = 400, description = "Invalid input data"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Review not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "reviews"
)]
pub async fn update_review_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ReviewMessageResponse>, ErrorResponse> {
    tracing::debug!("Updating review with id: {}", id);

    let form = ReviewForm::parse(multipart).await?;
    let request = UpdateReviewRequest {
        title: form.title.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        star_rating: form.star_rating.unwrap_or(0),
    };

    request
        .validate()
        .map_err(|e| ServiceError::ValidationError(first_validation_message(&e)))?;

    let image = form.image.ok_or(ServiceError::MissingImage)?;
    let image_path = state
        .uploads
        .store_image(&image.file_name, &image.data)
        .await
        .map_err(ServiceError::from)?;

    let (review, tags) = state
        .review_service
        .update_review(id, request, &image_path)
        .await?;

    tracing::info!("Successfully updated review {}", id);
    Ok(Json(ReviewMessageResponse {
        review: ReviewResponse::from_parts(review, tags),
        message: "Review successfully updated!".to_string(),
    }))
}

/// Delete a review
/// DELETE /api/reviews/{id}
#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = i32, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review deleted, response carries the removed record", body = ReviewMessageResponse),
        (status = 404, description = "Review not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "reviews"
)]
pub async fn delete_review_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ReviewMessageResponse>, ErrorResponse> {
    tracing::debug!("Deleting review with id: {}", id);

    let (review, tags) = state.review_service.delete_review(id).await?;

    tracing::info!("Successfully deleted review {}", id);
    Ok(Json(ReviewMessageResponse {
        review: ReviewResponse::from_parts(review, tags),
        message: "Review successfully deleted!".to_string(),
    }))
}

/// Like a review as the authenticated user
/// POST /api/reviews/{id}/like
#[utoipa::path(
    post,
    path = "/api/reviews/{id}/like",
    params(("id" = i32, Path, description = "Review id")),
    responses(
        (status = 200, description = "Like recorded", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Review not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "reviews"
)]
pub async fn like_review_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    state.review_service.like_review(id, user.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Successfully liked review!".to_string(),
    }))
}

/// Remove the authenticated user's like from a review
/// POST /api/reviews/{id}/unlike
#[utoipa::path(
    post,
    path = "/api/reviews/{id}/unlike",
    params(("id" = i32, Path, description = "Review id")),
    responses(
        (status = 200, description = "Like removed", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Review not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "reviews"
)]
pub async fn unlike_review_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    state.review_service.unlike_review(id, user.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Successfully unliked review!".to_string(),
    }))
}
