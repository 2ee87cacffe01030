use validator::Validate;

use crate::reviews::models::{CreateReviewRequest, Review, ReviewDetail, UpdateReviewRequest};
use crate::reviews::{ReviewRepository, ServiceError};
use crate::validation::first_validation_message;

/// Service layer for review business logic
#[derive(Clone)]
pub struct ReviewService {
    repository: ReviewRepository,
}

impl ReviewService {
    /// Create a new ReviewService
    pub fn new(repository: ReviewRepository) -> Self {
        Self { repository }
    }

    /// List all reviews, populated
    ///
    /// An empty store is reported as NoReviews rather than an empty
    /// list; the API contract maps it to 404.
    pub async fn list_reviews(&self) -> Result<Vec<ReviewDetail>, ServiceError> {
        let reviews = self.repository.find_all().await?;
        if reviews.is_empty() {
            return Err(ServiceError::NoReviews);
        }
        Ok(reviews)
    }

    /// Get one review by id, populated
    pub async fn get_review(&self, id: i32) -> Result<ReviewDetail, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Create a new review authored by the given user
    ///
    /// Validates the request, then persists the review together with the
    /// business back-reference updates in one transaction.
    pub async fn create_review(
        &self,
        author_id: i32,
        request: CreateReviewRequest,
        review_image: &str,
    ) -> Result<(Review, Vec<i32>), ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(first_validation_message(&e)))?;

        self.repository
            .create(
                author_id,
                &request.title,
                &request.description,
                request.star_rating,
                &request.tags,
                request.business_id,
                review_image,
            )
            .await
    }

    /// Update an existing review's mutable fields
    ///
    /// Returns the post-update record.
    pub async fn update_review(
        &self,
        id: i32,
        request: UpdateReviewRequest,
        review_image: &str,
    ) -> Result<(Review, Vec<i32>), ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(first_validation_message(&e)))?;

        self.repository
            .update(
                id,
                &request.title,
                &request.description,
                request.star_rating,
                review_image,
            )
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Delete a review, cleaning up its back-references
    pub async fn delete_review(&self, id: i32) -> Result<(Review, Vec<i32>), ServiceError> {
        self.repository
            .delete(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Record a like by the given user; idempotent
    pub async fn like_review(&self, review_id: i32, user_id: i32) -> Result<(), ServiceError> {
        let newly_liked = self.repository.like(review_id, user_id).await?;
        if !newly_liked {
            tracing::debug!("User {} had already liked review {}", user_id, review_id);
        }
        Ok(())
    }

    /// Remove the given user's like; idempotent
    pub async fn unlike_review(&self, review_id: i32, user_id: i32) -> Result<(), ServiceError> {
        let was_liked = self.repository.unlike(review_id, user_id).await?;
        if !was_liked {
            tracing::debug!("User {} had not liked review {}", user_id, review_id);
        }
        Ok(())
    }
}
