use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Review row as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub star_rating: i16,
    pub review_image: String,
    pub author_id: i32,
    pub business_id: i32,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tag row referenced by reviews
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

/// Author reference expanded to id + name in read responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewAuthor {
    pub id: i32,
    pub name: String,
}

/// Read model with tags, author and likes expanded
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewDetail {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub star_rating: i16,
    pub review_image: String,
    pub author: ReviewAuthor,
    pub business_id: i32,
    pub tags: Vec<Tag>,
    pub like_count: i32,
    /// Ids of the users who liked this review
    pub likes: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a new review
///
/// The author is taken from the bearer token and the image from the
/// uploaded file, never from the body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,
    #[validate(range(min = 1, max = 5, message = "Star rating must be between 1 and 5"))]
    pub star_rating: i16,
    /// Tag ids to attach; unknown ids are skipped
    #[serde(default)]
    pub tags: Vec<i32>,
    pub business_id: i32,
}

/// Request DTO for updating an existing review
///
/// Tags, author and business are immutable after creation, so the update
/// surface is title/description/star_rating (plus the replacement image).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,
    #[validate(range(min = 1, max = 5, message = "Star rating must be between 1 and 5"))]
    pub star_rating: i16,
}

/// Review representation returned by the write operations
/// (create/update/delete), carrying the attached tag ids
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub star_rating: i16,
    pub review_image: String,
    pub author_id: i32,
    pub business_id: i32,
    pub tags: Vec<i32>,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewResponse {
    pub fn from_parts(review: Review, tags: Vec<i32>) -> Self {
        Self {
            id: review.id,
            title: review.title,
            description: review.description,
            star_rating: review.star_rating,
            review_image: review.review_image,
            author_id: review.author_id,
            business_id: review.business_id,
            tags,
            like_count: review.like_count,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

/// Body of GET /api/reviews
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewDetail>,
}

/// Body of GET /api/reviews/{id}
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewDetailResponse {
    pub review: ReviewDetail,
}

/// Body of the write operations: the affected record plus a confirmation
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewMessageResponse {
    pub review: ReviewResponse,
    pub message: String,
}

/// Body of like/unlike: confirmation only, no record
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use validator::Validate;

    #[test]
    fn test_review_serialization() {
        let review = Review {
            id: 1,
            title: "Great food".to_string(),
            description: "Loved it".to_string(),
            star_rating: 5,
            review_image: "uploads/abc.jpg".to_string(),
            author_id: 7,
            business_id: 3,
            like_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&review).expect("Failed to serialize Review");

        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"title\":\"Great food\""));
        assert!(json.contains("\"description\":\"Loved it\""));
        assert!(json.contains("\"star_rating\":5"));
        assert!(json.contains("\"review_image\":\"uploads/abc.jpg\""));
        assert!(json.contains("\"author_id\":7"));
        assert!(json.contains("\"business_id\":3"));
        assert!(json.contains("\"like_count\":0"));
        assert!(json.contains("\"created_at\""));
        assert!(json.contains("\"updated_at\""));
    }

    #[test]
    fn test_create_review_request_deserialization() {
        let json = r#"{
            "title": "Great food",
            "description": "Loved it",
            "star_rating": 5,
            "tags": [1, 2],
            "business_id": 3
        }"#;

        let request: CreateReviewRequest =
            serde_json::from_str(json).expect("Failed to deserialize CreateReviewRequest");

        assert_eq!(request.title, "Great food");
        assert_eq!(request.description, "Loved it");
        assert_eq!(request.star_rating, 5);
        assert_eq!(request.tags, vec![1, 2]);
        assert_eq!(request.business_id, 3);
    }

    #[test]
    fn test_create_review_request_tags_default_to_empty() {
        let json = r#"{
            "title": "Great food",
            "description": "Loved it",
            "star_rating": 4,
            "business_id": 3
        }"#;

        let request: CreateReviewRequest =
            serde_json::from_str(json).expect("Failed to deserialize CreateReviewRequest");

        assert!(request.tags.is_empty());
    }

    #[test]
    fn test_star_rating_bounds() {
        let mut request = CreateReviewRequest {
            title: "Great food".to_string(),
            description: "Loved it".to_string(),
            star_rating: 5,
            tags: vec![],
            business_id: 1,
        };
        assert!(request.validate().is_ok());

        request.star_rating = 0;
        assert!(request.validate().is_err());

        request.star_rating = 6;
        assert!(request.validate().is_err());

        request.star_rating = 1;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let request = UpdateReviewRequest {
            title: String::new(),
            description: "Loved it".to_string(),
            star_rating: 3,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_review_response_from_parts() {
        let review = Review {
            id: 9,
            title: "Great food".to_string(),
            description: "Loved it".to_string(),
            star_rating: 5,
            review_image: "uploads/abc.jpg".to_string(),
            author_id: 7,
            business_id: 3,
            like_count: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response = ReviewResponse::from_parts(review, vec![4, 8]);

        assert_eq!(response.id, 9);
        assert_eq!(response.tags, vec![4, 8]);
        assert_eq!(response.like_count, 2);
    }
}
