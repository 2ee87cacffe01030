use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::reviews::models::{Review, ReviewAuthor, ReviewDetail, Tag};
use crate::reviews::ServiceError;

/// Row shape of the populated read queries; the aggregated author and
/// tag columns arrive as jsonb and the likes set as an integer array
#[derive(FromRow)]
struct ReviewDetailRow {
    id: i32,
    title: String,
    description: String,
    star_rating: i16,
    review_image: String,
    author: Json<ReviewAuthor>,
    business_id: i32,
    tags: Json<Vec<Tag>>,
    like_count: i32,
    likes: Vec<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewDetailRow> for ReviewDetail {
    fn from(row: ReviewDetailRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            star_rating: row.star_rating,
            review_image: row.review_image,
            author: row.author.0,
            business_id: row.business_id,
            tags: row.tags.0,
            like_count: row.like_count,
            likes: row.likes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for database operations on reviews
///
/// The multi-table writes (create, like, unlike, delete) each run in a
/// single transaction so a failed side-effect write rolls back the
/// primary write instead of leaving the tables inconsistent.
#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    /// Create a new ReviewRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch all reviews with tags, author and likes expanded
    pub async fn find_all(&self) -> Result<Vec<ReviewDetail>, ServiceError> {
        let rows = sqlx::query_as::<_, ReviewDetailRow>(
            r#"
            SELECT r.id, r.title, r.description, r.star_rating, r.review_image,
                   jsonb_build_object('id', u.id, 'name', u.name) AS author,
                   r.business_id,
                   COALESCE(jsonb_agg(DISTINCT jsonb_build_object('id', t.id, 'name', t.name))
                            FILTER (WHERE t.id IS NOT NULL), '[]'::jsonb) AS tags,
                   r.like_count,
                   COALESCE(array_agg(DISTINCT rl.user_id)
                            FILTER (WHERE rl.user_id IS NOT NULL), ARRAY[]::integer[]) AS likes,
                   r.created_at, r.updated_at
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            LEFT JOIN review_tags rt ON rt.review_id = r.id
            LEFT JOIN tags t ON t.id = rt.tag_id
            LEFT JOIN review_likes rl ON rl.review_id = r.id
            GROUP BY r.id, u.id
            ORDER BY r.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ReviewDetail::from).collect())
    }

    /// Fetch one review by id with tags, author and likes expanded
    pub async fn find_by_id(&self, id: i32) -> Result<Option<ReviewDetail>, ServiceError> {
        let row = sqlx::query_as::<_, ReviewDetailRow>(
            r#"
            SELECT r.id, r.title, r.description, r.star_rating, r.review_image,
                   jsonb_build_object('id', u.id, 'name', u.name) AS author,
                   r.business_id,
                   COALESCE(jsonb_agg(DISTINCT jsonb_build_object('id', t.id, 'name', t.name))
                            FILTER (WHERE t.id IS NOT NULL), '[]'::jsonb) AS tags,
                   r.like_count,
                   COALESCE(array_agg(DISTINCT rl.user_id)
                            FILTER (WHERE rl.user_id IS NOT NULL), ARRAY[]::integer[]) AS likes,
                   r.created_at, r.updated_at
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            LEFT JOIN review_tags rt ON rt.review_id = r.id
            LEFT JOIN tags t ON t.id = rt.tag_id
            LEFT JOIN review_likes rl ON rl.review_id = r.id
            WHERE r.id = $1
            GROUP BY r.id, u.id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ReviewDetail::from))
    }

    /// Create a review and record it on the business, all in one
    /// transaction
    ///
    /// The business side of the write appends the review id and its tags
    /// to the business's collections and increments its review counter.
    /// An unknown business rolls back the whole operation. Tag ids not
    /// present in the tags table are skipped; the returned Vec holds the
    /// ids that were actually attached.
    pub async fn create(
        &self,
        author_id: i32,
        title: &str,
        description: &str,
        star_rating: i16,
        tags: &[i32],
        business_id: i32,
        review_image: &str,
    ) -> Result<(Review, Vec<i32>), ServiceError> {
        let mut tx = self.pool.begin().await?;

        // Touch the business first: 0 rows means it does not exist and
        // nothing else should be written.
        let business = sqlx::query("UPDATE businesses SET review_count = review_count + 1 WHERE id = $1")
            .bind(business_id)
            .execute(&mut *tx)
            .await?;
        if business.rows_affected() == 0 {
            return Err(ServiceError::BusinessNotFound);
        }

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (title, description, star_rating, review_image, author_id, business_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, star_rating, review_image,
                      author_id, business_id, like_count, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(star_rating)
        .bind(review_image)
        .bind(author_id)
        .bind(business_id)
        .fetch_one(&mut *tx)
        .await?;

        let attached_tags: Vec<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO review_tags (review_id, tag_id)
            SELECT $1, id FROM tags WHERE id = ANY($2)
            ON CONFLICT DO NOTHING
            RETURNING tag_id
            "#,
        )
        .bind(review.id)
        .bind(tags)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO business_reviews (business_id, review_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(business_id)
        .bind(review.id)
        .execute(&mut *tx)
        .await?;

        if !attached_tags.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO business_tags (business_id, tag_id)
                SELECT $1, tag_id FROM review_tags WHERE review_id = $2
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(business_id)
            .bind(review.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok((review, attached_tags))
    }

    /// Update title/description/star_rating/image of a review
    ///
    /// Returns the post-update row, or None when the id does not exist.
    pub async fn update(
        &self,
        id: i32,
        title: &str,
        description: &str,
        star_rating: i16,
        review_image: &str,
    ) -> Result<Option<(Review, Vec<i32>)>, ServiceError> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET title = $1, description = $2, star_rating = $3, review_image = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING id, title, description, star_rating, review_image,
                      author_id, business_id, like_count, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(star_rating)
        .bind(review_image)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match review {
            Some(review) => {
                let tags = self.tag_ids(review.id).await?;
                Ok(Some((review, tags)))
            }
            None => Ok(None),
        }
    }

    /// Delete a review and clean up the back-references it created
    ///
    /// The review-keyed junction rows go away via FK cascade; the
    /// business review counter is decremented with a floor at zero.
    /// Returns the deleted row, or None when the id does not exist.
    pub async fn delete(&self, id: i32) -> Result<Option<(Review, Vec<i32>)>, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let tags: Vec<i32> =
            sqlx::query_scalar("SELECT tag_id FROM review_tags WHERE review_id = $1 ORDER BY tag_id")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            DELETE FROM reviews
            WHERE id = $1
            RETURNING id, title, description, star_rating, review_image,
                      author_id, business_id, like_count, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let review = match review {
            Some(review) => review,
            None => return Ok(None),
        };

        sqlx::query(
            "UPDATE businesses SET review_count = GREATEST(review_count - 1, 0) WHERE id = $1",
        )
        .bind(review.business_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((review, tags)))
    }

    /// Add a user to a review's likes set
    ///
    /// Membership-gated: the counter and the user's liked-reviews
    /// back-reference only move when the like was not already present,
    /// which makes the operation idempotent and keeps like_count equal
    /// to the size of the likes set. Returns whether the like was new.
    pub async fn like(&self, review_id: i32, user_id: i32) -> Result<bool, ServiceError> {
        let mut tx = self.pool.begin().await?;

        if !Self::review_exists(&mut tx, review_id).await? {
            return Err(ServiceError::NotFound);
        }

        let inserted = sqlx::query(
            "INSERT INTO review_likes (review_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(review_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let newly_liked = inserted.rows_affected() == 1;
        if newly_liked {
            sqlx::query("UPDATE reviews SET like_count = like_count + 1 WHERE id = $1")
                .bind(review_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT INTO user_liked_reviews (user_id, review_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(review_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(newly_liked)
    }

    /// Remove a user from a review's likes set
    ///
    /// Symmetric to like: the counter and back-reference only move when
    /// a like row was actually removed, so the counter can never go
    /// negative. Returns whether a like was removed.
    pub async fn unlike(&self, review_id: i32, user_id: i32) -> Result<bool, ServiceError> {
        let mut tx = self.pool.begin().await?;

        if !Self::review_exists(&mut tx, review_id).await? {
            return Err(ServiceError::NotFound);
        }

        let removed = sqlx::query("DELETE FROM review_likes WHERE review_id = $1 AND user_id = $2")
            .bind(review_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let was_liked = removed.rows_affected() == 1;
        if was_liked {
            sqlx::query("UPDATE reviews SET like_count = like_count - 1 WHERE id = $1")
                .bind(review_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query("DELETE FROM user_liked_reviews WHERE user_id = $1 AND review_id = $2")
                .bind(user_id)
                .bind(review_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(was_liked)
    }

    /// Tag ids attached to a review
    async fn tag_ids(&self, review_id: i32) -> Result<Vec<i32>, ServiceError> {
        let tags =
            sqlx::query_scalar("SELECT tag_id FROM review_tags WHERE review_id = $1 ORDER BY tag_id")
                .bind(review_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(tags)
    }

    async fn review_exists(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        review_id: i32,
    ) -> Result<bool, ServiceError> {
        let exists: Option<bool> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reviews WHERE id = $1)")
                .bind(review_id)
                .fetch_one(&mut **tx)
                .await?;

        Ok(exists.unwrap_or(false))
    }
}
