mod auth;
mod db;
mod reviews;
mod uploads;
mod validation;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use reviews::handlers::{
    create_review_handler, delete_review_handler, get_review_handler, like_review_handler,
    list_reviews_handler, unlike_review_handler, update_review_handler,
};
use reviews::{ReviewRepository, ReviewService};
use uploads::UploadStore;

/// Uploaded images may be a few megabytes; the axum default (2 MB) is
/// too small for phone photos.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        reviews::handlers::list_reviews_handler,
        reviews::handlers::get_review_handler,
        reviews::handlers::create_review_handler,
        reviews::handlers::update_review_handler,
        reviews::handlers::delete_review_handler,
        reviews::handlers::like_review_handler,
        reviews::handlers::unlike_review_handler,
    ),
    components(
        schemas(
            reviews::models::Review,
            reviews::models::Tag,
            reviews::models::ReviewAuthor,
            reviews::models::ReviewDetail,
            reviews::models::CreateReviewRequest,
            reviews::models::UpdateReviewRequest,
            reviews::models::ReviewResponse,
            reviews::models::ReviewListResponse,
            reviews::models::ReviewDetailResponse,
            reviews::models::ReviewMessageResponse,
            reviews::models::MessageResponse,
        )
    ),
    tags(
        (name = "reviews", description = "Review management endpoints")
    ),
    info(
        title = "Review API",
        version = "1.0.0",
        description = "RESTful API for business reviews with tags and likes"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub review_service: ReviewService,
    pub uploads: UploadStore,
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
fn create_router(db: PgPool, uploads: UploadStore) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let state = AppState {
        review_service: ReviewService::new(ReviewRepository::new(db)),
        uploads,
    };

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // API routes
        .route("/api/reviews", get(list_reviews_handler))
        .route("/api/reviews", post(create_review_handler))
        .route("/api/reviews/:id", get(get_review_handler))
        .route("/api/reviews/:id", put(update_review_handler))
        .route("/api/reviews/:id", delete(delete_review_handler))
        .route("/api/reviews/:id/like", post(like_review_handler))
        .route("/api/reviews/:id/unlike", post(unlike_review_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Review API - Starting...");

    // Get configuration from environment variables
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    if std::env::var("JWT_SECRET").is_err() {
        tracing::warn!("JWT_SECRET is not set; authenticated endpoints will reject all requests");
    }

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Create the application router
    let app = create_router(db_pool, UploadStore::from_env());

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Review API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}

#[cfg(test)]
mod tests;
