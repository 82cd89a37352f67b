//! Router configuration for the web API.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{auth, category, comment, post as post_handlers, AppState};
use super::middleware::{create_cors_layer, session_auth};
use crate::auth::session::SessionKeys;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    session_keys: Arc<SessionKeys>,
    cors_origins: &[String],
) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let category_routes = Router::new()
        .route("/", get(category::list_categories))
        .route("/:slug/posts", get(category::list_posts))
        .route(
            "/:id/access",
            get(category::list_grants)
                .post(category::grant_access)
                .delete(category::revoke_access),
        );

    let post_routes = Router::new()
        .route("/", post(post_handlers::create_post))
        .route(
            "/:id",
            get(post_handlers::get_post)
                .put(post_handlers::update_post)
                .delete(post_handlers::delete_post),
        )
        .route(
            "/:id/pin",
            post(post_handlers::pin_post).delete(post_handlers::unpin_post),
        )
        .route("/:id/vote", post(post_handlers::vote_post))
        .route("/:id/comments", get(comment::list_comments));

    let comment_routes = Router::new()
        .route("/", post(comment::create_comment))
        .route(
            "/:id",
            put(comment::update_comment).delete(comment::delete_comment),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/categories", category_routes)
        .nest("/posts", post_routes)
        .nest("/comments", comment_routes);

    let keys_for_middleware = session_keys.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let keys = keys_for_middleware.clone();
                    session_auth(keys, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_health_router() {
        let _router = create_health_router();
        // Should not panic
    }
}
