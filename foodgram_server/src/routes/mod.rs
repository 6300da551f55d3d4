//! Foodgram HTTP routes, nested at `/api`.

pub mod auth;
pub mod catalog;
pub mod recipes;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::FoodgramConfig;
use crate::db::{DbConn, DbPool};
use crate::error::{ApiError, ApiResult};

/// Shared state for route handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<FoodgramConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, config: FoodgramConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }

    /// Check out a pooled connection.
    pub async fn conn(&self) -> ApiResult<DbConn> {
        self.pool
            .get()
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("diesel pool: {e}")))
    }
}

/// JSON request body whose rejections render as API errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; an id that does not parse is a 404.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query parameters whose rejections render as API errors.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Build the `/api` router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/auth/token/login/", post(auth::login))
        .route("/auth/token/logout/", post(auth::logout))
        // Users
        .route("/users/", get(users::list_users).post(users::register))
        .route("/users/me/", get(users::me))
        .route("/users/set_password/", post(users::set_password))
        .route("/users/subscriptions/", get(users::subscriptions))
        .route("/users/{id}/", get(users::get_user))
        .route(
            "/users/{id}/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
        // Tags
        .route("/tags/", get(catalog::list_tags).post(catalog::create_tag))
        .route(
            "/tags/{id}/",
            get(catalog::get_tag)
                .patch(catalog::update_tag)
                .delete(catalog::delete_tag),
        )
        // Ingredients
        .route(
            "/ingredients/",
            get(catalog::list_ingredients).post(catalog::create_ingredient),
        )
        .route(
            "/ingredients/{id}/",
            get(catalog::get_ingredient).delete(catalog::delete_ingredient),
        )
        // Recipes
        .route(
            "/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/recipes/{id}/",
            get(recipes::get_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/{id}/favorite/",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .with_state(state)
}

/// The full application: `/api` plus tracing, CORS and timeout layers.
pub fn app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        .nest("/api", api_router(state))
        .fallback(not_found)
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(AllowOrigin::exact(origin)),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid FOODGRAM_CORS_ORIGIN: {e}");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
