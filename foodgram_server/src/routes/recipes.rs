//! `/recipes/` endpoints, including favorites, cart and the shopping list.

use axum::extract::{OriginalUri, RawQuery, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::{ApiJson, ApiPath, AppState};
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::ApiResult;
use crate::models::relation::RecipeRelation;
use crate::payload::page::{Page, PageWindow};
use crate::payload::recipe::{RecipeJson, RecipeListQuery, RecipeRequest, RecipeShortJson};
use crate::services::{recipe_service, relation_service, shopping_list_service};

pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: MaybeUser,
    OriginalUri(uri): OriginalUri,
    RawQuery(raw): RawQuery,
) -> ApiResult<Json<Page<RecipeJson>>> {
    let query = RecipeListQuery::parse(raw.as_deref());
    let window = PageWindow::new(query.page, state.config.page_limit(query.limit));
    let mut conn = state.conn().await?;
    let (results, count) =
        recipe_service::list_recipes(&mut conn, viewer.user_id(), &query, window).await?;
    Ok(Json(Page::new(results, count, window, &uri)))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiPath(recipe_id): ApiPath<i64>,
) -> ApiResult<Json<RecipeJson>> {
    let mut conn = state.conn().await?;
    Ok(Json(
        recipe_service::get_recipe(&mut conn, viewer.user_id(), recipe_id).await?,
    ))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<RecipeRequest>,
) -> ApiResult<(StatusCode, Json<RecipeJson>)> {
    let mut conn = state.conn().await?;
    let recipe = recipe_service::create_recipe(&mut conn, &current.user, req).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(recipe_id): ApiPath<i64>,
    ApiJson(req): ApiJson<RecipeRequest>,
) -> ApiResult<Json<RecipeJson>> {
    let mut conn = state.conn().await?;
    Ok(Json(
        recipe_service::update_recipe(&mut conn, &current, recipe_id, req).await?,
    ))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(recipe_id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    let mut conn = state.conn().await?;
    recipe_service::delete_recipe(&mut conn, &current, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark(
    state: AppState,
    current: CurrentUser,
    relation: RecipeRelation,
    recipe_id: i64,
) -> ApiResult<(StatusCode, Json<RecipeShortJson>)> {
    let mut conn = state.conn().await?;
    let short =
        relation_service::add_recipe_relation(&mut conn, relation, current.user.id, recipe_id)
            .await?;
    Ok((StatusCode::CREATED, Json(short)))
}

async fn unmark(
    state: AppState,
    current: CurrentUser,
    relation: RecipeRelation,
    recipe_id: i64,
) -> ApiResult<StatusCode> {
    let mut conn = state.conn().await?;
    relation_service::remove_recipe_relation(&mut conn, relation, current.user.id, recipe_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(recipe_id): ApiPath<i64>,
) -> ApiResult<(StatusCode, Json<RecipeShortJson>)> {
    mark(state, current, RecipeRelation::Favorite, recipe_id).await
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(recipe_id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    unmark(state, current, RecipeRelation::Favorite, recipe_id).await
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(recipe_id): ApiPath<i64>,
) -> ApiResult<(StatusCode, Json<RecipeShortJson>)> {
    mark(state, current, RecipeRelation::Cart, recipe_id).await
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(recipe_id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    unmark(state, current, RecipeRelation::Cart, recipe_id).await
}

/// Plain-text attachment with the summed ingredients of every cart recipe.
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.conn().await?;
    let list = shopping_list_service::export(&mut conn, &current.user).await?;
    let disposition = format!("attachment; filename=\"{}\"", list.filename);
    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        list.body,
    ))
}
