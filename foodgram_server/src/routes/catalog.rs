//! `/tags/` and `/ingredients/`. Reads are public, writes are admin-only.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{ApiJson, ApiPath, ApiQuery, AppState};
use crate::auth::{require_admin, CurrentUser};
use crate::error::ApiResult;
use crate::models::ingredient::Ingredient;
use crate::models::tag::Tag;
use crate::payload::catalog::{IngredientQuery, IngredientRequest, TagRequest};
use crate::services::catalog_service;

// ── Tags ──

pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    let mut conn = state.conn().await?;
    Ok(Json(catalog_service::list_tags(&mut conn).await?))
}

pub async fn get_tag(
    State(state): State<AppState>,
    ApiPath(tag_id): ApiPath<i64>,
) -> ApiResult<Json<Tag>> {
    let mut conn = state.conn().await?;
    Ok(Json(catalog_service::get_tag(&mut conn, tag_id).await?))
}

pub async fn create_tag(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<TagRequest>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    require_admin(&current)?;
    let new_tag = req.into_new()?;
    let mut conn = state.conn().await?;
    let tag = catalog_service::create_tag(&mut conn, new_tag).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn update_tag(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(tag_id): ApiPath<i64>,
    ApiJson(req): ApiJson<TagRequest>,
) -> ApiResult<Json<Tag>> {
    require_admin(&current)?;
    let changes = req.into_changeset()?;
    let mut conn = state.conn().await?;
    Ok(Json(
        catalog_service::update_tag(&mut conn, tag_id, changes).await?,
    ))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(tag_id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&current)?;
    let mut conn = state.conn().await?;
    catalog_service::delete_tag(&mut conn, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Ingredients ──

pub async fn list_ingredients(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IngredientQuery>,
) -> ApiResult<Json<Vec<Ingredient>>> {
    let mut conn = state.conn().await?;
    Ok(Json(
        catalog_service::list_ingredients(&mut conn, query.name.as_deref()).await?,
    ))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    ApiPath(ingredient_id): ApiPath<i64>,
) -> ApiResult<Json<Ingredient>> {
    let mut conn = state.conn().await?;
    Ok(Json(
        catalog_service::get_ingredient(&mut conn, ingredient_id).await?,
    ))
}

pub async fn create_ingredient(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<IngredientRequest>,
) -> ApiResult<(StatusCode, Json<Ingredient>)> {
    require_admin(&current)?;
    let new_ingredient = req.into_new()?;
    let mut conn = state.conn().await?;
    let ingredient = catalog_service::create_ingredient(&mut conn, new_ingredient).await?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

pub async fn delete_ingredient(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(ingredient_id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&current)?;
    let mut conn = state.conn().await?;
    catalog_service::delete_ingredient(&mut conn, ingredient_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
