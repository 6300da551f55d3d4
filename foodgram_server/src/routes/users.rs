//! `/users/` endpoints: registration, profiles, password and subscriptions.

use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::Json;

use super::{ApiJson, ApiPath, ApiQuery, AppState};
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::ApiResult;
use crate::payload::page::{Page, PageQuery, PageWindow};
use crate::payload::user::{
    RecipesLimitQuery, RegisterRequest, RegisteredUserJson, SetPasswordRequest,
    SubscriptionJson, SubscriptionsQuery, UserJson,
};
use crate::services::{relation_service, user_service};

pub async fn list_users(
    State(state): State<AppState>,
    viewer: MaybeUser,
    OriginalUri(uri): OriginalUri,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Page<UserJson>>> {
    let window = PageWindow::new(query.page, state.config.page_limit(query.limit));
    let mut conn = state.conn().await?;
    let (results, count) = user_service::list_users(&mut conn, viewer.user_id(), window).await?;
    Ok(Json(Page::new(results, count, window, &uri)))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisteredUserJson>)> {
    req.validate()?;
    let mut conn = state.conn().await?;
    let user = user_service::register(&mut conn, req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get_user(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<Json<UserJson>> {
    let mut conn = state.conn().await?;
    let user = user_service::get_user(&mut conn, user_id).await?;
    let json = user_service::user_json(&mut conn, viewer.user_id(), &user).await?;
    Ok(Json(json))
}

pub async fn me(current: CurrentUser) -> Json<UserJson> {
    Json(UserJson::new(&current.user, false))
}

pub async fn set_password(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<SetPasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;
    let mut conn = state.conn().await?;
    user_service::set_password(&mut conn, &current.user, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscriptions(
    State(state): State<AppState>,
    current: CurrentUser,
    OriginalUri(uri): OriginalUri,
    ApiQuery(query): ApiQuery<SubscriptionsQuery>,
) -> ApiResult<Json<Page<SubscriptionJson>>> {
    let window = PageWindow::new(query.page, state.config.page_limit(query.limit));
    let mut conn = state.conn().await?;
    let (results, count) = relation_service::list_subscriptions(
        &mut conn,
        current.user.id,
        window,
        query.recipes_limit,
    )
    .await?;
    Ok(Json(Page::new(results, count, window, &uri)))
}

pub async fn subscribe(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(author_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<RecipesLimitQuery>,
) -> ApiResult<(StatusCode, Json<SubscriptionJson>)> {
    let mut conn = state.conn().await?;
    let json =
        relation_service::subscribe(&mut conn, &current.user, author_id, query.recipes_limit)
            .await?;
    Ok((StatusCode::CREATED, Json(json)))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(author_id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    let mut conn = state.conn().await?;
    relation_service::unsubscribe(&mut conn, &current.user, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
