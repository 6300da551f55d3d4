//! Token login and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{ApiJson, AppState};
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::payload::user::{LoginRequest, TokenJson};
use crate::services::user_service;

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenJson>> {
    let mut conn = state.conn().await?;
    let auth_token = user_service::login(&mut conn, req).await?;
    Ok(Json(TokenJson { auth_token }))
}

pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<StatusCode> {
    let mut conn = state.conn().await?;
    user_service::logout(&mut conn, &current.token_digest).await?;
    tracing::info!(user_id = current.user.id, "Token revoked");
    Ok(StatusCode::NO_CONTENT)
}
