//! Accounts, tokens and user representations.

use std::collections::HashSet;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::auth;
use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::models::user::{NewAuthToken, NewUser, User};
use crate::payload::page::PageWindow;
use crate::payload::user::{LoginRequest, RegisterRequest, SetPasswordRequest, UserJson};
use crate::schema::{auth_tokens, subscriptions, users};

/// Resolve a token digest to its user.
pub async fn find_by_token(
    conn: &mut AsyncPgConnection,
    digest: &str,
) -> ApiResult<Option<User>> {
    let user = auth_tokens::table
        .inner_join(users::table)
        .filter(auth_tokens::key_digest.eq(digest))
        .select(User::as_select())
        .first::<User>(conn)
        .await
        .optional()?;
    Ok(user)
}

pub async fn get_user(conn: &mut AsyncPgConnection, user_id: i64) -> ApiResult<User> {
    let user = users::table.find(user_id).first::<User>(conn).await?;
    Ok(user)
}

/// Create an account. Expects a request that already passed `validate`.
pub async fn register(conn: &mut AsyncPgConnection, req: RegisterRequest) -> ApiResult<User> {
    let email = req.email.trim().to_lowercase();
    let username = req.username.trim().to_string();

    let mut errors = FieldErrors::new();
    let email_taken: bool = diesel::select(diesel::dsl::exists(
        users::table.filter(users::email.eq(&email)),
    ))
    .get_result(conn)
    .await?;
    if email_taken {
        errors.add("email", "A user with that email already exists.");
    }
    let username_taken: bool = diesel::select(diesel::dsl::exists(
        users::table.filter(users::username.eq(&username)),
    ))
    .get_result(conn)
    .await?;
    if username_taken {
        errors.add("username", "A user with that username already exists.");
    }
    errors.into_result()?;

    let new_user = NewUser {
        email,
        username,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        password_hash: auth::hash_password(&req.password)?,
    };

    let user = diesel::insert_into(users::table)
        .values(&new_user)
        .get_result::<User>(conn)
        .await?;

    crate::metrics::user_registered();
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok(user)
}

/// Exchange email and password for a new token. Returns the raw token.
pub async fn login(conn: &mut AsyncPgConnection, req: LoginRequest) -> ApiResult<String> {
    let invalid = || ApiError::bad_request("Unable to log in with provided credentials.");

    let email = req.email.trim().to_lowercase();
    let user = users::table
        .filter(users::email.eq(&email))
        .first::<User>(conn)
        .await
        .optional()?;

    let user = match user {
        Some(user)
            if user.is_active && auth::verify_password(&req.password, &user.password_hash) =>
        {
            user
        }
        _ => {
            tracing::warn!(email = %email, "Rejected login");
            return Err(invalid());
        }
    };

    let token = auth::generate_token();
    diesel::insert_into(auth_tokens::table)
        .values(&NewAuthToken {
            key_digest: auth::token_digest(&token),
            user_id: user.id,
        })
        .execute(conn)
        .await?;

    tracing::info!(user_id = user.id, "Token issued");
    Ok(token)
}

/// Revoke one token.
pub async fn logout(conn: &mut AsyncPgConnection, digest: &str) -> ApiResult<()> {
    diesel::delete(auth_tokens::table.find(digest))
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_password(
    conn: &mut AsyncPgConnection,
    user: &User,
    req: SetPasswordRequest,
) -> ApiResult<()> {
    if !auth::verify_password(&req.current_password, &user.password_hash) {
        return Err(ApiError::field("current_password", "Invalid password."));
    }

    let password_hash = auth::hash_password(&req.new_password)?;
    diesel::update(users::table.find(user.id))
        .set(users::password_hash.eq(password_hash))
        .execute(conn)
        .await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(())
}

/// Which of `author_ids` the viewer follows.
pub async fn subscribed_authors(
    conn: &mut AsyncPgConnection,
    viewer: Option<i64>,
    author_ids: &[i64],
) -> ApiResult<HashSet<i64>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<i64> = subscriptions::table
        .filter(subscriptions::user_id.eq(viewer))
        .filter(subscriptions::author_id.eq_any(author_ids))
        .select(subscriptions::author_id)
        .load(conn)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Represent one user as seen by `viewer`.
pub async fn user_json(
    conn: &mut AsyncPgConnection,
    viewer: Option<i64>,
    user: &User,
) -> ApiResult<UserJson> {
    let subscribed = subscribed_authors(conn, viewer, &[user.id]).await?;
    Ok(UserJson::new(user, subscribed.contains(&user.id)))
}

/// List users by id.
pub async fn list_users(
    conn: &mut AsyncPgConnection,
    viewer: Option<i64>,
    window: PageWindow,
) -> ApiResult<(Vec<UserJson>, i64)> {
    let count: i64 = users::table.count().get_result(conn).await?;
    let page = users::table
        .order(users::id.asc())
        .limit(window.limit)
        .offset(window.offset())
        .load::<User>(conn)
        .await?;

    let ids: Vec<i64> = page.iter().map(|u| u.id).collect();
    let subscribed = subscribed_authors(conn, viewer, &ids).await?;

    let results = page
        .iter()
        .map(|u| UserJson::new(u, subscribed.contains(&u.id)))
        .collect();
    Ok((results, count))
}
