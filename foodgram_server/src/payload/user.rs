//! User, auth and subscription payloads.

use serde::{Deserialize, Serialize};

use super::recipe::RecipeShortJson;
use super::{check_text, EMAIL_REGEX, USERNAME_REGEX};
use crate::error::{ApiResult, FieldErrors};
use crate::models::user::User;

/// Usernames that collide with fixed routes under `/users/`.
const RESERVED_USERNAMES: &[&str] = &["me", "subscriptions", "set_password"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();

        check_text(&mut errors, "email", &self.email, Some(254));
        if !errors.contains("email") && !EMAIL_REGEX.is_match(self.email.trim()) {
            errors.add("email", "Enter a valid email address.");
        }

        check_text(&mut errors, "username", &self.username, Some(50));
        if !errors.contains("username") {
            if !USERNAME_REGEX.is_match(&self.username) {
                errors.add(
                    "username",
                    "Enter a valid username. Letters, digits and @/./+/-/_ only.",
                );
            } else if RESERVED_USERNAMES.contains(&self.username.to_lowercase().as_str()) {
                errors.add("username", "This username is reserved.");
            }
        }

        check_text(&mut errors, "first_name", &self.first_name, Some(50));
        check_text(&mut errors, "last_name", &self.last_name, Some(50));
        check_text(&mut errors, "password", &self.password, Some(128));

        errors.into_result()
    }
}

/// Response body for a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisteredUserJson {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for RegisteredUserJson {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserJson {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserJson {
    pub fn new(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}

/// An author as seen from the subscriptions list.
#[derive(Debug, Serialize)]
pub struct SubscriptionJson {
    #[serde(flatten)]
    pub user: UserJson,
    pub recipes: Vec<RecipeShortJson>,
    pub recipes_count: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionsQuery {
    #[serde(default, deserialize_with = "super::lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient_int")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient_int")]
    pub recipes_limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitQuery {
    #[serde(default, deserialize_with = "super::lenient_int")]
    pub recipes_limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenJson {
    pub auth_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetPasswordRequest {
    pub new_password: String,
    pub current_password: String,
}

impl SetPasswordRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "current_password", &self.current_password, None);
        check_text(&mut errors, "new_password", &self.new_password, Some(128));
        errors.into_result()
    }
}
