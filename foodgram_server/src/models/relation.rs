//! favorites, carts, subscriptions: per-user join rows.

use diesel::prelude::*;

use crate::schema::{carts, favorites, subscriptions};

#[derive(Debug, Insertable)]
#[diesel(table_name = favorites)]
pub struct NewFavorite {
    pub user_id: i64,
    pub recipe_id: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCartItem {
    pub user_id: i64,
    pub recipe_id: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct NewSubscription {
    pub user_id: i64,
    pub author_id: i64,
}

/// A recipe relation a user can toggle on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeRelation {
    Favorite,
    Cart,
}

impl RecipeRelation {
    pub fn label(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorite",
            RecipeRelation::Cart => "cart",
        }
    }

    pub fn already_present(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "Recipe is already in favorites.",
            RecipeRelation::Cart => "Recipe is already in the shopping cart.",
        }
    }

    pub fn not_present(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "Recipe is not in favorites.",
            RecipeRelation::Cart => "Recipe is not in the shopping cart.",
        }
    }
}
