//! Toggle relations: favorites, shopping cart and subscriptions.
//!
//! Adding is a single `INSERT ... ON CONFLICT DO NOTHING`; zero affected rows
//! means the pair already existed. Removing reports when nothing was deleted.

use std::collections::HashSet;

use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::error::{ApiError, ApiResult};
use crate::models::recipe::Recipe;
use crate::models::relation::{NewCartItem, NewFavorite, NewSubscription, RecipeRelation};
use crate::models::user::User;
use crate::payload::page::PageWindow;
use crate::payload::recipe::RecipeShortJson;
use crate::payload::user::{SubscriptionJson, UserJson};
use crate::schema::{carts, favorites, recipes, subscriptions, users};

/// Mark a recipe for a user.
pub async fn add_recipe_relation(
    conn: &mut AsyncPgConnection,
    relation: RecipeRelation,
    user_id: i64,
    recipe_id: i64,
) -> ApiResult<RecipeShortJson> {
    let recipe = recipes::table.find(recipe_id).first::<Recipe>(conn).await?;

    let inserted = match relation {
        RecipeRelation::Favorite => {
            diesel::insert_into(favorites::table)
                .values(&NewFavorite { user_id, recipe_id })
                .on_conflict_do_nothing()
                .execute(conn)
                .await?
        }
        RecipeRelation::Cart => {
            diesel::insert_into(carts::table)
                .values(&NewCartItem { user_id, recipe_id })
                .on_conflict_do_nothing()
                .execute(conn)
                .await?
        }
    };

    if inserted == 0 {
        return Err(ApiError::bad_request(relation.already_present()));
    }

    crate::metrics::relation_toggled(relation.label(), "add");
    tracing::info!(user_id, recipe_id, relation = relation.label(), "Recipe marked");

    Ok(recipe.into())
}

/// Unmark a recipe for a user.
pub async fn remove_recipe_relation(
    conn: &mut AsyncPgConnection,
    relation: RecipeRelation,
    user_id: i64,
    recipe_id: i64,
) -> ApiResult<()> {
    recipes::table
        .find(recipe_id)
        .select(recipes::id)
        .first::<i64>(conn)
        .await?;

    let deleted = match relation {
        RecipeRelation::Favorite => {
            diesel::delete(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq(recipe_id)),
            )
            .execute(conn)
            .await?
        }
        RecipeRelation::Cart => {
            diesel::delete(
                carts::table
                    .filter(carts::user_id.eq(user_id))
                    .filter(carts::recipe_id.eq(recipe_id)),
            )
            .execute(conn)
            .await?
        }
    };

    if deleted == 0 {
        return Err(ApiError::bad_request(relation.not_present()));
    }

    crate::metrics::relation_toggled(relation.label(), "remove");
    tracing::info!(user_id, recipe_id, relation = relation.label(), "Recipe unmarked");

    Ok(())
}

/// Which of `recipe_ids` the viewer has marked with `relation`.
pub async fn marked_recipes(
    conn: &mut AsyncPgConnection,
    relation: RecipeRelation,
    viewer: Option<i64>,
    recipe_ids: &[i64],
) -> ApiResult<HashSet<i64>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<i64> = match relation {
        RecipeRelation::Favorite => {
            favorites::table
                .filter(favorites::user_id.eq(viewer))
                .filter(favorites::recipe_id.eq_any(recipe_ids))
                .select(favorites::recipe_id)
                .load(conn)
                .await?
        }
        RecipeRelation::Cart => {
            carts::table
                .filter(carts::user_id.eq(viewer))
                .filter(carts::recipe_id.eq_any(recipe_ids))
                .select(carts::recipe_id)
                .load(conn)
                .await?
        }
    };
    Ok(ids.into_iter().collect())
}

/// Follow an author.
pub async fn subscribe(
    conn: &mut AsyncPgConnection,
    user: &User,
    author_id: i64,
    recipes_limit: Option<i64>,
) -> ApiResult<SubscriptionJson> {
    let author = users::table.find(author_id).first::<User>(conn).await?;
    if author.id == user.id {
        return Err(ApiError::bad_request("You cannot subscribe to yourself."));
    }

    let inserted = diesel::insert_into(subscriptions::table)
        .values(&NewSubscription {
            user_id: user.id,
            author_id,
        })
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;
    if inserted == 0 {
        return Err(ApiError::bad_request(
            "You are already subscribed to this author.",
        ));
    }

    crate::metrics::relation_toggled("subscription", "add");
    tracing::info!(user_id = user.id, author_id, "Subscribed");

    subscription_json(conn, author, recipes_limit).await
}

/// Stop following an author.
pub async fn unsubscribe(
    conn: &mut AsyncPgConnection,
    user: &User,
    author_id: i64,
) -> ApiResult<()> {
    users::table
        .find(author_id)
        .select(users::id)
        .first::<i64>(conn)
        .await?;

    let deleted = diesel::delete(
        subscriptions::table
            .filter(subscriptions::user_id.eq(user.id))
            .filter(subscriptions::author_id.eq(author_id)),
    )
    .execute(conn)
    .await?;
    if deleted == 0 {
        return Err(ApiError::bad_request(
            "You are not subscribed to this author.",
        ));
    }

    crate::metrics::relation_toggled("subscription", "remove");
    tracing::info!(user_id = user.id, author_id, "Unsubscribed");
    Ok(())
}

fn followed_by(user_id: i64) -> users::BoxedQuery<'static, Pg> {
    users::table
        .filter(
            users::id.eq_any(
                subscriptions::table
                    .filter(subscriptions::user_id.eq(user_id))
                    .select(subscriptions::author_id),
            ),
        )
        .into_boxed()
}

/// Authors the user follows, ordered by username.
pub async fn list_subscriptions(
    conn: &mut AsyncPgConnection,
    user_id: i64,
    window: PageWindow,
    recipes_limit: Option<i64>,
) -> ApiResult<(Vec<SubscriptionJson>, i64)> {
    let count: i64 = followed_by(user_id).count().get_result(conn).await?;
    let authors = followed_by(user_id)
        .order(users::username.asc())
        .limit(window.limit)
        .offset(window.offset())
        .load::<User>(conn)
        .await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in authors {
        results.push(subscription_json(conn, author, recipes_limit).await?);
    }
    Ok((results, count))
}

/// An author followed by the viewer, with their newest recipes.
async fn subscription_json(
    conn: &mut AsyncPgConnection,
    author: User,
    recipes_limit: Option<i64>,
) -> ApiResult<SubscriptionJson> {
    let recipes_count: i64 = recipes::table
        .filter(recipes::author_id.eq(author.id))
        .count()
        .get_result(conn)
        .await?;

    let mut query = recipes::table
        .filter(recipes::author_id.eq(author.id))
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .into_boxed();
    if let Some(limit) = recipes_limit.filter(|l| *l >= 0) {
        query = query.limit(limit);
    }
    let recipes = query.load::<Recipe>(conn).await?;

    Ok(SubscriptionJson {
        user: UserJson::new(&author, true),
        recipes: recipes.into_iter().map(RecipeShortJson::from).collect(),
        recipes_count,
    })
}
