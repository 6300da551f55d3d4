//! Recipe CRUD, list filtering and the recipe representation.

use std::collections::{HashMap, HashSet};

use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::models::ingredient::Ingredient;
use crate::models::recipe::{NewRecipe, NewRecipeIngredient, NewRecipeTag, Recipe};
use crate::models::relation::RecipeRelation;
use crate::models::tag::Tag;
use crate::models::user::User;
use crate::payload::page::PageWindow;
use crate::payload::recipe::{
    RecipeDraft, RecipeIngredientJson, RecipeJson, RecipeListQuery, RecipeRequest,
};
use crate::payload::user::UserJson;
use crate::schema::{
    carts, favorites, ingredients, recipe_ingredients, recipe_tags, recipes, tags, users,
};
use crate::services::{relation_service, user_service};

/// Recipes matching the list filters. Viewer-relative flags apply only to
/// authenticated viewers.
fn filtered<'a>(query: &'a RecipeListQuery, viewer: Option<i64>) -> recipes::BoxedQuery<'a, Pg> {
    let mut q = recipes::table.into_boxed();

    if let Some(author) = query.author {
        q = q.filter(recipes::author_id.eq(author));
    }

    if !query.tags.is_empty() {
        q = q.filter(
            recipes::id.eq_any(
                recipe_tags::table
                    .inner_join(tags::table)
                    .filter(tags::slug.eq_any(&query.tags))
                    .select(recipe_tags::recipe_id),
            ),
        );
    }

    if let Some(viewer) = viewer {
        if let Some(flag) = query.is_favorited {
            let marked = favorites::table
                .filter(favorites::user_id.eq(viewer))
                .select(favorites::recipe_id);
            q = if flag {
                q.filter(recipes::id.eq_any(marked))
            } else {
                q.filter(diesel::dsl::not(recipes::id.eq_any(marked)))
            };
        }
        if let Some(flag) = query.is_in_shopping_cart {
            let marked = carts::table
                .filter(carts::user_id.eq(viewer))
                .select(carts::recipe_id);
            q = if flag {
                q.filter(recipes::id.eq_any(marked))
            } else {
                q.filter(diesel::dsl::not(recipes::id.eq_any(marked)))
            };
        }
    }

    q
}

/// List recipes, newest first.
pub async fn list_recipes(
    conn: &mut AsyncPgConnection,
    viewer: Option<i64>,
    query: &RecipeListQuery,
    window: PageWindow,
) -> ApiResult<(Vec<RecipeJson>, i64)> {
    let count: i64 = filtered(query, viewer).count().get_result(conn).await?;
    let page = filtered(query, viewer)
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .limit(window.limit)
        .offset(window.offset())
        .load::<Recipe>(conn)
        .await?;

    let results = represent(conn, viewer, page).await?;
    Ok((results, count))
}

pub async fn get_recipe(
    conn: &mut AsyncPgConnection,
    viewer: Option<i64>,
    recipe_id: i64,
) -> ApiResult<RecipeJson> {
    let recipe = recipes::table.find(recipe_id).first::<Recipe>(conn).await?;
    one(represent(conn, viewer, vec![recipe]).await?)
}

pub async fn create_recipe(
    conn: &mut AsyncPgConnection,
    author: &User,
    req: RecipeRequest,
) -> ApiResult<RecipeJson> {
    let draft = req.validate(true)?;
    check_references(conn, &draft).await?;

    let RecipeDraft {
        tags: tag_ids,
        ingredients: amounts,
        changes,
    } = draft;
    let (Some(name), Some(image), Some(text), Some(cooking_time)) =
        (changes.name, changes.image, changes.text, changes.cooking_time)
    else {
        return Err(ApiError::bad_request("Incomplete recipe."));
    };
    let new_recipe = NewRecipe {
        author_id: author.id,
        name,
        image,
        text,
        cooking_time,
    };

    let recipe = conn
        .transaction::<Recipe, ApiError, _>(|conn| {
            async move {
                let recipe = diesel::insert_into(recipes::table)
                    .values(&new_recipe)
                    .get_result::<Recipe>(conn)
                    .await?;
                if let Some(tag_ids) = &tag_ids {
                    replace_tags(conn, recipe.id, tag_ids).await?;
                }
                if let Some(amounts) = &amounts {
                    replace_ingredients(conn, recipe.id, amounts).await?;
                }
                Ok(recipe)
            }
            .scope_boxed()
        })
        .await?;

    crate::metrics::recipe_changed("create");
    tracing::info!(recipe_id = recipe.id, author_id = author.id, "Recipe created");

    one(represent(conn, Some(author.id), vec![recipe]).await?)
}

pub async fn update_recipe(
    conn: &mut AsyncPgConnection,
    current: &CurrentUser,
    recipe_id: i64,
    req: RecipeRequest,
) -> ApiResult<RecipeJson> {
    let existing = recipes::table.find(recipe_id).first::<Recipe>(conn).await?;
    ensure_can_edit(current, &existing)?;

    let draft = req.validate(false)?;
    check_references(conn, &draft).await?;

    let RecipeDraft {
        tags: tag_ids,
        ingredients: amounts,
        changes,
    } = draft;

    let recipe = conn
        .transaction::<Recipe, ApiError, _>(|conn| {
            async move {
                let recipe = if changes.is_empty() {
                    existing
                } else {
                    diesel::update(recipes::table.find(recipe_id))
                        .set(&changes)
                        .get_result::<Recipe>(conn)
                        .await?
                };
                if let Some(tag_ids) = &tag_ids {
                    replace_tags(conn, recipe_id, tag_ids).await?;
                }
                if let Some(amounts) = &amounts {
                    replace_ingredients(conn, recipe_id, amounts).await?;
                }
                Ok(recipe)
            }
            .scope_boxed()
        })
        .await?;

    crate::metrics::recipe_changed("update");
    tracing::info!(recipe_id, user_id = current.user.id, "Recipe updated");

    one(represent(conn, Some(current.user.id), vec![recipe]).await?)
}

pub async fn delete_recipe(
    conn: &mut AsyncPgConnection,
    current: &CurrentUser,
    recipe_id: i64,
) -> ApiResult<()> {
    let existing = recipes::table.find(recipe_id).first::<Recipe>(conn).await?;
    ensure_can_edit(current, &existing)?;

    diesel::delete(recipes::table.find(recipe_id))
        .execute(conn)
        .await?;

    crate::metrics::recipe_changed("delete");
    tracing::info!(recipe_id, user_id = current.user.id, "Recipe deleted");
    Ok(())
}

fn ensure_can_edit(current: &CurrentUser, recipe: &Recipe) -> ApiResult<()> {
    if recipe.author_id == current.user.id || current.user.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Report tag and ingredient ids that do not exist.
async fn check_references(conn: &mut AsyncPgConnection, draft: &RecipeDraft) -> ApiResult<()> {
    let mut errors = FieldErrors::new();

    if let Some(wanted) = &draft.tags {
        let found: HashSet<i64> = tags::table
            .filter(tags::id.eq_any(wanted))
            .select(tags::id)
            .load::<i64>(conn)
            .await?
            .into_iter()
            .collect();
        for id in wanted.iter().filter(|id| !found.contains(id)) {
            errors.add("tags", format!("Tag {id} does not exist."));
        }
    }

    if let Some(wanted) = &draft.ingredients {
        let ids: Vec<i64> = wanted.iter().map(|(id, _)| *id).collect();
        let found: HashSet<i64> = ingredients::table
            .filter(ingredients::id.eq_any(&ids))
            .select(ingredients::id)
            .load::<i64>(conn)
            .await?
            .into_iter()
            .collect();
        for id in ids.iter().filter(|id| !found.contains(id)) {
            errors.add("ingredients", format!("Ingredient {id} does not exist."));
        }
    }

    errors.into_result()
}

async fn replace_tags(
    conn: &mut AsyncPgConnection,
    recipe_id: i64,
    tag_ids: &[i64],
) -> Result<(), diesel::result::Error> {
    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
        .execute(conn)
        .await?;
    let rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();
    diesel::insert_into(recipe_tags::table)
        .values(&rows)
        .execute(conn)
        .await?;
    Ok(())
}

async fn replace_ingredients(
    conn: &mut AsyncPgConnection,
    recipe_id: i64,
    amounts: &[(i64, i32)],
) -> Result<(), diesel::result::Error> {
    diesel::delete(
        recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)),
    )
    .execute(conn)
    .await?;
    let rows: Vec<NewRecipeIngredient> = amounts
        .iter()
        .map(|&(ingredient_id, amount)| NewRecipeIngredient {
            recipe_id,
            ingredient_id,
            amount,
        })
        .collect();
    diesel::insert_into(recipe_ingredients::table)
        .values(&rows)
        .execute(conn)
        .await?;
    Ok(())
}

fn one(mut represented: Vec<RecipeJson>) -> ApiResult<RecipeJson> {
    represented
        .pop()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("recipe vanished while rendering")))
}

/// Build full representations for `page`, keeping its order.
///
/// Loads authors, tags, amounts and viewer flags with one query each.
pub async fn represent(
    conn: &mut AsyncPgConnection,
    viewer: Option<i64>,
    page: Vec<Recipe>,
) -> ApiResult<Vec<RecipeJson>> {
    if page.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<i64> = page.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<i64> = page.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<i64, User> = users::table
        .filter(users::id.eq_any(&author_ids))
        .load::<User>(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let tag_rows: Vec<(i64, Tag)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&recipe_ids))
        .order(tags::name.asc())
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(conn)
        .await?;
    let mut tags_by_recipe: HashMap<i64, Vec<Tag>> = HashMap::new();
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe.entry(recipe_id).or_default().push(tag);
    }

    let amount_rows: Vec<(i64, i32, Ingredient)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
        .order(recipe_ingredients::id.asc())
        .select((
            recipe_ingredients::recipe_id,
            recipe_ingredients::amount,
            Ingredient::as_select(),
        ))
        .load(conn)
        .await?;
    let mut ingredients_by_recipe: HashMap<i64, Vec<RecipeIngredientJson>> = HashMap::new();
    for (recipe_id, amount, ingredient) in amount_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(RecipeIngredientJson::new(ingredient, amount));
    }

    let subscribed = user_service::subscribed_authors(conn, viewer, &author_ids).await?;
    let favorited =
        relation_service::marked_recipes(conn, RecipeRelation::Favorite, viewer, &recipe_ids)
            .await?;
    let in_cart =
        relation_service::marked_recipes(conn, RecipeRelation::Cart, viewer, &recipe_ids).await?;

    page.into_iter()
        .map(|recipe| -> ApiResult<RecipeJson> {
            let author = authors.get(&recipe.author_id).ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!("recipe {} has no author", recipe.id))
            })?;
            Ok(RecipeJson {
                id: recipe.id,
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                author: UserJson::new(author, subscribed.contains(&author.id)),
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}
