//! Tags and ingredients.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::error::{ApiResult, FieldErrors};
use crate::models::ingredient::{Ingredient, NewIngredient};
use crate::models::tag::{NewTag, Tag, TagChangeset};
use crate::payload::catalog::like_prefix;
use crate::schema::{ingredients, tags};

/// All tags ordered by name.
pub async fn list_tags(conn: &mut AsyncPgConnection) -> ApiResult<Vec<Tag>> {
    let results = tags::table
        .order(tags::name.asc())
        .load::<Tag>(conn)
        .await?;
    Ok(results)
}

pub async fn get_tag(conn: &mut AsyncPgConnection, tag_id: i64) -> ApiResult<Tag> {
    let tag = tags::table.find(tag_id).first::<Tag>(conn).await?;
    Ok(tag)
}

/// Report name/slug collisions with tags other than `exclude_id`.
async fn check_tag_unique(
    conn: &mut AsyncPgConnection,
    name: Option<&str>,
    slug: Option<&str>,
    exclude_id: Option<i64>,
) -> ApiResult<()> {
    let mut errors = FieldErrors::new();
    let exclude_id = exclude_id.unwrap_or(0);

    if let Some(name) = name {
        let taken: bool = diesel::select(diesel::dsl::exists(
            tags::table
                .filter(tags::name.eq(name))
                .filter(tags::id.ne(exclude_id)),
        ))
        .get_result(conn)
        .await?;
        if taken {
            errors.add("name", "A tag with this name already exists.");
        }
    }
    if let Some(slug) = slug {
        let taken: bool = diesel::select(diesel::dsl::exists(
            tags::table
                .filter(tags::slug.eq(slug))
                .filter(tags::id.ne(exclude_id)),
        ))
        .get_result(conn)
        .await?;
        if taken {
            errors.add("slug", "A tag with this slug already exists.");
        }
    }
    errors.into_result()
}

pub async fn create_tag(conn: &mut AsyncPgConnection, new_tag: NewTag) -> ApiResult<Tag> {
    check_tag_unique(conn, Some(&new_tag.name), Some(&new_tag.slug), None).await?;

    let tag = diesel::insert_into(tags::table)
        .values(&new_tag)
        .get_result::<Tag>(conn)
        .await?;
    tracing::info!(tag_id = tag.id, slug = %tag.slug, "Tag created");
    Ok(tag)
}

pub async fn update_tag(
    conn: &mut AsyncPgConnection,
    tag_id: i64,
    changes: TagChangeset,
) -> ApiResult<Tag> {
    let existing = get_tag(conn, tag_id).await?;
    if changes.name.is_none() && changes.color.is_none() && changes.slug.is_none() {
        return Ok(existing);
    }
    check_tag_unique(
        conn,
        changes.name.as_deref(),
        changes.slug.as_deref(),
        Some(tag_id),
    )
    .await?;

    let tag = diesel::update(tags::table.find(tag_id))
        .set(&changes)
        .get_result::<Tag>(conn)
        .await?;
    tracing::info!(tag_id, "Tag updated");
    Ok(tag)
}

pub async fn delete_tag(conn: &mut AsyncPgConnection, tag_id: i64) -> ApiResult<()> {
    get_tag(conn, tag_id).await?;
    diesel::delete(tags::table.find(tag_id)).execute(conn).await?;
    tracing::info!(tag_id, "Tag deleted");
    Ok(())
}

/// Ingredients whose name starts with `prefix` (case-insensitive), by name.
pub async fn list_ingredients(
    conn: &mut AsyncPgConnection,
    prefix: Option<&str>,
) -> ApiResult<Vec<Ingredient>> {
    let mut query = ingredients::table
        .order((ingredients::name.asc(), ingredients::measurement_unit.asc()))
        .into_boxed();
    if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
        query = query.filter(ingredients::name.ilike(like_prefix(prefix)));
    }
    let results = query.load::<Ingredient>(conn).await?;
    Ok(results)
}

pub async fn get_ingredient(
    conn: &mut AsyncPgConnection,
    ingredient_id: i64,
) -> ApiResult<Ingredient> {
    let ingredient = ingredients::table
        .find(ingredient_id)
        .first::<Ingredient>(conn)
        .await?;
    Ok(ingredient)
}

pub async fn create_ingredient(
    conn: &mut AsyncPgConnection,
    new_ingredient: NewIngredient,
) -> ApiResult<Ingredient> {
    let taken: bool = diesel::select(diesel::dsl::exists(
        ingredients::table
            .filter(ingredients::name.eq(&new_ingredient.name))
            .filter(ingredients::measurement_unit.eq(&new_ingredient.measurement_unit)),
    ))
    .get_result(conn)
    .await?;
    if taken {
        let mut errors = FieldErrors::new();
        errors.add(
            "name",
            "An ingredient with this name and measurement unit already exists.",
        );
        errors.into_result()?;
    }

    let ingredient = diesel::insert_into(ingredients::table)
        .values(&new_ingredient)
        .get_result::<Ingredient>(conn)
        .await?;
    tracing::info!(ingredient_id = ingredient.id, name = %ingredient.name, "Ingredient created");
    Ok(ingredient)
}

pub async fn delete_ingredient(
    conn: &mut AsyncPgConnection,
    ingredient_id: i64,
) -> ApiResult<()> {
    get_ingredient(conn, ingredient_id).await?;
    diesel::delete(ingredients::table.find(ingredient_id))
        .execute(conn)
        .await?;
    tracing::info!(ingredient_id, "Ingredient deleted");
    Ok(())
}
