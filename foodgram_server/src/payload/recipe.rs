//! Recipe payloads: write validation, list filters and representations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::{check_range, check_text, IMAGE_DATA_REGEX};
use crate::error::{ApiResult, FieldErrors};
use crate::models::ingredient::Ingredient;
use crate::models::recipe::{Recipe, RecipeChangeset};
use crate::models::tag::Tag;

use super::user::UserJson;

pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 1000;
pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 1000;

/// An ingredient amount, sent either as a number or as a digit string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountValue {
    Number(i64),
    Text(String),
}

impl AmountValue {
    pub fn parse(&self) -> Option<i64> {
        match self {
            AmountValue::Number(n) => Some(*n),
            AmountValue::Text(s) => {
                let s = s.trim();
                if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                    s.parse().ok()
                } else {
                    None
                }
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmountRequest {
    pub id: i64,
    pub amount: AmountValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeRequest {
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
}

/// A recipe write that passed the shape checks.
///
/// `tags` and `ingredients` are `None` when an update leaves them unchanged.
/// Existence of the referenced ids is checked against the database later.
#[derive(Debug)]
pub struct RecipeDraft {
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<(i64, i32)>>,
    pub changes: RecipeChangeset,
}

impl RecipeRequest {
    pub fn validate(self, creating: bool) -> ApiResult<RecipeDraft> {
        let mut errors = FieldErrors::new();

        let tags = match self.tags {
            Some(tags) => Some(validate_tags(&mut errors, tags)),
            None => {
                if creating {
                    errors.add("tags", "This field is required.");
                }
                None
            }
        };

        let ingredients = match self.ingredients {
            Some(items) => Some(validate_ingredients(&mut errors, &items)),
            None => {
                if creating {
                    errors.add("ingredients", "This field is required.");
                }
                None
            }
        };

        let name = self.name.map(|n| n.trim().to_string());
        match &name {
            Some(name) => check_text(&mut errors, "name", name, Some(200)),
            None if creating => errors.add("name", "This field is required."),
            None => {}
        }

        match &self.text {
            Some(text) => check_text(&mut errors, "text", text, None),
            None if creating => errors.add("text", "This field is required."),
            None => {}
        }

        match &self.image {
            Some(image) => validate_image(&mut errors, image),
            None if creating => errors.add("image", "This field is required."),
            None => {}
        }

        let cooking_time = match self.cooking_time {
            Some(minutes) => {
                check_range(
                    &mut errors,
                    "cooking_time",
                    minutes,
                    MIN_COOKING_TIME,
                    MAX_COOKING_TIME,
                );
                Some(minutes as i32)
            }
            None => {
                if creating {
                    errors.add("cooking_time", "This field is required.");
                }
                None
            }
        };

        errors.into_result()?;
        Ok(RecipeDraft {
            tags,
            ingredients,
            changes: RecipeChangeset {
                name,
                image: self.image,
                text: self.text,
                cooking_time,
            },
        })
    }
}

fn validate_tags(errors: &mut FieldErrors, tags: Vec<i64>) -> Vec<i64> {
    if tags.is_empty() {
        errors.add("tags", "Select at least one tag.");
    }
    let mut seen = HashSet::new();
    for id in &tags {
        if !seen.insert(*id) {
            errors.add("tags", format!("Tag {id} is listed more than once."));
        }
    }
    tags
}

fn validate_ingredients(
    errors: &mut FieldErrors,
    items: &[IngredientAmountRequest],
) -> Vec<(i64, i32)> {
    if items.is_empty() {
        errors.add("ingredients", "Add at least one ingredient.");
    }
    let mut seen = HashSet::new();
    let mut validated = Vec::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id) {
            errors.add(
                "ingredients",
                format!("Ingredient {} is listed more than once.", item.id),
            );
            continue;
        }
        match item.amount.parse() {
            Some(amount) if (MIN_AMOUNT..=MAX_AMOUNT).contains(&amount) => {
                validated.push((item.id, amount as i32));
            }
            _ => errors.add(
                "ingredients",
                format!(
                    "Amount of ingredient {} must be a whole number from {} to {}.",
                    item.id, MIN_AMOUNT, MAX_AMOUNT
                ),
            ),
        }
    }
    validated
}

fn validate_image(errors: &mut FieldErrors, image: &str) {
    if image.trim().is_empty() {
        errors.add("image", "This field may not be blank.");
    } else if image.starts_with("data:") && !IMAGE_DATA_REGEX.is_match(image) {
        errors.add("image", "Upload a valid base64-encoded image.");
    }
}

/// Filters accepted by the recipe list.
///
/// Parsed from the raw query string because `tags` may repeat.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeListQuery {
    pub fn parse(query: Option<&str>) -> Self {
        let mut parsed = Self::default();
        let Some(query) = query else {
            return parsed;
        };
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => parsed.page = value.parse().ok(),
                "limit" => parsed.limit = value.parse().ok(),
                "author" => parsed.author = value.parse().ok(),
                "tags" => {
                    let slug = value.trim();
                    if !slug.is_empty() {
                        parsed.tags.push(slug.to_string());
                    }
                }
                "is_favorited" => parsed.is_favorited = parse_flag(&value),
                "is_in_shopping_cart" => parsed.is_in_shopping_cart = parse_flag(&value),
                _ => {}
            }
        }
        parsed
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientJson {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl RecipeIngredientJson {
    pub fn new(ingredient: Ingredient, amount: i32) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
            amount,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeJson {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserJson,
    pub ingredients: Vec<RecipeIngredientJson>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeShortJson {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipeShortJson {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn request() -> RecipeRequest {
        serde_json::from_value(serde_json::json!({
            "tags": [1, 2],
            "ingredients": [{"id": 10, "amount": 200}, {"id": 11, "amount": "3"}],
            "name": "Pancakes",
            "image": "data:image/png;base64,iVBORw0KGgo=",
            "text": "Mix and fry.",
            "cooking_time": 20
        }))
        .unwrap()
    }

    fn errors_of(result: ApiResult<RecipeDraft>) -> FieldErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_numeric_and_string_amounts() {
        let draft = request().validate(true).unwrap();
        assert_eq!(draft.tags, Some(vec![1, 2]));
        assert_eq!(draft.ingredients, Some(vec![(10, 200), (11, 3)]));
        assert_eq!(draft.changes.cooking_time, Some(20));
        assert_eq!(draft.changes.name.as_deref(), Some("Pancakes"));
    }

    #[test]
    fn create_requires_every_field() {
        let errors = errors_of(RecipeRequest::default().validate(true));
        for field in ["tags", "ingredients", "name", "text", "image", "cooking_time"] {
            assert!(errors.contains(field), "{field} should be required");
        }
    }

    #[test]
    fn update_accepts_partial_body() {
        let draft = RecipeRequest {
            name: Some("Crepes".to_string()),
            ..RecipeRequest::default()
        }
        .validate(false)
        .unwrap();
        assert!(draft.tags.is_none());
        assert!(draft.ingredients.is_none());
        assert!(!draft.changes.is_empty());
    }

    #[test]
    fn rejects_non_positive_and_oversized_amounts() {
        let amounts = [
            serde_json::json!(0),
            serde_json::json!(-5),
            serde_json::json!(1001),
            serde_json::json!("2.5"),
            serde_json::json!("abc"),
        ];
        for amount in amounts {
            let mut req = request();
            req.ingredients = Some(vec![serde_json::from_value(
                serde_json::json!({"id": 10, "amount": amount}),
            )
            .unwrap()]);
            let errors = errors_of(req.validate(true));
            assert!(errors.contains("ingredients"), "amount {amount} accepted");
        }
    }

    #[test]
    fn rejects_duplicates_and_empty_lists() {
        let mut req = request();
        req.tags = Some(vec![1, 1]);
        req.ingredients = Some(vec![]);
        let errors = errors_of(req.validate(true));
        assert!(errors.contains("tags"));
        assert!(errors.contains("ingredients"));

        let mut req = request();
        req.ingredients = Some(vec![
            serde_json::from_value(serde_json::json!({"id": 5, "amount": 1})).unwrap(),
            serde_json::from_value(serde_json::json!({"id": 5, "amount": 2})).unwrap(),
        ]);
        let errors = errors_of(req.validate(true));
        assert_eq!(errors.get("ingredients").map(<[String]>::len), Some(1));
    }

    #[test]
    fn cooking_time_bounds() {
        for minutes in [0, 1001] {
            let mut req = request();
            req.cooking_time = Some(minutes);
            assert!(errors_of(req.validate(true)).contains("cooking_time"));
        }
    }

    #[test]
    fn image_must_be_valid_data_url_when_inline() {
        let mut req = request();
        req.image = Some("data:text/plain;base64,aGVsbG8=".to_string());
        assert!(errors_of(req.validate(true)).contains("image"));

        let mut req = request();
        req.image = Some("   ".to_string());
        assert!(errors_of(req.validate(true)).contains("image"));
    }

    #[test]
    fn list_query_collects_repeated_tags() {
        let query = RecipeListQuery::parse(Some(
            "tags=breakfast&tags=lunch&author=7&is_favorited=1\
             &is_in_shopping_cart=false&page=2&limit=3",
        ));
        assert_eq!(query.tags, vec!["breakfast", "lunch"]);
        assert_eq!(query.author, Some(7));
        assert_eq!(query.is_favorited, Some(true));
        assert_eq!(query.is_in_shopping_cart, Some(false));
        assert_eq!(query.page, Some(2));
        assert_eq!(query.limit, Some(3));
    }

    #[test]
    fn list_query_ignores_unknown_flag_values() {
        let query = RecipeListQuery::parse(Some("is_favorited=maybe&author=abc&tags="));
        assert_eq!(query.is_favorited, None);
        assert_eq!(query.author, None);
        assert!(query.tags.is_empty());
        assert_eq!(RecipeListQuery::parse(None), RecipeListQuery::default());
    }
}
