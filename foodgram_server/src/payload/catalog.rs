//! Tag and ingredient payloads.

use serde::Deserialize;

use super::{check_text, COLOR_REGEX, SLUG_REGEX};
use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::models::ingredient::NewIngredient;
use crate::models::tag::{NewTag, TagChangeset};

#[derive(Debug, Default, Deserialize)]
pub struct TagRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub slug: Option<String>,
}

impl TagRequest {
    /// Validate a full tag for creation.
    pub fn into_new(self) -> ApiResult<NewTag> {
        let mut errors = FieldErrors::new();
        for (field, value) in [("name", &self.name), ("color", &self.color), ("slug", &self.slug)] {
            if value.is_none() {
                errors.add(field, "This field is required.");
            }
        }
        let changes = self.validate_into(errors)?;
        match (changes.name, changes.color, changes.slug) {
            (Some(name), Some(color), Some(slug)) => Ok(NewTag { name, color, slug }),
            _ => Err(ApiError::bad_request("name, color and slug are required.")),
        }
    }

    /// Validate a partial tag update.
    pub fn into_changeset(self) -> ApiResult<TagChangeset> {
        self.validate_into(FieldErrors::new())
    }

    fn validate_into(self, mut errors: FieldErrors) -> ApiResult<TagChangeset> {
        let name = self.name.map(|n| n.trim().to_string());
        if let Some(name) = &name {
            check_text(&mut errors, "name", name, Some(200));
        }

        let color = self.color.map(|c| normalize_color(&c));
        if let Some(color) = &color {
            if !COLOR_REGEX.is_match(color) {
                errors.add("color", "Enter a HEX color such as #E26C2D.");
            }
        }

        let slug = self.slug.map(|s| s.trim().to_string());
        if let Some(slug) = &slug {
            check_text(&mut errors, "slug", slug, Some(200));
            if !errors.contains("slug") && !SLUG_REGEX.is_match(slug) {
                errors.add(
                    "slug",
                    "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
                );
            }
        }

        errors.into_result()?;
        Ok(TagChangeset { name, color, slug })
    }
}

/// Trim, ensure a leading `#`, and uppercase the hex digits.
pub fn normalize_color(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('#');
    format!("#{}", trimmed.to_uppercase())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IngredientRequest {
    pub name: String,
    pub measurement_unit: String,
}

impl IngredientRequest {
    pub fn into_new(self) -> ApiResult<NewIngredient> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim().to_string();
        let measurement_unit = self.measurement_unit.trim().to_string();
        check_text(&mut errors, "name", &name, Some(200));
        check_text(&mut errors, "measurement_unit", &measurement_unit, Some(20));
        errors.into_result()?;
        Ok(NewIngredient {
            name,
            measurement_unit,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

/// Escape LIKE wildcards so a user-supplied prefix matches literally.
pub fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_is_normalized() {
        assert_eq!(normalize_color(" e26c2d "), "#E26C2D");
        assert_eq!(normalize_color("#49b64e"), "#49B64E");
        assert_eq!(normalize_color("##abc"), "#ABC");
    }

    #[test]
    fn new_tag_requires_all_fields() {
        let err = TagRequest {
            name: Some("Breakfast".to_string()),
            ..TagRequest::default()
        }
        .into_new()
        .unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert!(errors.contains("color"));
                assert!(errors.contains("slug"));
                assert!(!errors.contains("name"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn new_tag_validates_color_and_slug() {
        let err = TagRequest {
            name: Some("Lunch".to_string()),
            color: Some("#12345G".to_string()),
            slug: Some("lunch time".to_string()),
        }
        .into_new()
        .unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert!(errors.contains("color"));
                assert!(errors.contains("slug"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn new_tag_ok() {
        let tag = TagRequest {
            name: Some(" Dinner ".to_string()),
            color: Some("8775d2".to_string()),
            slug: Some("dinner".to_string()),
        }
        .into_new()
        .unwrap();
        assert_eq!(tag.name, "Dinner");
        assert_eq!(tag.color, "#8775D2");
        assert_eq!(tag.slug, "dinner");
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        let changes = TagRequest {
            color: Some("#ffffff".to_string()),
            ..TagRequest::default()
        }
        .into_changeset()
        .unwrap();
        assert_eq!(changes.color.as_deref(), Some("#FFFFFF"));
        assert!(changes.name.is_none());
    }

    #[test]
    fn ingredient_unit_length() {
        let err = IngredientRequest {
            name: "Flour".to_string(),
            measurement_unit: "g".repeat(21),
        }
        .into_new()
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(e) if e.contains("measurement_unit")));
    }

    #[test]
    fn like_prefix_escapes_wildcards() {
        assert_eq!(like_prefix("sug"), "sug%");
        assert_eq!(like_prefix("50%_off"), "50\\%\\_off%");
        assert_eq!(like_prefix(""), "%");
    }
}
