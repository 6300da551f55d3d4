//! ingredients: unique by (name, measurement_unit).

use diesel::prelude::*;
use serde::Serialize;

use crate::schema::ingredients;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = ingredients)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ingredients)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}
