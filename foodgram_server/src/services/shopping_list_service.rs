//! Shopping list export: ingredient totals across every recipe in a cart.

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::models::user::User;
use crate::schema::carts;

/// One line of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, QueryableByName)]
pub struct ShoppingItem {
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Text)]
    pub measurement_unit: String,
    #[diesel(sql_type = BigInt)]
    pub amount: i64,
}

/// A rendered shopping list ready to be sent as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingList {
    pub filename: String,
    pub body: String,
}

/// Sum amounts per (ingredient name, unit) over the user's cart.
pub async fn aggregate(
    conn: &mut AsyncPgConnection,
    user_id: i64,
) -> ApiResult<Vec<ShoppingItem>> {
    let items = diesel::sql_query(
        "SELECT \
            i.name AS name, \
            i.measurement_unit AS measurement_unit, \
            SUM(ri.amount)::BIGINT AS amount \
         FROM carts c \
         JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id \
         JOIN ingredients i ON i.id = ri.ingredient_id \
         WHERE c.user_id = $1 \
         GROUP BY i.name, i.measurement_unit \
         ORDER BY i.name, i.measurement_unit",
    )
    .bind::<BigInt, _>(user_id)
    .load::<ShoppingItem>(conn)
    .await?;
    Ok(items)
}

/// `name: amount unit`, one line per item.
pub fn render(items: &[ShoppingItem]) -> String {
    let mut body = String::new();
    for item in items {
        body.push_str(&format!(
            "{}: {} {}\n",
            item.name, item.amount, item.measurement_unit
        ));
    }
    body
}

pub fn filename(username: &str) -> String {
    let safe: String = username
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '@' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{safe}_shopping_list.txt")
}

/// Build the downloadable list. An empty cart is rejected.
pub async fn export(conn: &mut AsyncPgConnection, user: &User) -> ApiResult<ShoppingList> {
    let has_items: bool = diesel::select(diesel::dsl::exists(
        carts::table.filter(carts::user_id.eq(user.id)),
    ))
    .get_result(conn)
    .await?;
    if !has_items {
        return Err(ApiError::bad_request("Shopping cart is empty."));
    }

    let items = aggregate(conn, user.id).await?;
    crate::metrics::shopping_list_exported(items.len());
    tracing::info!(user_id = user.id, lines = items.len(), "Shopping list exported");

    Ok(ShoppingList {
        filename: filename(&user.username),
        body: render(&items),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: &str, amount: i64) -> ShoppingItem {
        ShoppingItem {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn renders_one_line_per_item() {
        let body = render(&[item("Flour", "g", 750), item("Milk", "ml", 300)]);
        assert_eq!(body, "Flour: 750 g\nMilk: 300 ml\n");
    }

    #[test]
    fn empty_list_renders_nothing() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn filename_uses_username() {
        assert_eq!(filename("chef.anna"), "chef.anna_shopping_list.txt");
        assert_eq!(filename("we\"ird/"), "we_ird__shopping_list.txt");
    }
}
