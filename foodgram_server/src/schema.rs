//! Diesel table definitions for Foodgram.
//!
//! Tables: users, auth_tokens, tags, ingredients, recipes, recipe_tags,
//! recipe_ingredients, favorites, carts, subscriptions.
//! Join tables carry a unique constraint on their pair of foreign keys.

diesel::table! {
    users (id) {
        id -> Int8,
        email -> Varchar,
        username -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        password_hash -> Varchar,
        is_active -> Bool,
        is_admin -> Bool,
        date_joined -> Timestamptz,
    }
}

diesel::table! {
    auth_tokens (key_digest) {
        key_digest -> Varchar,
        user_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    tags (id) {
        id -> Int8,
        name -> Varchar,
        color -> Varchar,
        slug -> Varchar,
    }
}

diesel::table! {
    ingredients (id) {
        id -> Int8,
        name -> Varchar,
        measurement_unit -> Varchar,
    }
}

diesel::table! {
    recipes (id) {
        id -> Int8,
        author_id -> Int8,
        name -> Varchar,
        image -> Text,
        text -> Text,
        cooking_time -> Int4,
        pub_date -> Timestamptz,
    }
}

diesel::table! {
    recipe_tags (id) {
        id -> Int8,
        recipe_id -> Int8,
        tag_id -> Int8,
    }
}

diesel::table! {
    recipe_ingredients (id) {
        id -> Int8,
        recipe_id -> Int8,
        ingredient_id -> Int8,
        amount -> Int4,
    }
}

diesel::table! {
    favorites (id) {
        id -> Int8,
        user_id -> Int8,
        recipe_id -> Int8,
        date_added -> Timestamptz,
    }
}

diesel::table! {
    carts (id) {
        id -> Int8,
        user_id -> Int8,
        recipe_id -> Int8,
        date_added -> Timestamptz,
    }
}

diesel::table! {
    subscriptions (id) {
        id -> Int8,
        user_id -> Int8,
        author_id -> Int8,
    }
}

// Foreign key relationships
diesel::joinable!(auth_tokens -> users (user_id));
diesel::joinable!(recipes -> users (author_id));
diesel::joinable!(recipe_tags -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> tags (tag_id));
diesel::joinable!(recipe_ingredients -> recipes (recipe_id));
diesel::joinable!(recipe_ingredients -> ingredients (ingredient_id));
diesel::joinable!(favorites -> recipes (recipe_id));
diesel::joinable!(carts -> recipes (recipe_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    auth_tokens,
    tags,
    ingredients,
    recipes,
    recipe_tags,
    recipe_ingredients,
    favorites,
    carts,
    subscriptions,
);
