//! Connection pool and schema migration.

use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConn = Object<AsyncPgConnection>;

/// SQL migration for all Foodgram tables.
///
/// Idempotent: every statement is guarded with IF NOT EXISTS.
pub const MIGRATION_SQL: &str = r#"
-- ================================================================
-- Users and tokens
-- ================================================================

CREATE TABLE IF NOT EXISTS users (
    id              BIGSERIAL PRIMARY KEY,
    email           VARCHAR(254) NOT NULL UNIQUE,
    username        VARCHAR(50) NOT NULL UNIQUE,
    first_name      VARCHAR(50) NOT NULL,
    last_name       VARCHAR(50) NOT NULL,
    password_hash   VARCHAR(255) NOT NULL,
    is_active       BOOLEAN NOT NULL DEFAULT TRUE,
    is_admin        BOOLEAN NOT NULL DEFAULT FALSE,
    date_joined     TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_users_username ON users (username);

CREATE TABLE IF NOT EXISTS auth_tokens (
    key_digest      VARCHAR(64) PRIMARY KEY,
    user_id         BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_auth_tokens_user ON auth_tokens (user_id);

-- ================================================================
-- Catalog
-- ================================================================

CREATE TABLE IF NOT EXISTS tags (
    id              BIGSERIAL PRIMARY KEY,
    name            VARCHAR(200) NOT NULL UNIQUE,
    color           VARCHAR(7) NOT NULL,
    slug            VARCHAR(200) NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS ingredients (
    id               BIGSERIAL PRIMARY KEY,
    name             VARCHAR(200) NOT NULL,
    measurement_unit VARCHAR(20) NOT NULL,
    CONSTRAINT unique_ingredient_unit UNIQUE (name, measurement_unit)
);

CREATE INDEX IF NOT EXISTS idx_ingredients_name ON ingredients (LOWER(name) varchar_pattern_ops);

-- ================================================================
-- Recipes
-- ================================================================

CREATE TABLE IF NOT EXISTS recipes (
    id              BIGSERIAL PRIMARY KEY,
    author_id       BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name            VARCHAR(200) NOT NULL,
    image           TEXT NOT NULL,
    text            TEXT NOT NULL,
    cooking_time    INTEGER NOT NULL CHECK (cooking_time BETWEEN 1 AND 1000),
    pub_date        TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_recipes_author ON recipes (author_id);
CREATE INDEX IF NOT EXISTS idx_recipes_pub_date ON recipes (pub_date DESC);

CREATE TABLE IF NOT EXISTS recipe_tags (
    id              BIGSERIAL PRIMARY KEY,
    recipe_id       BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    tag_id          BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    CONSTRAINT unique_recipe_tag UNIQUE (recipe_id, tag_id)
);

CREATE TABLE IF NOT EXISTS recipe_ingredients (
    id              BIGSERIAL PRIMARY KEY,
    recipe_id       BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    ingredient_id   BIGINT NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
    amount          INTEGER NOT NULL CHECK (amount BETWEEN 1 AND 1000),
    CONSTRAINT unique_recipe_ingredient UNIQUE (recipe_id, ingredient_id)
);

CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_ingredient ON recipe_ingredients (ingredient_id);

-- ================================================================
-- Per-user relations
-- ================================================================

CREATE TABLE IF NOT EXISTS favorites (
    id              BIGSERIAL PRIMARY KEY,
    user_id         BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    recipe_id       BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    date_added      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT unique_favorite_recipe UNIQUE (user_id, recipe_id)
);

CREATE TABLE IF NOT EXISTS carts (
    id              BIGSERIAL PRIMARY KEY,
    user_id         BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    recipe_id       BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    date_added      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT unique_cart_recipe UNIQUE (user_id, recipe_id)
);

CREATE TABLE IF NOT EXISTS subscriptions (
    id              BIGSERIAL PRIMARY KEY,
    user_id         BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    author_id       BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    CONSTRAINT unique_subscription UNIQUE (user_id, author_id),
    CONSTRAINT no_self_subscription CHECK (user_id <> author_id)
);

CREATE INDEX IF NOT EXISTS idx_subscriptions_author ON subscriptions (author_id);
"#;

/// Build the connection pool. No connection is opened until first use.
pub fn create_pool(database_url: &str, max_size: usize) -> anyhow::Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(manager).max_size(max_size).build()?;
    Ok(pool)
}

/// Run the Foodgram migration.
pub async fn run_migration(conn: &mut AsyncPgConnection) -> anyhow::Result<()> {
    conn.batch_execute(MIGRATION_SQL)
        .await
        .map_err(|e| anyhow::anyhow!("Foodgram migration failed: {e}"))?;
    Ok(())
}
