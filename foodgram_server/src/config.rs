//! Foodgram configuration, loaded from environment variables.

#[derive(Clone, Debug)]
pub struct FoodgramConfig {
    /// Page size used when a request does not pass `limit`.
    pub page_size: i64,
    /// Upper bound for the `limit` query parameter.
    pub max_page_size: i64,
    /// Maximum number of pooled database connections.
    pub db_pool_size: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Allowed CORS origin. Any origin is allowed when unset.
    pub cors_origin: Option<String>,
}

impl Default for FoodgramConfig {
    fn default() -> Self {
        Self {
            page_size: 6,
            max_page_size: 100,
            db_pool_size: 10,
            request_timeout_secs: 30,
            cors_origin: None,
        }
    }
}

impl FoodgramConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_page_size = std::env::var("FOODGRAM_MAX_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &i64| *n > 0)
            .unwrap_or(defaults.max_page_size);
        let page_size = std::env::var("FOODGRAM_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &i64| *n > 0)
            .unwrap_or(defaults.page_size);
        let db_pool_size = std::env::var("FOODGRAM_DB_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.db_pool_size);
        let request_timeout_secs = std::env::var("FOODGRAM_REQUEST_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.request_timeout_secs);
        let cors_origin = std::env::var("FOODGRAM_CORS_ORIGIN")
            .ok()
            .filter(|s| !s.trim().is_empty());

        if page_size > max_page_size {
            tracing::warn!(
                page_size,
                max_page_size,
                "FOODGRAM_PAGE_SIZE exceeds FOODGRAM_MAX_PAGE_SIZE -- clamping"
            );
        }
        if cors_origin.is_none() {
            tracing::warn!("FOODGRAM_CORS_ORIGIN not set -- allowing any origin");
        }

        Self {
            page_size: page_size.min(max_page_size),
            max_page_size,
            db_pool_size,
            request_timeout_secs,
            cors_origin,
        }
    }

    /// Resolve the effective page size for a requested `limit`.
    pub fn page_limit(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(n) if n > 0 => n.min(self.max_page_size),
            _ => self.page_size,
        }
    }
}
