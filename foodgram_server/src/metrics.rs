//! Prometheus metrics for Foodgram.

use metrics::{counter, histogram};

/// Initialize metrics exporter (Prometheus).
pub fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record a new user registration.
pub fn user_registered() {
    counter!("foodgram_users_registered_total").increment(1);
}

/// Record a recipe write (`create`, `update`, `delete`).
pub fn recipe_changed(op: &'static str) {
    counter!("foodgram_recipes_total", "op" => op).increment(1);
}

/// Record a toggle on a join relation (`favorite`, `cart`, `subscription`).
pub fn relation_toggled(relation: &'static str, op: &'static str) {
    counter!("foodgram_relations_total", "relation" => relation, "op" => op).increment(1);
}

/// Record a shopping list export and its number of lines.
pub fn shopping_list_exported(lines: usize) {
    counter!("foodgram_shopping_lists_total").increment(1);
    histogram!("foodgram_shopping_list_lines").record(lines as f64);
}
