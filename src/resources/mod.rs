//! Per-resource panel descriptors.

pub mod activities;
pub mod activity_approvals;
pub mod approvals;
pub mod budget_items;
pub mod donations;
pub mod donors;
pub mod projects;

use axum::Router;
use serde::Serialize;
use serde_json::Value;

use crate::AppState;
use crate::error::ValidationError;
use crate::panel;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(panel::routes::<donations::Donations>())
        .merge(donors::routes())
        .merge(activities::routes())
        .merge(budget_items::routes())
        .merge(panel::read_only_routes::<approvals::Approvals>())
        .merge(panel::read_only_routes::<activity_approvals::ActivityApprovals>())
        .merge(panel::routes::<projects::Projects>())
        .merge(projects::program_area_routes())
}

/// Numeric ids are sent as JSON numbers, anything else as a string.
pub fn id_value(raw: &str) -> Value {
    raw.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw))
}

pub fn to_payload<T: Serialize>(payload: &T) -> Result<Value, ValidationError> {
    serde_json::to_value(payload).map_err(|e| ValidationError::new("payload", e.to_string()))
}

pub fn empty_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}
