//! Breach data model.
//!
//! A [`Breach`] is a single finding produced by a rule evaluator. It comes in
//! three shapes ([`ValueBreach`], [`KeyValueBreach`], [`KeyValuesBreach`]),
//! all carrying the same [`BreachMeta`]: check name and type, severity, and
//! the remediation outcome recorded after rendering.
//!
//! ```
//! use breach_render::model::{Breach, KeyValueBreach};
//!
//! let breach: Breach = KeyValueBreach::new("config.yml", "invalid syntax")
//!     .with_labels("File", "Error")
//!     .into();
//! assert_eq!(breach.to_string(), "[File:config.yml] Error: invalid syntax");
//! ```

mod breach;
mod remediation;

pub use breach::*;
pub use remediation::*;

use crate::error::{ErrorContext, Result};

/// Parse breaches from JSON: either one breach object or an array of them.
///
/// Each breach is tagged with `breach-type` (`value`, `key-value` or
/// `key-values`).
pub fn parse_breaches(json: &str) -> Result<Vec<Breach>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        single => vec![single],
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| serde_json::from_value(item).with_context(|| format!("breach {i}")))
        .collect()
}
