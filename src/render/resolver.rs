//! Template resolution: which source applies for an output format.

use std::fmt;

use super::format::OutputFormat;
use crate::config::BreachTemplate;

/// Key of the `templates` entry used when no entry matches the format.
pub const DEFAULT_FORMAT_KEY: &str = "default";

/// Outcome of resolving a [`BreachTemplate`] for one output format.
///
/// Every configuration resolves to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'t> {
    /// A `templates` entry matched, either by format or the `default` key.
    PerFormat { key: &'t str, source: &'t str },
    /// The single `template` applies to every format.
    Single(&'t str),
    /// Evaluate the `key-label`/`key`/`value-label`/`value` fields one by one.
    Legacy,
    /// Nothing configured; the breach passes through.
    Raw,
}

impl<'t> Resolution<'t> {
    /// Source of the whole-breach template, if one applies.
    pub fn source(&self) -> Option<&'t str> {
        match self {
            Self::PerFormat { source, .. } | Self::Single(source) => Some(source),
            Self::Legacy | Self::Raw => None,
        }
    }

    pub fn is_enhanced(&self) -> bool {
        self.source().is_some()
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::PerFormat { .. } => "enhanced-per-format",
            Self::Single(_) => "enhanced-single",
            Self::Legacy => "legacy-per-field",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for Resolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerFormat { key, .. } => write!(f, "{} ({key})", self.mode()),
            _ => f.write_str(self.mode()),
        }
    }
}

/// Decide which template applies to `format`.
///
/// First match wins: `templates[format]`, `templates["default"]`,
/// `template`, then the legacy fields. Empty sources never match.
pub fn resolve<'t>(template: &'t BreachTemplate, format: &OutputFormat) -> Resolution<'t> {
    let lookup = |key: &str| {
        template
            .templates
            .get_key_value(key)
            .filter(|(_, source)| !source.is_empty())
            .map(|(key, source)| Resolution::PerFormat {
                key: key.as_str(),
                source: source.as_str(),
            })
    };
    if let Some(found) = lookup(format.as_str()).or_else(|| lookup(DEFAULT_FORMAT_KEY)) {
        return found;
    }
    if !template.template.is_empty() {
        return Resolution::Single(&template.template);
    }
    if template.is_configured() {
        Resolution::Legacy
    } else {
        Resolution::Raw
    }
}
