//! Output format tags.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Rendering target. Selects the matching `templates` entry and is exposed to
/// templates as `.OutputFormat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Pretty,
    /// Tabular terminal output
    Table,
    /// Structured JSON
    Json,
    /// JUnit XML for CI systems
    Junit,
    /// Any other writer-defined tag
    Custom(String),
}

impl OutputFormat {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pretty => "pretty",
            Self::Table => "table",
            Self::Json => "json",
            Self::Junit => "junit",
            Self::Custom(tag) => tag,
        }
    }

    /// The four formats every writer understands.
    pub fn standard() -> [OutputFormat; 4] {
        [Self::Pretty, Self::Table, Self::Json, Self::Junit]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s {
            "pretty" => Self::Pretty,
            "table" => Self::Table,
            "json" => Self::Json,
            "junit" => Self::Junit,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for OutputFormat {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from("markdown"),
            OutputFormat::Custom("markdown".to_string())
        );
        assert_eq!(OutputFormat::Junit.to_string(), "junit");
        assert_eq!(OutputFormat::default().as_str(), "pretty");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&OutputFormat::Table).unwrap();
        assert_eq!(json, "\"table\"");
        let back: OutputFormat = serde_json::from_str("\"sarif\"").unwrap();
        assert_eq!(back, OutputFormat::Custom("sarif".into()));
    }
}
