//! Breach variants and their shared metadata.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::remediation::{RemediationResult, RemediationStatus, RemediatorHandle};

/// Severity of a breach.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    #[serde(alias = "medium")]
    Normal,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parse a severity, case-insensitively. Returns None for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "normal" | "medium" => Some(Self::Normal),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("unknown severity '{s}' (expected low, normal, high or critical)")
        })
    }
}

/// Discriminator naming the breach shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BreachType {
    Value,
    KeyValue,
    KeyValues,
}

impl BreachType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::KeyValue => "key-value",
            Self::KeyValues => "key-values",
        }
    }

    /// Name used when the breach is exposed to templates.
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Value => "ValueBreach",
            Self::KeyValue => "KeyValueBreach",
            Self::KeyValues => "KeyValuesBreach",
        }
    }
}

impl fmt::Display for BreachType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BreachType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(Self::Value),
            "key-value" => Ok(Self::KeyValue),
            "key-values" => Ok(Self::KeyValues),
            other => Err(format!("unknown breach type '{other}'")),
        }
    }
}

/// Metadata common to every breach shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BreachMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub check_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub check_name: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "remediation_is_unset")]
    pub remediation: RemediationResult,
    #[serde(skip)]
    pub remediator: Option<RemediatorHandle>,
}

fn remediation_is_unset(result: &RemediationResult) -> bool {
    !result.is_set() && result.messages.is_empty()
}

/// A single offending value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValueBreach {
    #[serde(flatten)]
    pub meta: BreachMeta,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_label: String,
    #[serde(default)]
    pub value: String,
}

impl ValueBreach {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.value_label = label.into();
        self
    }
}

/// An offending value found at a key or location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KeyValueBreach {
    #[serde(flatten)]
    pub meta: BreachMeta,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_label: String,
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_label: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
}

impl KeyValueBreach {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_labels(mut self, key_label: impl Into<String>, value_label: impl Into<String>) -> Self {
        self.key_label = key_label.into();
        self.value_label = value_label.into();
        self
    }

    #[must_use]
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected_value = Some(expected.into());
        self
    }
}

/// Several offending values found at one key or location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KeyValuesBreach {
    #[serde(flatten)]
    pub meta: BreachMeta,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_label: String,
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_label: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl KeyValuesBreach {
    pub fn new<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_labels(mut self, key_label: impl Into<String>, value_label: impl Into<String>) -> Self {
        self.key_label = key_label.into();
        self.value_label = value_label.into();
        self
    }
}

/// A single finding produced by a rule evaluator.
///
/// The variant is the breach type; [`Breach::breach_type`] is derived from it
/// so the tag can never disagree with the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "breach-type", rename_all = "kebab-case")]
pub enum Breach {
    Value(ValueBreach),
    KeyValue(KeyValueBreach),
    KeyValues(KeyValuesBreach),
}

impl Breach {
    pub fn breach_type(&self) -> BreachType {
        match self {
            Self::Value(_) => BreachType::Value,
            Self::KeyValue(_) => BreachType::KeyValue,
            Self::KeyValues(_) => BreachType::KeyValues,
        }
    }

    pub fn meta(&self) -> &BreachMeta {
        match self {
            Self::Value(b) => &b.meta,
            Self::KeyValue(b) => &b.meta,
            Self::KeyValues(b) => &b.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut BreachMeta {
        match self {
            Self::Value(b) => &mut b.meta,
            Self::KeyValue(b) => &mut b.meta,
            Self::KeyValues(b) => &mut b.meta,
        }
    }

    pub fn check_name(&self) -> &str {
        &self.meta().check_name
    }

    pub fn check_type(&self) -> &str {
        &self.meta().check_type
    }

    pub fn severity(&self) -> Severity {
        self.meta().severity
    }

    pub fn remediation(&self) -> &RemediationResult {
        &self.meta().remediation
    }

    pub fn remediator(&self) -> Option<&RemediatorHandle> {
        self.meta().remediator.as_ref()
    }

    /// Set the metadata an analyser stamps on every breach it produces.
    pub fn set_common_values(
        &mut self,
        check_type: impl Into<String>,
        check_name: impl Into<String>,
        severity: Severity,
    ) {
        let meta = self.meta_mut();
        meta.check_type = check_type.into();
        meta.check_name = check_name.into();
        meta.severity = severity;
    }

    #[must_use]
    pub fn with_common_values(
        mut self,
        check_type: impl Into<String>,
        check_name: impl Into<String>,
        severity: Severity,
    ) -> Self {
        self.set_common_values(check_type, check_name, severity);
        self
    }

    pub fn set_remediator(&mut self, remediator: Option<RemediatorHandle>) {
        self.meta_mut().remediator = remediator;
    }

    /// Record a remediation outcome, appending the message if non-empty.
    pub fn set_remediation(&mut self, status: RemediationStatus, message: impl Into<String>) {
        let message = message.into();
        let result = &mut self.meta_mut().remediation;
        result.status = status;
        if !message.is_empty() {
            result.messages.push(message);
        }
    }

    /// Run the attached remediator, or record that none is available.
    pub fn perform_remediation(&mut self) {
        let Some(remediator) = self.remediator().cloned() else {
            self.set_remediation(RemediationStatus::NoSupport, "");
            return;
        };
        let outcome = remediator.remediate(self);
        let result = &mut self.meta_mut().remediation;
        result.status = outcome.status;
        result.messages.extend(outcome.messages);
    }

    pub fn value_label(&self) -> &str {
        match self {
            Self::Value(b) => &b.value_label,
            Self::KeyValue(b) => &b.value_label,
            Self::KeyValues(b) => &b.value_label,
        }
    }

    /// Key of the breach; value breaches have none.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Value(_) => None,
            Self::KeyValue(b) => Some(&b.key),
            Self::KeyValues(b) => Some(&b.key),
        }
    }

    pub fn key_label(&self) -> Option<&str> {
        match self {
            Self::Value(_) => None,
            Self::KeyValue(b) => Some(&b.key_label),
            Self::KeyValues(b) => Some(&b.key_label),
        }
    }
}

impl From<ValueBreach> for Breach {
    fn from(b: ValueBreach) -> Self {
        Self::Value(b)
    }
}

impl From<KeyValueBreach> for Breach {
    fn from(b: KeyValueBreach) -> Self {
        Self::KeyValue(b)
    }
}

impl From<KeyValuesBreach> for Breach {
    fn from(b: KeyValuesBreach) -> Self {
        Self::KeyValues(b)
    }
}

impl fmt::Display for ValueBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value_label.is_empty() {
            f.write_str(&self.value)
        } else {
            write!(f, "[{}] {}", self.value_label, self.value)
        }
    }
}

impl fmt::Display for KeyValueBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] ", self.key_label, self.key)?;
        if !self.value_label.is_empty() {
            write!(f, "{}: ", self.value_label)?;
        }
        f.write_str(&self.value)
    }
}

impl fmt::Display for KeyValuesBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] ", self.key_label, self.key)?;
        if !self.value_label.is_empty() {
            write!(f, "{}: ", self.value_label)?;
        }
        write!(f, "[{}]", self.values.join(", "))
    }
}

impl fmt::Display for Breach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(b) => b.fmt(f),
            Self::KeyValue(b) => b.fmt(f),
            Self::KeyValues(b) => b.fmt(f),
        }
    }
}
