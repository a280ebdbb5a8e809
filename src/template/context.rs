//! The data a template is executed against.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use super::value::{Record, Value};
use crate::model::{Breach, Severity};
use crate::render::OutputFormat;

/// Per-evaluation context, built once per render call.
///
/// Templates see it as the root value: `.Breach`, `.OutputFormat`,
/// `.Severity`, `.CheckName`, `.CheckType` and `.Context`.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext<'a> {
    /// The original, unrendered breach.
    pub breach: Option<&'a Breach>,
    pub output_format: OutputFormat,
    pub severity: Severity,
    pub check_name: String,
    pub check_type: String,
    /// Pass-through data from the template configuration.
    pub context: Option<&'a BTreeMap<String, JsonValue>>,
}

impl<'a> TemplateContext<'a> {
    /// Context for `breach`, copying its metadata for convenience.
    pub fn new(breach: &'a Breach, output_format: OutputFormat) -> Self {
        Self {
            breach: Some(breach),
            output_format,
            severity: breach.severity(),
            check_name: breach.check_name().to_string(),
            check_type: breach.check_type().to_string(),
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: &'a BTreeMap<String, JsonValue>) -> Self {
        self.context = Some(context);
        self
    }

    /// The root value seen by templates.
    pub fn to_value(&self) -> Value {
        let context = self
            .context
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect::<BTreeMap<_, _>>()
            })
            .unwrap_or_default();
        Record::new("TemplateContext")
            .field("Breach", self.breach.map(breach_value))
            .field("OutputFormat", self.output_format.as_str())
            .field("Severity", self.severity.as_str())
            .field("CheckName", self.check_name.as_str())
            .field("CheckType", self.check_type.as_str())
            .field("Context", Value::Map(context))
            .into()
    }
}

/// Expose a breach with the field names rule authors use.
///
/// Only the fields of the breach's own variant exist; asking a value breach
/// for `.Values` is an execution error.
pub(crate) fn breach_value(breach: &Breach) -> Value {
    let meta = breach.meta();
    let remediation = Record::new("RemediationResult")
        .field("Status", meta.remediation.status.as_str())
        .field("Messages", meta.remediation.messages.clone());
    let record = Record::new(breach.breach_type().type_name())
        .field("BreachType", breach.breach_type().as_str())
        .field("CheckType", meta.check_type.as_str())
        .field("CheckName", meta.check_name.as_str())
        .field("Severity", meta.severity.as_str());
    let record = match breach {
        Breach::Value(b) => record
            .field("ValueLabel", b.value_label.as_str())
            .field("Value", b.value.as_str()),
        Breach::KeyValue(b) => record
            .field("KeyLabel", b.key_label.as_str())
            .field("Key", b.key.as_str())
            .field("ValueLabel", b.value_label.as_str())
            .field("Value", b.value.as_str())
            .field("ExpectedValue", b.expected_value.clone().unwrap_or_default()),
        Breach::KeyValues(b) => record
            .field("KeyLabel", b.key_label.as_str())
            .field("Key", b.key.as_str())
            .field("ValueLabel", b.value_label.as_str())
            .field("Values", b.values.clone()),
    };
    record.field("RemediationResult", remediation).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KeyValuesBreach, ValueBreach};
    use serde_json::json;

    #[test]
    fn test_root_fields() {
        let breach: Breach = ValueBreach::new("fail b").into();
        let breach = breach.with_common_values("file", "config-check", Severity::High);
        let ctx = TemplateContext::new(&breach, OutputFormat::Json);
        let root = ctx.to_value();

        assert_eq!(root.field("OutputFormat").unwrap(), Value::from("json"));
        assert_eq!(root.field("Severity").unwrap(), Value::from("high"));
        assert_eq!(root.field("CheckName").unwrap(), Value::from("config-check"));
        assert_eq!(root.field("Context").unwrap(), Value::Map(BTreeMap::new()));

        let b = root.field("Breach").unwrap();
        assert_eq!(b.field("Value").unwrap(), Value::from("fail b"));
        assert_eq!(b.field("BreachType").unwrap(), Value::from("value"));
        assert!(b.field("Values").is_err());
    }

    #[test]
    fn test_context_map_is_exposed() {
        let breach: Breach = KeyValuesBreach::new("modules", ["a", "b"]).into();
        let extra = BTreeMap::from([("team".to_string(), json!("security"))]);
        let root = TemplateContext::new(&breach, OutputFormat::Pretty)
            .with_context(&extra)
            .to_value();
        let ctx = root.field("Context").unwrap();
        assert_eq!(ctx.field("team").unwrap(), Value::from("security"));
        let values = root.field("Breach").unwrap().field("Values").unwrap();
        assert_eq!(values, Value::from(vec!["a", "b"]));
    }

    #[test]
    fn test_default_context_has_nil_breach() {
        let ctx = TemplateContext {
            check_name: "security-check".into(),
            ..Default::default()
        };
        let root = ctx.to_value();
        assert_eq!(root.field("Breach").unwrap(), Value::Nil);
        assert_eq!(root.field("Severity").unwrap(), Value::from("normal"));
    }
}
