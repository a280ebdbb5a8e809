//! Dynamic values flowing through template evaluation.

use chrono::{DateTime, FixedOffset};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A value produced or consumed while executing a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Record(Record),
    Time(DateTime<FixedOffset>),
    /// Duration in nanoseconds.
    Duration(i64),
}

/// A fixed-shape value with named fields, such as a breach.
///
/// Unlike maps, asking a record for a field it does not have is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: &'static str,
    pub fields: Vec<(&'static str, Value)>,
}

impl Record {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

impl Value {
    /// Type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float64",
            Self::Str(_) => "string",
            Self::List(_) => "slice",
            Self::Map(_) => "map",
            Self::Record(r) => r.type_name,
            Self::Time(_) => "time",
            Self::Duration(_) => "duration",
        }
    }

    /// Template truthiness: false, zero, nil and empty values are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Map(m) => !m.is_empty(),
            Self::Record(_) | Self::Time(_) => true,
            Self::Duration(d) => *d != 0,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; integral floats are accepted.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Look up a field, as `.Name` does.
    ///
    /// Missing map keys yield nil; missing record fields are an error.
    pub fn field(&self, name: &str) -> Result<Value, String> {
        match self {
            Self::Map(m) => Ok(m.get(name).cloned().unwrap_or(Self::Nil)),
            Self::Record(r) => r
                .get(name)
                .cloned()
                .ok_or_else(|| format!("can't evaluate field {name} in type {}", r.type_name)),
            Self::Nil => Err(format!("nil pointer evaluating <nil>.{name}")),
            other => Err(format!(
                "can't evaluate field {name} in type {}",
                other.kind()
            )),
        }
    }

    /// Text written when the value is the result of an action.
    pub fn to_output(&self) -> String {
        match self {
            Self::Nil => "<no value>".to_string(),
            other => other.to_string(),
        }
    }

    /// Number of elements, characters or entries; zero for scalars.
    pub fn len(&self) -> usize {
        match self {
            Self::Str(s) => s.chars().count(),
            Self::List(l) => l.len(),
            Self::Map(m) => m.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Nil => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Str(_) | Self::List(_) | Self::Map(_) => self.len() == 0,
            Self::Duration(d) => *d == 0,
            Self::Record(_) | Self::Time(_) => false,
        }
    }

    /// Ordering used by `lt`, `le`, `gt` and `ge`.
    ///
    /// Numbers compare numerically, strings lexically; any other pairing
    /// falls back to comparing the printed forms.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let (x, y) = (a.as_float().unwrap_or(0.0), b.as_float().unwrap_or(0.0));
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Duration(a), Self::Duration(b)) => a.cmp(b),
            (a, b) => a.to_string().cmp(&b.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("<nil>"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(m) => {
                f.write_str("map[")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("]")
            }
            Self::Record(r) => {
                f.write_str("{")?;
                for (i, (_, v)) in r.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
            Self::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f %:z")),
            Self::Duration(ns) => f.write_str(&format_duration(*ns)),
        }
    }
}

/// Format a float the way `%v` does: shortest form, exponent outside
/// `[1e-4, 1e21)`.
pub(crate) fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let abs = x.abs();
    if abs != 0.0 && !(1e-4..1e21).contains(&abs) {
        let s = format!("{x:e}");
        if let Some((mantissa, exp)) = s.split_once('e') {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            return format!("{mantissa}e{sign}{:02}", exp.abs());
        }
        return s;
    }
    format!("{x}")
}

/// Format nanoseconds as `1h2m3.5s`, `250ms`, `0s`.
pub(crate) fn format_duration(ns: i64) -> String {
    const SECOND: u64 = 1_000_000_000;
    const MINUTE: u64 = 60 * SECOND;
    const HOUR: u64 = 60 * MINUTE;

    if ns == 0 {
        return "0s".to_string();
    }
    let u = ns.unsigned_abs();
    let mut out = String::new();
    if ns < 0 {
        out.push('-');
    }
    if u < SECOND {
        let (unit, div) = if u < 1_000 {
            ("ns", 1)
        } else if u < 1_000_000 {
            ("µs", 1_000)
        } else {
            ("ms", 1_000_000)
        };
        out.push_str(&fraction(u, div));
        out.push_str(unit);
        return out;
    }
    let hours = u / HOUR;
    let minutes = (u % HOUR) / MINUTE;
    let seconds = u % MINUTE;
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&fraction(seconds, SECOND));
    out.push('s');
    out
}

fn fraction(value: u64, div: u64) -> String {
    let whole = value / div;
    let rem = value % div;
    if rem == 0 {
        return whole.to_string();
    }
    let width = div.to_string().len() - 1;
    let digits = format!("{rem:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Nil,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(0.0)),
            },
            JsonValue::String(s) => Self::Str(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        Self::from(json.clone())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Self::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Self::Record(r)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Record(Record::new("T")).is_truthy());
    }

    #[test]
    fn test_display_matches_template_printing() {
        assert_eq!(Value::from(vec!["a", "b", "c"]).to_string(), "[a b c]");
        assert_eq!(Value::from(json!({"b": 2, "a": 1})).to_string(), "map[a:1 b:2]");
        assert_eq!(Value::Nil.to_string(), "<nil>");
        assert_eq!(Value::Nil.to_output(), "<no value>");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Float(100.0).to_string(), "100");
    }

    #[test]
    fn test_float_exponent_form() {
        assert_eq!(format_float(1e21), "1e+21");
        assert_eq!(format_float(1.5e-5), "1.5e-05");
        assert_eq!(format_float(0.0), "0");
    }

    #[test]
    fn test_duration_format() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(1_500_000_000), "1.5s");
        assert_eq!(format_duration(250_000_000), "250ms");
        assert_eq!(format_duration(3_723_000_000_000), "1h2m3s");
        assert_eq!(format_duration(3_600_000_000_000), "1h0m0s");
        assert_eq!(format_duration(90_000_000_000), "1m30s");
        assert_eq!(format_duration(-2_000), "-2µs");
    }

    #[test]
    fn test_field_access() {
        let map = Value::from(json!({"team": "security"}));
        assert_eq!(map.field("team").unwrap(), Value::from("security"));
        assert_eq!(map.field("missing").unwrap(), Value::Nil);

        let record = Value::Record(Record::new("ValueBreach").field("Value", "x"));
        assert_eq!(record.field("Value").unwrap(), Value::from("x"));
        let err = record.field("Values").unwrap_err();
        assert!(err.contains("can't evaluate field Values in type ValueBreach"));

        assert!(Value::Nil.field("Value").is_err());
        assert!(Value::from("s").field("Value").is_err());
    }

    #[test]
    fn test_compare_mixed_types() {
        assert_eq!(Value::Int(5).compare(&Value::Int(3)), Ordering::Greater);
        assert_eq!(Value::Int(5).compare(&Value::Float(5.0)), Ordering::Equal);
        assert_eq!(Value::from("apple").compare(&Value::from("banana")), Ordering::Less);
        assert_eq!(Value::Int(5).compare(&Value::from("5")), Ordering::Equal);
        assert_eq!(Value::from("hello").compare(&Value::Int(123)), Ordering::Greater);
        assert_eq!(Value::Bool(true).compare(&Value::Bool(false)), Ordering::Greater);
        assert_eq!(Value::Nil.compare(&Value::Nil), Ordering::Equal);
        assert_eq!(Value::Nil.compare(&Value::from("something")), Ordering::Less);
    }

    #[test]
    fn test_json_numbers() {
        assert_eq!(Value::from(json!(30)), Value::Int(30));
        assert_eq!(Value::from(json!(2.5)), Value::Float(2.5));
    }
}
