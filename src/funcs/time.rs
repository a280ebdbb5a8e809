//! Clock access and time formatting.
//!
//! `date` takes reference-time layouts (`2006-01-02 15:04:05`), which rule
//! authors already use in existing configuration.

use chrono::{DateTime, FixedOffset, Local};

use super::{arg_str, Arity, CallContext, Func, FuncError, FuncRegistry};
use crate::template::value::format_duration;
use crate::template::Value;

pub(super) fn register(reg: &mut FuncRegistry) {
    use Arity::Exact;
    for func in [
        Func::new("now", Exact(0), "now: current local time", now),
        Func::new("date", Exact(2), "date layout t: format a time with a 2006-01-02 layout", date),
        Func::new("duration", Exact(1), "duration ns: 1h2m3s style", duration),
    ] {
        reg.register(func);
    }
}

fn now(_: &CallContext<'_>, _: &[Value]) -> Result<Value, FuncError> {
    Ok(Value::Time(Local::now().fixed_offset()))
}

fn date(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let layout = arg_str(args, 0)?;
    let time = match &args[1] {
        Value::Time(t) => Some(*t),
        Value::Str(s) => DateTime::parse_from_rfc3339(s).ok(),
        Value::Int(secs) => DateTime::from_timestamp(*secs, 0).map(|t| t.fixed_offset()),
        _ => None,
    };
    Ok(time.map(|t| format_layout(&t, layout)).unwrap_or_default().into())
}

fn duration(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    match &args[0] {
        Value::Duration(ns) | Value::Int(ns) => Ok(format_duration(*ns).into()),
        other => Err(FuncError::Type {
            position: 1,
            expected: "duration",
            got: other.kind(),
        }),
    }
}

/// Layout chunks and their chrono equivalents, longest first within each
/// leading character.
const CHUNKS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Jan", "%b"),
    ("Monday", "%A"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("2006", "%Y"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("15", "%H"),
    ("_2", "%e"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("-07", "%:::z"),
    ("Z07:00", "Z%:z"),
    ("Z0700", "Z%z"),
];

/// Format `t` with a reference-time layout.
pub(crate) fn format_layout(t: &DateTime<FixedOffset>, layout: &str) -> String {
    let mut out = String::new();
    let mut rest = layout;
    'outer: while !rest.is_empty() {
        if let Some(len) = fraction_len(rest) {
            out.push_str(&fraction(t, &rest[..len]));
            rest = &rest[len..];
            continue;
        }
        for (chunk, spec) in CHUNKS {
            if let Some(tail) = rest.strip_prefix(chunk) {
                out.push_str(&format_chunk(t, spec));
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn format_chunk(t: &DateTime<FixedOffset>, spec: &str) -> String {
    match spec.strip_prefix('Z') {
        Some(_) if t.offset().local_minus_utc() == 0 => "Z".to_string(),
        Some(offset_spec) => t.format(offset_spec).to_string(),
        None => t.format(spec).to_string(),
    }
}

/// Length of a `.000`/`.999` fractional-second chunk at the start of `s`.
fn fraction_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'.') && bytes.first() != Some(&b',') {
        return None;
    }
    let digit = *bytes.get(1)?;
    if digit != b'0' && digit != b'9' {
        return None;
    }
    let run = bytes[1..].iter().take_while(|b| **b == digit).count();
    if bytes.get(1 + run).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    Some(1 + run)
}

fn fraction(t: &DateTime<FixedOffset>, chunk: &str) -> String {
    let digits = chunk.len() - 1;
    let nanos = format!("{:09}", t.timestamp_subsec_nanos());
    let mut frac: String = nanos.chars().take(digits.min(9)).collect();
    let separator = &chunk[..1];
    if chunk.as_bytes()[1] == b'9' {
        frac = frac.trim_end_matches('0').to_string();
        if frac.is_empty() {
            return String::new();
        }
    }
    format!("{separator}{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funcs::testing::{call, call_str};

    fn sample() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-05T14:07:09.123+00:00").unwrap()
    }

    #[test]
    fn test_common_layouts() {
        let t = sample();
        assert_eq!(format_layout(&t, "2006-01-02"), "2024-03-05");
        assert_eq!(format_layout(&t, "2006-01-02 15:04:05"), "2024-03-05 14:07:09");
        assert_eq!(format_layout(&t, "Jan 2, 2006"), "Mar 5, 2024");
        assert_eq!(format_layout(&t, "Monday 3:04PM"), "Tuesday 2:07PM");
        assert_eq!(format_layout(&t, "15:04:05.000"), "14:07:09.123");
        assert_eq!(format_layout(&t, "2006-01-02T15:04:05Z07:00"), "2024-03-05T14:07:09Z");
    }

    #[test]
    fn test_offsets() {
        let t = DateTime::parse_from_rfc3339("2024-03-05T14:07:09+05:30").unwrap();
        assert_eq!(format_layout(&t, "Z07:00"), "+05:30");
        assert_eq!(format_layout(&t, "-0700"), "+0530");
    }

    #[test]
    fn test_date_inputs() {
        let layout = Value::from("2006-01-02");
        assert_eq!(call_str("date", vec![layout.clone(), Value::Time(sample())]), "2024-03-05");
        assert_eq!(
            call_str("date", vec![layout.clone(), Value::from("2024-01-15T10:30:00Z")]),
            "2024-01-15"
        );
        assert_eq!(call_str("date", vec![layout.clone(), Value::Int(0)]), "1970-01-01");
        assert_eq!(call_str("date", vec![layout, Value::from("not a time")]), "");
    }

    #[test]
    fn test_now_is_a_time() {
        assert!(matches!(call("now", vec![]).unwrap(), Value::Time(_)));
    }

    #[test]
    fn test_duration() {
        assert_eq!(call_str("duration", vec![Value::Int(1_500_000_000)]), "1.5s");
        assert_eq!(call_str("duration", vec![Value::Duration(3_723_000_000_000)]), "1h2m3s");
        assert!(call("duration", vec![Value::from("1s")]).is_err());
    }
}
