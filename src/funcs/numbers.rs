//! Integer arithmetic and human-friendly number formatting.

use super::{arg_int, Arity, CallContext, Func, FuncError, FuncRegistry};
use crate::template::Value;

const BYTE_UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];
const COUNT_SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

pub(super) fn register(reg: &mut FuncRegistry) {
    use Arity::Exact;
    for func in [
        Func::new("humanize", Exact(1), "humanize v: 1.5K for numbers, Title Words for identifiers", humanize),
        Func::new("bytes", Exact(1), "bytes n: binary size such as 1.5 MB", bytes),
        Func::new("add", Exact(2), "add a b", add),
        Func::new("sub", Exact(2), "sub a b", sub),
        Func::new("mul", Exact(2), "mul a b", mul),
        Func::new("div", Exact(2), "div a b: integer division, 0 when b is 0", div),
        Func::new("mod", Exact(2), "mod a b: remainder, 0 when b is 0", modulo),
        Func::new("max", Exact(2), "max a b", max),
        Func::new("min", Exact(2), "min a b", min),
    ] {
        reg.register(func);
    }
}

fn humanize(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let out = match &args[0] {
        Value::Int(n) => humanize_number(*n as f64),
        Value::Float(x) => humanize_number(*x),
        Value::Str(s) => humanize_words(s),
        other => other.to_string(),
    };
    Ok(out.into())
}

/// `999`, `1K`, `1.5K`, `2M`, `1B`, `1T`.
pub(crate) fn humanize_number(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let mut scaled = value.abs();
    let mut idx = 0;
    while scaled >= 1000.0 && idx < COUNT_SUFFIXES.len() - 1 {
        scaled /= 1000.0;
        idx += 1;
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let suffix = COUNT_SUFFIXES[idx];
    if scaled.fract() == 0.0 {
        format!("{sign}{scaled:.0}{suffix}")
    } else {
        format!("{sign}{scaled:.1}{suffix}")
    }
}

/// `snake_case` and `kebab-case` to `Title Case`.
pub(crate) fn humanize_words(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn bytes(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(humanize_bytes(arg_int(args, 0)?).into())
}

/// 1024-based size with one decimal, e.g. `1.0 KB`; below 1 KB stays in bytes.
pub(crate) fn humanize_bytes(size: i64) -> String {
    const UNIT: u64 = 1024;
    let abs = size.unsigned_abs();
    if abs < UNIT {
        return format!("{size} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = abs / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let sign = if size < 0 { "-" } else { "" };
    format!("{sign}{:.1} {}", abs as f64 / div as f64, BYTE_UNITS[exp + 1])
}

fn add(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_int(args, 0)?.wrapping_add(arg_int(args, 1)?).into())
}

fn sub(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_int(args, 0)?.wrapping_sub(arg_int(args, 1)?).into())
}

fn mul(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_int(args, 0)?.wrapping_mul(arg_int(args, 1)?).into())
}

fn div(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let (a, b) = (arg_int(args, 0)?, arg_int(args, 1)?);
    Ok(if b == 0 { 0 } else { a.wrapping_div(b) }.into())
}

fn modulo(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let (a, b) = (arg_int(args, 0)?, arg_int(args, 1)?);
    Ok(if b == 0 { 0 } else { a.wrapping_rem(b) }.into())
}

fn max(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_int(args, 0)?.max(arg_int(args, 1)?).into())
}

fn min(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_int(args, 0)?.min(arg_int(args, 1)?).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funcs::testing::{call, call_str};

    #[test]
    fn test_humanize_thresholds() {
        let h = |n: i64| call_str("humanize", vec![Value::Int(n)]);
        assert_eq!(h(500), "500");
        assert_eq!(h(999), "999");
        assert_eq!(h(1000), "1K");
        assert_eq!(h(1500), "1.5K");
        assert_eq!(h(1_000_000), "1M");
        assert_eq!(h(2_500_000), "2.5M");
        assert_eq!(h(1_000_000_000), "1B");
        assert_eq!(h(1_000_000_000_000), "1T");
        assert_eq!(h(-1500), "-1.5K");
        assert_eq!(h(0), "0");
    }

    #[test]
    fn test_humanize_other_types() {
        assert_eq!(call_str("humanize", vec![Value::from("test_string")]), "Test String");
        assert_eq!(call_str("humanize", vec![Value::from("kebab-case-NAME")]), "Kebab Case Name");
        assert_eq!(call_str("humanize", vec![Value::Float(2.5)]), "2.5");
        assert_eq!(call_str("humanize", vec![Value::Bool(true)]), "true");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(humanize_bytes(500), "500 B");
        assert_eq!(humanize_bytes(1024), "1.0 KB");
        assert_eq!(humanize_bytes(1536), "1.5 KB");
        assert_eq!(humanize_bytes(1_048_576), "1.0 MB");
        assert_eq!(humanize_bytes(1_073_741_824), "1.0 GB");
        assert_eq!(humanize_bytes(-2048), "-2.0 KB");
        assert_eq!(humanize_bytes(i64::MAX), "8.0 EB");
    }

    #[test]
    fn test_arithmetic() {
        let c = |name, a, b| call(name, vec![Value::Int(a), Value::Int(b)]).unwrap();
        assert_eq!(c("add", 2, 3), Value::Int(5));
        assert_eq!(c("sub", 2, 3), Value::Int(-1));
        assert_eq!(c("mul", 4, 3), Value::Int(12));
        assert_eq!(c("div", 10, 3), Value::Int(3));
        assert_eq!(c("mod", 10, 3), Value::Int(1));
        assert_eq!(c("max", 10, 3), Value::Int(10));
        assert_eq!(c("min", 10, 3), Value::Int(3));
    }

    #[test]
    fn test_zero_divisor() {
        let c = |name, a, b| call(name, vec![Value::Int(a), Value::Int(b)]).unwrap();
        assert_eq!(c("div", 10, 0), Value::Int(0));
        assert_eq!(c("mod", 10, 0), Value::Int(0));
        assert_eq!(c("div", i64::MIN, -1), Value::Int(i64::MIN));
    }

    #[test]
    fn test_integral_floats_accepted() {
        assert_eq!(
            call("add", vec![Value::Float(2.0), Value::Int(1)]).unwrap(),
            Value::Int(3)
        );
        assert!(call("add", vec![Value::Float(2.5), Value::Int(1)]).is_err());
    }
}
