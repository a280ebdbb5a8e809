//! `printf`, `print` and `println`, with a small `fmt`-style verb engine.

use super::{arg_str, Arity, CallContext, Func, FuncError, FuncRegistry, MAX_GENERATED_LEN};
use crate::template::value::format_float;
use crate::template::Value;

pub(super) fn register(reg: &mut FuncRegistry) {
    reg.register(Func::new(
        "printf",
        Arity::AtLeast(1),
        "printf format args...: format with %s %v %d %f %x %q %t verbs",
        printf,
    ));
    reg.register(Func::new(
        "print",
        Arity::AtLeast(0),
        "print args...: concatenate printed args",
        print,
    ));
    reg.register(Func::new(
        "println",
        Arity::AtLeast(0),
        "println args...: space-separated args and a newline",
        println,
    ));
}

fn printf(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let format = arg_str(args, 0)?;
    Ok(sprintf(format, &args[1..]).into())
}

fn print(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(sprint(args).into())
}

fn println(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let mut out = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    out.push('\n');
    Ok(out.into())
}

/// Concatenate printed values, separating two operands with a space when
/// neither is a string.
pub(crate) fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !matches!(arg, Value::Str(_)) && !matches!(args[i - 1], Value::Str(_)) {
            out.push(' ');
        }
        out.push_str(&arg.to_string());
    }
    out
}

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    minus: bool,
    plus: bool,
    zero: bool,
    space: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Format `args` according to `format`.
///
/// Mismatches never fail: a missing operand prints `%!d(MISSING)`, a wrong
/// operand type prints `%!d(string=x)` and leftovers are listed in
/// `%!(EXTRA ...)`.
pub(crate) fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut next_arg = 0;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.minus = true,
                '+' => spec.plus = true,
                '0' => spec.zero = true,
                ' ' => spec.space = true,
                '#' => {}
                _ => break,
            }
            chars.next();
        }
        let Ok(width) = read_number(&mut chars) else {
            out.push_str("%!(NOVERB)");
            break;
        };
        spec.width = width;
        if chars.peek() == Some(&'.') {
            chars.next();
            let Ok(precision) = read_number(&mut chars) else {
                out.push_str("%!(NOVERB)");
                break;
            };
            spec.precision = Some(precision.unwrap_or(0));
        }
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(arg) = args.get(next_arg) else {
            out.push_str(&format!("%!{verb}(MISSING)"));
            continue;
        };
        next_arg += 1;
        let body = match format_verb(verb, &spec, arg) {
            Some(body) => body,
            None => {
                out.push_str(&format!("%!{verb}({}={arg})", arg.kind()));
                continue;
            }
        };
        out.push_str(&apply_width(&body, &spec, verb, arg));
    }

    if next_arg < args.len() {
        let extra = args[next_arg..]
            .iter()
            .map(|a| format!("{}={a}", a.kind()))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("%!(EXTRA {extra})"));
    }
    out
}

/// Width or precision digits. Numbers past [`MAX_GENERATED_LEN`] end the
/// format string.
fn read_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Option<usize>, ()> {
    let mut n: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        let next = n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize);
        if next > MAX_GENERATED_LEN {
            return Err(());
        }
        n = Some(next);
        chars.next();
    }
    Ok(n)
}

fn format_verb(verb: char, spec: &Spec, arg: &Value) -> Option<String> {
    let body = match verb {
        'v' => arg.to_string(),
        's' => {
            let s = arg.to_string();
            match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s,
            }
        }
        'd' => match arg {
            Value::Int(i) => signed(i.to_string(), *i >= 0, spec),
            _ => return None,
        },
        'f' | 'F' => {
            let x = arg.as_float()?;
            signed(format!("{:.*}", spec.precision.unwrap_or(6), x), x >= 0.0, spec)
        }
        'e' | 'E' => {
            let x = arg.as_float()?;
            let s = go_exponent(&format!("{:.*e}", spec.precision.unwrap_or(6), x));
            let s = if verb == 'E' { s.to_uppercase() } else { s };
            signed(s, x >= 0.0, spec)
        }
        'g' | 'G' => {
            let x = arg.as_float()?;
            signed(format_float(x), x >= 0.0, spec)
        }
        'x' | 'X' => {
            let s = match arg {
                Value::Int(i) if *i < 0 => format!("-{:x}", i.unsigned_abs()),
                Value::Int(i) => format!("{i:x}"),
                Value::Str(s) => s.bytes().map(|b| format!("{b:02x}")).collect(),
                _ => return None,
            };
            if verb == 'X' {
                s.to_uppercase()
            } else {
                s
            }
        }
        'q' => match arg {
            Value::Str(s) => format!("{s:?}"),
            Value::Int(i) => format!("{:?}", char::from_u32(u32::try_from(*i).ok()?)?),
            _ => return None,
        },
        't' => match arg {
            Value::Bool(b) => b.to_string(),
            _ => return None,
        },
        'c' => match arg {
            Value::Int(i) => char::from_u32(u32::try_from(*i).ok()?)?.to_string(),
            _ => return None,
        },
        _ => return None,
    };
    Some(body)
}

fn signed(digits: String, non_negative: bool, spec: &Spec) -> String {
    if non_negative && spec.plus {
        format!("+{digits}")
    } else if non_negative && spec.space {
        format!(" {digits}")
    } else {
        digits
    }
}

/// Rust prints `1.5e0`; the reference format is `1.5e+00`.
fn go_exponent(s: &str) -> String {
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => s.to_string(),
    }
}

fn apply_width(body: &str, spec: &Spec, verb: char, arg: &Value) -> String {
    let Some(width) = spec.width else {
        return body.to_string();
    };
    let len = body.chars().count();
    if len >= width {
        return body.to_string();
    }
    let fill = width - len;
    if spec.minus {
        return format!("{body}{}", " ".repeat(fill));
    }
    let numeric = arg.is_numeric() && matches!(verb, 'd' | 'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 'x' | 'X' | 'v');
    if spec.zero && numeric {
        let (sign, digits) = match body.chars().next() {
            Some(c @ ('-' | '+' | ' ')) => (c.to_string(), &body[1..]),
            _ => (String::new(), body),
        };
        return format!("{sign}{}{digits}", "0".repeat(fill));
    }
    format!("{}{body}", " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funcs::testing::call_str;

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_basic_verbs() {
        assert_eq!(sprintf("%s: %d", &[s("count"), Value::Int(5)]), "count: 5");
        assert_eq!(sprintf("%v", &[Value::from(vec!["a", "b"])]), "[a b]");
        assert_eq!(sprintf("%.2f", &[Value::Float(3.14159)]), "3.14");
        assert_eq!(sprintf("%f", &[Value::Int(2)]), "2.000000");
        assert_eq!(sprintf("%x %X", &[Value::Int(255), Value::Int(255)]), "ff FF");
        assert_eq!(sprintf("%q", &[s("hi")]), "\"hi\"");
        assert_eq!(sprintf("%t", &[Value::Bool(true)]), "true");
        assert_eq!(sprintf("100%%", &[]), "100%");
        assert_eq!(sprintf("%e", &[Value::Float(1500.0)]), "1.500000e+03");
    }

    #[test]
    fn test_width_and_flags() {
        assert_eq!(sprintf("%5d|", &[Value::Int(42)]), "   42|");
        assert_eq!(sprintf("%-5s|", &[s("ab")]), "ab   |");
        assert_eq!(sprintf("%05d", &[Value::Int(-42)]), "-0042");
        assert_eq!(sprintf("%+d", &[Value::Int(3)]), "+3");
        assert_eq!(sprintf("%.3s", &[s("abcdef")]), "abc");
    }

    #[test]
    fn test_mismatches_do_not_fail() {
        assert_eq!(sprintf("%d", &[]), "%!d(MISSING)");
        assert_eq!(sprintf("%d", &[s("hello")]), "%!d(string=hello)");
        assert_eq!(sprintf("x", &[Value::Int(1)]), "x%!(EXTRA int=1)");
    }

    #[test]
    fn test_oversized_width_and_precision_end_the_format() {
        assert_eq!(
            sprintf("a%9223372036854775807d", &[Value::Int(1)]),
            "a%!(NOVERB)%!(EXTRA int=1)"
        );
        assert_eq!(
            sprintf("%.9223372036854775807f", &[Value::Float(1.5)]),
            "%!(NOVERB)%!(EXTRA float64=1.5)"
        );
        assert_eq!(sprintf("%1000000d|", &[Value::Int(1)]).len(), 1_000_001);
    }

    #[test]
    fn test_print_functions() {
        assert_eq!(call_str("print", vec![s("a"), s("b")]), "ab");
        assert_eq!(call_str("print", vec![Value::Int(1), Value::Int(2)]), "1 2");
        assert_eq!(call_str("println", vec![s("a"), Value::Int(1)]), "a 1\n");
        assert_eq!(call_str("printf", vec![s("%s-%s"), s("a"), s("b")]), "a-b");
    }
}
