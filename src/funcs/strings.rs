//! String manipulation, truncation, padding and escaping.

use unicode_width::UnicodeWidthStr;

use super::{arg_int, arg_str, arg_usize, bounded, Arity, CallContext, Func, FuncError, FuncRegistry};
use crate::funcs::printf::sprint;
use crate::template::Value;

pub(super) fn register(reg: &mut FuncRegistry) {
    use Arity::Exact;
    for func in [
        Func::new("join", Exact(2), "join sep list: join elements with sep", join),
        Func::new("split", Exact(2), "split s sep: split s around sep", split),
        Func::new("replace", Exact(3), "replace s old new: replace every occurrence", replace),
        Func::new("trim", Exact(1), "trim s: strip surrounding whitespace", trim),
        Func::new("trimLeft", Exact(2), "trimLeft s cutset: strip leading cutset chars", trim_left),
        Func::new("trimRight", Exact(2), "trimRight s cutset: strip trailing cutset chars", trim_right),
        Func::new("upper", Exact(1), "upper s: upper-case", upper),
        Func::new("lower", Exact(1), "lower s: lower-case", lower),
        Func::new("title", Exact(1), "title s: capitalise each word", title),
        Func::new("repeat", Exact(2), "repeat s n: repeat s n times", repeat),
        Func::new("contains", Exact(2), "contains s substr", contains),
        Func::new("hasPrefix", Exact(2), "hasPrefix s prefix", has_prefix),
        Func::new("hasSuffix", Exact(2), "hasSuffix s suffix", has_suffix),
        Func::new("truncate", Exact(2), "truncate n s: shorten to n chars with \"...\"", truncate),
        Func::new("ellipsis", Exact(2), "ellipsis n s: first n chars followed by \"…\"", ellipsis),
        Func::new("pad", Exact(2), "pad width s: left-align to width", pad),
        Func::new("padLeft", Exact(2), "padLeft width s: right-align to width", pad_left),
        Func::new("pluralize", Exact(3), "pluralize n singular plural", pluralize),
        Func::new("html", Arity::AtLeast(1), "html args...: HTML-escape the printed args", html),
        Func::new("urlquery", Arity::AtLeast(1), "urlquery args...: query-escape the printed args", urlquery),
    ] {
        reg.register(func);
    }
}

fn join(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let sep = arg_str(args, 0)?;
    let joined = match &args[1] {
        Value::Nil => String::new(),
        Value::List(items) => items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(sep),
        other => other.to_string(),
    };
    Ok(joined.into())
}

fn split(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let s = arg_str(args, 0)?;
    let sep = arg_str(args, 1)?;
    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::Str(c.to_string())).collect()
    } else {
        s.split(sep).map(Value::from).collect()
    };
    Ok(Value::List(parts))
}

fn replace(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let s = arg_str(args, 0)?;
    let old = arg_str(args, 1)?;
    let new = arg_str(args, 2)?;
    if old.is_empty() {
        return Ok(s.into());
    }
    Ok(s.replace(old, new).into())
}

fn trim(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_str(args, 0)?.trim().into())
}

fn trim_left(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let s = arg_str(args, 0)?;
    let cutset = arg_str(args, 1)?;
    Ok(s.trim_start_matches(|c| cutset.contains(c)).into())
}

fn trim_right(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let s = arg_str(args, 0)?;
    let cutset = arg_str(args, 1)?;
    Ok(s.trim_end_matches(|c| cutset.contains(c)).into())
}

fn upper(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_str(args, 0)?.to_uppercase().into())
}

fn lower(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_str(args, 0)?.to_lowercase().into())
}

fn title(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(title_case(arg_str(args, 0)?).into())
}

/// Upper-case the first letter of every word, leaving the rest untouched.
pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_' || c == '\'');
    }
    out
}

fn repeat(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let s = arg_str(args, 0)?;
    let n = arg_usize(args, 1)?;
    let len = s.len().checked_mul(n).unwrap_or(usize::MAX);
    bounded(len, "repeat length")?;
    Ok(s.repeat(n).into())
}

fn contains(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_str(args, 0)?.contains(arg_str(args, 1)?).into())
}

fn has_prefix(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_str(args, 0)?.starts_with(arg_str(args, 1)?).into())
}

fn has_suffix(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(arg_str(args, 0)?.ends_with(arg_str(args, 1)?).into())
}

fn truncate(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let n = arg_int(args, 0)?;
    let s = arg_str(args, 1)?;
    Ok(truncate_str(s, n).into())
}

/// `s` if it fits in `n` characters; otherwise its first `n - 3` characters
/// plus `...` (or just the first `n` when `n <= 3`).
pub(crate) fn truncate_str(s: &str, n: i64) -> String {
    let n = usize::try_from(n).unwrap_or(0);
    if s.chars().count() <= n {
        return s.to_string();
    }
    if n <= 3 {
        return s.chars().take(n).collect();
    }
    let mut out: String = s.chars().take(n - 3).collect();
    out.push_str("...");
    out
}

fn ellipsis(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let n = arg_usize(args, 0)?;
    let s = arg_str(args, 1)?;
    if s.chars().count() <= n {
        return Ok(s.into());
    }
    let mut out: String = s.chars().take(n).collect();
    out.push('…');
    Ok(out.into())
}

fn pad(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let width = bounded(arg_usize(args, 0)?, "pad width")?;
    let s = arg_str(args, 1)?;
    let fill = width.saturating_sub(s.width());
    Ok(format!("{s}{}", " ".repeat(fill)).into())
}

fn pad_left(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let width = bounded(arg_usize(args, 0)?, "pad width")?;
    let s = arg_str(args, 1)?;
    let fill = width.saturating_sub(s.width());
    Ok(format!("{}{s}", " ".repeat(fill)).into())
}

fn pluralize(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let count = arg_int(args, 0)?;
    let singular = arg_str(args, 1)?;
    let plural = arg_str(args, 2)?;
    Ok(if count == 1 { singular } else { plural }.into())
}

fn html(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let text = sprint(args);
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '\0' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    Ok(out.into())
}

fn urlquery(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let text = sprint(args);
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b));
            }
            b' ' => out.push('+'),
            b => out.push_str(&format!("%{b:02X}")),
        }
    }
    Ok(out.into())
}
