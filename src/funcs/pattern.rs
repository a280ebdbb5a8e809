//! Regular expression helpers. Invalid patterns degrade instead of failing.

use regex::Regex;

use super::{arg_str, Arity, CallContext, Func, FuncError, FuncRegistry};
use crate::template::Value;

pub(super) fn register(reg: &mut FuncRegistry) {
    use Arity::Exact;
    for func in [
        Func::new("regexMatch", Exact(2), "regexMatch pattern s: false on invalid pattern", regex_match),
        Func::new("regexReplace", Exact(3), "regexReplace pattern repl s: $1 refers to groups", regex_replace),
        Func::new("regexFind", Exact(2), "regexFind pattern s: first match or \"\"", regex_find),
    ] {
        reg.register(func);
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!("invalid template regex {pattern:?}: {e}");
            None
        }
    }
}

fn regex_match(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let pattern = arg_str(args, 0)?;
    let s = arg_str(args, 1)?;
    Ok(compile(pattern).is_some_and(|re| re.is_match(s)).into())
}

fn regex_replace(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let pattern = arg_str(args, 0)?;
    let replacement = arg_str(args, 1)?;
    let s = arg_str(args, 2)?;
    Ok(match compile(pattern) {
        Some(re) => re.replace_all(s, replacement).into_owned(),
        None => s.to_string(),
    }
    .into())
}

fn regex_find(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let pattern = arg_str(args, 0)?;
    let s = arg_str(args, 1)?;
    Ok(compile(pattern)
        .and_then(|re| re.find(s).map(|m| m.as_str().to_string()))
        .unwrap_or_default()
        .into())
}
