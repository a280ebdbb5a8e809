//! ANSI terminal styling.

use super::{arg_str, Arity, CallContext, Func, FuncError, FuncRegistry};
use crate::template::Value;

const RESET: &str = "\x1b[0m";

const COLORS: &[(&str, &str)] = &[
    ("black", "\x1b[30m"),
    ("red", "\x1b[31m"),
    ("green", "\x1b[32m"),
    ("yellow", "\x1b[33m"),
    ("blue", "\x1b[34m"),
    ("magenta", "\x1b[35m"),
    ("cyan", "\x1b[36m"),
    ("white", "\x1b[37m"),
    ("gray", "\x1b[90m"),
    ("grey", "\x1b[90m"),
    ("bright-red", "\x1b[91m"),
    ("bright-green", "\x1b[92m"),
    ("bright-yellow", "\x1b[93m"),
    ("bright-blue", "\x1b[94m"),
    ("bright-magenta", "\x1b[95m"),
    ("bright-cyan", "\x1b[96m"),
    ("bright-white", "\x1b[97m"),
    ("bg-red", "\x1b[41m"),
    ("bg-green", "\x1b[42m"),
    ("bg-yellow", "\x1b[43m"),
    ("bg-blue", "\x1b[44m"),
    ("bg-magenta", "\x1b[45m"),
    ("bg-cyan", "\x1b[46m"),
    ("bg-white", "\x1b[47m"),
];

pub(super) fn register(reg: &mut FuncRegistry) {
    use Arity::Exact;
    for func in [
        Func::new("colorize", Exact(2), "colorize color text: wrap text in an ANSI color", colorize),
        Func::new("bold", Exact(1), "bold text", bold),
        Func::new("italic", Exact(1), "italic text", italic),
        Func::new("underline", Exact(1), "underline text", underline),
    ] {
        reg.register(func);
    }
}

/// Wrap `text` in the named color; unknown names leave it untouched.
pub(crate) fn colorize_text(color: &str, text: &str) -> String {
    let color = color.to_ascii_lowercase();
    match COLORS.iter().find(|(name, _)| *name == color) {
        Some((_, code)) => format!("{code}{text}{RESET}"),
        None => text.to_string(),
    }
}

fn colorize(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(colorize_text(arg_str(args, 0)?, arg_str(args, 1)?).into())
}

fn bold(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(format!("\x1b[1m{}{RESET}", arg_str(args, 0)?).into())
}

fn italic(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(format!("\x1b[3m{}{RESET}", arg_str(args, 0)?).into())
}

fn underline(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(format!("\x1b[4m{}{RESET}", arg_str(args, 0)?).into())
}
