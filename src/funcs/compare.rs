//! Comparisons, boolean logic and defaulting.

use std::cmp::Ordering;

use super::{Arity, CallContext, Func, FuncError, FuncRegistry};
use crate::template::Value;

pub(super) fn register(reg: &mut FuncRegistry) {
    use Arity::Exact;
    for func in [
        Func::new("eq", Exact(2), "eq a b: structural equality", eq),
        Func::new("ne", Exact(2), "ne a b: structural inequality", ne),
        Func::new("lt", Exact(2), "lt a b: a < b", lt),
        Func::new("le", Exact(2), "le a b: a <= b", le),
        Func::new("gt", Exact(2), "gt a b: a > b", gt),
        Func::new("ge", Exact(2), "ge a b: a >= b", ge),
        Func::new("and", Arity::AtLeast(2), "and a b...: every argument is truthy", and),
        Func::new("or", Arity::AtLeast(2), "or a b...: some argument is truthy", or),
        Func::new("not", Exact(1), "not a: negated truthiness", not),
        Func::new("default", Exact(2), "default fallback v: fallback when v is nil or \"\"", default),
        Func::new("empty", Exact(1), "empty v: nil, false, zero or zero-length", empty),
    ] {
        reg.register(func);
    }
}

fn eq(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok((args[0] == args[1]).into())
}

fn ne(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok((args[0] != args[1]).into())
}

fn lt(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok((args[0].compare(&args[1]) == Ordering::Less).into())
}

fn le(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok((args[0].compare(&args[1]) != Ordering::Greater).into())
}

fn gt(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok((args[0].compare(&args[1]) == Ordering::Greater).into())
}

fn ge(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok((args[0].compare(&args[1]) != Ordering::Less).into())
}

fn and(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(args.iter().all(Value::is_truthy).into())
}

fn or(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(args.iter().any(Value::is_truthy).into())
}

fn not(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok((!args[0].is_truthy()).into())
}

fn default(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let value = &args[1];
    let missing = match value {
        Value::Nil => true,
        Value::Str(s) => s.is_empty(),
        _ => false,
    };
    Ok(if missing { args[0].clone() } else { value.clone() })
}

fn empty(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(args[0].is_empty().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funcs::testing::call;

    fn truth(name: &str, a: Value, b: Value) -> bool {
        call(name, vec![a, b]).unwrap() == Value::Bool(true)
    }

    #[test]
    fn test_equality_is_structural() {
        assert!(truth("eq", Value::from("high"), Value::from("high")));
        assert!(truth("eq", Value::from(vec!["a"]), Value::from(vec!["a"])));
        assert!(!truth("eq", Value::Int(5), Value::Float(5.0)));
        assert!(truth("ne", Value::Int(1), Value::from("1")));
    }

    #[test]
    fn test_ordering_never_fails_on_mixed_types() {
        assert!(truth("gt", Value::Int(5), Value::Int(3)));
        assert!(truth("lt", Value::Float(2.5), Value::Int(3)));
        assert!(truth("lt", Value::from("apple"), Value::from("banana")));
        assert!(truth("ge", Value::Int(5), Value::from("5")));
        assert!(truth("le", Value::Nil, Value::Nil));
        assert!(truth("gt", Value::from("hello"), Value::Int(123)));
    }

    #[test]
    fn test_logic() {
        assert!(truth("and", Value::Bool(true), Value::from("x")));
        assert!(!truth("and", Value::Bool(true), Value::Int(0)));
        assert!(truth("or", Value::Bool(false), Value::Int(1)));
        assert_eq!(call("not", vec![Value::Nil]).unwrap(), Value::Bool(true));
        assert_eq!(
            call("and", vec![Value::Bool(true), Value::Bool(true), Value::Bool(false)]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_default() {
        let d = |v| call("default", vec![Value::from("fallback"), v]).unwrap();
        assert_eq!(d(Value::Nil), Value::from("fallback"));
        assert_eq!(d(Value::from("")), Value::from("fallback"));
        assert_eq!(d(Value::from("set")), Value::from("set"));
        assert_eq!(d(Value::Int(0)), Value::Int(0));
    }

    #[test]
    fn test_empty() {
        let e = |v| call("empty", vec![v]).unwrap() == Value::Bool(true);
        assert!(e(Value::Nil));
        assert!(e(Value::from("")));
        assert!(e(Value::List(vec![])));
        assert!(e(Value::Int(0)));
        assert!(e(Value::Bool(false)));
        assert!(!e(Value::from("x")));
        assert!(!e(Value::Int(3)));
    }
}
