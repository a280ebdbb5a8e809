//! Sequence and map access.

use super::{arg_int, Arity, CallContext, Func, FuncError, FuncRegistry};
use crate::template::Value;

pub(super) fn register(reg: &mut FuncRegistry) {
    use Arity::Exact;
    for func in [
        Func::new("len", Exact(1), "len v: length of a list, map or string; 0 otherwise", len),
        Func::new("first", Exact(1), "first list: first element or nil", first),
        Func::new("last", Exact(1), "last list: last element or nil", last),
        Func::new("slice", Exact(3), "slice start end list: clamped sub-list", slice),
        Func::new("index", Arity::AtLeast(1), "index v keys...: element by list index or map key", index),
    ] {
        reg.register(func);
    }
}

fn len(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(args[0].len().into())
}

fn first(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(match &args[0] {
        Value::List(items) => items.first().cloned().unwrap_or_default(),
        _ => Value::Nil,
    })
}

fn last(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    Ok(match &args[0] {
        Value::List(items) => items.last().cloned().unwrap_or_default(),
        _ => Value::Nil,
    })
}

fn slice(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let start = arg_int(args, 0)?;
    let end = arg_int(args, 1)?;
    let Value::List(items) = &args[2] else {
        return Ok(args[2].clone());
    };
    let start = usize::try_from(start).unwrap_or(0);
    let end = usize::try_from(end).unwrap_or(0).min(items.len());
    if start >= end {
        return Ok(Value::List(Vec::new()));
    }
    Ok(Value::List(items[start..end].to_vec()))
}

fn index(_: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let mut current = args[0].clone();
    for (offset, key) in args[1..].iter().enumerate() {
        current = match (&current, key) {
            (Value::List(items), _) => {
                let i = key.as_int().ok_or(FuncError::Type {
                    position: offset + 2,
                    expected: "int",
                    got: key.kind(),
                })?;
                usize::try_from(i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .unwrap_or_default()
            }
            (Value::Map(map), Value::Str(k)) => map.get(k).cloned().unwrap_or_default(),
            (Value::Map(_), other) => {
                return Err(FuncError::Type {
                    position: offset + 2,
                    expected: "string",
                    got: other.kind(),
                })
            }
            (Value::Nil, _) => Value::Nil,
            (other, _) => {
                return Err(FuncError::Invalid(format!(
                    "can't index item of type {}",
                    other.kind()
                )))
            }
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funcs::testing::call;
    use serde_json::json;

    fn list() -> Value {
        Value::from(vec!["a", "b", "c", "d"])
    }

    #[test]
    fn test_len() {
        assert_eq!(call("len", vec![list()]).unwrap(), Value::Int(4));
        assert_eq!(call("len", vec![Value::from("héllo")]).unwrap(), Value::Int(5));
        assert_eq!(call("len", vec![Value::Nil]).unwrap(), Value::Int(0));
        assert_eq!(call("len", vec![Value::Int(42)]).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_first_last() {
        assert_eq!(call("first", vec![list()]).unwrap(), Value::from("a"));
        assert_eq!(call("last", vec![list()]).unwrap(), Value::from("d"));
        assert_eq!(call("first", vec![Value::List(vec![])]).unwrap(), Value::Nil);
        assert_eq!(call("last", vec![Value::from("str")]).unwrap(), Value::Nil);
    }

    #[test]
    fn test_slice_clamps() {
        let sl = |a, b| call("slice", vec![Value::Int(a), Value::Int(b), list()]).unwrap();
        assert_eq!(sl(1, 3), Value::from(vec!["b", "c"]));
        assert_eq!(sl(-5, 2), Value::from(vec!["a", "b"]));
        assert_eq!(sl(2, 100), Value::from(vec!["c", "d"]));
        assert_eq!(sl(3, 1), Value::List(vec![]));
        assert_eq!(sl(10, 20), Value::List(vec![]));
        assert_eq!(
            call("slice", vec![Value::Int(0), Value::Int(1), Value::from("abc")]).unwrap(),
            Value::from("abc")
        );
    }

    #[test]
    fn test_index() {
        assert_eq!(call("index", vec![list(), Value::Int(1)]).unwrap(), Value::from("b"));
        assert_eq!(call("index", vec![list(), Value::Int(9)]).unwrap(), Value::Nil);
        let nested = Value::from(json!({"a": {"b": [1, 2]}}));
        assert_eq!(
            call("index", vec![nested, Value::from("a"), Value::from("b"), Value::Int(1)]).unwrap(),
            Value::Int(2)
        );
        assert!(call("index", vec![Value::Int(1), Value::Int(0)]).is_err());
    }
}
