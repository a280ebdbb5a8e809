//! Lookups into previously collected facts.

use super::{arg_str, Arity, CallContext, Func, FuncError, FuncRegistry};
use crate::template::Value;

pub(super) fn register(reg: &mut FuncRegistry) {
    use Arity::Exact;
    for func in [
        Func::new("lookup", Exact(2), "lookup fact key: fact data at key, or nil", lookup),
        Func::new("lookupDefault", Exact(3), "lookupDefault fact key default", lookup_default),
        Func::new(
            "lookupFactAsStringMap",
            Exact(2),
            "lookupFactAsStringMap fact key: string at key, or \"\"",
            lookup_string,
        ),
    ] {
        reg.register(func);
    }
}

fn lookup(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let id = arg_str(args, 0)?;
    let key = arg_str(args, 1)?;
    Ok(ctx.facts.lookup(id, key).map(Value::from).unwrap_or_default())
}

fn lookup_default(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let id = arg_str(args, 0)?;
    let key = arg_str(args, 1)?;
    Ok(ctx
        .facts
        .lookup(id, key)
        .map(Value::from)
        .unwrap_or_else(|| args[2].clone()))
}

fn lookup_string(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
    let id = arg_str(args, 0)?;
    let key = arg_str(args, 1)?;
    let text = match ctx.facts.lookup(id, key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) if !other.is_object() && !other.is_array() && !other.is_null() => {
            other.to_string()
        }
        _ => String::new(),
    };
    Ok(text.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::FactStore;
    use serde_json::json;

    fn facts() -> FactStore {
        FactStore::new()
            .with_fact("string-map-fact", json!({"key1": "value1"}))
            .with_fact("interface-map-fact", json!({"name": "John Doe", "age": 30}))
            .with_fact("nested", json!({"file1.log": {"content": "error occurred"}}))
    }

    fn call(name: &str, args: Vec<Value>) -> Value {
        let facts = facts();
        FuncRegistry::builtin()
            .call(name, &CallContext::new(&facts), &args)
            .unwrap()
    }

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_lookup() {
        assert_eq!(call("lookup", vec![s("string-map-fact"), s("key1")]), s("value1"));
        assert_eq!(call("lookup", vec![s("interface-map-fact"), s("name")]), s("John Doe"));
        assert_eq!(call("lookup", vec![s("interface-map-fact"), s("age")]), Value::Int(30));
        assert_eq!(call("lookup", vec![s("string-map-fact"), s("missing")]), Value::Nil);
        assert_eq!(call("lookup", vec![s("missing-fact"), s("key1")]), Value::Nil);
    }

    #[test]
    fn test_lookup_nested() {
        let content = call("lookup", vec![s("nested"), s("file1.log")]);
        assert_eq!(content.field("content").unwrap(), s("error occurred"));
    }

    #[test]
    fn test_lookup_default() {
        assert_eq!(
            call("lookupDefault", vec![s("string-map-fact"), s("key1"), s("fallback")]),
            s("value1")
        );
        assert_eq!(
            call("lookupDefault", vec![s("string-map-fact"), s("missing"), s("fallback")]),
            s("fallback")
        );
        assert_eq!(
            call("lookupDefault", vec![s("missing-fact"), s("k"), Value::Int(7)]),
            Value::Int(7)
        );
    }

    #[test]
    fn test_lookup_string_map() {
        assert_eq!(call("lookupFactAsStringMap", vec![s("string-map-fact"), s("key1")]), s("value1"));
        assert_eq!(call("lookupFactAsStringMap", vec![s("string-map-fact"), s("nope")]), s(""));
        assert_eq!(call("lookupFactAsStringMap", vec![s("missing-fact"), s("key1")]), s(""));
        assert_eq!(call("lookupFactAsStringMap", vec![s("interface-map-fact"), s("age")]), s("30"));
    }
}
