//! The function library available to breach templates.
//!
//! A [`FuncRegistry`] maps function names to plain function pointers and is
//! built once (usually with [`FuncRegistry::builtin`]) then shared by
//! reference with every evaluation. Functions never fault on bad *values*:
//! out-of-range indices, zero divisors and invalid patterns degrade to a
//! default result. Only wrong arity or a wrong argument *type* produces a
//! [`FuncError`], which the executor reports as an execution failure.

mod collections;
mod compare;
mod facts;
mod numbers;
mod pattern;
mod printf;
mod strings;
mod style;
mod time;

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::facts::FactSource;
use crate::template::Value;

/// Signature shared by every template function.
pub type FuncImpl = fn(&CallContext<'_>, &[Value]) -> Result<Value, FuncError>;

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Self::Exact(want) => n == want,
            Self::Between(lo, hi) => (lo..=hi).contains(&n),
            Self::AtLeast(lo) => n >= lo,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Between(lo, hi) => write!(f, "{lo}..{hi}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Errors raised by argument checking before a function body runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FuncError {
    #[error("wrong number of args for {name}: want {want} got {got}")]
    Arity {
        name: String,
        want: String,
        got: usize,
    },

    #[error("wrong type for argument {position}: expected {expected}; got {got}")]
    Type {
        position: usize,
        expected: &'static str,
        got: &'static str,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Read-only environment handed to every function call.
#[derive(Clone, Copy)]
pub struct CallContext<'a> {
    pub facts: &'a dyn FactSource,
}

impl<'a> CallContext<'a> {
    pub fn new(facts: &'a dyn FactSource) -> Self {
        Self { facts }
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext").finish_non_exhaustive()
    }
}

/// A named template function.
#[derive(Clone, Copy)]
pub struct Func {
    pub name: &'static str,
    pub arity: Arity,
    pub summary: &'static str,
    call: FuncImpl,
}

impl Func {
    pub const fn new(name: &'static str, arity: Arity, summary: &'static str, call: FuncImpl) -> Self {
        Self {
            name,
            arity,
            summary,
            call,
        }
    }

    /// Check arity, then run the function body.
    pub fn call(&self, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
        if !self.arity.accepts(args.len()) {
            return Err(FuncError::Arity {
                name: self.name.to_string(),
                want: self.arity.to_string(),
                got: args.len(),
            });
        }
        (self.call)(ctx, args)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Immutable name → function table.
#[derive(Debug, Clone, Default)]
pub struct FuncRegistry {
    funcs: BTreeMap<&'static str, Func>,
}

impl FuncRegistry {
    /// An empty registry; templates compiled against it may only use literals,
    /// fields and control flow.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The full built-in library.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        strings::register(&mut reg);
        printf::register(&mut reg);
        numbers::register(&mut reg);
        collections::register(&mut reg);
        compare::register(&mut reg);
        pattern::register(&mut reg);
        time::register(&mut reg);
        style::register(&mut reg);
        facts::register(&mut reg);
        reg
    }

    /// Add or replace a function.
    pub fn register(&mut self, func: Func) {
        self.funcs.insert(func.name, func);
    }

    pub fn get(&self, name: &str) -> Option<&Func> {
        self.funcs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Functions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Func> {
        self.funcs.values()
    }

    /// Closest known function name, for "did you mean" hints.
    pub fn suggest(&self, name: &str) -> Option<&'static str> {
        self.funcs
            .keys()
            .map(|candidate| (*candidate, strsim::jaro_winkler(name, candidate)))
            .filter(|(_, score)| *score >= 0.8)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(candidate, _)| candidate)
    }

    /// Call a function by name.
    pub fn call(&self, name: &str, ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, FuncError> {
        let func = self
            .get(name)
            .ok_or_else(|| FuncError::Invalid(format!("function \"{name}\" not defined")))?;
        func.call(ctx, args)
    }
}

// Argument helpers shared by the function families. Positions are zero-based
// internally and reported one-based.

pub(crate) fn arg_int(args: &[Value], i: usize) -> Result<i64, FuncError> {
    args[i].as_int().ok_or(FuncError::Type {
        position: i + 1,
        expected: "int",
        got: args[i].kind(),
    })
}

pub(crate) fn arg_str(args: &[Value], i: usize) -> Result<&str, FuncError> {
    args[i].as_str().ok_or(FuncError::Type {
        position: i + 1,
        expected: "string",
        got: args[i].kind(),
    })
}

/// Negative counts read as zero.
pub(crate) fn arg_usize(args: &[Value], i: usize) -> Result<usize, FuncError> {
    arg_int(args, i).map(|n| usize::try_from(n).unwrap_or(0))
}

/// Largest width, precision or generated string length a function accepts.
pub(crate) const MAX_GENERATED_LEN: usize = 1_000_000;

/// `n` if it is within [`MAX_GENERATED_LEN`].
pub(crate) fn bounded(n: usize, what: &str) -> Result<usize, FuncError> {
    if n > MAX_GENERATED_LEN {
        return Err(FuncError::Invalid(format!(
            "{what} {n} exceeds the limit of {MAX_GENERATED_LEN}"
        )));
    }
    Ok(n)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::facts::NoFacts;

    /// Call a builtin with no facts available.
    pub fn call(name: &str, args: Vec<Value>) -> Result<Value, FuncError> {
        FuncRegistry::builtin().call(name, &CallContext::new(&NoFacts), &args)
    }

    pub fn call_str(name: &str, args: Vec<Value>) -> String {
        call(name, args).unwrap().to_string()
    }
}
