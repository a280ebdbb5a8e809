//! Breach template language.
//!
//! A small, side-effect-free subset of Go's `text/template`: field access
//! into the [`TemplateContext`], function pipelines, `if`/`with`/`range`,
//! variables, and `define`/`template`/`block`. Sources are compiled against
//! a [`FuncRegistry`](crate::funcs::FuncRegistry) and executed by the
//! [`Evaluator`], which turns failures into synthetic breaches instead of
//! returning them.
//!
//! ```
//! use breach_render::facts::NoFacts;
//! use breach_render::funcs::FuncRegistry;
//! use breach_render::model::{Breach, ValueBreach};
//! use breach_render::render::OutputFormat;
//! use breach_render::template::{Evaluator, TemplateContext};
//!
//! let funcs = FuncRegistry::builtin();
//! let evaluator = Evaluator::new(&funcs, &NoFacts);
//! let breach: Breach = ValueBreach::new("fail b").into();
//! let ctx = TemplateContext::new(&breach, OutputFormat::Pretty);
//!
//! let mut failures: Vec<Breach> = Vec::new();
//! let out = evaluator.evaluate("{{ .Breach.Value | upper }}", &ctx, &mut failures);
//! assert_eq!(out, "FAIL B");
//! assert!(failures.is_empty());
//! ```

mod context;
mod error;
mod evaluator;
mod exec;
mod lexer;
mod parse;
pub(crate) mod value;

pub use context::TemplateContext;
pub use error::{FailureClass, TemplateError};
pub use evaluator::{failure_breach, Evaluator, Template, TEMPLATE_NAME};
pub use value::{Record, Value};
