//! CLI command handlers.
//!
//! Handlers are invoked by `main.rs` and write to any [`std::io::Write`], so
//! they can be tested without a terminal.

mod functions;
mod render;
mod validate;

pub use functions::{run_functions, run_schema, SchemaKind};
pub use render::{run_render, RenderOptions};
pub use validate::run_validate;
