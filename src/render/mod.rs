//! Breach rendering for output writers.
//!
//! [`resolve`] picks the template that applies to an [`OutputFormat`];
//! [`BreachRenderer`] evaluates it and rebuilds the breach, sending the
//! result (and any template failures) to a [`BreachSink`].

mod format;
mod renderer;
mod resolver;
mod sink;

pub use format::OutputFormat;
pub use renderer::{BreachRenderer, RenderJob};
pub use resolver::{resolve, Resolution, DEFAULT_FORMAT_KEY};
pub use sink::BreachSink;
