//! **Template rendering for compliance breaches.**
//!
//! `breach-render` turns the findings ("breaches") produced by compliance
//! rules into display-ready text. Each rule may carry a [`BreachTemplate`]:
//! either legacy per-field templates or an enhanced whole-breach template,
//! optionally one per output format. The same rendered breaches then feed
//! every output writer (pretty, table, JSON, JUnit).
//!
//! ## Modules
//!
//! - **[`model`]**: the [`Breach`] sum type and its metadata.
//! - **[`template`]**: the template language and its fault-tolerant
//!   [`Evaluator`].
//! - **[`funcs`]**: the function library templates call into.
//! - **[`render`]**: template resolution and the [`BreachRenderer`].
//! - **[`config`]**: template and renderer configuration files.
//! - **[`facts`]**: read-only fact data reachable through `lookup`.
//!
//! ## Rendering a breach
//!
//! ```
//! use breach_render::{BreachRenderer, BreachTemplate, FuncRegistry, NoFacts, OutputFormat};
//! use breach_render::model::{Breach, KeyValueBreach};
//!
//! let template = BreachTemplate {
//!     key_label: "File".into(),
//!     key: "{{ .Breach.Key }}".into(),
//!     value_label: "Error".into(),
//!     value: "{{ .Breach.Value | upper }}".into(),
//!     ..Default::default()
//! };
//! let breach: Breach = KeyValueBreach::new("config.yml", "invalid syntax").into();
//!
//! let funcs = FuncRegistry::builtin();
//! let renderer = BreachRenderer::new(&funcs, &NoFacts);
//! let rendered = renderer.render_one(&breach, &template, &OutputFormat::Pretty, None);
//!
//! assert_eq!(rendered[0].to_string(), "[File:config.yml] Error: INVALID SYNTAX");
//! ```
//!
//! A template that fails to compile or execute never aborts rendering: a
//! synthetic breach describing the failure is emitted ahead of the breach,
//! which keeps the unrendered template text.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // Numeric template values move between i64, f64 and usize
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::similar_names
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod facts;
pub mod funcs;
pub mod model;
pub mod render;
pub mod template;

pub use config::{BreachTemplate, ConfigError, EvalLimits, RendererConfig, TemplateFile, Validatable};
pub use error::{BreachError, ErrorContext, Result};
pub use facts::{FactSource, FactStore, NoFacts};
pub use funcs::FuncRegistry;
pub use model::{Breach, BreachType, KeyValueBreach, KeyValuesBreach, Severity, ValueBreach};
pub use render::{resolve, BreachRenderer, BreachSink, OutputFormat, RenderJob, Resolution};
pub use template::{Evaluator, TemplateContext, TemplateError};
