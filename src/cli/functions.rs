//! `functions` and `schema` command handlers.

use anyhow::Result;
use std::io::Write;

use crate::config::{generate_json_schema, generate_renderer_config_schema};
use crate::funcs::FuncRegistry;

/// Print the template function library.
pub fn run_functions(out: &mut dyn Write) -> Result<()> {
    let funcs = FuncRegistry::builtin();
    let width = funcs.iter().map(|f| f.name.len()).max().unwrap_or(0);
    for func in funcs.iter() {
        writeln!(out, "{:<width$}  args: {:<10}  {}", func.name, func.arity.to_string(), func.summary)?;
    }
    Ok(())
}

/// Which JSON Schema to print.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemaKind {
    /// Breach template files
    #[default]
    Template,
    /// Renderer config files
    Config,
}

pub fn run_schema(kind: SchemaKind, out: &mut dyn Write) -> Result<()> {
    let schema = match kind {
        SchemaKind::Template => generate_json_schema(),
        SchemaKind::Config => generate_renderer_config_schema(),
    };
    writeln!(out, "{schema}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_functions_lists_library() {
        let mut out = Vec::new();
        run_functions(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().any(|l| l.starts_with("humanize ")));
        assert!(text.lines().any(|l| l.starts_with("lookupDefault ")));
        assert_eq!(text.lines().count(), FuncRegistry::builtin().len());
    }

    #[test]
    fn test_schema_output() {
        let mut out = Vec::new();
        run_schema(SchemaKind::Template, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("value-label"));
    }
}
