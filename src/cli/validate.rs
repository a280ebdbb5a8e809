//! `validate` command handler.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::config::{load_template_file, Validatable};

/// Compile every template in the file and report problems.
///
/// Returns whether the file is valid.
pub fn run_validate(path: &Path, out: &mut dyn Write) -> Result<bool> {
    let templates =
        load_template_file(path).with_context(|| format!("loading templates from {}", path.display()))?;
    let errors = templates.validate();
    if errors.is_empty() {
        writeln!(out, "{}: {} template(s) OK", path.display(), templates.len())?;
        return Ok(true);
    }
    for error in &errors {
        writeln!(out, "{}: {error}", path.display())?;
    }
    Ok(false)
}
