//! Compile and execution failures of breach templates.

use std::fmt;
use thiserror::Error;

/// A template failed to compile or to execute.
///
/// Messages follow the `template: NAME:LINE: ...` convention so they can be
/// shown verbatim in a synthetic breach.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template: {name}:{line}: {message}")]
    Parse {
        name: String,
        line: usize,
        message: String,
    },

    #[error("template: {name}:{line}: executing \"{name}\" at <{at}>: {message}")]
    Exec {
        name: String,
        line: usize,
        at: String,
        message: String,
    },
}

impl TemplateError {
    pub(crate) fn parse(name: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            name: name.to_string(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn exec(name: &str, line: usize, at: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::Exec {
            name: name.to_string(),
            line,
            at: at.to_string(),
            message: message.into(),
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            Self::Parse { .. } => FailureClass::Compile,
            Self::Exec { .. } => FailureClass::Execution,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Parse { line, .. } | Self::Exec { line, .. } => *line,
        }
    }

    /// The message without the location prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Parse { message, .. } | Self::Exec { message, .. } => message,
        }
    }
}

/// Which stage of evaluation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    Compile,
    Execution,
}

impl FailureClass {
    /// Label of the synthetic breach reporting the failure.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Compile => "unable to parse breach template",
            Self::Execution => "unable to render breach template",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = TemplateError::parse("breach", 1, "missing value for command");
        assert_eq!(err.to_string(), "template: breach:1: missing value for command");
        assert_eq!(err.class(), FailureClass::Compile);
        assert_eq!(err.class().label(), "unable to parse breach template");
    }

    #[test]
    fn test_exec_error_display() {
        let err = TemplateError::exec(
            "breach",
            2,
            ".Breach.Values",
            "can't evaluate field Values in type ValueBreach",
        );
        assert_eq!(
            err.to_string(),
            "template: breach:2: executing \"breach\" at <.Breach.Values>: can't evaluate field Values in type ValueBreach"
        );
        assert_eq!(err.class(), FailureClass::Execution);
        assert_eq!(err.line(), 2);
        assert!(err.message().starts_with("can't evaluate"));
    }
}
