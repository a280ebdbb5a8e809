//! Remediation outcome attached to breaches after rendering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::Breach;

/// Outcome of a remediation attempt.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum RemediationStatus {
    /// Nothing has been attempted yet
    #[default]
    None,
    /// The breach has no remediator configured
    NoSupport,
    /// Remediation fixed the breach
    Success,
    /// Remediation was attempted and failed
    Failed,
    /// Remediation fixed part of the breach
    Partial,
}

impl RemediationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::NoSupport => "no-support",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Partial => "partial",
        }
    }
}

impl fmt::Display for RemediationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status plus the messages collected while remediating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RemediationResult {
    #[serde(default)]
    pub status: RemediationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl RemediationResult {
    pub fn new(status: RemediationStatus, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            messages: if message.is_empty() {
                Vec::new()
            } else {
                vec![message]
            },
        }
    }

    /// Whether a remediation outcome has been recorded at all.
    pub fn is_set(&self) -> bool {
        self.status != RemediationStatus::None
    }
}

/// A collaborator able to fix the condition behind a breach.
///
/// Remediators are attached to rendered breaches and run later by the
/// remediation phase; rendering never invokes them.
pub trait Remediator: Send + Sync + fmt::Debug {
    /// Attempt remediation for the given breach.
    fn remediate(&self, breach: &Breach) -> RemediationResult;
}

/// Shared handle to a [`Remediator`], comparable by identity.
#[derive(Clone)]
pub struct RemediatorHandle(Arc<dyn Remediator>);

impl RemediatorHandle {
    pub fn new(remediator: impl Remediator + 'static) -> Self {
        Self(Arc::new(remediator))
    }

    pub fn remediate(&self, breach: &Breach) -> RemediationResult {
        self.0.remediate(breach)
    }
}

impl From<Arc<dyn Remediator>> for RemediatorHandle {
    fn from(inner: Arc<dyn Remediator>) -> Self {
        Self(inner)
    }
}

impl fmt::Debug for RemediatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RemediatorHandle").field(&self.0).finish()
    }
}

impl PartialEq for RemediatorHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
