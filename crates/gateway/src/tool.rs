use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::context::ExecutionContext;

/// Classification of a tool's potential blast radius. Fixed at registration;
/// drives the confirmation policy in the guardrail engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        })
    }
}

/// Failure raised by a domain handler. The original message is preserved
/// verbatim in the execution result and audit record.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct HandlerFailure(pub String);

impl HandlerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<&str> for HandlerFailure {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<String> for HandlerFailure {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// A registrable side-effecting action. Implementations are immutable once
/// registered: name, scopes, and risk never change for the registry's
/// lifetime.
///
/// `execute` receives arguments that already passed schema validation and
/// guardrail checks. When `ctx.dry_run` is set the handler must simulate the
/// action instead of performing it.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON-Schema-like object shape the arguments are validated against.
    fn parameters(&self) -> Value;

    /// Capability scopes the caller must hold, all of them.
    fn required_scopes(&self) -> Vec<String> {
        Vec::new()
    }

    fn risk(&self) -> RiskLevel {
        RiskLevel::Low
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        args: Map<String, Value>,
    ) -> Result<Value, HandlerFailure>;
}
