use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Execution policy controlling whether risky tools may run without
/// human confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    ReadOnly,
    AutoSafe,
    AutoFull,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecutionMode::ReadOnly => "read_only",
            ExecutionMode::AutoSafe => "auto_safe",
            ExecutionMode::AutoFull => "auto_full",
        })
    }
}

/// Per-call caller identity and policy context. Built by the caller once per
/// call; the gateway never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub tenant_id: String,
    pub user_id: String,
    pub session_id: String,
    pub granted_scopes: BTreeSet<String>,
    pub mode: ExecutionMode,
    pub dry_run: bool,
}

impl ExecutionContext {
    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            granted_scopes: BTreeSet::new(),
            mode,
            dry_run: false,
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.granted_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.granted_scopes.contains(scope)
    }
}
