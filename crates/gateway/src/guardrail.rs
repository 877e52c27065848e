use std::collections::BTreeSet;

use crate::context::ExecutionMode;
use crate::error::GatewayError;
use crate::tool::RiskLevel;

/// Outcome of the mode/risk/confirmation decision table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardrailDecision {
    Proceed,
    Block { reason: String },
    RequireConfirmation { reason: String },
}

/// All required scopes must be granted (conjunction). On failure the error
/// enumerates both the missing and the currently granted scopes.
pub fn check_scopes(
    required: &[String],
    granted: &BTreeSet<String>,
) -> Result<(), GatewayError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|scope| !granted.contains(*scope))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::Unauthorized {
            missing,
            granted: granted.iter().cloned().collect(),
        })
    }
}

/// The confirmation decision table, in precedence order: dry-run bypasses
/// everything, low risk always proceeds, read-only hard-blocks medium/high,
/// auto-safe gates medium/high on the confirmation marker, auto-full always
/// proceeds.
///
/// Implemented as one exhaustive match over `(dry_run, risk, mode,
/// confirmed)` so adding a mode or risk level fails to compile here instead
/// of silently falling through to allow.
pub fn evaluate(
    mode: ExecutionMode,
    risk: RiskLevel,
    confirmed: bool,
    dry_run: bool,
) -> GuardrailDecision {
    use ExecutionMode::*;
    use RiskLevel::*;

    match (dry_run, risk, mode, confirmed) {
        (true, _, _, _) => GuardrailDecision::Proceed,
        (false, Low, _, _) => GuardrailDecision::Proceed,
        (false, Medium | High, ReadOnly, _) => GuardrailDecision::Block {
            reason: format!("read-only mode forbids {risk}-risk tools"),
        },
        (false, Medium | High, AutoSafe, true) => GuardrailDecision::Proceed,
        (false, Medium | High, AutoSafe, false) => GuardrailDecision::RequireConfirmation {
            reason: format!("{risk}-risk action requires explicit confirmation in auto_safe mode"),
        },
        (false, Medium | High, AutoFull, _) => GuardrailDecision::Proceed,
    }
}
