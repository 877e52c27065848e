use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::audit::{AuditRecord, AuditSink};
use crate::context::ExecutionContext;
use crate::error::GatewayError;
use crate::guardrail::{self, GuardrailDecision};
use crate::registry::{ToolRegistry, ToolSpec};
use crate::schema::{self, FieldViolation};

/// Top-level argument field callers use to confirm a gated action. It is a
/// transient per-call signal: stripped before validation, never passed to the
/// handler, never part of tool identity.
pub const CONFIRM_FIELD: &str = "confirm";

/// Returned when a risky action needs explicit human sign-off. Designed to be
/// shown to a human and replayed: resubmit `args` plus `"confirm": true` as a
/// fresh call. The gateway holds no pending state between the two calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub tool: String,
    pub args: Map<String, Value>,
    pub reason: String,
}

/// Normalized outcome of one `execute` call. Never carries a raw handler
/// panic or policy error across the boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub simulated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationRequest>,
}

impl ExecutionResult {
    fn success(data: Value, simulated: bool) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            simulated,
            confirmation: None,
        }
    }

    fn failure(error: impl Into<String>, simulated: bool) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
            simulated,
            confirmation: None,
        }
    }

    fn needs_confirmation(request: ConfirmationRequest, simulated: bool) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(format!("confirmation required: {}", request.reason)),
            simulated,
            confirmation: Some(request),
        }
    }

    /// True for the retriable confirmation-required outcome.
    pub fn requires_confirmation(&self) -> bool {
        self.confirmation.is_some()
    }
}

enum Outcome {
    Completed(Value),
    Confirm(ConfirmationRequest),
    Failed(GatewayError),
}

/// The execution orchestrator. Sequences lookup, validation, guardrails,
/// handler invocation, and audit logging; it is the only component callers
/// interact with at runtime.
pub struct ToolGateway {
    registry: Arc<ToolRegistry>,
    audit: Arc<dyn AuditSink>,
}

impl ToolGateway {
    pub fn new(registry: Arc<ToolRegistry>, audit: Arc<dyn AuditSink>) -> Self {
        Self { registry, audit }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn list_for_scopes(&self, granted: &std::collections::BTreeSet<String>) -> Vec<ToolSpec> {
        self.registry.list_for_scopes(granted)
    }

    /// The sole runtime entry point. Always resolves to an
    /// `ExecutionResult`; exactly one audit record is appended per call,
    /// whatever the outcome.
    pub async fn execute(
        &self,
        ctx: &ExecutionContext,
        tool_name: &str,
        raw_args: Value,
    ) -> ExecutionResult {
        let started = Instant::now();
        info!(
            tool = tool_name,
            session = %ctx.session_id,
            mode = %ctx.mode,
            dry_run = ctx.dry_run,
            "dispatching tool"
        );

        let outcome = self.run(ctx, tool_name, &raw_args).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Outcome::Completed(data) => ExecutionResult::success(data, ctx.dry_run),
            Outcome::Confirm(request) => {
                ExecutionResult::needs_confirmation(request, ctx.dry_run)
            }
            Outcome::Failed(err) => {
                warn!(tool = tool_name, error = %err, "tool call failed");
                ExecutionResult::failure(err.to_string(), ctx.dry_run)
            }
        };

        let record = AuditRecord {
            tenant_id: ctx.tenant_id.clone(),
            session_id: ctx.session_id.clone(),
            tool: tool_name.to_string(),
            args_json: raw_args,
            result_json: if result.ok { result.data.clone() } else { None },
            ok: result.ok,
            error: result.error.clone(),
            duration_ms,
            simulated: result.simulated,
            created_at: Utc::now(),
        };

        // Best-effort: a broken audit sink must never alter the result.
        if let Err(err) = self.audit.append(record).await {
            error!(tool = tool_name, error = %err, "audit append failed");
        }

        result
    }

    async fn run(
        &self,
        ctx: &ExecutionContext,
        tool_name: &str,
        raw_args: &Value,
    ) -> Outcome {
        // 1. Lookup.
        let Some(tool) = self.registry.get(tool_name) else {
            return Outcome::Failed(GatewayError::UnknownTool {
                name: tool_name.to_string(),
            });
        };

        // 2. Strip the transient confirmation marker, then validate. Invalid
        // input never reaches the guardrail engine or a handler.
        let Some((args, confirmed)) = split_confirmation(raw_args) else {
            return Outcome::Failed(GatewayError::Validation(vec![FieldViolation {
                field: String::new(),
                rule: "type".to_string(),
                constraint: Some(Value::String("object".to_string())),
            }]));
        };

        let args = match schema::validate(&tool.parameters(), &args) {
            Ok(args) => args,
            Err(violations) => return Outcome::Failed(GatewayError::Validation(violations)),
        };

        // 3. Guardrails: scopes first, then the mode/risk decision table.
        if let Err(err) = guardrail::check_scopes(&tool.required_scopes(), &ctx.granted_scopes) {
            return Outcome::Failed(err);
        }

        match guardrail::evaluate(ctx.mode, tool.risk(), confirmed, ctx.dry_run) {
            GuardrailDecision::Block { reason } => {
                Outcome::Failed(GatewayError::Blocked { reason })
            }
            GuardrailDecision::RequireConfirmation { reason } => {
                Outcome::Confirm(ConfirmationRequest {
                    tool: tool_name.to_string(),
                    args,
                    reason,
                })
            }
            GuardrailDecision::Proceed => {
                // 4. Invoke the handler in a spawned task so a panic is
                // captured instead of unwinding through the gateway.
                let ctx = ctx.clone();
                let handle = tokio::spawn(async move { tool.execute(&ctx, args).await });
                match handle.await {
                    Ok(Ok(data)) => Outcome::Completed(data),
                    Ok(Err(failure)) => Outcome::Failed(GatewayError::Handler {
                        tool: tool_name.to_string(),
                        message: failure.to_string(),
                    }),
                    Err(join_err) => {
                        let message = if join_err.is_panic() {
                            "handler panicked".to_string()
                        } else {
                            "handler task was cancelled".to_string()
                        };
                        error!(tool = tool_name, reason = %message, "handler did not complete");
                        Outcome::Failed(GatewayError::Handler {
                            tool: tool_name.to_string(),
                            message,
                        })
                    }
                }
            }
        }
    }
}

/// Split the raw payload into handler-visible arguments and the confirmation
/// flag. `null` is treated as an empty argument object; any other non-object
/// payload is rejected by the caller as a type violation.
fn split_confirmation(raw: &Value) -> Option<(Map<String, Value>, bool)> {
    let mut args = match raw {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        _ => return None,
    };
    let confirmed = args
        .remove(CONFIRM_FIELD)
        .map(|v| v.as_bool().unwrap_or(false))
        .unwrap_or(false);
    Some((args, confirmed))
}
