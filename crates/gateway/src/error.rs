use thiserror::Error;

use crate::schema::FieldViolation;

/// Everything that can go wrong between receiving a call and invoking its
/// handler. All variants except `DuplicateTool` are converted into a
/// structured `ExecutionResult` by the orchestrator; duplicate registration
/// is a startup-time configuration error and stays fatal.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("invalid arguments: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("missing required scopes {missing:?} (granted: {granted:?})")]
    Unauthorized {
        missing: Vec<String>,
        granted: Vec<String>,
    },

    #[error("{reason}")]
    Blocked { reason: String },

    #[error("tool '{tool}' failed: {message}")]
    Handler { tool: String, message: String },

    #[error("duplicate tool registration: {name}")]
    DuplicateTool { name: String },
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_error_lists_every_violation() {
        let err = GatewayError::Validation(vec![
            FieldViolation {
                field: "invoiceId".into(),
                rule: "required".into(),
                constraint: None,
            },
            FieldViolation {
                field: "amount".into(),
                rule: "minimum".into(),
                constraint: Some(json!(0)),
            },
        ]);
        let text = err.to_string();
        assert!(text.contains("invoiceId: required"));
        assert!(text.contains("amount: minimum (0)"));
    }

    #[test]
    fn unauthorized_error_names_missing_and_granted() {
        let err = GatewayError::Unauthorized {
            missing: vec!["INVOICE_WRITE".into()],
            granted: vec!["CLIENT_READ".into()],
        };
        let text = err.to_string();
        assert!(text.contains("INVOICE_WRITE"));
        assert!(text.contains("CLIENT_READ"));
    }
}
