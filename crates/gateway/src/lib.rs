pub mod audit;
pub mod context;
pub mod error;
pub mod gateway;
pub mod guardrail;
pub mod registry;
pub mod schema;
pub mod tool;

pub use audit::{AuditQuery, AuditRecord, AuditSink, AuditStats, AuditStoreError};
pub use context::{ExecutionContext, ExecutionMode};
pub use error::GatewayError;
pub use gateway::{ConfirmationRequest, ExecutionResult, ToolGateway, CONFIRM_FIELD};
pub use guardrail::GuardrailDecision;
pub use registry::{ToolRegistry, ToolSpec};
pub use schema::FieldViolation;
pub use tool::{HandlerFailure, RiskLevel, Tool};
