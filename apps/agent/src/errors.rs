use serde_json::{json, Value};
use thiserror::Error;

use crate::llm_client::LlmError;

/// Agent-level error type.
/// Every failure a pipeline stage or tool call can surface is one of these kinds.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Not enough evidence to analyze project: {0}")]
    EvidenceInsufficient(String),

    #[error("Model output could not be parsed: {0}")]
    GenerationFormat(String),

    #[error("Generated content violates constraints: {0}")]
    ContentConstraint(String),

    #[error("Resume slot {index} is out of range (expected 0..{max})")]
    InvalidSlot { index: usize, max: usize },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Deploy failed: {0}")]
    DeployFailed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Model backend error: {0}")]
    Backend(#[from] LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Stable kind string carried on the wire and in CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::ProjectNotFound(_) => "ProjectNotFoundError",
            AgentError::EvidenceInsufficient(_) => "EvidenceInsufficientError",
            AgentError::GenerationFormat(_) => "GenerationFormatError",
            AgentError::ContentConstraint(_) => "ContentConstraintError",
            AgentError::InvalidSlot { .. } => "InvalidSlotError",
            AgentError::MalformedDocument(_) => "MalformedDocumentError",
            AgentError::DuplicateEntry(_) => "DuplicateEntryError",
            AgentError::Backup(_) => "BackupError",
            AgentError::PublishFailed(_) => "PublishFailedError",
            AgentError::DeployFailed(_) => "DeployFailedError",
            AgentError::Protocol(_) => "ProtocolError",
            AgentError::Backend(_) => "BackendError",
            AgentError::Io(_) => "IoError",
        }
    }

    /// JSON-RPC error code. Protocol errors use the reserved range,
    /// pipeline failures use the implementation-defined server range.
    pub fn rpc_code(&self) -> i64 {
        match self {
            AgentError::Protocol(_) => -32602,
            AgentError::ProjectNotFound(_)
            | AgentError::EvidenceInsufficient(_)
            | AgentError::InvalidSlot { .. } => -32001,
            AgentError::DuplicateEntry(_) | AgentError::MalformedDocument(_) => -32002,
            AgentError::GenerationFormat(_)
            | AgentError::ContentConstraint(_)
            | AgentError::Backend(_) => -32003,
            AgentError::Backup(_) | AgentError::PublishFailed(_) | AgentError::DeployFailed(_) => {
                -32004
            }
            AgentError::Io(_) => -32603,
        }
    }

    /// Builds the JSON-RPC `error` object. Only the kind and the display message
    /// leave the process; backend and I/O internals are logged instead.
    pub fn to_rpc_error(&self, stage: Option<&str>) -> Value {
        match self {
            AgentError::Backend(e) => tracing::error!("Model backend error: {e}"),
            AgentError::Io(e) => tracing::error!("I/O error: {e}"),
            _ => {}
        }

        let mut data = json!({ "kind": self.kind() });
        if let Some(stage) = stage {
            data["stage"] = json!(stage);
        }

        json!({
            "code": self.rpc_code(),
            "message": self.to_string(),
            "data": data,
        })
    }
}
