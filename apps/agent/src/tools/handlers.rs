//! `tools/call` handlers. Every handler drives a `PipelineController` with
//! the auto-accept confirmer; nothing here ever prompts.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AgentError;
use crate::pipeline::{AutoConfirmer, PipelineController, PipelineError, PipelineState, RunMode};
use crate::state::AppState;
use crate::tools::DEFAULT_COMMIT_MESSAGE;

// ────────────────────────────────────────────────────────────────────────────
// Arguments
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProjectArgs {
    pub project_path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArgs {
    pub project_path: PathBuf,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeployArgs {
    #[serde(default)]
    pub commit_message: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// A failed tool call. `stage` is set when a pipeline run aborted.
#[derive(Debug)]
pub struct ToolError {
    pub source: AgentError,
    pub stage: Option<PipelineState>,
}

impl ToolError {
    pub fn to_rpc_error(&self) -> Value {
        let stage = self.stage.map(|s| s.to_string());
        self.source.to_rpc_error(stage.as_deref())
    }
}

impl From<AgentError> for ToolError {
    fn from(source: AgentError) -> Self {
        Self {
            source,
            stage: None,
        }
    }
}

impl From<PipelineError> for ToolError {
    fn from(e: PipelineError) -> Self {
        Self {
            source: e.source,
            stage: Some(e.stage),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatch
// ────────────────────────────────────────────────────────────────────────────

/// Runs tool `name` and wraps its result as MCP text content.
pub async fn call_tool(state: &AppState, name: &str, arguments: Value) -> Result<Value, ToolError> {
    info!("Tool call: {}", name);
    let result = match name {
        "analyze_project" => handle_analyze_project(state, parse_args(arguments)?).await?,
        "update_portfolio" => handle_update_portfolio(state, parse_args(arguments)?).await?,
        "get_project_info" => handle_get_project_info(state, parse_args(arguments)?)?,
        "deploy_portfolio" => handle_deploy_portfolio(state, parse_args(arguments)?).await?,
        "list_projects" => handle_list_projects(state)?,
        other => return Err(AgentError::Protocol(format!("unknown tool '{other}'")).into()),
    };
    Ok(json!({
        "content": [{ "type": "text", "text": format!("{result:#}") }]
    }))
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, AgentError> {
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| AgentError::Protocol(format!("invalid arguments: {e}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, AgentError> {
    serde_json::to_value(value).map_err(|e| AgentError::Io(e.into()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// analyze_project — profile plus generated content, no side effects.
async fn handle_analyze_project(state: &AppState, args: ProjectArgs) -> Result<Value, ToolError> {
    run(state, &args.project_path, RunMode::AnalyzeOnly).await
}

/// update_portfolio — full pipeline in the requested mode (default `auto`).
async fn handle_update_portfolio(state: &AppState, args: UpdateArgs) -> Result<Value, ToolError> {
    let mode = match args.mode.as_deref() {
        None => RunMode::Auto,
        Some(raw) => RunMode::parse(raw).ok_or_else(|| {
            AgentError::Protocol(format!(
                "invalid mode '{raw}' (expected auto, dry-run or analyze-only)"
            ))
        })?,
    };
    run(state, &args.project_path, mode).await
}

async fn run(state: &AppState, path: &Path, mode: RunMode) -> Result<Value, ToolError> {
    let mut controller = PipelineController::new(state, &AutoConfirmer);
    let report = controller.run(path, mode).await?;
    Ok(to_json(&report)?)
}

fn handle_get_project_info(state: &AppState, args: ProjectArgs) -> Result<Value, ToolError> {
    let info = PipelineController::new(state, &AutoConfirmer).project_info(&args.project_path)?;
    Ok(to_json(&info)?)
}

async fn handle_deploy_portfolio(state: &AppState, args: DeployArgs) -> Result<Value, ToolError> {
    let message = args
        .commit_message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string());
    let report = PipelineController::new(state, &AutoConfirmer)
        .deploy(&message)
        .await?;
    Ok(to_json(&report)?)
}

fn handle_list_projects(state: &AppState) -> Result<Value, ToolError> {
    let entries = PipelineController::new(state, &AutoConfirmer).list_projects()?;
    Ok(json!({ "count": entries.len(), "projects": to_json(&entries)? }))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
