//! Tool catalog exposed over the protocol: what `tools/list` returns.

use serde_json::{json, Value};

pub mod handlers;

pub use handlers::{call_tool, ToolError};

/// Commit message used by `deploy_portfolio` when none is given.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update portfolio";

/// Definitions with JSON-schema `inputSchema`s, in catalog order.
pub fn tool_definitions() -> Value {
    let project_path = json!({
        "type": "string",
        "description": "Path to the project directory to analyze"
    });

    json!([
        {
            "name": "analyze_project",
            "description": "Analyze a project and generate its portfolio entry and resume bullets without touching any document.",
            "inputSchema": {
                "type": "object",
                "properties": { "project_path": project_path },
                "required": ["project_path"]
            }
        },
        {
            "name": "update_portfolio",
            "description": "Run the full update pipeline for a project: analyze, generate, back up, edit the portfolio and resume, commit, push and deploy. Use mode \"dry-run\" to preview diffs.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "project_path": project_path,
                    "mode": {
                        "type": "string",
                        "enum": ["auto", "dry-run", "analyze-only"],
                        "default": "auto"
                    }
                },
                "required": ["project_path"]
            }
        },
        {
            "name": "get_project_info",
            "description": "Inspect a project directory: evidence files, detected technologies and a file listing. No model call.",
            "inputSchema": {
                "type": "object",
                "properties": { "project_path": project_path },
                "required": ["project_path"]
            }
        },
        {
            "name": "deploy_portfolio",
            "description": "Commit and push pending portfolio changes, then run the deploy command.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "commit_message": {
                        "type": "string",
                        "default": DEFAULT_COMMIT_MESSAGE
                    }
                }
            }
        },
        {
            "name": "list_projects",
            "description": "List the projects currently in the portfolio, in document order.",
            "inputSchema": { "type": "object", "properties": {} }
        }
    ])
}
