use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::{LlmBackend, LlmError, OllamaClient};
use crate::vcs::{CommandRunner, ProcessRunner};

/// Everything a pipeline run or tool call needs, built once at startup and
/// shared by the CLI and the tool server.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Model backend. Default: local Ollama; tests inject a scripted fake.
    pub llm: Arc<dyn LlmBackend>,
    /// git and deploy subprocesses.
    pub runner: Arc<dyn CommandRunner>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, LlmError> {
        let llm = OllamaClient::new(&config)?;
        Ok(Self {
            config,
            llm: Arc::new(llm),
            runner: Arc::new(ProcessRunner),
        })
    }
}
