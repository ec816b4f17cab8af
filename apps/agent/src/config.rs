use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Agent configuration loaded from environment variables.
/// Built once at startup and handed to every component; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the portfolio repository (a git working tree).
    pub portfolio_path: PathBuf,
    /// Component-tree source holding the `projects` array, relative to `portfolio_path`.
    pub portfolio_file: PathBuf,
    /// HTML resume, relative to `portfolio_path`.
    pub resume_file: PathBuf,
    pub ollama_url: String,
    pub ollama_model: String,
    pub llm_timeout_secs: u64,
    pub git_remote: String,
    pub git_branch: String,
    /// Whitespace-separated deploy command run inside `portfolio_path`.
    pub deploy_command: String,
    pub push_backup_branch: bool,
    pub rust_log: String,
}

impl Config {
    /// Loads configuration from the environment (and `.env` if present).
    /// `portfolio_override` takes precedence over `PORTFOLIO_PATH`.
    pub fn from_env(portfolio_override: Option<PathBuf>) -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let portfolio_path = match portfolio_override {
            Some(path) => path,
            None => PathBuf::from(require_env("PORTFOLIO_PATH")?),
        };

        let defaults = Config::with_portfolio_path(portfolio_path);

        Ok(Config {
            portfolio_file: env_or("PORTFOLIO_FILE", defaults.portfolio_file.to_string_lossy())
                .into(),
            resume_file: env_or("RESUME_FILE", defaults.resume_file.to_string_lossy()).into(),
            ollama_url: env_or("OLLAMA_URL", defaults.ollama_url),
            ollama_model: env_or("OLLAMA_MODEL", defaults.ollama_model),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.llm_timeout_secs.to_string())
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            git_remote: env_or("GIT_REMOTE", defaults.git_remote),
            git_branch: env_or("GIT_BRANCH", defaults.git_branch),
            deploy_command: env_or("DEPLOY_COMMAND", defaults.deploy_command),
            push_backup_branch: std::env::var("PUSH_BACKUP_BRANCH")
                .unwrap_or_else(|_| "true".to_string())
                .parse::<bool>()
                .context("PUSH_BACKUP_BRANCH must be 'true' or 'false'")?,
            rust_log: env_or("RUST_LOG", defaults.rust_log),
            portfolio_path: defaults.portfolio_path,
        })
    }

    /// Configuration with every optional key at its default.
    pub fn with_portfolio_path(portfolio_path: PathBuf) -> Self {
        Config {
            portfolio_path,
            portfolio_file: PathBuf::from("src/Portfolio.tsx"),
            resume_file: PathBuf::from("public/resume.html"),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.1:8b".to_string(),
            llm_timeout_secs: 120,
            git_remote: "origin".to_string(),
            git_branch: "main".to_string(),
            deploy_command: "npm run deploy".to_string(),
            push_backup_branch: true,
            rust_log: "info".to_string(),
        }
    }

    pub fn portfolio_document(&self) -> PathBuf {
        self.portfolio_path.join(&self.portfolio_file)
    }

    pub fn resume_document(&self) -> PathBuf {
        self.portfolio_path.join(&self.resume_file)
    }

    pub fn repo_root(&self) -> &Path {
        &self.portfolio_path
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: impl Into<String>) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_conventional_documents() {
        let config = Config::with_portfolio_path(PathBuf::from("/srv/site"));
        assert_eq!(
            config.portfolio_document(),
            PathBuf::from("/srv/site/src/Portfolio.tsx")
        );
        assert_eq!(
            config.resume_document(),
            PathBuf::from("/srv/site/public/resume.html")
        );
        assert_eq!(config.ollama_model, "llama3.1:8b");
        assert!(config.push_backup_branch);
    }
}
