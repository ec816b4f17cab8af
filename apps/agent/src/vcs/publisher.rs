//! Publishing: commit + push the updated documents, then run the deploy command.
//!
//! Nothing here rolls back. A failed push leaves the local commit and the
//! backup branch in place; a failed deploy leaves the pushed commit.

use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::errors::AgentError;
use crate::models::{CommitRef, DeployResult};
use crate::vcs::{run_checked, CommandRunner};

/// Deploy output lines kept in the result.
const OUTPUT_TAIL_LINES: usize = 20;

pub struct Publisher<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
}

impl<'a> Publisher<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// True when the working tree has uncommitted changes.
    pub async fn has_changes(&self) -> Result<bool, AgentError> {
        let status = run_checked(
            self.runner,
            "git",
            &["status", "--porcelain"],
            self.config.repo_root(),
        )
        .await
        .map_err(AgentError::PublishFailed)?;
        Ok(!status.is_empty())
    }

    /// Stages `paths` (relative to the repository root, or everything when
    /// empty), commits and pushes to the configured remote/branch.
    pub async fn commit_and_push(
        &self,
        message: &str,
        paths: &[PathBuf],
    ) -> Result<CommitRef, AgentError> {
        self.commit(message, paths).await?;
        self.push(message).await
    }

    /// `git add` + `git commit`. An error here means no commit was made.
    pub async fn commit(&self, message: &str, paths: &[PathBuf]) -> Result<(), AgentError> {
        let repo = self.config.repo_root();

        let mut add_args = vec!["add".to_string()];
        if paths.is_empty() {
            add_args.push("--all".to_string());
        } else {
            add_args.push("--".to_string());
            add_args.extend(path_args(paths));
        }
        let add_args: Vec<&str> = add_args.iter().map(String::as_str).collect();

        run_checked(self.runner, "git", &add_args, repo)
            .await
            .map_err(AgentError::PublishFailed)?;
        run_checked(self.runner, "git", &["commit", "-m", message], repo)
            .await
            .map_err(AgentError::PublishFailed)?;
        Ok(())
    }

    /// Pushes HEAD (the commit made with `message`) to the configured
    /// remote/branch.
    pub async fn push(&self, message: &str) -> Result<CommitRef, AgentError> {
        let repo = self.config.repo_root();
        let sha = run_checked(self.runner, "git", &["rev-parse", "HEAD"], repo)
            .await
            .map_err(AgentError::PublishFailed)?;
        info!("Committed {}: {}", sha, message);

        run_checked(
            self.runner,
            "git",
            &["push", &self.config.git_remote, &self.config.git_branch],
            repo,
        )
        .await
        .map_err(AgentError::PublishFailed)?;

        let pushed_to = format!("{}/{}", self.config.git_remote, self.config.git_branch);
        info!("Pushed {} to {}", sha, pushed_to);

        Ok(CommitRef {
            sha,
            message: message.to_string(),
            pushed_to,
        })
    }

    /// Drops `paths` from the index after a failed commit. Working files are
    /// not touched.
    pub async fn unstage(&self, paths: &[PathBuf]) -> Result<(), AgentError> {
        let mut args = vec!["reset".to_string(), "--quiet".to_string(), "--".to_string()];
        args.extend(path_args(paths));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        run_checked(self.runner, "git", &args, self.config.repo_root())
            .await
            .map(|_| ())
            .map_err(AgentError::PublishFailed)
    }

    /// Runs the configured deploy command inside the repository through
    /// `sh -c`, so quoting and shell operators in DEPLOY_COMMAND work.
    pub async fn deploy(&self) -> Result<DeployResult, AgentError> {
        let command = self.config.deploy_command.trim();
        if command.is_empty() {
            return Err(AgentError::DeployFailed("deploy command is empty".to_string()));
        }

        info!("Deploying with `{}`", command);
        let output = self
            .runner
            .run("sh", &["-c", command], self.config.repo_root())
            .await
            .map_err(|e| AgentError::DeployFailed(format!("could not run `{command}`: {e}")))?;

        if !output.success() {
            return Err(AgentError::DeployFailed(format!(
                "`{command}` failed ({})",
                output.failure_summary()
            )));
        }

        let lines: Vec<&str> = output.stdout.lines().collect();
        let output_tail = lines[lines.len().saturating_sub(OUTPUT_TAIL_LINES)..].join("\n");
        info!("Deploy finished");

        Ok(DeployResult {
            command: command.to_string(),
            output_tail,
        })
    }
}

fn path_args(paths: &[PathBuf]) -> impl Iterator<Item = String> + '_ {
    paths.iter().map(|p| p.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRunner, HEAD_SHA};

    fn config() -> Config {
        Config::with_portfolio_path(PathBuf::from("/srv/site"))
    }

    #[tokio::test]
    async fn test_commit_and_push_sequence() {
        let runner = FakeRunner::new();
        let config = config();
        let paths = vec![PathBuf::from("src/Portfolio.tsx")];

        let commit = Publisher::new(&config, &runner)
            .commit_and_push("Add demo", &paths)
            .await
            .unwrap();

        assert_eq!(commit.sha, HEAD_SHA);
        assert_eq!(commit.pushed_to, "origin/main");
        assert_eq!(
            runner.calls(),
            vec![
                "git add -- src/Portfolio.tsx",
                "git commit -m Add demo",
                "git rev-parse HEAD",
                "git push origin main",
            ]
        );
    }

    #[tokio::test]
    async fn test_push_failure_is_publish_failed() {
        let runner = FakeRunner::new().fail("git push", "rejected (fetch first)");
        let config = config();

        let err = Publisher::new(&config, &runner)
            .commit_and_push("Add demo", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::PublishFailed(_)));
        assert!(runner.called("git add --all"));
    }

    #[tokio::test]
    async fn test_deploy_runs_through_shell_and_keeps_tail() {
        let stdout: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        let runner = FakeRunner::new().output("sh -c npm run deploy", &stdout);
        let config = config();

        let result = Publisher::new(&config, &runner).deploy().await.unwrap();

        assert!(runner.called("sh -c npm run deploy"));
        assert!(result.output_tail.starts_with("line 11"));
        assert!(result.output_tail.ends_with("line 30"));
    }

    #[tokio::test]
    async fn test_deploy_failure_is_deploy_failed() {
        let runner = FakeRunner::new().fail("sh -c npm run deploy", "gh-pages: permission denied");
        let config = config();

        let err = Publisher::new(&config, &runner).deploy().await.unwrap_err();

        assert!(matches!(err, AgentError::DeployFailed(msg) if msg.contains("permission denied")));
    }

    #[tokio::test]
    async fn test_deploy_command_is_passed_whole_to_shell() {
        let runner = FakeRunner::new();
        let mut config = config();
        config.deploy_command = r#"npm run deploy -- -m "x y""#.to_string();

        let result = Publisher::new(&config, &runner).deploy().await.unwrap();

        assert_eq!(runner.calls(), vec![r#"sh -c npm run deploy -- -m "x y""#]);
        assert_eq!(result.command, r#"npm run deploy -- -m "x y""#);
    }

    #[tokio::test]
    async fn test_commit_failure_never_pushes() {
        let runner = FakeRunner::new().fail("git commit", "fatal: unable to write");
        let config = config();
        let paths = vec![PathBuf::from("src/Portfolio.tsx")];
        let publisher = Publisher::new(&config, &runner);

        let err = publisher.commit("Add demo", &paths).await.unwrap_err();
        publisher.unstage(&paths).await.unwrap();

        assert!(matches!(err, AgentError::PublishFailed(msg) if msg.contains("unable to write")));
        assert!(runner.called("git reset --quiet -- src/Portfolio.tsx"));
        assert!(!runner.called("git push"));
    }
}
