//! Subprocess plumbing for git and the deploy command.
//!
//! Every external command goes through `CommandRunner`, judged by exit code
//! with stderr captured. Tests swap in a scripted runner.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

pub mod backup;
pub mod publisher;

pub use backup::BackupManager;
pub use publisher::Publisher;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short failure description: exit code plus the last stderr line
    /// (stdout when stderr is empty).
    pub fn failure_summary(&self) -> String {
        let detail = last_line(&self.stderr)
            .or_else(|| last_line(&self.stdout))
            .unwrap_or("no output");
        match self.code {
            Some(code) => format!("exit {code}: {detail}"),
            None => format!("terminated by signal: {detail}"),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str], cwd: &Path)
        -> std::io::Result<CommandOutput>;
}

/// Runs real processes via `tokio::process`.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
    ) -> std::io::Result<CommandOutput> {
        debug!("Running {} {} in {}", program, args.join(" "), cwd.display());

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs a command and maps spawn failures and non-zero exits to a message.
/// `Ok` carries the trimmed stdout.
pub async fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
    cwd: &Path,
) -> Result<String, String> {
    let command_line = format!("{} {}", program, args.join(" "));
    let output = runner
        .run(program, args, cwd)
        .await
        .map_err(|e| format!("could not run `{command_line}`: {e}"))?;

    if !output.success() {
        return Err(format!("`{command_line}` failed ({})", output.failure_summary()));
    }
    Ok(output.stdout.trim().to_string())
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).last()
}
