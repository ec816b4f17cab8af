//! Backup branches: a restorable snapshot taken before any document write.

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AgentError;
use crate::models::BackupHandle;
use crate::vcs::{run_checked, CommandRunner};

pub struct BackupManager<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
}

impl<'a> BackupManager<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Creates `backup-YYYYMMDD-HHMMSS` at the current HEAD.
    ///
    /// Steps:
    /// 1. git status --porcelain → must be empty (BackupError otherwise)
    /// 2. git rev-parse HEAD → base_ref
    /// 3. git branch <name> → the snapshot
    /// 4. git push <remote> <name> → only when PUSH_BACKUP_BRANCH is set;
    ///    a failed push is logged, the local branch is still a valid backup
    pub async fn create_backup(&self) -> Result<BackupHandle, AgentError> {
        let repo = self.config.repo_root();

        // Step 1: Clean tree
        let status = run_checked(self.runner, "git", &["status", "--porcelain"], repo)
            .await
            .map_err(AgentError::Backup)?;
        if !status.is_empty() {
            let changed = status.lines().count();
            return Err(AgentError::Backup(format!(
                "working tree is not clean ({changed} changed paths); commit or stash first"
            )));
        }

        // Step 2: Base commit
        let base_ref = run_checked(self.runner, "git", &["rev-parse", "HEAD"], repo)
            .await
            .map_err(AgentError::Backup)?;

        // Step 3: Branch
        let created_at = Utc::now();
        let branch_name = format!("backup-{}", created_at.format("%Y%m%d-%H%M%S"));
        run_checked(self.runner, "git", &["branch", &branch_name], repo)
            .await
            .map_err(AgentError::Backup)?;
        info!("Created backup branch {} at {}", branch_name, base_ref);

        // Step 4: Optional push
        if self.config.push_backup_branch {
            match run_checked(
                self.runner,
                "git",
                &["push", &self.config.git_remote, &branch_name],
                repo,
            )
            .await
            {
                Ok(_) => info!("Pushed backup branch to {}", self.config.git_remote),
                Err(e) => warn!("Backup branch kept local only: {e}"),
            }
        }

        Ok(BackupHandle {
            branch_name,
            created_at,
            base_ref,
        })
    }
}
