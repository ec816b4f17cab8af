use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A backup branch created before any document is written.
/// Never mutated after creation; the publisher only references it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupHandle {
    pub branch_name: String,
    pub created_at: DateTime<Utc>,
    /// Commit the branch points at.
    pub base_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitRef {
    pub sha: String,
    pub message: String,
    pub pushed_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployResult {
    pub command: String,
    /// Last lines of the deploy command's stdout.
    pub output_tail: String,
}
