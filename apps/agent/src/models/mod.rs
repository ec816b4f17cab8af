pub mod backup;
pub mod project;
pub mod resume;

pub use backup::{BackupHandle, CommitRef, DeployResult};
pub use project::{PortfolioEntry, ProjectProfile};
pub use resume::{ResumeSlot, RESUME_SLOT_COUNT};
