//! Document Mutator — structural edits to the portfolio source and the
//! HTML resume.
//!
//! The edit functions are pure (`&str` in, `String` out) and reject rather
//! than repeat an edit. Writing is separate: `apply_writes` persists a
//! planned set of edits, one atomic rename per document.

use std::path::PathBuf;

use regex::Regex;
use tracing::{error, info};

use crate::errors::AgentError;

pub mod atomic;
pub mod diff;
pub mod portfolio;
pub mod resume;
pub mod scan;

pub use diff::DocumentDiff;
pub use portfolio::{insert_portfolio_entry, list_entries, ListedEntry};
pub use resume::{list_slots, replace_resume_slot};

/// Compiles one of the module's fixed patterns.
pub(crate) fn pattern(source: &str) -> Result<Regex, AgentError> {
    Regex::new(source)
        .map_err(|e| AgentError::MalformedDocument(format!("invalid document pattern: {e}")))
}

/// One document's planned edit.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub path: PathBuf,
    /// Path shown in diffs and commit staging, relative to the repository.
    pub display_path: PathBuf,
    pub before: String,
    pub after: String,
}

impl PendingWrite {
    /// The write that puts the document back the way it was.
    pub fn reverted(&self) -> PendingWrite {
        PendingWrite {
            path: self.path.clone(),
            display_path: self.display_path.clone(),
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }

    pub fn diff(&self) -> DocumentDiff {
        DocumentDiff::new(
            &self.display_path.to_string_lossy(),
            &self.before,
            &self.after,
        )
    }
}

/// Writes every planned document. If a later write fails, documents already
/// written are restored to their previous contents (best effort) before the
/// error is returned.
pub fn apply_writes(writes: &[PendingWrite]) -> Result<(), AgentError> {
    for (n, write) in writes.iter().enumerate() {
        if let Err(e) = atomic::write_atomic(&write.path, &write.after) {
            for done in &writes[..n] {
                if let Err(restore) = atomic::write_atomic(&done.path, &done.before) {
                    error!("Could not restore {}: {restore}", done.path.display());
                }
            }
            return Err(AgentError::Io(e));
        }
        info!("Wrote {}", write.display_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_second_write_restores_first() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("a.tsx");
        std::fs::write(&first, "before").unwrap();

        let writes = vec![
            PendingWrite {
                path: first.clone(),
                display_path: "a.tsx".into(),
                before: "before".into(),
                after: "after".into(),
            },
            PendingWrite {
                path: tmp.path().join("missing/b.html"),
                display_path: "missing/b.html".into(),
                before: String::new(),
                after: "x".into(),
            },
        ];

        let err = apply_writes(&writes).unwrap_err();
        assert!(matches!(err, AgentError::Io(_)));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "before");
    }
}
