//! Read-only project inspection for `get_project_info`. No model call.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analysis::evidence::{
    collect_evidence, relative_path, resolve_project_dir, source_walker, EvidenceFile,
};
use crate::analysis::technologies::{detect_technologies, manifest_name};
use crate::errors::AgentError;

/// Files listed in an inspection; the total is always reported.
pub const MAX_LISTED_FILES: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub path: PathBuf,
    pub technologies: Vec<String>,
    pub evidence: Vec<EvidenceFile>,
    pub files: Vec<String>,
    pub total_files: usize,
}

pub fn inspect(path: &Path) -> Result<ProjectInfo, AgentError> {
    let root = resolve_project_dir(path)?;

    let (name, technologies, evidence) = match collect_evidence(&root) {
        Ok(evidence) => (
            manifest_name(&evidence).unwrap_or_else(|| evidence.dir_name()),
            detect_technologies(&evidence),
            evidence.files,
        ),
        // An unrecognizable project is still inspectable.
        Err(AgentError::EvidenceInsufficient(_)) => (dir_name(&root), Vec::new(), Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    let mut total_files = 0;
    for entry in source_walker(&root, usize::MAX).filter(|e| e.file_type().is_file()) {
        total_files += 1;
        if files.len() < MAX_LISTED_FILES {
            files.push(relative_path(&root, entry.path()));
        }
    }

    Ok(ProjectInfo {
        name,
        path: root,
        technologies,
        evidence,
        files,
        total_files,
    })
}

fn dir_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_inspect_lists_files_and_counts_total() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("Cargo.toml"), "[package]\nname = \"rack\"\n").unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        for i in 0..60 {
            fs::write(tmp.path().join(format!("src/m{i:02}.rs")), "").unwrap();
        }
        fs::create_dir_all(tmp.path().join("target/debug")).unwrap();
        fs::write(tmp.path().join("target/debug/rack"), "bin").unwrap();

        let info = inspect(tmp.path()).unwrap();

        assert_eq!(info.name, "rack");
        assert_eq!(info.total_files, 61);
        assert_eq!(info.files.len(), MAX_LISTED_FILES);
        assert_eq!(info.files[0], "Cargo.toml");
        assert!(info.files.iter().all(|f| !f.starts_with("target")));
        assert_eq!(info.technologies, vec!["Rust"]);
    }

    #[test]
    fn test_inspect_tolerates_unrecognized_project() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("notes.txt"), "hello").unwrap();

        let info = inspect(tmp.path()).unwrap();

        assert!(info.evidence.is_empty());
        assert_eq!(info.files, vec!["notes.txt"]);
    }

    #[test]
    fn test_inspect_missing_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = inspect(&tmp.path().join("gone")).unwrap_err();
        assert!(matches!(err, AgentError::ProjectNotFound(_)));
    }
}
