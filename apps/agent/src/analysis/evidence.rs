//! Evidence collection — the bounded, prioritized file set the analyzer sends
//! to the model.
//!
//! Priority: manifests, then the README, then a handful of top-level source
//! files. Each file is cut to a byte budget so the prompt stays bounded no
//! matter how large the project is. Manifests are also kept whole (up to
//! `MANIFEST_PARSE_LIMIT`) for technology detection.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::errors::AgentError;

pub const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "requirements.txt",
    "setup.py",
    "go.mod",
    "pom.xml",
];

pub const README_FILES: &[&str] = &[
    "README.md",
    "readme.md",
    "Readme.md",
    "README.txt",
    "README",
];

pub const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "jsx", "ts", "tsx", "rs", "go", "java", "c", "cpp",
];

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "build",
    "dist",
    "target",
    "__pycache__",
    "venv",
    ".venv",
    ".git",
    ".next",
];

const MANIFEST_BYTE_BUDGET: usize = 5000;
/// Largest manifest read for parsing. Bigger ones are parsed from a prefix.
const MANIFEST_PARSE_LIMIT: usize = 256 * 1024;
const README_BYTE_BUDGET: usize = 5000;
const SOURCE_BYTE_BUDGET: usize = 1500;
const MAX_SOURCE_SAMPLES: usize = 5;
/// Root plus one level (e.g. `src/main.rs`).
const SOURCE_SCAN_DEPTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Manifest,
    Readme,
    Source,
}

impl EvidenceKind {
    fn byte_budget(self) -> usize {
        match self {
            EvidenceKind::Manifest => MANIFEST_BYTE_BUDGET,
            EvidenceKind::Readme => README_BYTE_BUDGET,
            EvidenceKind::Source => SOURCE_BYTE_BUDGET,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvidenceFile {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    pub kind: EvidenceKind,
    /// Prompt copy, cut to the kind's byte budget.
    #[serde(skip)]
    pub content: String,
    /// Untruncated text, manifests only.
    #[serde(skip)]
    pub full_text: Option<String>,
    /// Size on disk before truncation.
    pub bytes: u64,
    pub truncated: bool,
}

impl EvidenceFile {
    /// Text for parsing: the whole file when it was kept, else the prompt copy.
    pub fn parse_text(&self) -> &str {
        self.full_text.as_deref().unwrap_or(&self.content)
    }
}

#[derive(Debug, Clone)]
pub struct Evidence {
    pub root: PathBuf,
    pub files: Vec<EvidenceFile>,
}

impl Evidence {
    pub fn file(&self, path: &str) -> Option<&EvidenceFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn of_kind(&self, kind: EvidenceKind) -> impl Iterator<Item = &EvidenceFile> {
        self.files.iter().filter(move |f| f.kind == kind)
    }

    /// Fallback project name: the directory name.
    pub fn dir_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    }
}

/// Resolves `path` to an absolute, readable directory.
pub fn resolve_project_dir(path: &Path) -> Result<PathBuf, AgentError> {
    let resolved = path
        .canonicalize()
        .map_err(|e| AgentError::ProjectNotFound(format!("{}: {e}", path.display())))?;

    if !resolved.is_dir() {
        return Err(AgentError::ProjectNotFound(format!(
            "{} is not a directory",
            resolved.display()
        )));
    }

    fs::read_dir(&resolved).map_err(|e| {
        AgentError::ProjectNotFound(format!("{} is not readable: {e}", resolved.display()))
    })?;

    Ok(resolved)
}

/// Collects evidence from an already-resolved project root.
/// Fails with `EvidenceInsufficient` when nothing recognizable is found.
pub fn collect_evidence(root: &Path) -> Result<Evidence, AgentError> {
    let mut files = Vec::new();

    for name in MANIFEST_FILES {
        let path = root.join(name);
        if path.is_file() {
            push_file(&mut files, root, &path, EvidenceKind::Manifest);
        }
    }

    if let Some(readme) = README_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
    {
        push_file(&mut files, root, &readme, EvidenceKind::Readme);
    }

    let sources: Vec<PathBuf> = source_walker(root, SOURCE_SCAN_DEPTH)
        .filter(|entry| entry.file_type().is_file() && is_source_file(entry.path()))
        .map(|entry| entry.into_path())
        .take(MAX_SOURCE_SAMPLES)
        .collect();

    for path in &sources {
        push_file(&mut files, root, path, EvidenceKind::Source);
    }

    if files.is_empty() {
        return Err(AgentError::EvidenceInsufficient(format!(
            "no manifest, README or source files found in {}",
            root.display()
        )));
    }

    Ok(Evidence {
        root: root.to_path_buf(),
        files,
    })
}

/// Walks the project in file-name order, skipping excluded and hidden
/// directories. Unreadable entries are skipped.
pub fn source_walker(root: &Path, max_depth: usize) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e))
        .filter_map(|e| e.ok())
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    // The root itself may be hidden (e.g. a temp dir); only prune below it.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    EXCLUDED_DIRS.contains(&&*name) || name.starts_with('.')
}

fn push_file(files: &mut Vec<EvidenceFile>, root: &Path, path: &Path, kind: EvidenceKind) {
    match read_evidence(root, path, kind) {
        Ok(file) => files.push(file),
        Err(e) => warn!("Could not read {}: {e}", path.display()),
    }
}

/// Reads a file as (lossy) UTF-8 without loading more than it needs: the
/// prompt budget plus a few bytes, or the parse limit for manifests. The
/// prompt copy never splits a character.
fn read_evidence(root: &Path, path: &Path, kind: EvidenceKind) -> std::io::Result<EvidenceFile> {
    let budget = kind.byte_budget();
    let limit = match kind {
        EvidenceKind::Manifest => MANIFEST_PARSE_LIMIT,
        _ => budget + 4,
    };

    let file = File::open(path)?;
    let bytes = file.metadata()?.len();
    let mut raw = Vec::new();
    file.take(limit as u64).read_to_end(&mut raw)?;
    let text = String::from_utf8_lossy(&raw).into_owned();

    let truncated = bytes > budget as u64 || text.len() > budget;
    let content = if truncated {
        let mut cut = budget.min(text.len());
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}\n... (truncated)", &text[..cut])
    } else {
        text.clone()
    };

    Ok(EvidenceFile {
        path: relative_path(root, path),
        kind,
        content,
        full_text: (kind == EvidenceKind::Manifest).then_some(text),
        bytes,
        truncated,
    })
}
