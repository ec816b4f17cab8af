use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Highlights kept on a profile.
pub const MAX_HIGHLIGHTS: usize = 4;
/// Per-highlight bound, shared with generated portfolio entries.
pub const MAX_HIGHLIGHT_CHARS: usize = 160;
/// Description bound so the text can be embedded into markup unchanged.
pub const MAX_DESCRIPTION_CHARS: usize = 400;

/// What the analyzer learned about a project. Immutable once produced.
///
/// Invariants: `technologies` is non-empty and free of case-insensitive
/// duplicates; `highlights` holds at most `MAX_HIGHLIGHTS` items;
/// `description` is at most `MAX_DESCRIPTION_CHARS` characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectProfile {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub highlights: Vec<String>,
    pub source_path: PathBuf,
}

/// One entry of the portfolio's `projects` list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioEntry {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub highlights: Vec<String>,
    /// Date the entry was generated. The list is newest-first, so new
    /// entries always go to the head.
    pub order_key: NaiveDate,
}
