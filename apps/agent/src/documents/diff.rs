//! Line diff for dry-run previews.
//!
//! Edits made by the mutator are single contiguous blocks, so trimming the
//! common prefix and suffix yields an exact hunk.

use serde::Serialize;

/// Unchanged lines shown around a hunk.
const CONTEXT_LINES: usize = 2;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentDiff {
    pub path: String,
    pub diff: String,
}

impl DocumentDiff {
    pub fn new(path: &str, before: &str, after: &str) -> Self {
        Self {
            path: path.to_string(),
            diff: unified(path, before, after),
        }
    }
}

/// Unified-style diff with a single hunk. Empty when the texts are equal.
pub fn unified(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let old: Vec<&str> = before.lines().collect();
    let new: Vec<&str> = after.lines().collect();

    let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let start = prefix.saturating_sub(CONTEXT_LINES);
    let old_end = old.len() - suffix;
    let new_end = new.len() - suffix;
    let tail = (old_end + CONTEXT_LINES).min(old.len());

    let mut out = format!("--- a/{path}\n+++ b/{path}\n");
    out.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        start + 1,
        tail - start,
        start + 1,
        tail - start + new_end - old_end
    ));
    for line in &old[start..prefix] {
        out.push_str(&format!(" {line}\n"));
    }
    for line in &old[prefix..old_end] {
        out.push_str(&format!("-{line}\n"));
    }
    for line in &new[prefix..new_end] {
        out.push_str(&format!("+{line}\n"));
    }
    for line in &old[old_end..tail] {
        out.push_str(&format!(" {line}\n"));
    }
    out
}
