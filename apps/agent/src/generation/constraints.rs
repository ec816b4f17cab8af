//! Post-generation rules for portfolio entries and resume bullets.
//!
//! A violation is a `Rejection::Constraint`, which earns exactly one
//! regeneration before the run fails with `ContentConstraintError`.

use crate::llm_client::retry::Rejection;
use crate::models::project::{MAX_HIGHLIGHTS, MAX_HIGHLIGHT_CHARS};
use crate::models::resume::MAX_BULLETS_PER_SLOT;
use crate::models::ResumeSlot;
use crate::text::{normalize_key, squash_whitespace};

/// Card-sized description on the portfolio page.
pub const MAX_ENTRY_DESCRIPTION_CHARS: usize = 300;
/// One printed line on the resume.
pub const MAX_BULLET_CHARS: usize = 150;

/// Strips list markers the model likes to prepend and collapses whitespace.
pub fn sanitize_line(text: &str) -> String {
    let trimmed = text
        .trim()
        .trim_start_matches(['-', '•', '*', '–'])
        .trim_start();
    squash_whitespace(trimmed)
}

pub fn check_entry(description: &str, highlights: &[String]) -> Result<(), Rejection> {
    let mut problems = Vec::new();

    let description_len = description.chars().count();
    if description_len == 0 {
        problems.push("description is empty".to_string());
    } else if description_len > MAX_ENTRY_DESCRIPTION_CHARS {
        problems.push(format!(
            "description has {description_len} characters (max {MAX_ENTRY_DESCRIPTION_CHARS})"
        ));
    }

    if highlights.is_empty() || highlights.len() > MAX_HIGHLIGHTS {
        problems.push(format!(
            "expected 1 to {MAX_HIGHLIGHTS} highlights, got {}",
            highlights.len()
        ));
    }
    for (n, highlight) in highlights.iter().enumerate() {
        let len = highlight.chars().count();
        if len > MAX_HIGHLIGHT_CHARS {
            problems.push(format!(
                "highlight {} has {len} characters (max {MAX_HIGHLIGHT_CHARS})",
                n + 1
            ));
        }
    }

    reject_if_any(problems)
}

/// Bullet rules: count within bounds, each within the length limit, no
/// duplicates within the set or against any bullet already on the resume.
pub fn check_bullets(bullets: &[String], slot_context: &[ResumeSlot]) -> Result<(), Rejection> {
    let mut problems = Vec::new();

    if bullets.is_empty() || bullets.len() > MAX_BULLETS_PER_SLOT {
        problems.push(format!(
            "expected 1 to {MAX_BULLETS_PER_SLOT} bullets, got {}",
            bullets.len()
        ));
    }

    let existing: Vec<String> = slot_context
        .iter()
        .flat_map(|slot| slot.bullets.iter())
        .map(|b| normalize_key(b))
        .collect();
    let mut seen: Vec<String> = Vec::new();

    for (n, bullet) in bullets.iter().enumerate() {
        let len = bullet.chars().count();
        if len == 0 {
            problems.push(format!("bullet {} is empty", n + 1));
            continue;
        }
        if len > MAX_BULLET_CHARS {
            problems.push(format!(
                "bullet {} has {len} characters (max {MAX_BULLET_CHARS})",
                n + 1
            ));
        }
        let key = normalize_key(bullet);
        if seen.contains(&key) {
            problems.push(format!("bullet {} repeats an earlier bullet", n + 1));
        } else if existing.contains(&key) {
            problems.push(format!("bullet {} already appears on the resume", n + 1));
        }
        seen.push(key);
    }

    reject_if_any(problems)
}

fn reject_if_any(problems: Vec<String>) -> Result<(), Rejection> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(Rejection::Constraint(problems.join("; ")))
    }
}
