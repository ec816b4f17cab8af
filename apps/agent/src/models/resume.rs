use serde::{Deserialize, Serialize};

/// Number of project slots on the single-page resume.
pub const RESUME_SLOT_COUNT: usize = 3;

/// Bullets a slot may hold and still fit the page.
pub const MAX_BULLETS_PER_SLOT: usize = 3;

/// A project slot on the resume. Replacing a slot overwrites both fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResumeSlot {
    pub title: String,
    pub bullets: Vec<String>,
}
