//! Content Generation — portfolio entry and resume bullets from a profile.
//!
//! Flow: profile → prompt → LLM complete → parse → sanitize → constraints.
//! A response that breaks a rule is regenerated once; the second failure
//! surfaces as `ContentConstraintError` and no document is touched.

use chrono::Local;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::errors::AgentError;
use crate::generation::constraints::{check_bullets, check_entry, sanitize_line};
use crate::generation::prompts::{
    BULLETS_PROMPT_TEMPLATE, BULLETS_SHAPE, ENTRY_PROMPT_TEMPLATE, ENTRY_SHAPE,
};
use crate::llm_client::prompts::GROUNDING_INSTRUCTION;
use crate::llm_client::retry::{complete_with_retry, Rejection};
use crate::llm_client::{extract_json, strip_json_fences, LlmBackend, ResponseSchema};
use crate::models::{PortfolioEntry, ProjectProfile, ResumeSlot};

pub const ENTRY_SCHEMA: ResponseSchema = ResponseSchema {
    name: "portfolio_entry",
    shape: ENTRY_SHAPE,
};

pub const BULLETS_SCHEMA: ResponseSchema = ResponseSchema {
    name: "resume_bullets",
    shape: BULLETS_SHAPE,
};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default, alias = "summary")]
    description: String,
    #[serde(default, alias = "features", alias = "bullet_points")]
    highlights: Vec<String>,
}

/// Display title for a project. Deterministic, so re-running on the same
/// project always produces the same title and duplicate checks hold.
///
/// Slug-like names (`trail-finder`) become title case (`Trail Finder`);
/// names that already carry capitals or spaces are kept as written.
pub fn entry_title(profile: &ProjectProfile) -> String {
    let name = profile.name.trim();
    if name.chars().any(|c| c.is_uppercase() || c == ' ') {
        return name.to_string();
    }
    name.split(['-', '_', '.'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

pub struct ContentGenerator<'a> {
    llm: &'a dyn LlmBackend,
}

impl<'a> ContentGenerator<'a> {
    pub fn new(llm: &'a dyn LlmBackend) -> Self {
        Self { llm }
    }

    /// Generates the portfolio card. Technologies come from the profile
    /// unchanged; `order_key` is today's date.
    pub async fn generate_portfolio_entry(
        &self,
        profile: &ProjectProfile,
    ) -> Result<PortfolioEntry, AgentError> {
        let prompt = ENTRY_PROMPT_TEMPLATE
            .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
            .replace("{profile_json}", &profile_json(profile)?);

        let raw = complete_with_retry(self.llm, &prompt, &ENTRY_SCHEMA, parse_entry).await?;

        let entry = PortfolioEntry {
            title: entry_title(profile),
            description: raw.description,
            technologies: profile.technologies.clone(),
            highlights: raw.highlights,
            order_key: Local::now().date_naive(),
        };
        info!(
            "Generated portfolio entry '{}' ({} highlights)",
            entry.title,
            entry.highlights.len()
        );
        Ok(entry)
    }

    /// Generates resume bullets for `profile`. `slot_context` holds the
    /// resume's current slots; no bullet may duplicate one of theirs.
    pub async fn generate_resume_bullets(
        &self,
        profile: &ProjectProfile,
        slot_context: &[ResumeSlot],
    ) -> Result<Vec<String>, AgentError> {
        let existing: Vec<&str> = slot_context
            .iter()
            .flat_map(|slot| slot.bullets.iter().map(String::as_str))
            .collect();
        let existing = if existing.is_empty() {
            "none".to_string()
        } else {
            existing
                .iter()
                .map(|b| format!("- {b}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = BULLETS_PROMPT_TEMPLATE
            .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
            .replace("{profile_json}", &profile_json(profile)?)
            .replace("{existing_bullets}", &existing);

        let bullets = complete_with_retry(self.llm, &prompt, &BULLETS_SCHEMA, |text| {
            let bullets = parse_bullets(text)?;
            check_bullets(&bullets, slot_context)?;
            Ok(bullets)
        })
        .await?;

        info!("Generated {} resume bullets for '{}'", bullets.len(), profile.name);
        Ok(bullets)
    }
}

fn profile_json(profile: &ProjectProfile) -> Result<String, AgentError> {
    serde_json::to_string_pretty(&serde_json::json!({
        "name": profile.name,
        "description": profile.description,
        "technologies": profile.technologies,
        "highlights": profile.highlights,
    }))
    .map_err(|e| AgentError::GenerationFormat(format!("could not serialize profile: {e}")))
}

fn parse_entry(text: &str) -> Result<RawEntry, Rejection> {
    let json = extract_json(text, '{', '}')
        .ok_or_else(|| Rejection::Format("no JSON object in response".to_string()))?;
    let mut raw: RawEntry = serde_json::from_str(json)
        .map_err(|e| Rejection::Format(format!("invalid entry JSON: {e}")))?;

    raw.description = sanitize_line(&raw.description);
    raw.highlights = raw
        .highlights
        .iter()
        .map(|h| sanitize_line(h))
        .filter(|h| !h.is_empty())
        .collect();

    check_entry(&raw.description, &raw.highlights)?;
    Ok(raw)
}

/// Accepts `{"bullets": [...]}` or a bare array; items may be strings or
/// objects with a `text` field.
fn parse_bullets(text: &str) -> Result<Vec<String>, Rejection> {
    let cleaned = strip_json_fences(text);
    let value = serde_json::from_str::<Value>(cleaned)
        .ok()
        .or_else(|| {
            extract_json(cleaned, '{', '}').and_then(|json| serde_json::from_str(json).ok())
        })
        .or_else(|| {
            extract_json(cleaned, '[', ']').and_then(|json| serde_json::from_str(json).ok())
        })
        .ok_or_else(|| Rejection::Format("no JSON value in response".to_string()))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => ["bullets", "resume_bullets", "items"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| Rejection::Format("missing \"bullets\" array".to_string()))?,
        _ => return Err(Rejection::Format("expected a JSON object".to_string())),
    };

    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(o) => o.get("text").and_then(Value::as_str),
            _ => None,
        })
        .map(sanitize_line)
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
