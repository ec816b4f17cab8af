// Prompt constants for content generation.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Portfolio entry prompt template.
/// Replace: {grounding_instruction}, {profile_json}
pub const ENTRY_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

Write the portfolio website card for the project described below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "description": "One or two sentences for a project card.",
  "highlights": ["Short, concrete highlight"]
}

Rules:
- "description": at most 300 characters, third person, no first-person "I".
- "highlights": 1 to 4 items, each under 160 characters.

PROJECT PROFILE:
{profile_json}"#;

pub const ENTRY_SHAPE: &str = r#"{"description": "string", "highlights": ["string"]}"#;

/// Resume bullets prompt template.
/// Replace: {grounding_instruction}, {profile_json}, {existing_bullets}
pub const BULLETS_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

Write ATS-friendly resume bullets for the project described below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "bullets": ["Action verb + what was built + technology + outcome"]
}

Rules:
- 2 or 3 bullets, each at most 150 characters.
- Start every bullet with a strong past-tense action verb (Built, Designed, Implemented, Automated).
- Name the key technologies; keep the wording plain so resume screeners can parse it.
- Never repeat or paraphrase a bullet from the EXISTING RESUME BULLETS list.

PROJECT PROFILE:
{profile_json}

EXISTING RESUME BULLETS:
{existing_bullets}"#;

pub const BULLETS_SHAPE: &str = r#"{"bullets": ["string"]}"#;
