// Shared prompt constants.
// Each stage that calls the model defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to a prompt on the single retry after malformed output.
pub const STRICT_SCHEMA_REMINDER: &str = "\
    REMINDER: your previous answer could not be parsed. \
    Return ONLY the JSON value described above, with every required field present \
    and no other text before or after it.";

/// Keeps generated prose factual and plain for automated resume screeners.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Every claim must be traceable to the project evidence provided. \
    Do NOT invent metrics, users, or features that the evidence does not support. \
    Write plain text only: no markdown, no emoji, no HTML.";
