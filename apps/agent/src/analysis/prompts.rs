// Prompt constants for project analysis.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Project profile prompt template.
/// Replace: {grounding_instruction}, {directory}, {detected}, {evidence}
pub const PROFILE_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

You are analyzing a software project so it can be presented on a developer's
portfolio website and resume. Read the project evidence below and describe the
project.

Return a JSON object with this EXACT schema (no extra fields):
{
  "description": "Two or three sentences on what the project does and for whom.",
  "technologies": ["Languages, frameworks and tools actually used"],
  "highlights": ["Concrete feature or engineering achievement, one per item"]
}

Rules:
- "description": plain prose, at most 400 characters.
- "technologies": proper names ("React", not "react"); only what the evidence shows.
- "highlights": 2 to 4 items, each a single sentence under 160 characters.

PROJECT DIRECTORY: {directory}
TECHNOLOGIES DETECTED FROM MANIFESTS: {detected}

PROJECT EVIDENCE:
{evidence}"#;

/// Literal shape given to the backend alongside the system prompt.
pub const PROFILE_SHAPE: &str =
    r#"{"description": "string", "technologies": ["string"], "highlights": ["string"]}"#;
