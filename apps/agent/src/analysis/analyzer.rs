//! Project Analyzer — turns a project directory into a `ProjectProfile`.
//!
//! Flow: resolve path → collect evidence → detect technologies →
//!       one schema-constrained completion (retried once) → normalize.
//!
//! Read-only: nothing under the project directory is ever written.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::analysis::evidence::{collect_evidence, resolve_project_dir, Evidence};
use crate::analysis::prompts::{PROFILE_PROMPT_TEMPLATE, PROFILE_SHAPE};
use crate::analysis::technologies::{detect_technologies, extend_unique, manifest_name};
use crate::errors::AgentError;
use crate::llm_client::prompts::GROUNDING_INSTRUCTION;
use crate::llm_client::retry::{complete_with_retry, Rejection};
use crate::llm_client::{extract_json, LlmBackend, ResponseSchema};
use crate::models::project::{MAX_DESCRIPTION_CHARS, MAX_HIGHLIGHTS, MAX_HIGHLIGHT_CHARS};
use crate::models::ProjectProfile;
use crate::text::{clip_chars, normalize_key, squash_whitespace};

pub const PROFILE_SCHEMA: ResponseSchema = ResponseSchema {
    name: "project_profile",
    shape: PROFILE_SHAPE,
};

// ────────────────────────────────────────────────────────────────────────────
// Model output
// ────────────────────────────────────────────────────────────────────────────

/// What the model returns. Field aliases absorb the common drift in key
/// names; missing fields default to empty and are rejected below.
#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(default, alias = "summary")]
    description: String,
    #[serde(default, alias = "tech_stack", alias = "tech")]
    technologies: Vec<String>,
    #[serde(default, alias = "bullet_points", alias = "features", alias = "key_features")]
    highlights: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

pub struct ProjectAnalyzer<'a> {
    llm: &'a dyn LlmBackend,
}

impl<'a> ProjectAnalyzer<'a> {
    pub fn new(llm: &'a dyn LlmBackend) -> Self {
        Self { llm }
    }

    /// Analyzes the project at `path`.
    ///
    /// Steps:
    /// 1. resolve_project_dir() → absolute readable directory (ProjectNotFound)
    /// 2. collect_evidence() → bounded evidence set (EvidenceInsufficient)
    /// 3. detect_technologies() + manifest_name() → deterministic facts
    /// 4. LLM complete → RawProfile (one retry on malformed output)
    /// 5. merge + clip → ProjectProfile
    pub async fn analyze(&self, path: &Path) -> Result<ProjectProfile, AgentError> {
        // Step 1: Resolve
        let root = resolve_project_dir(path)?;
        info!("Analyzing project at {}", root.display());

        // Step 2: Evidence
        let evidence = collect_evidence(&root)?;
        info!(
            "Collected {} evidence files ({} truncated)",
            evidence.files.len(),
            evidence.files.iter().filter(|f| f.truncated).count()
        );

        // Step 3: Deterministic facts
        let detected = detect_technologies(&evidence);
        let name = manifest_name(&evidence).unwrap_or_else(|| evidence.dir_name());
        info!("Detected technologies for '{}': {:?}", name, detected);

        // Step 4: Model call
        let prompt = build_profile_prompt(&evidence, &detected);
        let raw = complete_with_retry(self.llm, &prompt, &PROFILE_SCHEMA, |text| {
            parse_profile(text, &detected)
        })
        .await?;

        // Step 5: Normalize
        let profile = normalize_profile(name, raw, detected, root);
        info!(
            "Profile ready: '{}' ({} technologies, {} highlights)",
            profile.name,
            profile.technologies.len(),
            profile.highlights.len()
        );
        Ok(profile)
    }
}

/// Parses and sanity-checks one completion. Technologies may come from
/// detection alone, so an empty model list is only fatal when nothing was
/// detected either.
fn parse_profile(text: &str, detected: &[String]) -> Result<RawProfile, Rejection> {
    let json = extract_json(text, '{', '}')
        .ok_or_else(|| Rejection::Format("no JSON object in response".to_string()))?;
    let raw: RawProfile = serde_json::from_str(json)
        .map_err(|e| Rejection::Format(format!("invalid profile JSON: {e}")))?;

    if raw.description.trim().is_empty() {
        return Err(Rejection::Format("\"description\" is missing or empty".to_string()));
    }
    if raw.highlights.iter().all(|h| h.trim().is_empty()) {
        return Err(Rejection::Format("\"highlights\" is missing or empty".to_string()));
    }
    if detected.is_empty() && raw.technologies.iter().all(|t| t.trim().is_empty()) {
        return Err(Rejection::Format("\"technologies\" is missing or empty".to_string()));
    }
    Ok(raw)
}

fn normalize_profile(
    name: String,
    raw: RawProfile,
    detected: Vec<String>,
    root: std::path::PathBuf,
) -> ProjectProfile {
    let mut technologies = detected;
    extend_unique(&mut technologies, raw.technologies);

    let mut highlights: Vec<String> = Vec::new();
    for highlight in raw.highlights {
        let highlight = clip_chars(&squash_whitespace(&highlight), MAX_HIGHLIGHT_CHARS);
        if highlight.is_empty() {
            continue;
        }
        let key = normalize_key(&highlight);
        if highlights.iter().any(|h| normalize_key(h) == key) {
            continue;
        }
        highlights.push(highlight);
        if highlights.len() == MAX_HIGHLIGHTS {
            break;
        }
    }

    ProjectProfile {
        name,
        description: clip_chars(&squash_whitespace(&raw.description), MAX_DESCRIPTION_CHARS),
        technologies,
        highlights,
        source_path: root,
    }
}

fn build_profile_prompt(evidence: &Evidence, detected: &[String]) -> String {
    let mut body = String::new();
    for file in &evidence.files {
        body.push_str(&format!(
            "=== {} ({:?}{}) ===\n{}\n\n",
            file.path,
            file.kind,
            if file.truncated { ", truncated" } else { "" },
            file.content
        ));
    }

    let detected = if detected.is_empty() {
        "none".to_string()
    } else {
        detected.join(", ")
    };

    PROFILE_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{directory}", &evidence.dir_name())
        .replace("{detected}", &detected)
        .replace("{evidence}", body.trim_end())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{react_project, FakeLlm};

    const GOOD_PROFILE: &str = r#"{
        "description": "A small demo single-page app.",
        "technologies": ["JavaScript", "react"],
        "highlights": ["Component-based UI", "Client-side state handling"]
    }"#;

    #[tokio::test]
    async fn test_package_json_only_project_yields_react() {
        let project = react_project();
        let llm = FakeLlm::new().respond("project_profile", GOOD_PROFILE);

        let profile = ProjectAnalyzer::new(&llm).analyze(project.path()).await.unwrap();

        assert_eq!(profile.name, "demo");
        assert_eq!(profile.technologies, vec!["React", "JavaScript"]);
        assert!(!profile.highlights.is_empty());
        assert!(profile.source_path.is_absolute());
        assert_eq!(llm.calls("project_profile"), 1);
        assert!(llm.prompts("project_profile")[0].contains("package.json"));
    }

    #[tokio::test]
    async fn test_malformed_twice_is_generation_format_error() {
        let project = react_project();
        let llm = FakeLlm::new()
            .respond("project_profile", "I think this is a React app.")
            .respond("project_profile", r#"{"description": ""}"#);

        let err = ProjectAnalyzer::new(&llm)
            .analyze(project.path())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::GenerationFormat(_)));
        assert_eq!(llm.calls("project_profile"), 2);
    }

    #[tokio::test]
    async fn test_missing_path_never_calls_model() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = FakeLlm::new();

        let err = ProjectAnalyzer::new(&llm)
            .analyze(&tmp.path().join("missing"))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ProjectNotFound(_)));
        assert_eq!(llm.calls("project_profile"), 0);
    }

    #[tokio::test]
    async fn test_highlights_are_deduplicated_and_capped() {
        let project = react_project();
        let llm = FakeLlm::new().respond(
            "project_profile",
            r#"{"summary": "Demo.", "tech": [], "bullet_points": ["One", "one", "Two", "Three", "Four", "Five"]}"#,
        );

        let profile = ProjectAnalyzer::new(&llm).analyze(project.path()).await.unwrap();

        assert_eq!(profile.description, "Demo.");
        assert_eq!(profile.highlights, vec!["One", "Two", "Three", "Four"]);
        assert_eq!(profile.technologies, vec!["React"]);
    }
}
