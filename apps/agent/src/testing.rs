//! Test doubles and fixtures shared by unit tests across modules.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::config::Config;
use crate::llm_client::{LlmBackend, LlmError, ResponseSchema};
use crate::vcs::{CommandOutput, CommandRunner};

pub const HEAD_SHA: &str = "4f1c2e9a7b3d";

// ────────────────────────────────────────────────────────────────────────────
// FakeLlm
// ────────────────────────────────────────────────────────────────────────────

/// Scripted backend: one response queue per schema name. An exhausted queue
/// behaves like an unreachable service.
#[derive(Default)]
pub struct FakeLlm {
    responses: Mutex<HashMap<String, VecDeque<String>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl FakeLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, schema: &str, text: &str) -> Self {
        self.responses
            .get_mut()
            .unwrap()
            .entry(schema.to_string())
            .or_default()
            .push_back(text.to_string());
        self
    }

    pub fn calls(&self, schema: &str) -> usize {
        self.prompts(schema).len()
    }

    pub fn prompts(&self, schema: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == schema)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmBackend for FakeLlm {
    async fn complete(&self, prompt: &str, schema: &ResponseSchema) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push((schema.name.to_string(), prompt.to_string()));

        self.responses
            .lock()
            .unwrap()
            .get_mut(schema.name)
            .and_then(VecDeque::pop_front)
            .ok_or(LlmError::Unavailable { retries: 0 })
    }

    fn model(&self) -> &str {
        "fake"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FakeRunner
// ────────────────────────────────────────────────────────────────────────────

/// Records every command line and answers from prefix-matched rules.
/// Unmatched commands succeed with empty output, except `git rev-parse HEAD`
/// which answers `HEAD_SHA`.
pub struct FakeRunner {
    rules: Vec<(String, CommandOutput)>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            rules: vec![(
                "git rev-parse HEAD".to_string(),
                CommandOutput {
                    code: Some(0),
                    stdout: format!("{HEAD_SHA}\n"),
                    stderr: String::new(),
                },
            )],
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Commands starting with `prefix` succeed with `stdout`.
    pub fn output(mut self, prefix: &str, stdout: &str) -> Self {
        self.rules.insert(
            0,
            (
                prefix.to_string(),
                CommandOutput {
                    code: Some(0),
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                },
            ),
        );
        self
    }

    /// Commands starting with `prefix` exit 1 with `stderr`.
    pub fn fail(mut self, prefix: &str, stderr: &str) -> Self {
        self.rules.insert(
            0,
            (
                prefix.to_string(),
                CommandOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                },
            ),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        _cwd: &Path,
    ) -> std::io::Result<CommandOutput> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());

        Ok(self
            .rules
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or(CommandOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

pub const PORTFOLIO_TSX: &str = r#"import React from "react";
import { ProjectCard } from "./ProjectCard";

// Newest first.
const projects: Project[] = [
  {
    title: "Trail Finder",
    description: "Maps hiking trails with elevation profiles.",
    tech: ["React", "Leaflet"],
    highlights: ["Offline tile cache", "GPX import"],
    date: "2025-06-01",
  },
  {
    title: 'Budget Bot',
    description: "Telegram bot that tracks shared expenses, {even} with [brackets].",
    tech: ["Python", "SQLite"],
    highlights: ["Natural-language expense parsing"],
    date: "2024-11-20",
  },
  {
    title: `Pixel Forge`,
    /* retired demo: { not an entry } */
    description: "Sprite editor in the browser.",
    tech: ["TypeScript", "Canvas"],
    highlights: [],
    date: "2023-03-14",
  },
];

export default function Portfolio() {
  return <div>{projects.map((p) => <ProjectCard key={p.title} {...p} />)}</div>;
}
"#;

pub const RESUME_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
  <section id="projects">
    <h2>Projects</h2>
    <div class="entry project">
      <h3 class="entry-title">Trail Finder</h3>
      <ul>
        <li>Built an offline-first trail map with cached vector tiles</li>
        <li>Imported GPX tracks for 2,000+ routes</li>
      </ul>
    </div>
    <div class="entry project">
      <h3 class="entry-title">Budget Bot</h3>
      <ul>
        <li>Parsed free-text expenses with a rule-based tokenizer</li>
      </ul>
    </div>
    <div class="entry project">
      <h3 class="entry-title">Pixel Forge</h3>
      <ul>
        <li>Implemented layered sprite editing on HTML canvas</li>
        <li>Exported animations as sprite sheets</li>
      </ul>
    </div>
  </section>
</body>
</html>
"#;

/// A portfolio repository laid out at the default document paths, with a
/// `Config` pointing at it.
pub fn portfolio_site() -> (TempDir, Config) {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::with_portfolio_path(tmp.path().to_path_buf());
    std::fs::create_dir_all(config.portfolio_document().parent().unwrap()).unwrap();
    std::fs::create_dir_all(config.resume_document().parent().unwrap()).unwrap();
    std::fs::write(config.portfolio_document(), PORTFOLIO_TSX).unwrap();
    std::fs::write(config.resume_document(), RESUME_HTML).unwrap();
    (tmp, config)
}

/// A project directory holding only a React `package.json`.
pub fn react_project() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("package.json"),
        r#"{"name":"demo","dependencies":{"react":"^18.0.0"}}"#,
    )
    .unwrap();
    tmp
}

pub const PROFILE_RESPONSE: &str = r#"{
    "description": "A small demo single-page app built with React.",
    "technologies": ["JavaScript", "React"],
    "highlights": ["Component-based UI", "Client-side routing"]
}"#;

pub const ENTRY_RESPONSE: &str = r#"{
    "description": "Single-page demo app showcasing reusable React components.",
    "highlights": ["Reusable component library", "Client-side routing"]
}"#;

pub const BULLETS_RESPONSE: &str = r#"{"bullets": [
    "Built a React single-page app with reusable components",
    "Implemented client-side routing for instant navigation"
]}"#;

/// Backend answering one full analyze + generate pass.
pub fn full_run_llm() -> FakeLlm {
    FakeLlm::new()
        .respond("project_profile", PROFILE_RESPONSE)
        .respond("portfolio_entry", ENTRY_RESPONSE)
        .respond("resume_bullets", BULLETS_RESPONSE)
}
