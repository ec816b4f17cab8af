//! Pipeline Controller — the state machine behind every update run.
//!
//! Idle → Analyzing → Generating → AwaitingConfirmation → BackingUp →
//! Mutating → Publishing → Done, with Aborted reachable from any
//! non-terminal state. The run mode decides where a run stops:
//! `analyze-only` after Generating, `dry-run` after the slot decision (with
//! diffs), `auto` after Publishing.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::{inspect, ProjectAnalyzer, ProjectInfo};
use crate::config::Config;
use crate::documents::portfolio::contains_title;
use crate::documents::{
    apply_writes, insert_portfolio_entry, list_entries, list_slots, replace_resume_slot,
    DocumentDiff, ListedEntry, PendingWrite,
};
use crate::errors::AgentError;
use crate::generation::{entry_title, ContentGenerator};
use crate::models::{
    BackupHandle, CommitRef, DeployResult, PortfolioEntry, ProjectProfile, ResumeSlot,
};
use crate::state::AppState;
use crate::vcs::{BackupManager, Publisher};

pub mod confirm;

pub use confirm::{AutoConfirmer, Confirmer, SlotChoice, TerminalConfirmer};

// ────────────────────────────────────────────────────────────────────────────
// Modes, states, errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Analyze, generate, confirm, back up, write, commit, push and deploy.
    Auto,
    /// Everything up to the slot decision; returns diffs, writes nothing.
    DryRun,
    /// Analyze and generate only.
    AnalyzeOnly,
}

impl RunMode {
    /// Accepts `dry-run`, `dry_run` and `DRY-RUN` alike.
    pub fn parse(value: &str) -> Option<Self> {
        <Self as clap::ValueEnum>::from_str(&value.replace('_', "-"), true).ok()
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunMode::Auto => "auto",
            RunMode::DryRun => "dry-run",
            RunMode::AnalyzeOnly => "analyze-only",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Analyzing,
    Generating,
    AwaitingConfirmation,
    BackingUp,
    Mutating,
    Publishing,
    Done,
    Aborted,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineState::Idle => "idle",
            PipelineState::Analyzing => "analyzing",
            PipelineState::Generating => "generating",
            PipelineState::AwaitingConfirmation => "awaiting_confirmation",
            PipelineState::BackingUp => "backing_up",
            PipelineState::Mutating => "mutating",
            PipelineState::Publishing => "publishing",
            PipelineState::Done => "done",
            PipelineState::Aborted => "aborted",
        })
    }
}

/// A run aborted in `stage`.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: PipelineState,
    #[source]
    pub source: AgentError,
}

// ────────────────────────────────────────────────────────────────────────────
// Reports
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub final_state: PipelineState,
    pub transitions: Vec<PipelineState>,
    pub profile: ProjectProfile,
    pub entry: PortfolioEntry,
    pub bullets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_choice: Option<SlotChoice>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diffs: Vec<DocumentDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy: Option<DeployResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    /// `None` when the tree was already clean.
    pub commit: Option<CommitRef>,
    pub deploy: DeployResult,
}

/// Both documents as read at the start of generation.
struct Documents {
    portfolio: String,
    resume: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

pub struct PipelineController<'a> {
    state: &'a AppState,
    confirmer: &'a dyn Confirmer,
    current: PipelineState,
    transitions: Vec<PipelineState>,
}

impl<'a> PipelineController<'a> {
    pub fn new(state: &'a AppState, confirmer: &'a dyn Confirmer) -> Self {
        Self {
            state,
            confirmer,
            current: PipelineState::Idle,
            transitions: vec![PipelineState::Idle],
        }
    }

    pub fn transitions(&self) -> &[PipelineState] {
        &self.transitions
    }

    fn enter(&mut self, next: PipelineState) {
        info!("Pipeline: {} → {}", self.current, next);
        self.current = next;
        self.transitions.push(next);
    }

    fn abort(&mut self, source: AgentError) -> PipelineError {
        let stage = self.current;
        warn!("Aborted during {stage}: {} ({})", source, source.kind());
        self.enter(PipelineState::Aborted);
        PipelineError { stage, source }
    }

    fn reset(&mut self) {
        self.current = PipelineState::Idle;
        self.transitions = vec![PipelineState::Idle];
    }

    /// Runs the pipeline for the project at `path`.
    pub async fn run(&mut self, path: &Path, mode: RunMode) -> Result<RunReport, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id, %mode);
        self.run_inner(run_id, path, mode).instrument(span).await
    }

    async fn run_inner(
        &mut self,
        run_id: Uuid,
        path: &Path,
        mode: RunMode,
    ) -> Result<RunReport, PipelineError> {
        self.reset();
        let state = self.state;
        let config = &state.config;
        info!("Starting {} run for {}", mode, path.display());

        // Analyzing
        self.enter(PipelineState::Analyzing);
        let profile = ProjectAnalyzer::new(state.llm.as_ref())
            .analyze(path)
            .await
            .map_err(|e| self.abort(e))?;

        // Generating
        self.enter(PipelineState::Generating);
        let documents = match mode {
            RunMode::AnalyzeOnly => None,
            _ => Some(read_documents(config).map_err(|e| self.abort(e))?),
        };
        let slots = match &documents {
            Some(docs) => self
                .check_not_listed(&docs.portfolio, &profile)
                .and_then(|_| list_slots(&docs.resume))
                .map_err(|e| self.abort(e))?,
            None => current_slots_best_effort(config),
        };

        let generator = ContentGenerator::new(state.llm.as_ref());
        let entry = generator
            .generate_portfolio_entry(&profile)
            .await
            .map_err(|e| self.abort(e))?;
        let bullets = generator
            .generate_resume_bullets(&profile, &slots)
            .await
            .map_err(|e| self.abort(e))?;

        let mut report = RunReport {
            run_id,
            mode,
            final_state: PipelineState::Done,
            transitions: Vec::new(),
            profile,
            entry,
            bullets,
            slot_choice: None,
            diffs: Vec::new(),
            backup: None,
            commit: None,
            deploy: None,
        };

        let Some(documents) = documents else {
            return Ok(self.finish(report));
        };

        // AwaitingConfirmation
        self.enter(PipelineState::AwaitingConfirmation);
        let confirmer: &dyn Confirmer = match mode {
            RunMode::DryRun => &AutoConfirmer,
            _ => self.confirmer,
        };
        let choice = confirmer
            .choose_slot(&slots, &report.entry.title)
            .await
            .map_err(|e| self.abort(e))?;
        info!("Resume slot decision: {:?}", choice);
        report.slot_choice = Some(choice);

        // Plan both edits before any backup branch exists.
        let writes = plan_writes(config, &documents, &report.entry, &report.bullets, choice)
            .map_err(|e| self.abort(e))?;
        report.diffs = writes.iter().map(PendingWrite::diff).collect();

        if mode == RunMode::DryRun {
            return Ok(self.finish(report));
        }

        // BackingUp
        self.enter(PipelineState::BackingUp);
        let backup = BackupManager::new(config, state.runner.as_ref())
            .create_backup()
            .await
            .map_err(|e| self.abort(e))?;
        report.backup = Some(backup);

        // Mutating
        self.enter(PipelineState::Mutating);
        apply_writes(&writes).map_err(|e| self.abort(e))?;

        // Publishing
        self.enter(PipelineState::Publishing);
        let publisher = Publisher::new(config, state.runner.as_ref());
        let paths: Vec<PathBuf> = writes.iter().map(|w| w.display_path.clone()).collect();
        let message = format!("Add {} to portfolio", report.entry.title);
        if let Err(e) = publisher.commit(&message, &paths).await {
            restore_documents(&publisher, &writes, &paths).await;
            return Err(self.abort(e));
        }
        let commit = publisher.push(&message).await.map_err(|e| self.abort(e))?;
        report.commit = Some(commit);
        let deploy = publisher.deploy().await.map_err(|e| self.abort(e))?;
        report.deploy = Some(deploy);

        Ok(self.finish(report))
    }

    fn finish(&mut self, mut report: RunReport) -> RunReport {
        self.enter(PipelineState::Done);
        report.final_state = self.current;
        report.transitions = self.transitions.clone();
        info!("Run {} finished", report.run_id);
        report
    }

    /// Existing-project check: the new title must not already be listed.
    fn check_not_listed(
        &self,
        portfolio: &str,
        profile: &ProjectProfile,
    ) -> Result<(), AgentError> {
        let title = entry_title(profile);
        if contains_title(&list_entries(portfolio)?, &title) {
            return Err(AgentError::DuplicateEntry(format!(
                "'{title}' is already in the portfolio"
            )));
        }
        Ok(())
    }

    /// Commits pending changes (if any) and runs the deploy command.
    pub async fn deploy(&mut self, commit_message: &str) -> Result<DeployReport, PipelineError> {
        self.reset();
        let state = self.state;
        let publisher = Publisher::new(&state.config, state.runner.as_ref());

        self.enter(PipelineState::Publishing);
        let commit = match publisher.has_changes().await.map_err(|e| self.abort(e))? {
            true => Some(
                publisher
                    .commit_and_push(commit_message, &[])
                    .await
                    .map_err(|e| self.abort(e))?,
            ),
            false => {
                info!("Working tree clean, deploying without a new commit");
                None
            }
        };
        let deploy = publisher.deploy().await.map_err(|e| self.abort(e))?;
        self.enter(PipelineState::Done);

        Ok(DeployReport { commit, deploy })
    }

    /// Portfolio entries in document order.
    pub fn list_projects(&self) -> Result<Vec<ListedEntry>, AgentError> {
        let text = std::fs::read_to_string(self.state.config.portfolio_document())?;
        list_entries(&text)
    }

    /// Read-only inspection of a project directory.
    pub fn project_info(&self, path: &Path) -> Result<ProjectInfo, AgentError> {
        inspect(path)
    }
}

fn read_documents(config: &Config) -> Result<Documents, AgentError> {
    Ok(Documents {
        portfolio: std::fs::read_to_string(config.portfolio_document())?,
        resume: std::fs::read_to_string(config.resume_document())?,
    })
}

/// Resume slots for analyze-only runs, which must work without a portfolio
/// checkout. Unreadable documents mean no context.
fn current_slots_best_effort(config: &Config) -> Vec<ResumeSlot> {
    std::fs::read_to_string(config.resume_document())
        .map_err(AgentError::from)
        .and_then(|text| list_slots(&text))
        .unwrap_or_else(|e| {
            warn!("Resume not readable, generating without slot context: {e}");
            Vec::new()
        })
}

/// Undoes a mutation that never made it into a commit: documents go back
/// to their pre-run text and leave the index, so the tree is clean again.
async fn restore_documents(
    publisher: &Publisher<'_>,
    writes: &[PendingWrite],
    paths: &[PathBuf],
) {
    let reverted: Vec<PendingWrite> = writes.iter().map(PendingWrite::reverted).collect();
    match apply_writes(&reverted) {
        Ok(()) => info!("Restored {} documents after failed commit", reverted.len()),
        Err(e) => error!("Could not restore documents after failed commit: {e}"),
    }
    if let Err(e) = publisher.unstage(paths).await {
        warn!("Could not unstage documents: {e}");
    }
}

/// Computes the new document texts. Pure: nothing is written here.
fn plan_writes(
    config: &Config,
    documents: &Documents,
    entry: &PortfolioEntry,
    bullets: &[String],
    choice: SlotChoice,
) -> Result<Vec<PendingWrite>, AgentError> {
    let mut writes = vec![PendingWrite {
        path: config.portfolio_document(),
        display_path: config.portfolio_file.clone(),
        before: documents.portfolio.clone(),
        after: insert_portfolio_entry(&documents.portfolio, entry)?,
    }];

    if let SlotChoice::Replace(index) = choice {
        let slot = ResumeSlot {
            title: entry.title.clone(),
            bullets: bullets.to_vec(),
        };
        writes.push(PendingWrite {
            path: config.resume_document(),
            display_path: config.resume_file.clone(),
            before: documents.resume.clone(),
            after: replace_resume_slot(&documents.resume, index, &slot)?,
        });
    }
    Ok(writes)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
