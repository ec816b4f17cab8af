//! Confirmation: the single user decision in a run, which resume slot (if
//! any) the new project replaces.

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::errors::AgentError;
use crate::models::ResumeSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "slot")]
pub enum SlotChoice {
    Replace(usize),
    /// Portfolio-only update; the resume is left alone.
    Skip,
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn choose_slot(
        &self,
        slots: &[ResumeSlot],
        new_title: &str,
    ) -> Result<SlotChoice, AgentError>;
}

/// Non-interactive choice used by the server, dry runs and `--yes`: the
/// last slot (the oldest project shown) is replaced.
pub struct AutoConfirmer;

#[async_trait]
impl Confirmer for AutoConfirmer {
    async fn choose_slot(
        &self,
        slots: &[ResumeSlot],
        _new_title: &str,
    ) -> Result<SlotChoice, AgentError> {
        Ok(match slots.len() {
            0 => SlotChoice::Skip,
            n => SlotChoice::Replace(n - 1),
        })
    }
}

/// Asks on the terminal. Prompts go to stderr so stdout stays parseable.
pub struct TerminalConfirmer;

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn choose_slot(
        &self,
        slots: &[ResumeSlot],
        new_title: &str,
    ) -> Result<SlotChoice, AgentError> {
        if slots.is_empty() {
            return Ok(SlotChoice::Skip);
        }

        eprintln!("\nCurrent resume projects:");
        for (n, slot) in slots.iter().enumerate() {
            eprintln!("  {}. {}", n + 1, slot.title);
        }
        eprintln!("  0. Keep the resume as is");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            eprint!("Replace which project with '{new_title}'? [0-{}]: ", slots.len());
            let Some(line) = lines.next_line().await? else {
                return Err(AgentError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stdin closed before a resume slot was chosen",
                )));
            };
            match parse_slot_choice(&line, slots.len()) {
                Some(choice) => return Ok(choice),
                None => eprintln!("Please enter a number between 0 and {}.", slots.len()),
            }
        }
    }
}

/// `0` skips; `1..=slot_count` picks a slot (1-based on screen).
pub fn parse_slot_choice(input: &str, slot_count: usize) -> Option<SlotChoice> {
    match input.trim().parse::<usize>().ok()? {
        0 => Some(SlotChoice::Skip),
        n if n <= slot_count => Some(SlotChoice::Replace(n - 1)),
        _ => None,
    }
}
