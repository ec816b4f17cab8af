//! Validated completions: one automatic retry with a stricter reminder, then
//! the failure surfaces as a typed error.

use tracing::{debug, warn};

use crate::errors::AgentError;
use crate::llm_client::prompts::STRICT_SCHEMA_REMINDER;
use crate::llm_client::{LlmBackend, ResponseSchema};

/// Total model calls per validated completion (first try + one retry).
pub const MAX_ATTEMPTS: u32 = 2;

/// Why a completion was not accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Output could not be parsed into the expected shape.
    Format(String),
    /// Output parsed but broke a content rule (length, count, duplicates).
    Constraint(String),
}

impl Rejection {
    fn reminder(&self) -> String {
        match self {
            Rejection::Format(reason) => format!("{STRICT_SCHEMA_REMINDER}\nProblem: {reason}"),
            Rejection::Constraint(reason) => format!(
                "REMINDER: your previous answer broke these rules: {reason}. \
                Return a corrected answer in the same JSON shape."
            ),
        }
    }

    fn into_error(self) -> AgentError {
        match self {
            Rejection::Format(reason) => AgentError::GenerationFormat(reason),
            Rejection::Constraint(reason) => AgentError::ContentConstraint(reason),
        }
    }
}

/// Calls the backend and hands the raw text to `accept`. A rejected answer is
/// retried exactly once with a reminder appended; a second rejection becomes
/// `GenerationFormat` or `ContentConstraint` depending on its kind.
pub async fn complete_with_retry<T, F>(
    llm: &dyn LlmBackend,
    prompt: &str,
    schema: &ResponseSchema,
    mut accept: F,
) -> Result<T, AgentError>
where
    F: FnMut(&str) -> Result<T, Rejection>,
{
    let mut reminder: Option<String> = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let full_prompt = match &reminder {
            Some(reminder) => format!("{prompt}\n\n{reminder}"),
            None => prompt.to_string(),
        };

        let text = llm.complete(&full_prompt, schema).await?;
        debug!("Model response for {} (attempt {attempt}): {text}", schema.name);

        match accept(&text) {
            Ok(value) => return Ok(value),
            Err(rejection) if attempt == MAX_ATTEMPTS => {
                warn!(
                    "{} rejected on final attempt {attempt}/{MAX_ATTEMPTS}: {:?}",
                    schema.name, rejection
                );
                return Err(rejection.into_error());
            }
            Err(rejection) => {
                warn!(
                    "{} rejected on attempt {attempt}/{MAX_ATTEMPTS}, regenerating: {:?}",
                    schema.name, rejection
                );
                reminder = Some(rejection.reminder());
            }
        }
    }

    Err(AgentError::GenerationFormat(format!(
        "{} produced no answer",
        schema.name
    )))
}
