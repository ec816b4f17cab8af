// Content generation: portfolio card and resume bullets from a ProjectProfile.
// All model calls go through llm_client; rules live in constraints.rs.

pub mod constraints;
pub mod generator;
pub mod prompts;

pub use generator::{entry_title, ContentGenerator};
