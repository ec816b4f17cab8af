pub mod analyzer;
pub mod evidence;
pub mod inspect;
pub mod prompts;
pub mod technologies;

pub use analyzer::ProjectAnalyzer;
pub use inspect::{inspect, ProjectInfo};
