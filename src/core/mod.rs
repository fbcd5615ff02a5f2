pub mod formatter;
pub mod orchestrator;
pub mod state_machine;
pub mod write_back;

pub use orchestrator::{FetchOutcome, TokenOrchestrator};
