pub mod history;
pub mod orchestrator;
pub mod types;

pub use history::HistoryLedger;
pub use orchestrator::{JobCompletion, Orchestrator, OrchestratorConfig};
pub use types::*;
