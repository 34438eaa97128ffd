pub mod runner;
pub mod types;

pub use runner::{build_args, AgentRunner, ClaudeCliRunner, Invocation, KillSignal, ProcessHandle};
pub use types::*;
