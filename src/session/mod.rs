pub mod tracker;
pub mod types;

pub use tracker::SessionTracker;
pub use types::*;
