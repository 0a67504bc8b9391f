pub mod diff;
mod engine;
mod state;

pub use engine::{render, CycleReport, RelayEngine};
pub use state::{FeedRegistry, FeedState};
