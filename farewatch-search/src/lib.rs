pub mod phase;
pub mod snapshot;
pub mod orchestrator;

pub use orchestrator::SearchOrchestrator;
pub use phase::{SearchError, SearchEvent, SearchPhase};
pub use snapshot::SearchSnapshot;
