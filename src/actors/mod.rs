//! Actor implementations for the search pipeline
//!
//! The state owner is the single actor of the pipeline: it serializes every
//! mutation of the observable state.

pub mod messages;
pub mod state_owner;

pub use messages::{FetchOutcome, PipelineMessage};
pub use state_owner::StateOwner;
