//! lob-sequencer
//!
//! Single-writer sequencing for one instrument's book: a tokio task owns the
//! `MatchingEngine`, every submit and cancel is queued to it and applied to
//! completion in arrival order, and readers get consistent snapshots without
//! waiting on matching. Independent instruments get independent tasks.

pub mod config;
pub mod error;
pub mod handle;
pub mod telemetry;
pub mod types;

// internal, not re-exported
mod engine_task;

pub use config::Config;
pub use error::SequencerError;
pub use handle::BookHandle;
pub use telemetry::{env_filter, init_tracing};
