//! Errors surfaced by [`BookHandle`](crate::BookHandle).

use lob_core::EngineError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    /// The engine processed the request and refused it.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The engine task is gone, so the request was not processed.
    #[error("engine task has stopped")]
    Closed,
}
