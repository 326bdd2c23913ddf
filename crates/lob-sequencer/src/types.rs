//! Shared types for the sequencer.
//!
//! This module defines:
//! - `EngineRequest`: mutations flowing from handles to the engine task
//! - channel aliases between handles and the engine task

use lob_core::{Cancelled, DepthSnapshot, EngineError, NewOrder, OrderId, SubmitResult};
use tokio::sync::{mpsc, oneshot, watch};

/// A mutating request for the engine task, carrying its reply channel.
#[derive(Debug)]
pub enum EngineRequest {
    Submit {
        order: NewOrder,
        reply: oneshot::Sender<Result<SubmitResult, EngineError>>,
    },
    Cancel {
        order_id: OrderId,
        reply: oneshot::Sender<Result<Cancelled, EngineError>>,
    },
}

/// Channel from handles → engine task. Bounded, so a flood of submitters
/// waits instead of growing the queue without limit.
pub type EngineTx = mpsc::Sender<EngineRequest>;
pub type EngineRx = mpsc::Receiver<EngineRequest>;

/// Latest published depth, engine task → readers.
pub type SnapshotTx = watch::Sender<DepthSnapshot>;
pub type SnapshotRx = watch::Receiver<DepthSnapshot>;
