//! Cloneable front door to one book's engine task.

use std::sync::Arc;

use lob_core::{
    BookSnapshot, Cancelled, DepthSnapshot, EngineError, MatchingEngine, NewOrder, OrderId,
    Price, Quantity, Side, SubmitResult,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::engine_task;
use crate::error::SequencerError;
use crate::types::{EngineRequest, EngineTx, SnapshotRx};

/// Handle to a running engine task.
///
/// Mutations (`submit*`, `cancel*`) are queued to the task and applied one at
/// a time. Reads (`snapshot`, `depth`) copy the most recently published depth
/// and never wait for the engine.
///
/// The task stops once every clone of the handle has been dropped.
#[derive(Debug, Clone)]
pub struct BookHandle {
    symbol: Arc<str>,
    requests: EngineTx,
    snapshots: SnapshotRx,
}

impl BookHandle {
    /// Spawn an engine task for a fresh book. Must be called from within a
    /// tokio runtime.
    pub fn spawn(config: &Config) -> (Self, JoinHandle<MatchingEngine>) {
        Self::spawn_with(MatchingEngine::new(config.symbol.as_str()), config)
    }

    /// Spawn an engine task around an existing engine.
    pub fn spawn_with(engine: MatchingEngine, config: &Config) -> (Self, JoinHandle<MatchingEngine>) {
        let (requests, engine_rx) = mpsc::channel(config.channel_capacity);
        let (snapshot_tx, snapshots) = watch::channel(engine.depth(config.depth_levels));
        let symbol: Arc<str> = Arc::from(engine.symbol());

        let task = tokio::spawn(engine_task::run_engine_loop(
            engine,
            engine_rx,
            snapshot_tx,
            config.depth_levels,
        ));

        let handle = BookHandle {
            symbol,
            requests,
            snapshots,
        };
        (handle, task)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Submit a limit order with an engine-assigned id.
    pub async fn submit_order(
        &self,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Result<SubmitResult, SequencerError> {
        self.submit(NewOrder::limit(side, price, quantity)).await
    }

    pub async fn submit(&self, order: NewOrder) -> Result<SubmitResult, SequencerError> {
        let (reply, response) = oneshot::channel();
        self.send(EngineRequest::Submit { order, reply }).await?;
        let result = response.await.map_err(|_| SequencerError::Closed)?;
        Ok(result?)
    }

    pub async fn cancel(&self, order_id: OrderId) -> Result<Cancelled, SequencerError> {
        let (reply, response) = oneshot::channel();
        self.send(EngineRequest::Cancel { order_id, reply }).await?;
        let result = response.await.map_err(|_| SequencerError::Closed)?;
        Ok(result?)
    }

    /// `Ok(true)` if a resting order was cancelled, `Ok(false)` if there was
    /// nothing resting under that id.
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<bool, SequencerError> {
        match self.cancel(order_id).await {
            Ok(_) => Ok(true),
            Err(SequencerError::Engine(EngineError::NotFound(_) | EngineError::AlreadyFilled(_))) => {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Best bid / best ask as of the last completed request.
    pub fn snapshot(&self) -> BookSnapshot {
        self.snapshots.borrow().top()
    }

    /// Published depth as of the last completed request.
    pub fn depth(&self) -> DepthSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait for the next change to the published depth.
    pub async fn changed(&mut self) -> Result<DepthSnapshot, SequencerError> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| SequencerError::Closed)?;
        Ok(self.snapshots.borrow_and_update().clone())
    }

    /// A receiver for readers that only need snapshots.
    pub fn subscribe(&self) -> SnapshotRx {
        self.snapshots.clone()
    }

    async fn send(&self, req: EngineRequest) -> Result<(), SequencerError> {
        self.requests
            .send(req)
            .await
            .map_err(|_| SequencerError::Closed)
    }
}
