//! Central engine loop.
//!
//! This task owns the `MatchingEngine` and is the only writer to its book.
//! Requests are handled strictly one at a time: a submit runs its whole
//! matching loop (which never awaits) before the next request, cancels
//! included, is taken off the queue.
//!
//! After each request the new depth is published to the watch channel
//! *before* the reply is sent, so a caller that has its reply always sees a
//! snapshot at least as new as its own operation.

use lob_core::MatchingEngine;
use tracing::{debug, info};

use crate::types::{EngineRequest, EngineRx, SnapshotTx};

/// Run the engine loop until every handle is dropped, then hand the engine
/// back.
pub(crate) async fn run_engine_loop(
    mut engine: MatchingEngine,
    mut engine_rx: EngineRx,
    snapshots: SnapshotTx,
    depth_levels: usize,
) -> MatchingEngine {
    info!(symbol = engine.symbol(), "engine loop started");

    while let Some(req) = engine_rx.recv().await {
        match req {
            EngineRequest::Submit { order, reply } => {
                let result = engine.submit(order);
                if let Err(err) = &result {
                    debug!(symbol = engine.symbol(), %err, "submit rejected");
                }
                publish(&engine, &snapshots, depth_levels);
                // The caller may have given up waiting; the order stands.
                let _ = reply.send(result);
            }
            EngineRequest::Cancel { order_id, reply } => {
                let result = engine.cancel(order_id);
                publish(&engine, &snapshots, depth_levels);
                let _ = reply.send(result);
            }
        }
    }

    info!(symbol = engine.symbol(), "engine loop shutting down (request channel closed)");
    engine
}

/// Replace the published depth, waking readers only if it changed.
fn publish(engine: &MatchingEngine, snapshots: &SnapshotTx, depth_levels: usize) {
    let depth = engine.depth(depth_levels);
    snapshots.send_if_modified(|current| {
        if *current == depth {
            false
        } else {
            *current = depth;
            true
        }
    });
}
