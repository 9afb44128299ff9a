//! Shared WebSocket adapter state.
//!
//! WebSocket entry points depend on the snapshot channel and the
//! notification source, never on concrete infrastructure, so the adapter
//! stays testable with deterministic doubles.

use std::sync::Arc;

use crate::domain::SnapshotReceiver;
use crate::domain::ports::NotificationSource;

/// Dependency bundle for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    /// Current board snapshot, fed by the reconciler.
    pub board: SnapshotReceiver,
    /// Per-user notification streams.
    pub notifications: Arc<dyn NotificationSource>,
}

impl WsState {
    /// Construct state from explicit dependencies.
    pub fn new(board: SnapshotReceiver, notifications: Arc<dyn NotificationSource>) -> Self {
        Self {
            board,
            notifications,
        }
    }
}
