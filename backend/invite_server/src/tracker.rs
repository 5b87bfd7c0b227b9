//! Background task that drains tracking records into SQLite.
//!
//! Handlers never wait on it: [`ChannelSink`] pushes into an unbounded
//! channel and forgets. The single consumer serializes every write, so the
//! capped log needs no locking.

use std::sync::Arc;

use invite_core::tracking::{TrackRecord, TrackingSink};
use sqlx::SqlitePool;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info};

use crate::db;

pub struct TrackerState {
    pub pool: SqlitePool,
    pub cap: usize,
}

/// [`TrackingSink`] that hands records to the background task.
#[derive(Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<TrackRecord>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<TrackRecord>) -> Self {
        Self { tx }
    }
}

impl TrackingSink for ChannelSink {
    fn append(&mut self, record: TrackRecord) {
        if self.tx.send(record).is_err() {
            debug!("Tracker stopped, record dropped");
        }
    }
}

pub fn channel() -> (ChannelSink, UnboundedReceiver<TrackRecord>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink::new(tx), rx)
}

/// Run until every sender is gone.
pub async fn run(state: Arc<TrackerState>, mut rx: UnboundedReceiver<TrackRecord>) {
    info!("Tracker starting — keeping {} records", state.cap);

    while let Some(record) = rx.recv().await {
        if let Err(e) = db::insert_tracking(&state.pool, &record, state.cap).await {
            error!("Tracking write failed: {e}");
        }
    }

    info!("Tracker stopped");
}
