//! The realtime database seen by the sync adapter.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::error::TripCalResult;

/// A JSON tree addressed by slash-separated paths, with live updates.
///
/// Absent paths read as `Value::Null`. Writes replace the whole value at a
/// path; there is no partial update.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Single point-in-time read.
    async fn get(&self, path: &str) -> TripCalResult<Value>;

    /// Replace the value stored at `path`.
    async fn set(&self, path: &str, value: &Value) -> TripCalResult<()>;

    /// Stream of full snapshots of `path`: the current value first, then one
    /// per change made by any client. Dropping the receiver ends the stream.
    async fn listen(&self, path: &str) -> TripCalResult<mpsc::Receiver<Value>>;

    /// Transport-level connectivity, distinct from data updates.
    fn connection(&self) -> watch::Receiver<bool>;
}
