//! In-process realtime store.
//!
//! Several itineraries can share one `MemoryStore` to behave like
//! collaborators on the same database. Connectivity can be switched off and
//! writes can be made to fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};

use crate::error::{TripCalError, TripCalResult};
use crate::remote::store::RealtimeStore;

const CHANGE_BUFFER: usize = 64;

pub struct MemoryStore {
    data: Mutex<HashMap<String, Value>>,
    changes: broadcast::Sender<(String, Value)>,
    connected: watch::Sender<bool>,
    fail_writes: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        let (connected, _) = watch::channel(true);

        MemoryStore {
            data: Mutex::new(HashMap::new()),
            changes,
            connected,
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn with_value(path: &str, value: Value) -> Self {
        let store = Self::new();
        store.put(path, value);
        store
    }

    /// Current value at `path`, `Null` when absent.
    pub fn value(&self, path: &str) -> Value {
        self.data.lock().get(&normalize_path(path)).cloned().unwrap_or(Value::Null)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.send_replace(connected);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn put(&self, path: &str, value: Value) -> Value {
        let path = normalize_path(path);
        let mut data = self.data.lock();

        // Like the real database, empty containers are not stored.
        if is_empty(&value) {
            data.remove(&path);
            Value::Null
        } else {
            data.insert(path, value.clone());
            value
        }
    }

    fn ensure_connected(&self) -> TripCalResult<()> {
        if *self.connected.borrow() {
            Ok(())
        } else {
            Err(TripCalError::Transport("client is offline".into()))
        }
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn get(&self, path: &str) -> TripCalResult<Value> {
        self.ensure_connected()?;
        Ok(self.value(path))
    }

    async fn set(&self, path: &str, value: &Value) -> TripCalResult<()> {
        self.ensure_connected()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TripCalError::Transport("permission denied".into()));
        }

        let stored = self.put(path, value.clone());
        let _ = self.changes.send((normalize_path(path), stored));
        Ok(())
    }

    async fn listen(&self, path: &str) -> TripCalResult<mpsc::Receiver<Value>> {
        let path = normalize_path(path);
        let mut changes = self.changes.subscribe();
        let current = self.value(&path);

        let (tx, rx) = mpsc::channel(CHANGE_BUFFER);
        tokio::spawn(async move {
            if tx.send(current).await.is_err() {
                return;
            }

            loop {
                let (changed_path, value) = tokio::select! {
                    _ = tx.closed() => return,
                    change = changes.recv() => match change {
                        Ok(change) => change,
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => return,
                    },
                };

                if changed_path == path && tx.send(value).await.is_err() {
                    return;
                }
            }
        });

        Ok(rx)
    }

    fn connection(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
