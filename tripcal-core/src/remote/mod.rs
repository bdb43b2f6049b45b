//! Remote sync adapter.
//!
//! Connects to the optional realtime database, performs the initial
//! load-or-seed, streams live updates, and pushes full-collection writes.
//! Whenever the database cannot be used the adapter degrades to local
//! persistence instead of failing.

pub mod firebase;
pub mod memory;
pub mod sse;
pub mod store;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::RemoteConfig;
use crate::defaults::DefaultDataset;
use crate::error::{TripCalError, TripCalResult};
use crate::event::{EventRecord, normalize_all};
use crate::local::LocalStore;

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use store::RealtimeStore;

/// Lifecycle of the adapter. Only a fresh `connect` leaves `Unavailable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Uninitialized,
    Connecting,
    Connected,
    Unavailable,
}

/// Result of a connection attempt. Being unavailable is an expected outcome,
/// not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Connection {
    Ready,
    Unavailable(Unavailable),
}

impl Connection {
    pub fn is_ready(&self) -> bool {
        matches!(self, Connection::Ready)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Unavailable {
    /// No `[remote]` section at all.
    NotConfigured,
    /// Credentials still hold template placeholders.
    Placeholder,
    /// The client could not be set up.
    InitFailed(String),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Unavailable::NotConfigured => write!(f, "no realtime database configured"),
            Unavailable::Placeholder => write!(f, "realtime database credentials are placeholders"),
            Unavailable::InitFailed(reason) => write!(f, "realtime database setup failed: {reason}"),
        }
    }
}

/// Where a write ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Remote,
    LocalFallback,
    /// Neither the remote store nor the local fallback accepted the write.
    Failed(String),
}

/// Handle to a live listener. The listener stops on `unsubscribe` or when the
/// handle is dropped.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Subscription {
            task: tokio::spawn(future),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn unsubscribe(self) {
        // Dropping aborts the task.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct RemoteSync {
    state: AdapterState,
    store: Option<Arc<dyn RealtimeStore>>,
    path: String,
    fallback: LocalStore,
}

impl RemoteSync {
    /// `fallback` receives writes the remote store refuses.
    pub fn new(fallback: LocalStore) -> Self {
        RemoteSync {
            state: AdapterState::Uninitialized,
            store: None,
            path: String::new(),
            fallback,
        }
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == AdapterState::Connected
    }

    /// Set up the Firebase client described by `config`.
    pub fn connect(&mut self, config: Option<&RemoteConfig>) -> Connection {
        self.state = AdapterState::Connecting;

        let connection = match config {
            None => Connection::Unavailable(Unavailable::NotConfigured),
            Some(config) if config.is_placeholder() => {
                Connection::Unavailable(Unavailable::Placeholder)
            }
            Some(config) => match FirebaseStore::new(config) {
                Ok(store) => return self.attach(Arc::new(store), &config.collection_path),
                Err(e) => Connection::Unavailable(Unavailable::InitFailed(e.to_string())),
            },
        };

        self.mark_unavailable(&connection);
        connection
    }

    /// Use an already constructed store, e.g. a shared `MemoryStore`.
    pub fn attach(&mut self, store: Arc<dyn RealtimeStore>, path: &str) -> Connection {
        self.state = AdapterState::Connected;
        self.store = Some(store);
        self.path = path.trim_matches('/').to_string();
        info!(path = %self.path, "Connected to realtime database");
        Connection::Ready
    }

    /// Give up on the remote store after it failed during startup.
    pub fn disconnect(&mut self, reason: &TripCalError) {
        warn!("Realtime database unusable, switching to local mode: {reason}");
        self.state = AdapterState::Unavailable;
        self.store = None;
    }

    fn mark_unavailable(&mut self, connection: &Connection) {
        self.state = AdapterState::Unavailable;
        self.store = None;

        match connection {
            Connection::Unavailable(Unavailable::InitFailed(reason)) => {
                warn!("Realtime database setup failed, using local mode: {reason}")
            }
            Connection::Unavailable(reason) => info!("Using local mode: {reason}"),
            Connection::Ready => {}
        }
    }

    fn store(&self) -> TripCalResult<&Arc<dyn RealtimeStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| TripCalError::Transport("not connected to a realtime database".into()))
    }

    /// Read the remote collection once. An empty database is seeded with the
    /// default itinerary, which is written back and returned.
    pub async fn load_once(&self, defaults: &DefaultDataset) -> TripCalResult<Vec<EventRecord>> {
        let store = self.store()?;
        let mut events = collection_from_value(store.get(&self.path).await?)?;

        if events.is_empty() {
            info!("Remote collection is empty, seeding it with default events");
            let mut seed = defaults.load().await;
            normalize_all(&mut seed);
            if !seed.is_empty() {
                self.write(&seed).await;
            }
            return Ok(seed);
        }

        if normalize_all(&mut events) {
            info!("Repairing remote events with missing ids or end times");
            self.write(&events).await;
        }

        info!(count = events.len(), "Loaded events from realtime database");
        Ok(events)
    }

    /// Deliver the remote collection now and after every change, whichever
    /// client made it.
    ///
    /// An update carrying records without ids or end times is repaired and
    /// written back, so every client settles on the same ids.
    pub async fn subscribe<F>(&self, on_change: F) -> TripCalResult<Subscription>
    where
        F: Fn(Vec<EventRecord>) + Send + Sync + 'static,
    {
        let store = self.store()?.clone();
        let path = self.path.clone();
        let mut snapshots = store.listen(&path).await?;

        Ok(Subscription::spawn(async move {
            while let Some(value) = snapshots.recv().await {
                match collection_from_value(value) {
                    Ok(mut events) => {
                        if normalize_all(&mut events) {
                            info!("Repairing remote update with missing ids or end times");
                            if let Err(e) = write_back(store.as_ref(), &path, &events).await {
                                warn!("Could not write repaired events back: {e}");
                            }
                        }
                        debug!(count = events.len(), "Remote collection changed");
                        on_change(events);
                    }
                    Err(e) => warn!("Ignoring unreadable remote update: {e}"),
                }
            }
        }))
    }

    /// Report transport connectivity now and on every change.
    pub fn subscribe_connection_state<F>(&self, on_change: F) -> TripCalResult<Subscription>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let mut connection = self.store()?.connection();

        Ok(Subscription::spawn(async move {
            let current = *connection.borrow_and_update();
            on_change(current);

            while connection.changed().await.is_ok() {
                let current = *connection.borrow_and_update();
                on_change(current);
            }
        }))
    }

    /// Replace the remote collection. Never fails: a refused write is saved
    /// locally instead.
    pub async fn write(&self, events: &[EventRecord]) -> WriteOutcome {
        let result = match (self.store(), serde_json::to_value(events)) {
            (Ok(store), Ok(value)) => store.set(&self.path, &value).await,
            (Err(e), _) => Err(e),
            (_, Err(e)) => Err(e.into()),
        };

        match result {
            Ok(()) => {
                debug!(count = events.len(), "Saved events to realtime database");
                WriteOutcome::Remote
            }
            Err(e) => {
                warn!("Saving to realtime database failed, keeping changes locally: {e}");
                match self.fallback.save_local(events) {
                    Ok(()) => WriteOutcome::LocalFallback,
                    Err(local_err) => {
                        error!("Local fallback save failed too: {local_err}");
                        WriteOutcome::Failed(local_err.to_string())
                    }
                }
            }
        }
    }
}

async fn write_back(store: &dyn RealtimeStore, path: &str, events: &[EventRecord]) -> TripCalResult<()> {
    let value = serde_json::to_value(events)?;
    store.set(path, &value).await
}

/// Convert what the database holds into an ordered collection.
///
/// The database may hand back a list (possibly with `null` holes) or a keyed
/// map. Maps are ordered by numeric key first, then by the remaining keys.
/// Entries that are not event objects are skipped.
pub fn collection_from_value(value: Value) -> TripCalResult<Vec<EventRecord>> {
    let items: Vec<Value> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by_key(|(key, _)| match key.parse::<u64>() {
                Ok(index) => (0, index),
                Err(_) => (1, 0),
            });
            entries.into_iter().map(|(_, v)| v).collect()
        }
        other => {
            return Err(TripCalError::Serialization(format!(
                "remote collection is neither a list nor a map: {other}"
            )));
        }
    };

    Ok(items
        .into_iter()
        .filter(|item| !item.is_null())
        .filter_map(|item| match serde_json::from_value::<EventRecord>(item) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping unreadable remote event: {e}");
                None
            }
        })
        .collect())
}
