//! The itinerary controller.
//!
//! An [`Itinerary`] owns the live collection of events and is the only way the
//! front-end reads or changes it. At startup it picks a source (the realtime
//! database if one is configured and reachable, otherwise the local store,
//! otherwise the default itinerary) and afterwards writes every change through
//! to whichever backend is active.
//!
//! Writes always replace the whole collection. With several collaborators the
//! last full write wins; there is no per-record merge.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{RemoteConfig, TripCalConfig};
use crate::defaults::{DefaultDataset, embedded_events};
use crate::error::{TripCalError, TripCalResult};
use crate::event::{EventPatch, EventRecord, normalize_all, sort_by_start};
use crate::local::LocalStore;
use crate::remote::{AdapterState, RealtimeStore, RemoteSync, Subscription, WriteOutcome};
use crate::travel::{TravelLinks, links_to_next};

type RefreshFn = Arc<dyn Fn(&[EventRecord]) + Send + Sync>;
type ConnectionFn = Arc<dyn Fn(bool) + Send + Sync>;

/// Which backend changes are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Changes go to the local store only.
    Local,
    /// Changes go to the shared realtime database.
    Collaborative,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::Local => write!(f, "local"),
            Mode::Collaborative => write!(f, "collaborative"),
        }
    }
}

pub struct Itinerary {
    events: Arc<RwLock<Vec<EventRecord>>>,
    local: LocalStore,
    remote: RemoteSync,
    defaults: DefaultDataset,
    remote_config: Option<RemoteConfig>,
    remote_store: Option<(Arc<dyn RealtimeStore>, String)>,
    mode: Mode,
    on_refresh: RefreshFn,
    on_connection: Option<ConnectionFn>,
    subscriptions: Vec<Subscription>,
}

impl Itinerary {
    pub fn new(local: LocalStore, defaults: DefaultDataset) -> Self {
        Itinerary {
            events: Arc::default(),
            remote: RemoteSync::new(local.clone()),
            local,
            defaults,
            remote_config: None,
            remote_store: None,
            mode: Mode::Local,
            on_refresh: Arc::new(|_| {}),
            on_connection: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn from_config(config: &TripCalConfig) -> Self {
        Self::new(config.local_store(), config.default_dataset())
            .with_remote_config(config.remote.clone())
    }

    pub fn with_remote_config(mut self, config: Option<RemoteConfig>) -> Self {
        self.remote_config = config;
        self
    }

    /// Use `store` as the realtime database instead of the configured one.
    pub fn with_remote_store(mut self, store: Arc<dyn RealtimeStore>, path: impl Into<String>) -> Self {
        self.remote_store = Some((store, path.into()));
        self
    }

    /// Called with the full collection whenever it should be redrawn.
    pub fn on_refresh<F>(mut self, on_refresh: F) -> Self
    where
        F: Fn(&[EventRecord]) + Send + Sync + 'static,
    {
        self.on_refresh = Arc::new(on_refresh);
        self
    }

    /// Called with the database connectivity, in collaborative mode only.
    pub fn on_connection_change<F>(mut self, on_change: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.on_connection = Some(Arc::new(on_change));
        self
    }

    /// Select the data source and load the collection from it.
    ///
    /// Every returned record has an id and an end time.
    pub async fn initialize(&mut self) -> TripCalResult<Vec<EventRecord>> {
        self.subscriptions.clear();

        if let Some(events) = self.start_collaborative().await {
            self.mode = Mode::Collaborative;
            info!(count = events.len(), "Collaborative mode: realtime database is the source");
            return Ok(events);
        }

        self.mode = Mode::Local;
        let events = self.load_local_or_seed().await?;
        info!(count = events.len(), "Local mode: changes are kept on this machine");

        *self.events.write() = events.clone();
        self.refresh(&events);
        Ok(events)
    }

    /// `None` when the database is unavailable or failed while starting.
    async fn start_collaborative(&mut self) -> Option<Vec<EventRecord>> {
        let connection = match &self.remote_store {
            Some((store, path)) => self.remote.attach(store.clone(), path),
            None => self.remote.connect(self.remote_config.as_ref()),
        };

        if !connection.is_ready() {
            return None;
        }

        match self.load_and_subscribe().await {
            Ok(events) => Some(events),
            Err(e) => {
                self.subscriptions.clear();
                self.remote.disconnect(&e);
                None
            }
        }
    }

    async fn load_and_subscribe(&mut self) -> TripCalResult<Vec<EventRecord>> {
        let events = self.remote.load_once(&self.defaults).await?;
        *self.events.write() = events.clone();

        let shared = self.events.clone();
        let refresh = self.on_refresh.clone();
        let data = self
            .remote
            .subscribe(move |events| {
                *shared.write() = events.clone();
                refresh(&events);
            })
            .await?;
        self.subscriptions.push(data);

        if let Some(on_connection) = self.on_connection.clone() {
            let status = self
                .remote
                .subscribe_connection_state(move |connected| on_connection(connected))?;
            self.subscriptions.push(status);
        }

        Ok(events)
    }

    async fn load_local_or_seed(&self) -> TripCalResult<Vec<EventRecord>> {
        if let Some(mut events) = self.local.load_local()? {
            if normalize_all(&mut events) {
                info!("Repairing saved events with missing ids or end times");
                self.local.save_local(&events)?;
            }
            return Ok(events);
        }

        info!("Nothing saved yet, starting from the default itinerary");
        let mut events = self.defaults.load().await;
        normalize_all(&mut events);
        self.local.save_local(&events)?;
        Ok(events)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn remote_state(&self) -> AdapterState {
        self.remote.state()
    }

    /// Snapshot of the collection in stored order.
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<EventRecord> {
        self.events.read().iter().find(|e| e.id == id).cloned()
    }

    pub fn sorted_by_start(&self) -> Vec<EventRecord> {
        let mut events = self.events();
        sort_by_start(&mut events);
        events
    }

    /// Directions from the event `id` to the one after it.
    pub fn travel_links(&self, id: &str) -> Option<TravelLinks> {
        links_to_next(&self.events.read(), id)
    }

    pub async fn create(&self, patch: EventPatch) -> TripCalResult<EventRecord> {
        let record = patch.into_record();
        record.validate()?;
        let record = record.normalized();

        let mut events = self.events();
        events.push(record.clone());
        self.commit(events).await?;

        Ok(record)
    }

    pub async fn update(&self, id: &str, patch: EventPatch) -> TripCalResult<EventRecord> {
        let mut events = self.events();
        let record = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| TripCalError::EventNotFound(id.to_string()))?;

        patch.apply(record);
        record.validate()?;
        record.normalize();
        let updated = record.clone();

        self.commit(events).await?;
        Ok(updated)
    }

    /// Returns false if no event has that id.
    pub async fn remove(&self, id: &str) -> TripCalResult<bool> {
        let mut events = self.events();
        let before = events.len();
        events.retain(|e| e.id != id);

        if events.len() == before {
            return Ok(false);
        }

        self.commit(events).await?;
        Ok(true)
    }

    /// The collection as a pretty-printed JSON array.
    pub fn export(&self) -> TripCalResult<String> {
        Ok(serde_json::to_string_pretty(&*self.events.read())?)
    }

    pub fn export_file_name(date: NaiveDate) -> String {
        format!("calendar-events-{}.json", date.format("%Y-%m-%d"))
    }

    /// Parse an exported file without touching the collection.
    ///
    /// Start times are not checked: anything `initialize` can load, an
    /// export of it can bring back.
    pub fn parse_import(blob: &str) -> TripCalResult<Vec<EventRecord>> {
        let value: Value = serde_json::from_str(blob)
            .map_err(|e| TripCalError::MalformedImport(format!("not valid JSON: {e}")))?;

        let Value::Array(items) = value else {
            return Err(TripCalError::MalformedImport(
                "expected a list of events, not a single value".into(),
            ));
        };

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value::<EventRecord>(item).map_err(|e| {
                    TripCalError::MalformedImport(format!("event #{}: {e}", i + 1))
                })
            })
            .collect()
    }

    /// Replace the whole collection with the contents of an exported file.
    /// Nothing changes if the file cannot be used.
    pub async fn import(&self, blob: &str) -> TripCalResult<Vec<EventRecord>> {
        let mut events = Self::parse_import(blob)?;
        normalize_all(&mut events);

        self.commit(events.clone()).await?;
        info!(count = events.len(), "Imported events");
        Ok(events)
    }

    /// Replace the shared collection with the bundled default itinerary.
    pub async fn reset_to_defaults(&self) -> TripCalResult<Vec<EventRecord>> {
        if self.mode != Mode::Collaborative {
            return Err(TripCalError::NotCollaborative);
        }

        let mut events = embedded_events();
        normalize_all(&mut events);

        self.commit(events.clone()).await?;
        info!(count = events.len(), "Reset shared itinerary to defaults");
        Ok(events)
    }

    /// Stop listening to the realtime database.
    pub fn shutdown(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }

    async fn commit(&self, events: Vec<EventRecord>) -> TripCalResult<()> {
        match self.mode {
            Mode::Local => {
                self.local.save_local(&events)?;
                *self.events.write() = events.clone();
                self.refresh(&events);
            }
            Mode::Collaborative => {
                *self.events.write() = events.clone();
                match self.remote.write(&events).await {
                    // The subscription echoes the write back.
                    WriteOutcome::Remote => {}
                    WriteOutcome::LocalFallback => self.refresh(&events),
                    WriteOutcome::Failed(reason) => {
                        warn!("Change could not be saved anywhere: {reason}");
                        return Err(TripCalError::Transport(reason));
                    }
                }
            }
        }
        Ok(())
    }

    fn refresh(&self, events: &[EventRecord]) {
        (self.on_refresh)(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DefaultsSource;
    use crate::remote::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn local_itinerary(dir: &TempDir) -> Itinerary {
        let defaults = DefaultDataset::new(DefaultsSource::File(dir.path().join("missing.json")));
        Itinerary::new(LocalStore::new(dir.path().join("local_storage")), defaults)
    }

    fn local_store(dir: &TempDir) -> LocalStore {
        LocalStore::new(dir.path().join("local_storage"))
    }

    fn shared_itinerary(dir: &TempDir, store: &Arc<MemoryStore>) -> Itinerary {
        local_itinerary(dir).with_remote_store(store.clone(), "events")
    }

    fn with_refresh_channel(
        itinerary: Itinerary,
    ) -> (Itinerary, mpsc::UnboundedReceiver<Vec<EventRecord>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let itinerary = itinerary.on_refresh(move |events| {
            let _ = tx.send(events.to_vec());
        });
        (itinerary, rx)
    }

    async fn refresh_matching<F>(
        rx: &mut mpsc::UnboundedReceiver<Vec<EventRecord>>,
        predicate: F,
    ) -> Vec<EventRecord>
    where
        F: Fn(&[EventRecord]) -> bool,
    {
        loop {
            let events = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("timed out waiting for refresh")
                .expect("refresh channel closed");
            if predicate(&events) {
                return events;
            }
        }
    }

    fn patch(title: &str, start: &str) -> EventPatch {
        EventPatch {
            title: Some(title.into()),
            start: Some(start.into()),
            ..Default::default()
        }
    }

    fn assert_ready_for_display(events: &[EventRecord]) {
        for event in events {
            assert!(!event.id.is_empty(), "{event} has no id");
            assert!(event.end_time().is_some(), "{event} has no end");
        }
    }

    #[tokio::test]
    async fn first_run_without_defaults_file_uses_embedded_itinerary() {
        let dir = TempDir::new().unwrap();
        let mut itinerary = local_itinerary(&dir);

        let events = itinerary.initialize().await.unwrap();

        let mut expected = embedded_events();
        assert_eq!(events.len(), expected.len());
        for (want, got) in expected.iter_mut().zip(&events) {
            want.id = got.id.clone();
            want.normalize();
        }
        assert_eq!(events, expected);
        assert_eq!(itinerary.mode(), Mode::Local);
        assert_eq!(local_store(&dir).load_local().unwrap(), Some(events));
    }

    #[tokio::test]
    async fn saved_events_are_normalized_and_repaired_on_disk() {
        let dir = TempDir::new().unwrap();
        local_store(&dir)
            .set_item("events", r#"[{"title":"A","start":"2026-01-01T10:00"}]"#)
            .unwrap();

        let mut itinerary = local_itinerary(&dir);
        let events = itinerary.initialize().await.unwrap();

        assert_eq!(events.len(), 1);
        assert_ready_for_display(&events);
        assert_eq!(local_store(&dir).load_local().unwrap(), Some(events));
    }

    #[tokio::test]
    async fn saved_empty_collection_is_not_reseeded() {
        let dir = TempDir::new().unwrap();
        local_store(&dir).save_local(&[]).unwrap();

        let mut itinerary = local_itinerary(&dir);
        assert!(itinerary.initialize().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_writes_through_and_fills_in_end() {
        let dir = TempDir::new().unwrap();
        local_store(&dir)
            .set_item("events", r#"[{"id":"e1","start":"2026-01-01T10:00","title":"A"}]"#)
            .unwrap();
        let mut itinerary = local_itinerary(&dir);
        itinerary.initialize().await.unwrap();

        let patch = EventPatch {
            title: Some("B".into()),
            ..Default::default()
        };
        itinerary.update("e1", patch).await.unwrap();

        let expected = EventRecord {
            id: "e1".into(),
            title: "B".into(),
            start: "2026-01-01T10:00".into(),
            end: Some("2026-01-01T11:00".into()),
            ..Default::default()
        };
        assert_eq!(local_store(&dir).load_local().unwrap(), Some(vec![expected.clone()]));

        let mut reloaded = local_itinerary(&dir);
        assert_eq!(reloaded.initialize().await.unwrap(), vec![expected]);
    }

    #[tokio::test]
    async fn rejected_changes_leave_collection_untouched() {
        let dir = TempDir::new().unwrap();
        local_store(&dir).save_local(&[]).unwrap();
        let mut itinerary = local_itinerary(&dir);
        itinerary.initialize().await.unwrap();

        let err = itinerary.create(patch("Dinner", "tonight")).await.unwrap_err();
        assert!(matches!(err, TripCalError::Validation(_)));

        let err = itinerary.update("nope", EventPatch::default()).await.unwrap_err();
        assert!(matches!(err, TripCalError::EventNotFound(_)));

        assert!(!itinerary.remove("nope").await.unwrap());
        assert!(itinerary.events().is_empty());
        assert_eq!(local_store(&dir).load_local().unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn deleting_only_event_saves_empty_collection() {
        let dir = TempDir::new().unwrap();
        local_store(&dir).save_local(&[]).unwrap();
        let mut itinerary = local_itinerary(&dir);
        itinerary.initialize().await.unwrap();

        let created = itinerary.create(patch("Lunch", "2026-01-02T12:00")).await.unwrap();
        assert!(itinerary.remove(&created.id).await.unwrap());

        assert_eq!(local_store(&dir).load_local().unwrap(), Some(Vec::new()));
        assert_eq!(local_store(&dir).get_item("events").unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn local_mutations_refresh_directly() {
        let dir = TempDir::new().unwrap();
        local_store(&dir).save_local(&[]).unwrap();
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = refreshes.clone();
        let mut itinerary = local_itinerary(&dir).on_refresh(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        itinerary.initialize().await.unwrap();
        let created = itinerary.create(patch("Museum", "2026-01-03T10:00")).await.unwrap();
        itinerary.update(&created.id, patch("Museum", "2026-01-03T11:00")).await.unwrap();
        itinerary.remove(&created.id).await.unwrap();

        assert_eq!(refreshes.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn import_rejects_anything_but_a_list() {
        let dir = TempDir::new().unwrap();
        let mut itinerary = local_itinerary(&dir);
        let before = itinerary.initialize().await.unwrap();

        let err = itinerary.import(r#"{"not":"an array"}"#).await.unwrap_err();
        assert!(matches!(err, TripCalError::MalformedImport(_)));

        let err = itinerary.import("[{").await.unwrap_err();
        assert!(matches!(err, TripCalError::MalformedImport(_)));

        let err = itinerary.import(r#"[{"id":"x"}, 7]"#).await.unwrap_err();
        assert!(matches!(err, TripCalError::MalformedImport(_)));

        assert_eq!(itinerary.events(), before);
        assert_eq!(local_store(&dir).load_local().unwrap(), Some(before));
    }

    #[tokio::test]
    async fn export_then_import_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut itinerary = local_itinerary(&dir);
        let original = itinerary.initialize().await.unwrap();

        let blob = itinerary.export().unwrap();
        assert!(blob.starts_with("[\n  {"));

        let imported = itinerary.import(&blob).await.unwrap();
        assert_eq!(imported, original);
    }

    #[tokio::test]
    async fn loaded_event_with_unparseable_start_round_trips() {
        let dir = TempDir::new().unwrap();
        local_store(&dir)
            .set_item("events", r#"[{"id":"x","title":"T","start":"TBD"}]"#)
            .unwrap();
        let mut itinerary = local_itinerary(&dir);
        let loaded = itinerary.initialize().await.unwrap();
        assert_eq!(loaded[0].end, None);

        let blob = itinerary.export().unwrap();
        let imported = itinerary.import(&blob).await.unwrap();

        assert_eq!(imported, loaded);
        assert_eq!(local_store(&dir).load_local().unwrap(), Some(loaded));
    }

    #[tokio::test]
    async fn import_replaces_whole_collection() {
        let dir = TempDir::new().unwrap();
        let mut itinerary = local_itinerary(&dir);
        itinerary.initialize().await.unwrap();

        let events = itinerary
            .import(r#"[{"title":"Only","start":"2026-05-01T08:00","notes":{"toBring":"Umbrella"}}]"#)
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_ready_for_display(&events);
        assert_eq!(events[0].notes.to_bring.as_deref(), Some("Umbrella"));
        assert_eq!(local_store(&dir).load_local().unwrap(), Some(events));
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        assert_eq!(Itinerary::export_file_name(date), "calendar-events-2026-01-26.json");
    }

    #[tokio::test]
    async fn reset_requires_collaborative_mode() {
        let dir = TempDir::new().unwrap();
        let mut itinerary = local_itinerary(&dir);
        itinerary.initialize().await.unwrap();

        let err = itinerary.reset_to_defaults().await.unwrap_err();
        assert!(matches!(err, TripCalError::NotCollaborative));
    }

    #[tokio::test]
    async fn travel_links_follow_start_order() {
        let dir = TempDir::new().unwrap();
        let mut itinerary = local_itinerary(&dir);
        itinerary
            .import(
                r#"[
                    {"id":"b","start":"2026-01-01T12:00","address":"Station B"},
                    {"id":"a","start":"2026-01-01T09:00","address":"Hotel A"}
                ]"#,
            )
            .await
            .unwrap();
        itinerary.initialize().await.unwrap();

        let travel = itinerary.travel_links("a").unwrap();
        assert_eq!(travel.next.id, "b");
        assert_eq!(travel.links.len(), 3);
        assert!(travel.links[0].1.contains("origin=Hotel%20A&destination=Station%20B"));
        assert!(itinerary.travel_links("b").is_none());
    }

    #[tokio::test]
    async fn empty_database_is_seeded_in_collaborative_mode() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let (mut itinerary, mut rx) = with_refresh_channel(shared_itinerary(&dir, &store));

        let events = itinerary.initialize().await.unwrap();

        assert_eq!(itinerary.mode(), Mode::Collaborative);
        assert_eq!(itinerary.remote_state(), AdapterState::Connected);
        assert_eq!(events.len(), 31);
        assert_ready_for_display(&events);
        assert_eq!(refresh_matching(&mut rx, |_| true).await, events);
        assert_eq!(local_store(&dir).load_local().unwrap(), None);
    }

    #[tokio::test]
    async fn keyed_remote_data_is_ordered_and_repaired() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::with_value(
            "events",
            json!({
                "1": {"id": "second", "title": "B", "start": "2026-01-02T10:00"},
                "0": {"title": "A", "start": "2026-01-01T10:00"}
            }),
        ));
        let mut itinerary = shared_itinerary(&dir, &store);

        let events = itinerary.initialize().await.unwrap();

        assert_eq!(events[0].title, "A");
        assert_eq!(events[1].id, "second");
        assert_ready_for_display(&events);
        assert!(store.value("events").is_array());
    }

    #[tokio::test]
    async fn collaborators_see_each_others_changes() {
        let store = Arc::new(MemoryStore::new());
        let (dir_a, dir_b) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        let mut alice = shared_itinerary(&dir_a, &store);
        alice.initialize().await.unwrap();

        let (mut bob, mut bob_rx) = with_refresh_channel(shared_itinerary(&dir_b, &store));
        bob.initialize().await.unwrap();

        let created = alice.create(patch("Sushi class", "2026-01-28T18:00")).await.unwrap();

        let seen = refresh_matching(&mut bob_rx, |events| events.iter().any(|e| e.id == created.id)).await;
        assert_eq!(seen.len(), 32);
        assert_eq!(bob.get(&created.id), Some(created));
    }

    #[tokio::test]
    async fn collaborative_mutations_refresh_through_the_echo() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::with_value(
            "events",
            json!([{"id": "e1", "title": "A", "start": "2026-01-01T10:00"}]),
        ));
        let (mut itinerary, mut rx) = with_refresh_channel(shared_itinerary(&dir, &store));
        itinerary.initialize().await.unwrap();

        itinerary.update("e1", patch("B", "2026-01-01T10:00")).await.unwrap();

        let echoed = refresh_matching(&mut rx, |events| events[0].title == "B").await;
        assert_eq!(echoed[0].end.as_deref(), Some("2026-01-01T11:00"));
        assert_eq!(local_store(&dir).load_local().unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_database_falls_back_to_local_mode() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.set_connected(false);
        let mut itinerary = shared_itinerary(&dir, &store);

        let events = itinerary.initialize().await.unwrap();

        assert_eq!(itinerary.mode(), Mode::Local);
        assert_eq!(itinerary.remote_state(), AdapterState::Unavailable);
        assert_eq!(events.len(), 31);
        assert_eq!(local_store(&dir).load_local().unwrap(), Some(events));
    }

    #[tokio::test]
    async fn placeholder_credentials_mean_local_mode() {
        let dir = TempDir::new().unwrap();
        let remote = RemoteConfig {
            api_key: "YOUR_API_KEY_HERE".into(),
            database_url: "https://YOUR_PROJECT_ID-default-rtdb.firebaseio.com".into(),
            ..Default::default()
        };
        let mut itinerary = local_itinerary(&dir).with_remote_config(Some(remote));

        itinerary.initialize().await.unwrap();
        assert_eq!(itinerary.mode(), Mode::Local);
    }

    #[tokio::test]
    async fn refused_remote_write_is_kept_locally_and_refreshed() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let (mut itinerary, mut rx) = with_refresh_channel(shared_itinerary(&dir, &store));
        itinerary.initialize().await.unwrap();
        store.fail_writes(true);

        let created = itinerary.create(patch("Onsen", "2026-01-29T16:00")).await.unwrap();

        refresh_matching(&mut rx, |events| events.iter().any(|e| e.id == created.id)).await;
        assert_eq!(itinerary.mode(), Mode::Collaborative);
        let saved = local_store(&dir).load_local().unwrap().unwrap();
        assert!(saved.iter().any(|e| e.id == created.id));
    }

    #[tokio::test]
    async fn reset_restores_shared_defaults() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let (mut itinerary, mut rx) = with_refresh_channel(shared_itinerary(&dir, &store));
        itinerary.initialize().await.unwrap();

        itinerary
            .import(r#"[{"title":"Oops","start":"2026-01-01T00:00"}]"#)
            .await
            .unwrap();
        refresh_matching(&mut rx, |events| events.len() == 1).await;

        let events = itinerary.reset_to_defaults().await.unwrap();
        assert_eq!(events.len(), 31);
        refresh_matching(&mut rx, |events| events.len() == 31).await;
        assert_eq!(store.value("events").as_array().map(Vec::len), Some(31));
    }

    #[tokio::test]
    async fn connection_changes_are_reported() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut itinerary = shared_itinerary(&dir, &store).on_connection_change(move |connected| {
            let _ = tx.send(connected);
        });
        itinerary.initialize().await.unwrap();

        assert_eq!(timeout(Duration::from_secs(1), rx.recv()).await.unwrap(), Some(true));
        store.set_connected(false);
        assert_eq!(timeout(Duration::from_secs(1), rx.recv()).await.unwrap(), Some(false));

        itinerary.shutdown();
        store.set_connected(true);
        assert!(timeout(Duration::from_millis(200), rx.recv()).await.map_or(true, |v| v.is_none()));
    }
}
