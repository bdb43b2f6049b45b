//! Firebase Realtime Database over its REST API.
//!
//! Reads and writes are plain `GET`/`PUT` requests on `<path>.json`. Live
//! updates use the REST streaming endpoint, which answers a `GET` with
//! `Accept: text/event-stream` with `put`/`patch` events for every change.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};
use url::Url;

use crate::config::RemoteConfig;
use crate::error::{TripCalError, TripCalResult};
use crate::remote::sse::{SseEvent, SseParser};
use crate::remote::store::RealtimeStore;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const LISTEN_BUFFER: usize = 16;

pub struct FirebaseStore {
    http: reqwest::Client,
    base_url: Url,
    auth: Option<String>,
    connected: Arc<watch::Sender<bool>>,
}

impl FirebaseStore {
    pub fn new(config: &RemoteConfig) -> TripCalResult<Self> {
        let mut base_url = Url::parse(config.database_url.trim())
            .map_err(|e| TripCalError::Config(format!("Invalid database_url: {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TripCalError::Config(format!(
                "database_url must be an http(s) URL, got '{}'",
                config.database_url
            )));
        }

        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(format!("tripcal/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        let (connected, _) = watch::channel(false);

        Ok(FirebaseStore {
            http,
            base_url,
            auth: config.auth_token.clone().filter(|t| !t.is_empty()),
            connected: Arc::new(connected),
        })
    }

    fn url_for(&self, path: &str) -> TripCalResult<Url> {
        let mut url = self
            .base_url
            .join(&format!("{}.json", path.trim_matches('/')))
            .map_err(|e| TripCalError::Config(format!("Invalid path '{path}': {e}")))?;

        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }

        Ok(url)
    }

    fn record_outcome<T>(&self, result: &TripCalResult<T>) {
        set_connected(&self.connected, result.is_ok());
    }
}

#[async_trait]
impl RealtimeStore for FirebaseStore {
    async fn get(&self, path: &str) -> TripCalResult<Value> {
        let url = self.url_for(path)?;
        let result = fetch_json(&self.http, url).await;
        self.record_outcome(&result);
        result
    }

    async fn set(&self, path: &str, value: &Value) -> TripCalResult<()> {
        let url = self.url_for(path)?;
        let result = async {
            let response = self
                .http
                .put(url)
                .timeout(REQUEST_TIMEOUT)
                .json(value)
                .send()
                .await?;
            ensure_success(response).await.map(|_| ())
        }
        .await;

        self.record_outcome(&result);
        result
    }

    async fn listen(&self, path: &str) -> TripCalResult<mpsc::Receiver<Value>> {
        let (tx, rx) = mpsc::channel(LISTEN_BUFFER);

        let stream = EventStream {
            http: self.http.clone(),
            url: self.url_for(path)?,
            connected: self.connected.clone(),
            tx,
            backoff: INITIAL_BACKOFF,
        };
        tokio::spawn(stream.run());

        Ok(rx)
    }

    fn connection(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }
}

fn set_connected(sender: &watch::Sender<bool>, connected: bool) {
    sender.send_if_modified(|current| {
        if *current == connected {
            false
        } else {
            *current = connected;
            true
        }
    });
}

async fn fetch_json(http: &reqwest::Client, url: Url) -> TripCalResult<Value> {
    let response = http.get(url).timeout(REQUEST_TIMEOUT).send().await?;
    let response = ensure_success(response).await?;
    Ok(response.json().await?)
}

async fn ensure_success(response: reqwest::Response) -> TripCalResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    let detail = response
        .json::<ErrorBody>()
        .await
        .map(|b| format!(": {}", b.error))
        .unwrap_or_default();

    Err(TripCalError::Transport(format!("HTTP {status}{detail}")))
}

/// Payload of `put` and `patch` stream events.
#[derive(Deserialize)]
struct StreamPayload {
    path: String,
    #[serde(default)]
    data: Value,
}

enum StreamEnd {
    /// Server closed the connection; reconnect.
    Closed,
    /// Nobody is listening any more; stop.
    ReceiverGone,
}

/// Background task behind `listen`: keeps a streaming request open,
/// reconnecting with capped exponential backoff, and forwards full snapshots.
struct EventStream {
    http: reqwest::Client,
    url: Url,
    connected: Arc<watch::Sender<bool>>,
    tx: mpsc::Sender<Value>,
    backoff: Duration,
}

impl EventStream {
    async fn run(mut self) {
        loop {
            match self.stream_once().await {
                Ok(StreamEnd::ReceiverGone) => return,
                Ok(StreamEnd::Closed) => debug!("Realtime stream closed by server"),
                Err(e) => warn!("Realtime stream interrupted: {e}"),
            }

            set_connected(&self.connected, false);

            tokio::select! {
                _ = self.tx.closed() => return,
                _ = tokio::time::sleep(self.backoff) => {}
            }
            self.backoff = (self.backoff * 2).min(MAX_BACKOFF);
        }
    }

    async fn stream_once(&mut self) -> TripCalResult<StreamEnd> {
        let response = self
            .http
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = ensure_success(response).await?;

        set_connected(&self.connected, true);
        self.backoff = INITIAL_BACKOFF;

        let mut body = response.bytes_stream();
        let mut parser = SseParser::default();

        loop {
            let chunk = tokio::select! {
                _ = self.tx.closed() => return Ok(StreamEnd::ReceiverGone),
                chunk = body.next() => chunk,
            };

            let Some(chunk) = chunk else {
                return Ok(StreamEnd::Closed);
            };

            for event in parser.push(&chunk?) {
                if let Some(snapshot) = self.snapshot_for(event).await? {
                    if self.tx.send(snapshot).await.is_err() {
                        return Ok(StreamEnd::ReceiverGone);
                    }
                }
            }
        }
    }

    /// Turn one stream event into a full snapshot of the listened path.
    async fn snapshot_for(&self, event: SseEvent) -> TripCalResult<Option<Value>> {
        match event.event.as_str() {
            "put" | "patch" => {
                let payload: StreamPayload = serde_json::from_str(&event.data)?;
                if event.event == "put" && payload.path == "/" {
                    return Ok(Some(payload.data));
                }
                // Partial change somewhere below the root: re-read everything.
                debug!(path = %payload.path, "Partial remote change, re-reading collection");
                fetch_json(&self.http, self.url.clone()).await.map(Some)
            }
            "keep-alive" => Ok(None),
            "cancel" => Err(TripCalError::Transport(
                "stream cancelled by the database (check security rules)".into(),
            )),
            "auth_revoked" => Err(TripCalError::Transport("credentials revoked".into())),
            other => {
                debug!(event = other, "Ignoring unknown stream event");
                Ok(None)
            }
        }
    }
}
