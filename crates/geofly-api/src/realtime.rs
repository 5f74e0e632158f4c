//! Realtime push channel with candidate-endpoint fallback.
//!
//! The service exposes its event stream on one of several WebSocket
//! paths depending on deployment. The client walks an ordered candidate
//! list (`Connecting -> Open | Failed`, advancing on failure), sends an
//! authentication handshake on open, and streams parsed [`PushEvent`]s
//! through a [`tokio::sync::broadcast`] channel. After a full pass fails,
//! it waits with exponential backoff (capped) and starts the list over.
//!
//! # Example
//!
//! ```rust,ignore
//! use geofly_api::realtime::{RealtimeHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let base = Url::parse("https://geofence.example.com")?;
//!
//! let handle = RealtimeHandle::connect(&base, api_key, ReconnectConfig::default(), cancel.clone())?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{event:?}");
//! }
//!
//! handle.shutdown();
//! ```

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::transport::CLIENT_NAME;
use crate::types::{Alert, Tourist, Zone};

// ── Channel capacity ─────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Path suffixes tried in order when deriving candidate endpoints.
const REALTIME_PATHS: [&str; 3] = ["/api/v1/realtime", "/ws", "/websocket"];

// ── PushEvent ────────────────────────────────────────────────────────

/// A typed event from the realtime stream.
#[derive(Debug, Clone)]
pub enum PushEvent {
    /// A new alert was raised; consumers prepend it.
    Alert(Alert),
    /// A tourist's record changed; consumers replace by id.
    TouristUpdate(Tourist),
    /// A zone's record changed; consumers replace by id.
    ZoneUpdate(Zone),
}

/// Raw `{type, payload}` envelope from the wire.
#[derive(Debug, Deserialize)]
struct WireEnvelope {
    #[serde(rename = "type")]
    kind: String,
    payload: serde_json::Value,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Retry policy for the realtime channel.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before trying the next candidate after one fails. Default: 1s.
    pub candidate_delay: Duration,

    /// Backoff after the first full failed pass over the candidate list.
    /// Default: 1s.
    pub initial_backoff: Duration,

    /// Upper bound on the between-pass backoff. Default: 30s.
    pub max_backoff: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            candidate_delay: Duration::from_secs(1),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

// ── Candidate derivation ─────────────────────────────────────────────

/// Derive the ordered WebSocket candidate URLs from an HTTP base URL:
/// scheme swapped to `ws`/`wss`, path set to each known suffix.
pub fn candidate_urls(base: &Url) -> Result<Vec<Url>, Error> {
    let scheme = match base.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };

    REALTIME_PATHS
        .iter()
        .map(|path| {
            let mut url = base.clone();
            url.set_scheme(scheme)
                .map_err(|()| Error::RealtimeConnect(format!("cannot derive ws url from {base}")))?;
            url.set_path(path);
            Ok(url)
        })
        .collect()
}

// ── Candidate cursor ─────────────────────────────────────────────────

/// Position in the ordered candidate list during one connection pass.
#[derive(Debug)]
pub(crate) struct CandidateCursor {
    candidates: Vec<Url>,
    index: usize,
}

impl CandidateCursor {
    pub(crate) fn new(candidates: Vec<Url>) -> Self {
        Self {
            candidates,
            index: 0,
        }
    }

    /// The candidate currently being attempted, `None` once exhausted.
    pub(crate) fn current(&self) -> Option<&Url> {
        self.candidates.get(self.index)
    }

    /// Mark the current candidate failed and move to the next.
    pub(crate) fn advance(&mut self) {
        self.index += 1;
    }

    pub(crate) fn attempt(&self) -> usize {
        self.index + 1
    }

    pub(crate) fn len(&self) -> usize {
        self.candidates.len()
    }
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to a running realtime event stream.
///
/// Drop all receivers and call [`shutdown`](Self::shutdown) to tear down
/// the background task.
pub struct RealtimeHandle {
    event_rx: broadcast::Receiver<PushEvent>,
    cancel: CancellationToken,
}

impl RealtimeHandle {
    /// Derive the candidate endpoints and spawn the connection loop.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously. Subscribe to the receiver to consume events.
    pub fn connect(
        base_url: &Url,
        api_key: SecretString,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let candidates = candidate_urls(base_url)?;
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            push_loop(candidates, api_key, event_tx, reconnect, task_cancel).await;
        });

        Ok(Self { event_rx, cancel })
    }

    /// Get a new broadcast receiver for the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background connection loop ───────────────────────────────────────

/// Walk the candidate list; on a full failed pass, back off and restart.
async fn push_loop(
    candidates: Vec<Url>,
    api_key: SecretString,
    event_tx: broadcast::Sender<PushEvent>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut pass: u32 = 0;

    'passes: loop {
        let mut cursor = CandidateCursor::new(candidates.clone());

        while let Some(url) = cursor.current() {
            let url = url.clone();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'passes,
                result = connect_and_read(&url, &api_key, &event_tx, &cancel) => {
                    match result {
                        // Clean disconnect after an open session: restart
                        // from the head of the candidate list immediately.
                        Ok(()) => {
                            if cancel.is_cancelled() {
                                break 'passes;
                            }
                            tracing::info!(%url, "realtime channel closed cleanly, reconnecting");
                            pass = 0;
                            continue 'passes;
                        }
                        Err(e) => {
                            tracing::warn!(
                                %url,
                                error = %e,
                                attempt = cursor.attempt(),
                                of = cursor.len(),
                                "realtime candidate failed"
                            );

                            tokio::select! {
                                biased;
                                _ = cancel.cancelled() => break 'passes,
                                _ = tokio::time::sleep(reconnect.candidate_delay) => {}
                            }
                            cursor.advance();
                        }
                    }
                }
            }
        }

        // Every candidate failed this pass.
        let delay = backoff_delay(pass, &reconnect);
        tracing::warn!(
            candidates = candidates.len(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            pass,
            "all realtime endpoints unreachable, backing off"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
        pass = pass.saturating_add(1);
    }

    tracing::debug!("realtime loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one WebSocket, authenticate, and read frames until it drops.
async fn connect_and_read(
    url: &Url,
    api_key: &SecretString,
    event_tx: &broadcast::Sender<PushEvent>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(%url, "connecting realtime channel");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::RealtimeConnect(e.to_string()))?;

    let (ws_stream, _response) = tokio_tungstenite::connect_async(uri)
        .await
        .map_err(|e| Error::RealtimeConnect(e.to_string()))?;

    tracing::info!(%url, "realtime channel open");

    let (mut write, mut read) = ws_stream.split();

    // Authentication handshake, sent once per connection.
    let auth = auth_message(api_key);
    write
        .send(tungstenite::Message::Text(auth.into()))
        .await
        .map_err(|e| Error::RealtimeConnect(format!("auth handshake failed: {e}")))?;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        dispatch_frame(&text, event_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite answers pongs automatically
                        tracing::trace!("realtime ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "realtime close frame");
                        } else {
                            tracing::info!("realtime close frame (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::RealtimeConnect(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close frame
                        tracing::info!("realtime stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

/// Build the `{type: "authenticate", ...}` handshake payload.
fn auth_message(api_key: &SecretString) -> String {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct AuthMessage<'a> {
        r#type: &'a str,
        api_key: &'a str,
        client: &'a str,
        timestamp: String,
    }

    serde_json::to_string(&AuthMessage {
        r#type: "authenticate",
        api_key: api_key.expose_secret(),
        client: CLIENT_NAME,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
    .unwrap_or_default()
}

// ── Frame dispatch ───────────────────────────────────────────────────

/// Parse one text frame and broadcast the typed event it carries.
/// Unknown event types and malformed frames are logged and dropped.
fn dispatch_frame(text: &str, event_tx: &broadcast::Sender<PushEvent>) {
    let envelope: WireEnvelope = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!(error = %e, "unparseable realtime frame");
            return;
        }
    };

    let event = match envelope.kind.as_str() {
        "alert" => serde_json::from_value(envelope.payload).map(PushEvent::Alert),
        "tourist_update" => serde_json::from_value(envelope.payload).map(PushEvent::TouristUpdate),
        "zone_update" => serde_json::from_value(envelope.payload).map(PushEvent::ZoneUpdate),
        other => {
            tracing::debug!(kind = other, "unknown realtime event type, dropping");
            return;
        }
    };

    match event {
        Ok(event) => {
            // Ignore send errors -- just means no active subscribers.
            let _ = event_tx.send(event);
        }
        Err(e) => {
            tracing::debug!(kind = %envelope.kind, error = %e, "bad realtime payload");
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// `delay = min(initial * 2^pass, max)`
fn backoff_delay(pass: u32, config: &ReconnectConfig) -> Duration {
    let exp = config
        .initial_backoff
        .saturating_mul(2u32.saturating_pow(pass.min(16)));
    exp.min(config.max_backoff)
}

// ── Tests ────────────────────────────────────────────────────────────
