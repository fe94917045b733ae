use std::fmt;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use campmap_shared::{ApiConfig, CampgroundRecord, QueryVariant, extract_records, request_url};

/// Why a fetch cycle produced no data. Tolerated and non-fatal: the
/// caller logs it and leaves the previous UI state untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    Transport(String),
    Status(u16),
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "transport error: {e}"),
            FetchError::Status(code) => write!(f, "HTTP {code}"),
            FetchError::Parse(e) => write!(f, "parse error: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// One GET against the campground API. An empty result set is `Ok`;
/// only transport, HTTP, and body-parse failures are errors.
pub async fn fetch_records(
    cfg: &ApiConfig,
    variant: QueryVariant,
) -> Result<Vec<CampgroundRecord>, FetchError> {
    let url = request_url(cfg, variant);

    let resp = gloo_net::http::Request::get(&url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    if !resp.ok() {
        return Err(FetchError::Status(resp.status()));
    }

    let body = resp
        .json::<serde_json::Value>()
        .await
        .map_err(|e| FetchError::Parse(e.to_string()))?;

    Ok(extract_records(&body))
}

/// Where the displayed data stands relative to the last issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Syncing,
    Synced,
    Failed,
}

/// Signals a fetch cycle writes into. `camps` is replaced wholesale on
/// success; everything downstream (markers, list, detail) derives from
/// it, so a fetch either lands completely or not at all.
#[derive(Clone, Copy)]
pub struct SyncSink {
    pub camps: RwSignal<Vec<CampgroundRecord>>,
    pub status: RwSignal<SyncStatus>,
    pub synced_at: RwSignal<Option<String>>,
    /// Monotonically increasing fetch tag; see [`start_sync`].
    pub nonce: RwSignal<u64>,
}

/// Whether a resolving fetch may still apply its result.
///
/// Overlapping fetches are not cancelled; each is tagged with the nonce
/// current at issue time, and any response whose tag is no longer the
/// latest is discarded. The last *issued* fetch wins, not the last one
/// to resolve.
pub fn is_current(issued: u64, latest: u64) -> bool {
    issued == latest
}

/// Issue one fetch cycle. Stale responses are dropped; failures are
/// logged and leave `camps` untouched.
pub fn start_sync(cfg: ApiConfig, sink: SyncSink, variant: QueryVariant) {
    let request_nonce = sink.nonce.get_untracked().wrapping_add(1);
    sink.nonce.set(request_nonce);
    sink.status.set(SyncStatus::Syncing);

    spawn_local(async move {
        let result = fetch_records(&cfg, variant).await;

        if !is_current(request_nonce, sink.nonce.get_untracked()) {
            web_sys::console::info_1(
                &format!("fetch_discarded_stale (nonce={request_nonce})").into(),
            );
            return;
        }

        match result {
            Ok(records) => {
                sink.camps.set(records);
                sink.status.set(SyncStatus::Synced);
                sink.synced_at
                    .set(Some(chrono::Local::now().format("%H:%M:%S").to_string()));
            }
            Err(e) => {
                web_sys::console::error_1(&format!("fetch_failed: {e}").into());
                sink.status.set(SyncStatus::Failed);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_nonce_is_not_current() {
        assert!(is_current(3, 3));
        assert!(!is_current(2, 3));
        // A later tag never matches an earlier "latest".
        assert!(!is_current(4, 3));
    }

    #[test]
    fn fetch_error_messages_name_the_failure() {
        assert_eq!(
            FetchError::Transport("offline".into()).to_string(),
            "transport error: offline"
        );
        assert_eq!(FetchError::Status(500).to_string(), "HTTP 500");
        assert_eq!(
            FetchError::Parse("bad json".into()).to_string(),
            "parse error: bad json"
        );
    }
}
