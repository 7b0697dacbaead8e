// ── Update coordinator ──
//
// Runs one fetch-and-reshape cycle per fixed interval and publishes
// the latest successful CycleSnapshot plus failure state through
// watch channels. A cycle either publishes a complete snapshot or
// publishes nothing -- consumers never observe a partial result.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::snapshot::{CycleSnapshot, shape_cycle};
use crate::source::{ReadingsSource, TokenProvider};

/// Coordinator failure/success state observable by consumers.
#[derive(Debug, Clone)]
pub struct CycleStatus {
    /// Whether the most recent cycle succeeded.
    pub last_update_succeeded: bool,
    /// Message from the most recent failed cycle, cleared on success.
    pub last_error: Option<String>,
    /// When the last successful cycle completed.
    pub last_success_at: Option<DateTime<Utc>>,
}

impl Default for CycleStatus {
    fn default() -> Self {
        Self {
            // No cycle has failed yet; flips false on the first failure.
            last_update_succeeded: true,
            last_error: None,
            last_success_at: None,
        }
    }
}

/// Polls a token provider + readings source on a fixed interval.
///
/// Cheaply cloneable via `Arc`. The scheduled task and any forced
/// refresh serialize on an internal mutex, so no two cycles ever run
/// concurrently.
pub struct Coordinator<S, R> {
    inner: Arc<Inner<S, R>>,
}

impl<S, R> Clone for Coordinator<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S, R> {
    session: S,
    client: R,
    scan_interval: Duration,
    snapshot: watch::Sender<Option<Arc<CycleSnapshot>>>,
    status: watch::Sender<CycleStatus>,
    /// Serializes scheduled and forced refreshes.
    cycle_lock: Mutex<()>,
    cancel: CancellationToken,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl<S, R> Coordinator<S, R>
where
    S: TokenProvider + 'static,
    R: ReadingsSource + 'static,
{
    /// Create a coordinator. Does NOT poll -- call
    /// [`refresh()`](Self::refresh) for the initial cycle and
    /// [`start()`](Self::start) to begin the interval task.
    pub fn new(session: S, client: R, scan_interval: Duration) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (status, _) = watch::channel(CycleStatus::default());

        Self {
            inner: Arc::new(Inner {
                session,
                client,
                scan_interval,
                snapshot,
                status,
                cycle_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                poll_task: Mutex::new(None),
            }),
        }
    }

    /// The fixed interval between scheduled cycles.
    pub fn scan_interval(&self) -> Duration {
        self.inner.scan_interval
    }

    // ── Cycle execution ──────────────────────────────────────────

    /// Run one complete cycle now.
    ///
    /// On success the new snapshot replaces the previous one wholesale
    /// and failure state clears. On failure nothing is published: the
    /// previous snapshot stays visible as last-known-good, and the
    /// status flips to failed with the wrapped error message.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let _guard = self.inner.cycle_lock.lock().await;

        match self.run_cycle().await {
            Ok(snapshot) => {
                self.inner.snapshot.send_replace(Some(Arc::new(snapshot)));
                self.inner.status.send_replace(CycleStatus {
                    last_update_succeeded: true,
                    last_error: None,
                    last_success_at: Some(Utc::now()),
                });
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "update cycle failed");
                self.inner.status.send_modify(|status| {
                    status.last_update_succeeded = false;
                    status.last_error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Refresh token, fetch, and shape -- the body of one cycle.
    async fn run_cycle(&self) -> Result<CycleSnapshot, CoreError> {
        // Ensure the token is still valid; refresh if needed. A
        // rejection here surfaces as AuthRefreshFailed so the caller
        // can re-trigger authorization instead of blind retries.
        let token = self.inner.session.ensure_token_valid().await?;

        // Push the (possibly refreshed) token into the client.
        self.inner.client.set_token(token);

        // One batched call for every device's latest readings.
        let readings = self.inner.client.fetch_all_device_readings().await?;
        debug!(devices = readings.len(), "fetched device readings");

        Ok(shape_cycle(readings))
    }

    // ── Background polling ───────────────────────────────────────

    /// Spawn the fixed-interval polling task.
    pub async fn start(&self) {
        let mut task = self.inner.poll_task.lock().await;
        if task.is_some() {
            return;
        }

        let coordinator = self.clone();
        let cancel = self.inner.cancel.clone();
        *task = Some(tokio::spawn(poll_task(coordinator, cancel)));
    }

    /// Cancel the polling task and wait for it to finish.
    ///
    /// Any in-flight network call is abandoned; nothing partial was
    /// published, so no compensating action is needed.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.poll_task.lock().await.take() {
            let _ = handle.await;
        }
        debug!("coordinator stopped");
    }

    // ── State observation ────────────────────────────────────────

    /// The latest successful snapshot, if any cycle has succeeded.
    pub fn snapshot(&self) -> Option<Arc<CycleSnapshot>> {
        self.inner.snapshot.borrow().clone()
    }

    /// Current failure/success state.
    pub fn status(&self) -> CycleStatus {
        self.inner.status.borrow().clone()
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<CycleSnapshot>>> {
        self.inner.snapshot.subscribe()
    }

    /// Subscribe to status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<CycleStatus> {
        self.inner.status.subscribe()
    }
}

/// Fixed-interval polling loop. Failures are logged and retried on the
/// next tick; there is no backoff beyond the fixed interval.
async fn poll_task<S, R>(coordinator: Coordinator<S, R>, cancel: CancellationToken)
where
    S: TokenProvider + 'static,
    R: ReadingsSource + 'static,
{
    let mut interval = tokio::time::interval(coordinator.scan_interval());
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = coordinator.refresh().await {
                    warn!(error = %e, "scheduled refresh failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use secrecy::{ExposeSecret, SecretString};
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    use aerolite_api::DeviceReading;

    use super::*;
    use crate::snapshot::tests::{device, metric};

    struct FakeSession {
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeSession {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TokenProvider for FakeSession {
        async fn ensure_token_valid(&self) -> Result<SecretString, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(CoreError::AuthRefreshFailed {
                    message: "refresh token rejected".into(),
                })
            } else {
                Ok(SecretString::from("tok-1".to_string()))
            }
        }
    }

    struct FakeClient {
        responses: StdMutex<VecDeque<Result<Vec<DeviceReading>, CoreError>>>,
        tokens_seen: StdMutex<Vec<String>>,
    }

    impl FakeClient {
        fn new(responses: Vec<Result<Vec<DeviceReading>, CoreError>>) -> Self {
            Self {
                responses: StdMutex::new(responses.into_iter().collect()),
                tokens_seen: StdMutex::new(Vec::new()),
            }
        }
    }

    impl ReadingsSource for FakeClient {
        fn set_token(&self, token: SecretString) {
            self.tokens_seen
                .lock()
                .unwrap()
                .push(token.expose_secret().to_owned());
        }

        async fn fetch_all_device_readings(&self) -> Result<Vec<DeviceReading>, CoreError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn one_device_batch() -> Vec<DeviceReading> {
        vec![device(
            "d1",
            vec![metric("temperature", Some("°C"), json!(21.5))],
        )]
    }

    #[tokio::test]
    async fn successful_cycle_publishes_snapshot_and_token() {
        let client = FakeClient::new(vec![Ok(one_device_batch())]);
        let coordinator =
            Coordinator::new(FakeSession::new(), client, Duration::from_secs(180));

        assert!(coordinator.snapshot().is_none());
        coordinator.refresh().await.unwrap();

        let snapshot = coordinator.snapshot().unwrap();
        assert_eq!(snapshot.value("d1", "temperature"), Some(21.5));

        let status = coordinator.status();
        assert!(status.last_update_succeeded);
        assert!(status.last_error.is_none());
        assert!(status.last_success_at.is_some());

        let tokens = coordinator.inner.client.tokens_seen.lock().unwrap();
        assert_eq!(tokens.as_slice(), ["tok-1"]);
    }

    #[tokio::test]
    async fn token_refresh_failure_retains_previous_snapshot() {
        let client = FakeClient::new(vec![Ok(one_device_batch())]);
        let session = FakeSession::new();
        let coordinator = Coordinator::new(session, client, Duration::from_secs(180));

        coordinator.refresh().await.unwrap();
        let before = coordinator.snapshot().unwrap();

        coordinator
            .inner
            .session
            .fail
            .store(true, Ordering::SeqCst);
        let err = coordinator.refresh().await.unwrap_err();
        assert!(err.requires_reauth());

        // Last-known-good is untouched: same published Arc.
        let after = coordinator.snapshot().unwrap();
        assert!(Arc::ptr_eq(&before, &after));

        let status = coordinator.status();
        assert!(!status.last_update_succeeded);
        assert!(
            status.last_error.unwrap().contains("refresh token rejected"),
            "failure detail should reach consumers"
        );
    }

    #[tokio::test]
    async fn fetch_failure_fails_whole_cycle() {
        let client = FakeClient::new(vec![
            Ok(one_device_batch()),
            Err(CoreError::FetchFailed {
                message: "HTTP 503: upstream down".into(),
                status: Some(503),
                body: None,
            }),
        ]);
        let coordinator =
            Coordinator::new(FakeSession::new(), client, Duration::from_secs(180));

        coordinator.refresh().await.unwrap();
        let before = coordinator.snapshot().unwrap();

        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(err, CoreError::FetchFailed { .. }));

        let after = coordinator.snapshot().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert!(
            coordinator
                .status()
                .last_error
                .unwrap()
                .contains("HTTP 503")
        );
    }

    #[tokio::test]
    async fn recovery_clears_failure_state() {
        let client = FakeClient::new(vec![
            Err(CoreError::FetchFailed {
                message: "HTTP 500".into(),
                status: Some(500),
                body: None,
            }),
            Ok(one_device_batch()),
        ]);
        let coordinator =
            Coordinator::new(FakeSession::new(), client, Duration::from_secs(180));

        assert!(coordinator.refresh().await.is_err());
        assert!(coordinator.snapshot().is_none());

        coordinator.refresh().await.unwrap();
        let status = coordinator.status();
        assert!(status.last_update_succeeded);
        assert!(status.last_error.is_none());
        assert!(coordinator.snapshot().is_some());
    }

    #[tokio::test]
    async fn snapshot_is_replaced_wholesale_each_cycle() {
        let client = FakeClient::new(vec![
            Ok(vec![
                device("d1", vec![metric("temperature", Some("°C"), json!(20.0))]),
                device("d2", vec![metric("humidity", Some("%"), json!(50.0))]),
            ]),
            // d2 disappears from the next batch entirely.
            Ok(vec![device(
                "d1",
                vec![metric("temperature", Some("°C"), json!(21.0))],
            )]),
        ]);
        let coordinator =
            Coordinator::new(FakeSession::new(), client, Duration::from_secs(180));

        coordinator.refresh().await.unwrap();
        assert_eq!(coordinator.snapshot().unwrap().device_count(), 2);

        coordinator.refresh().await.unwrap();
        let snapshot = coordinator.snapshot().unwrap();
        assert_eq!(snapshot.device_count(), 1);
        assert!(snapshot.device("d2").is_none());
    }

    #[tokio::test]
    async fn shutdown_stops_the_poll_task() {
        let client = FakeClient::new(vec![]);
        let coordinator =
            Coordinator::new(FakeSession::new(), client, Duration::from_millis(10));

        coordinator.start().await;
        coordinator.shutdown().await;
        assert!(coordinator.inner.poll_task.lock().await.is_none());
    }
}
