//! Backend readiness polling
//!
//! One background loop probes `GET /api/status` until the backend reports
//! ready. Manual retries wake that loop instead of starting another one, so
//! at most one probe is ever scheduled.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};

use crate::backend::{Backend, StatusResponse};

/// Hint shown while the status endpoint cannot be reached at all
pub const UNREACHABLE_HINT: &str = "cannot reach backend";

/// Where the backend is in its start-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessState {
    /// Still waiting; carries the last reason the backend gave, if any.
    Loading(Option<String>),
    /// Terminal. Nothing changes after this.
    Ready,
    /// The attempt cap ran out. Only a manual retry leaves this state.
    Unreachable(String),
}

impl ReadinessState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessState::Ready)
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            ReadinessState::Loading(hint) => hint.as_deref(),
            ReadinessState::Ready => None,
            ReadinessState::Unreachable(reason) => Some(reason),
        }
    }
}

/// How often to probe, and whether to ever give up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2000),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &crate::config::BackendConfig) -> Self {
        Self {
            delay: config.poll_interval(),
            max_attempts: config.max_probe_attempts,
        }
    }
}

struct Inner {
    backend: Arc<dyn Backend>,
    policy: RetryPolicy,
    state_tx: watch::Sender<ReadinessState>,
    wake: Notify,
    started: AtomicBool,
    probes: AtomicU64,
}

/// Drives [`ReadinessState`] from status probes
#[derive(Clone)]
pub struct ReadinessMonitor {
    inner: Arc<Inner>,
}

impl ReadinessMonitor {
    pub fn new(backend: Arc<dyn Backend>, policy: RetryPolicy) -> Self {
        let (state_tx, _) = watch::channel(ReadinessState::Loading(None));
        Self {
            inner: Arc::new(Inner {
                backend,
                policy,
                state_tx,
                wake: Notify::new(),
                started: AtomicBool::new(false),
                probes: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> ReadinessState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.inner.state_tx.subscribe()
    }

    /// Number of probes issued so far.
    pub fn probe_count(&self) -> u64 {
        self.inner.probes.load(Ordering::SeqCst)
    }

    /// Probe the backend once and apply the result.
    ///
    /// Does nothing once `Ready` has been reached.
    pub async fn check_status(&self) -> ReadinessState {
        self.inner.check_status().await
    }

    /// Start the polling loop. Returns `false` if it was already started.
    pub fn start(&self) -> bool {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return false;
        }
        let monitor = self.clone();
        tokio::spawn(async move {
            monitor.poll_loop().await;
        });
        true
    }

    async fn poll_loop(&self) {
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            let state = self.check_status().await;
            if state.is_ready() {
                break;
            }

            let exhausted = self
                .inner
                .policy
                .max_attempts
                .is_some_and(|max| attempts >= max);
            if exhausted {
                let reason = state.hint().unwrap_or(UNREACHABLE_HINT).to_string();
                tracing::warn!(attempts, "Backend not ready, giving up until retried: {}", reason);
                self.inner.transition(ReadinessState::Unreachable(reason));
                // Parked until a manual retry.
                self.inner.wake.notified().await;
                attempts = 0;
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.inner.policy.delay) => {}
                _ = self.inner.wake.notified() => {
                    tracing::debug!("Manual retry, probing early");
                    attempts = 0;
                }
            }
        }
        tracing::debug!("Readiness polling finished");
    }

    /// User-requested retry: probe now instead of waiting out the delay.
    pub fn retry(&self) {
        if self.state().is_ready() {
            return;
        }
        if !self.start() {
            self.inner.wake.notify_one();
        }
    }
}

impl Inner {
    async fn check_status(&self) -> ReadinessState {
        if self.state_tx.borrow().is_ready() {
            return ReadinessState::Ready;
        }
        if matches!(*self.state_tx.borrow(), ReadinessState::Unreachable(_)) {
            self.transition(ReadinessState::Loading(None));
        }

        let attempt = self.probes.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(attempt, "Probing backend status");

        let next = match self.backend.status().await {
            Ok(status) if status.ready => {
                log_model_info(&status);
                ReadinessState::Ready
            }
            Ok(status) => ReadinessState::Loading(status.error),
            Err(e) => {
                tracing::debug!("Status probe failed: {}", e);
                ReadinessState::Loading(Some(UNREACHABLE_HINT.to_string()))
            }
        };
        self.transition(next);
        self.state_tx.borrow().clone()
    }

    /// Apply `next` if it is a legal move from the current state.
    fn transition(&self, next: ReadinessState) {
        self.state_tx.send_if_modified(|current| {
            let allowed = match (&*current, &next) {
                (ReadinessState::Ready, _) => false,
                (ReadinessState::Unreachable(_), ReadinessState::Ready) => false,
                (a, b) => a != b,
            };
            if allowed {
                tracing::info!("Backend readiness: {:?} -> {:?}", current, next);
                *current = next.clone();
            }
            allowed
        });
    }
}

fn log_model_info(status: &StatusResponse) {
    match &status.model_info {
        Some(info) => tracing::info!(
            model = info.model_name.as_deref().unwrap_or("unknown"),
            device = info.device.as_deref().unwrap_or("unknown"),
            "Backend ready"
        ),
        None => tracing::info!("Backend ready"),
    }
}
