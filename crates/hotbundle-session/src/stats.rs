use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use hotbundle_core::{DeviceIdentity, StatsAction, StatsPayload, StatsReporter};
use tracing::debug;

use crate::Fetcher;

const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Posts usage events to the stats endpoint from a background thread. The
/// triggering call never waits for, or learns about, delivery. Handles of
/// unfinished deliveries are kept so the host can `flush` before exit.
pub struct HttpStatsReporter {
    fetcher: Arc<dyn Fetcher>,
    endpoint: Option<String>,
    identity: DeviceIdentity,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpStatsReporter {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        endpoint: Option<String>,
        identity: DeviceIdentity,
    ) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.filter(|value| !value.trim().is_empty()),
            identity,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Number of deliveries that have not finished yet.
    pub fn pending(&self) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        reap_finished(&mut pending);
        pending.len()
    }
}

impl StatsReporter for HttpStatsReporter {
    fn report(&self, action: StatsAction, version_name: &str) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        let payload = self.identity.payload(action, version_name);
        let fetcher = Arc::clone(&self.fetcher);

        let spawned = thread::Builder::new()
            .name("hotbundle-stats".to_string())
            .spawn(move || deliver(fetcher.as_ref(), &endpoint, &payload));
        match spawned {
            Ok(handle) => {
                let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
                reap_finished(&mut pending);
                pending.push(handle);
            }
            Err(err) => {
                debug!(action = action.as_str(), error = %err, "stats thread not started");
            }
        }
    }

    fn flush(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = self.pending();
            if remaining == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                debug!(pending = remaining, "stats flush timed out");
                return false;
            }
            thread::sleep(FLUSH_POLL_INTERVAL);
        }
    }
}

fn reap_finished(pending: &mut Vec<JoinHandle<()>>) {
    let mut index = 0;
    while index < pending.len() {
        if pending[index].is_finished() {
            let handle = pending.swap_remove(index);
            if handle.join().is_err() {
                debug!("stats thread panicked");
            }
        } else {
            index += 1;
        }
    }
}

fn deliver(fetcher: &dyn Fetcher, endpoint: &str, payload: &StatsPayload) {
    let body = match serde_json::to_vec(payload) {
        Ok(body) => body,
        Err(err) => {
            debug!(error = %err, "stats payload not serialized");
            return;
        }
    };

    match fetcher.post_json(endpoint, body) {
        Ok(status) => debug!(
            action = payload.action.as_str(),
            version = %payload.version_name,
            status,
            "stats sent"
        ),
        Err(err) => debug!(
            action = payload.action.as_str(),
            error = %format!("{err:#}"),
            "stats not sent"
        ),
    }
}
