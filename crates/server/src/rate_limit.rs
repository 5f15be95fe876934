use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// In-memory sliding-log rate limiter keyed by client address.
///
/// Each key keeps the instants of its accepted requests inside the window.
/// Expired entries are pruned on every check, and a key with no entries
/// left is dropped. State is per process.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    log: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            log: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request from `client` if it is within the limit.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut log = match self.log.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        log.retain(|_, entries| {
            entries.retain(|t| now.saturating_duration_since(*t) < self.window);
            !entries.is_empty()
        });

        let count = log.get(client).map_or(0, Vec::len);
        if count >= self.max_requests {
            return false;
        }
        log.entry(client.to_string()).or_default().push(now);
        true
    }

    /// Requests still counted against `client`.
    pub fn in_window(&self, client: &str) -> usize {
        self.log
            .lock()
            .map(|log| log.get(client).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Number of clients with requests still inside the window.
    pub fn tracked_clients(&self) -> usize {
        self.log.lock().map(|log| log.len()).unwrap_or(0)
    }
}
