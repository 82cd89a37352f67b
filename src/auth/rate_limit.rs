//! Login attempt limiting.
//!
//! Tracks failed logins per username and client address pair in an
//! expiring cache. After too many failures within the window the pair
//! is locked out for a fixed duration.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// An expiring counter cache.
///
/// The limiter only needs counters with a time-to-live, so the store
/// is abstracted behind this trait. The in-memory implementation is
/// the only one shipped; a shared cache can be swapped in behind it.
pub trait TtlCache: Send + Sync {
    /// Get a live value, if present and not expired.
    fn get(&self, key: &str) -> Option<u64>;

    /// Set a value with an expiry.
    fn set(&self, key: &str, value: u64, ttl: Duration);

    /// Remove a value.
    fn remove(&self, key: &str);

    /// Atomically increment a counter, creating it when absent or
    /// expired. Returns the new value. Every bump pushes the entry's
    /// expiry out by the full TTL, so the counting window slides with
    /// the latest recorded failure.
    fn increment(&self, key: &str, ttl: Duration) -> u64;
}

/// In-memory [`TtlCache`] backed by a `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (u64, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries. Called opportunistically on writes.
    fn purge(entries: &mut HashMap<String, (u64, Instant)>) {
        let now = Instant::now();
        entries.retain(|_, (_, expires)| *expires > now);
    }
}

impl TtlCache for MemoryCache {
    fn get(&self, key: &str) -> Option<u64> {
        let entries = self.entries.read().unwrap();
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Some(*value),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: u64, ttl: Duration) {
        let mut entries = self.entries.write().unwrap();
        Self::purge(&mut entries);
        entries.insert(key.to_string(), (value, Instant::now() + ttl));
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.write().unwrap();
        entries.remove(key);
    }

    fn increment(&self, key: &str, ttl: Duration) -> u64 {
        let mut entries = self.entries.write().unwrap();
        Self::purge(&mut entries);
        let now = Instant::now();
        match entries.get_mut(key) {
            Some((value, expires)) if *expires > now => {
                *value += 1;
                *expires = now + ttl;
                *value
            }
            _ => {
                entries.insert(key.to_string(), (1, now + ttl));
                1
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Minutes from `now` until an expiry instant, rounded up, at least 1.
fn minutes_remaining(expiry_millis: u64, now_millis: u64) -> u64 {
    let remaining = expiry_millis.saturating_sub(now_millis);
    ((remaining + 59_999) / 60_000).max(1)
}

/// Outcome of checking whether a login may proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginGate {
    /// Login may be attempted.
    Allowed,
    /// The username and address pair is locked out.
    Locked {
        /// Minutes until the lockout expires, rounded up, at least 1.
        minutes_remaining: u64,
    },
}

/// Outcome of recording a failed login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// More attempts remain in the window.
    AttemptsRemaining(u32),
    /// This failure triggered a lockout.
    LockedOut {
        /// Minutes until the lockout expires.
        minutes: u64,
    },
}

/// Limits login attempts per username and client address pair.
pub struct LoginLimiter<C: TtlCache> {
    cache: C,
    max_attempts: u32,
    window: Duration,
    lockout: Duration,
}

impl<C: TtlCache> LoginLimiter<C> {
    pub fn new(cache: C, max_attempts: u32, window: Duration, lockout: Duration) -> Self {
        Self {
            cache,
            max_attempts,
            window,
            lockout,
        }
    }

    // Keys use the lowercased username so retries that vary only in
    // case share one counter
    fn attempts_key(username: &str, client_ip: &str) -> String {
        format!("login_attempts:{}:{}", username.to_lowercase(), client_ip)
    }

    fn lockout_key(username: &str, client_ip: &str) -> String {
        format!("login_lockout:{}:{}", username.to_lowercase(), client_ip)
    }

    fn lockout_minutes(&self) -> u64 {
        (self.lockout.as_secs() + 59) / 60
    }

    /// Check whether a login attempt for this pair may proceed. While
    /// locked out, reports the minutes left until the lockout expires.
    pub fn check(&self, username: &str, client_ip: &str) -> LoginGate {
        match self.cache.get(&Self::lockout_key(username, client_ip)) {
            Some(expiry) => LoginGate::Locked {
                minutes_remaining: minutes_remaining(expiry, now_millis()),
            },
            None => LoginGate::Allowed,
        }
    }

    /// Record a failed login. When the failure count reaches the
    /// maximum, the counter is replaced by a lockout marker.
    pub fn record_failure(&self, username: &str, client_ip: &str) -> FailureOutcome {
        let count = self
            .cache
            .increment(&Self::attempts_key(username, client_ip), self.window);

        if count >= self.max_attempts as u64 {
            // The lockout marker's value is its own expiry instant, so
            // a later check can report the minutes left
            let expiry = now_millis() + self.lockout.as_millis() as u64;
            self.cache.set(
                &Self::lockout_key(username, client_ip),
                expiry,
                self.lockout,
            );
            self.cache.remove(&Self::attempts_key(username, client_ip));
            FailureOutcome::LockedOut {
                minutes: self.lockout_minutes(),
            }
        } else {
            FailureOutcome::AttemptsRemaining(self.max_attempts - count as u32)
        }
    }

    /// Record a successful login, clearing both the counter and any
    /// lockout marker for the pair.
    pub fn record_success(&self, username: &str, client_ip: &str) {
        self.cache.remove(&Self::attempts_key(username, client_ip));
        self.cache.remove(&Self::lockout_key(username, client_ip));
    }
}
