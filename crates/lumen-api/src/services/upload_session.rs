//! In-process upload session store and presign rate limiter.
//!
//! Both are volatile by design: a process restart invalidates every in-flight
//! upload and resets all rate-limit windows. Clients simply re-sign. A
//! multi-instance deployment would need an external expiring KV store.

use chrono::{DateTime, Duration, Utc};
use lumen_core::models::UploadSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const SWEEP_INTERVAL_SECS: u64 = 300;

/// Sessions keyed by upload id.
#[derive(Clone, Default)]
pub struct UploadSessionStore {
    inner: Arc<Mutex<HashMap<Uuid, UploadSession>>>,
}

impl UploadSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: UploadSession) {
        let mut guard = self.inner.lock().await;
        guard.insert(session.id, session);
    }

    /// Look up a live session. Expired entries are dropped on contact.
    pub async fn get(&self, id: Uuid) -> Option<UploadSession> {
        let mut guard = self.inner.lock().await;
        match guard.get(&id) {
            Some(session) if session.is_expired_at(Utc::now()) => {
                guard.remove(&id);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    /// Atomic lookup-and-consume under one lock: the first confirm wins, a
    /// second confirm for the same id sees nothing.
    pub async fn take(&self, id: Uuid) -> Option<UploadSession> {
        let mut guard = self.inner.lock().await;
        let session = guard.remove(&id)?;
        if session.is_expired_at(Utc::now()) {
            return None;
        }
        Some(session)
    }

    /// Idempotent removal.
    pub async fn delete(&self, id: Uuid) {
        let mut guard = self.inner.lock().await;
        guard.remove(&id);
    }

    /// Drop every expired session; returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut guard = self.inner.lock().await;
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_at(now));
        before - guard.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Periodically sweep abandoned sessions so the map cannot grow unbounded.
pub fn spawn_session_sweeper(store: UploadSessionStore) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let removed = store.sweep_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "Swept expired upload sessions");
            }
        }
    });
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Fixed-window presign limiter, one window per user.
#[derive(Clone)]
pub struct UploadRateLimiter {
    inner: Arc<Mutex<HashMap<Uuid, (u32, DateTime<Utc>)>>>,
    max_requests: u32,
    window: Duration,
}

impl UploadRateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::seconds(window_seconds as i64),
        }
    }

    pub async fn check(&self, user_id: Uuid) -> RateDecision {
        self.check_at(user_id, Utc::now()).await
    }

    /// Counting happens against a caller-supplied clock so the window logic
    /// is testable.
    pub async fn check_at(&self, user_id: Uuid, now: DateTime<Utc>) -> RateDecision {
        let mut guard = self.inner.lock().await;
        let (count, reset_at) = guard.entry(user_id).or_insert((0, now + self.window));
        if now >= *reset_at {
            *count = 0;
            *reset_at = now + self.window;
        }
        if *count >= self.max_requests {
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_at: *reset_at,
            };
        }
        *count += 1;
        RateDecision {
            allowed: true,
            remaining: self.max_requests - *count,
            reset_at: *reset_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::models::{MediaKind, MediaScope};

    fn session(expires_in_secs: i64) -> UploadSession {
        let now = Utc::now();
        UploadSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            filename: "a.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size: 10,
            kind: MediaKind::Photo,
            scope: MediaScope::Event(Uuid::new_v4()),
            media_id: None,
            quarantine_key: "quarantine/x.jpg".to_string(),
            created_at: now,
            expires_at: now + Duration::seconds(expires_in_secs),
        }
    }

    #[tokio::test]
    async fn take_consumes_exactly_once() {
        let store = UploadSessionStore::new();
        let s = session(900);
        let id = s.id;
        store.insert(s).await;

        assert!(store.take(id).await.is_some());
        assert!(store.take(id).await.is_none());
    }

    #[tokio::test]
    async fn taken_session_can_be_restored_for_a_retry() {
        let store = UploadSessionStore::new();
        let s = session(900);
        let id = s.id;
        store.insert(s).await;

        let claimed = store.take(id).await.unwrap();
        assert!(store.take(id).await.is_none());

        // A confirm that failed without destroying the upload puts the
        // session back, and the client can confirm again.
        store.insert(claimed).await;
        assert!(store.take(id).await.is_some());
    }

    #[tokio::test]
    async fn expired_sessions_are_invisible() {
        let store = UploadSessionStore::new();
        let s = session(-1);
        let id = s.id;
        store.insert(s).await;

        assert!(store.get(id).await.is_none());
        // get dropped the entry
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn take_rejects_expired() {
        let store = UploadSessionStore::new();
        let s = session(-1);
        let id = s.id;
        store.insert(s).await;

        assert!(store.take(id).await.is_none());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let store = UploadSessionStore::new();
        store.insert(session(-5)).await;
        store.insert(session(-5)).await;
        let live = session(900);
        let live_id = live.id;
        store.insert(live).await;

        assert_eq!(store.sweep_expired().await, 2);
        assert!(store.get(live_id).await.is_some());
    }

    #[tokio::test]
    async fn limiter_counts_down_and_blocks() {
        let limiter = UploadRateLimiter::new(3, 3600);
        let user = Uuid::new_v4();
        let now = Utc::now();

        assert_eq!(limiter.check_at(user, now).await.remaining, 2);
        assert_eq!(limiter.check_at(user, now).await.remaining, 1);
        assert_eq!(limiter.check_at(user, now).await.remaining, 0);

        let blocked = limiter.check_at(user, now).await;
        assert!(!blocked.allowed);
        assert_eq!(blocked.reset_at, now + Duration::seconds(3600));
    }

    #[tokio::test]
    async fn limiter_resets_after_window() {
        let limiter = UploadRateLimiter::new(1, 60);
        let user = Uuid::new_v4();
        let now = Utc::now();

        assert!(limiter.check_at(user, now).await.allowed);
        assert!(!limiter.check_at(user, now).await.allowed);

        let later = now + Duration::seconds(61);
        let decision = limiter.check_at(user, later).await;
        assert!(decision.allowed);
        assert_eq!(decision.reset_at, later + Duration::seconds(60));
    }

    #[tokio::test]
    async fn limiter_windows_are_per_user() {
        let limiter = UploadRateLimiter::new(1, 60);
        let now = Utc::now();

        assert!(limiter.check_at(Uuid::new_v4(), now).await.allowed);
        assert!(limiter.check_at(Uuid::new_v4(), now).await.allowed);
    }
}
