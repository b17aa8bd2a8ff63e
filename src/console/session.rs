//! In-memory console sessions.
//!
//! Each session holds the operator's own backend token, so concurrent
//! operators never share credentials. Sessions die on logout, on expiry, or
//! with the process.

use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use dashmap::DashMap;
use uuid::Uuid;

use crate::backend::LoginGrant;

#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub token: String,
    expires_at: Instant,
}

impl Session {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    max_ttl: Duration,
}

impl SessionStore {
    pub fn new(max_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_ttl,
        }
    }

    /// Lifetime of a session for `grant`: the configured TTL, shortened to the
    /// token's own lifetime when the backend reports one.
    pub fn lifetime(&self, grant: &LoginGrant) -> Duration {
        match grant.expires_in {
            Some(secs) if secs > 0 => self.max_ttl.min(Duration::from_secs(secs)),
            _ => self.max_ttl,
        }
    }

    /// Open a session and return its id.
    pub fn create(&self, username: &str, grant: &LoginGrant) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let session = Session {
            username: username.to_string(),
            token: grant.token.clone(),
            expires_at: Instant::now() + self.lifetime(grant),
        };
        self.sessions.insert(id.clone(), session);
        id
    }

    /// Live session for `id`. Expired entries are evicted on sight.
    pub fn get(&self, id: &str) -> Option<Session> {
        let now = Instant::now();
        let session = self.sessions.get(id).map(|entry| entry.value().clone())?;
        if session.is_expired(now) {
            self.sessions.remove(id);
            return None;
        }
        Some(session)
    }

    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop every expired session, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}

pub fn session_cookie(name: &str, id: &str, lifetime: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name,
        id,
        lifetime.as_secs()
    )
}

pub fn expired_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}
