use crate::types::UserToken;
use http::HeaderMap;
use http::header::COOKIE;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub handle: String,
    pub email: String,
}

/// A logged-in user together with the OAuth token obtained at login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: UserToken,
}

pub trait SessionStore: Send + Sync {
    /// Looks up the session for a session id, if one exists.
    fn resolve(&self, session_id: &str) -> Option<Session>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session_id: impl Into<String>, session: Session) {
        self.sessions.write().insert(session_id.into(), session);
    }
}

impl SessionStore for MemorySessionStore {
    fn resolve(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().get(session_id).cloned()
    }
}

/// Extracts the session id from the request's `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=')
                && name == SESSION_COOKIE
            {
                return Some(value.to_string());
            }
        }
    }
    None
}
