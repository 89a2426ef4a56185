use crate::classify::AnalysisMode;
use crate::login::IdentityStore;
use crate::table::DataTable;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "sentiscope_session";

/// State of one interactive session
///
/// Created on first contact and discarded when it goes idle. Holds the
/// session's own user store, so accounts never leak between sessions.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub identity: IdentityStore,
    /// Most recent analysed table, target of exploration and downloads
    pub dataset: Option<DataTable>,
    pub mode: AnalysisMode,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_id(Uuid::new_v4(), now)
    }

    pub fn with_id(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            identity: IdentityStore::new(),
            dataset: None,
            mode: AnalysisMode::default(),
            created_at: now,
            last_seen: now,
        }
    }

    /// Log out and forget the analysed data
    pub fn logout(&mut self) {
        self.identity.logout();
        self.dataset = None;
    }
}

/// All live sessions
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<Uuid, Session>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            idle_timeout,
        }
    }

    /// Look up a live session or start a new one
    ///
    /// Unknown or expired ids get a fresh session; callers must hand the
    /// returned session's id back to the client.
    pub fn open(&mut self, id: Option<Uuid>, now: DateTime<Utc>) -> &mut Session {
        self.evict_idle(now);

        let id = id
            .filter(|id| self.sessions.contains_key(id))
            .unwrap_or_else(Uuid::new_v4);

        let session = self.sessions.entry(id).or_insert_with(|| {
            log::debug!("starting session {}", id);
            Session::with_id(id, now)
        });
        session.last_seen = now;
        session
    }

    /// Look up a live session without creating one
    pub fn get_mut(&mut self, id: &Uuid, now: DateTime<Utc>) -> Option<&mut Session> {
        self.evict_idle(now);
        let session = self.sessions.get_mut(id)?;
        session.last_seen = now;
        Some(session)
    }

    /// Drop sessions idle for longer than the timeout; returns how many
    pub fn evict_idle(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        let timeout = self.idle_timeout;
        self.sessions
            .retain(|_, session| now - session.last_seen <= timeout);

        let evicted = before - self.sessions.len();
        if evicted > 0 {
            log::info!("discarded {} idle session(s)", evicted);
        }
        evicted
    }

    pub fn end(&mut self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
