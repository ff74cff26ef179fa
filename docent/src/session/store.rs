use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::error::{DocentError, Result};
use crate::models::{SessionStats, Turn};

const SESSION_ID_LEN: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Active,
    Expired,
}

#[derive(Debug)]
struct Session {
    state: SessionState,
    history: VecDeque<Turn>,
    last_activity: DateTime<Utc>,
}

type SessionHandle = Arc<Mutex<Session>>;

/// In-memory conversation sessions with a sliding history window and an
/// inactivity TTL.
///
/// The outer map lock is held only to look up or insert a handle; appends lock
/// the individual session, so requests on different sessions do not contend.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionHandle>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    window: usize,
    max_resident: usize,
}

impl SessionStore {
    pub fn new(config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
            ttl: Duration::seconds(
                i64::try_from(config.ttl_secs)
                    .unwrap_or(i64::MAX)
                    .min(i64::MAX / 1000),
            ),
            window: config.window.max(1),
            max_resident: config.max_resident.max(1),
        }
    }

    /// Returns the id of a live session, creating one when `session_id` is
    /// absent, unknown or expired. The flag is true for a freshly created session.
    pub fn resolve(&self, session_id: Option<&str>) -> (String, bool) {
        let now = self.clock.now();

        if let Some(id) = session_id {
            if self.live_handle(id, now).is_some() {
                return (id.to_string(), false);
            }
        }

        let mut sessions = self.lock_sessions();
        if sessions.len() >= self.max_resident {
            let removed = self.sweep_locked(&mut sessions, now);
            tracing::debug!(removed, "Opportunistic session sweep");
        }

        let id = loop {
            let candidate = nanoid::nanoid!(SESSION_ID_LEN);
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        sessions.insert(
            id.clone(),
            Arc::new(Mutex::new(Session {
                state: SessionState::Active,
                history: VecDeque::new(),
                last_activity: now,
            })),
        );

        tracing::debug!(session_id = %id, "Created session");
        (id, true)
    }

    pub fn append(&self, session_id: &str, turn: Turn) -> Result<()> {
        self.append_all(session_id, vec![turn])
    }

    /// Appends `turns` in order under one lock, so no other append lands between them.
    pub fn append_all(&self, session_id: &str, turns: Vec<Turn>) -> Result<()> {
        let now = self.clock.now();
        let handle = self
            .live_handle(session_id, now)
            .ok_or_else(|| DocentError::UnknownSession(session_id.to_string()))?;

        let mut session = lock(&handle);
        // expired between lookup and lock
        if session.state == SessionState::Expired || self.is_expired(&session, now) {
            session.state = SessionState::Expired;
            drop(session);
            self.remove_if_same(session_id, &handle);
            return Err(DocentError::UnknownSession(session_id.to_string()));
        }

        session.history.extend(turns);
        while session.history.len() > self.window {
            session.history.pop_front();
        }
        session.last_activity = now;
        Ok(())
    }

    /// Snapshot of the session history, oldest first.
    pub fn read(&self, session_id: &str) -> Result<Vec<Turn>> {
        let now = self.clock.now();
        let handle = self
            .live_handle(session_id, now)
            .ok_or_else(|| DocentError::UnknownSession(session_id.to_string()))?;
        let history = lock(&handle).history.iter().cloned().collect();
        Ok(history)
    }

    /// Drops every expired session. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.lock_sessions();
        self.sweep_locked(&mut sessions, now)
    }

    pub fn stats(&self) -> SessionStats {
        let now = self.clock.now();
        let handles: Vec<SessionHandle> = self.lock_sessions().values().cloned().collect();

        let lengths: Vec<usize> = handles
            .iter()
            .filter_map(|handle| {
                let session = lock(handle);
                (session.state == SessionState::Active && !self.is_expired(&session, now))
                    .then_some(session.history.len())
            })
            .collect();

        let active_sessions = lengths.len();
        let avg_history_length = if active_sessions == 0 {
            0.0
        } else {
            lengths.iter().sum::<usize>() as f64 / active_sessions as f64
        };

        SessionStats {
            active_sessions,
            avg_history_length,
        }
    }

    /// Number of sessions held in memory, including expired ones not yet swept.
    pub fn resident(&self) -> usize {
        self.lock_sessions().len()
    }

    pub fn shutdown(&self) {
        let mut sessions = self.lock_sessions();
        let count = sessions.len();
        for handle in sessions.values() {
            lock(handle).state = SessionState::Expired;
        }
        sessions.clear();
        tracing::info!(sessions = count, "Session store shut down");
    }

    fn live_handle(&self, session_id: &str, now: DateTime<Utc>) -> Option<SessionHandle> {
        let handle = self.lock_sessions().get(session_id).cloned()?;

        let expired = {
            let mut session = lock(&handle);
            if session.state == SessionState::Active && self.is_expired(&session, now) {
                session.state = SessionState::Expired;
            }
            session.state == SessionState::Expired
        };

        if expired {
            self.remove_if_same(session_id, &handle);
            tracing::debug!(session_id = %session_id, "Session expired");
            return None;
        }
        Some(handle)
    }

    /// Removes the map entry only if it still points at `handle`, leaving a
    /// session created under the same id in the meantime alone.
    fn remove_if_same(&self, session_id: &str, handle: &SessionHandle) {
        let mut sessions = self.lock_sessions();
        if sessions
            .get(session_id)
            .is_some_and(|current| Arc::ptr_eq(current, handle))
        {
            sessions.remove(session_id);
        }
    }

    fn sweep_locked(&self, sessions: &mut HashMap<String, SessionHandle>, now: DateTime<Utc>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, handle| {
            let mut session = lock(handle);
            if session.state == SessionState::Active && self.is_expired(&session, now) {
                session.state = SessionState::Expired;
            }
            session.state == SessionState::Active
        });
        before - sessions.len()
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.last_activity > self.ttl
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<String, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn lock(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    handle.lock().unwrap_or_else(|e| e.into_inner())
}
