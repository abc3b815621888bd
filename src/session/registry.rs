use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::Session;

struct Entry {
    session: Session,
    touched_at: Instant,
}

/// Active sessions keyed by user. A user has at most one; starting another replaces it.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `session` for `user_id`, returning the one it replaced.
    pub fn insert(&self, user_id: &str, session: Session) -> Option<Session> {
        let entry = Entry {
            session,
            touched_at: Instant::now(),
        };
        self.sessions
            .lock()
            .insert(user_id.to_string(), entry)
            .map(|old| old.session)
    }

    pub fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions
            .lock()
            .get(user_id)
            .map(|entry| entry.session.clone())
    }

    /// Runs `f` against the user's session under the lock.
    pub fn with_session<T>(&self, user_id: &str, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let mut guard = self.sessions.lock();
        let entry = guard.get_mut(user_id)?;
        entry.touched_at = Instant::now();
        Some(f(&mut entry.session))
    }

    pub fn remove(&self, user_id: &str) -> Option<Session> {
        self.sessions.lock().remove(user_id).map(|entry| entry.session)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions idle for longer than `max_idle`; returns how many went.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut guard = self.sessions.lock();
        let before = guard.len();
        guard.retain(|_, entry| entry.touched_at.elapsed() <= max_idle);
        before - guard.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Mode, StudyKind};

    #[test]
    fn test_one_session_per_user() {
        let registry = SessionRegistry::new();
        assert!(registry
            .insert("u1", Session::new(StudyKind::Quiz, Mode::New))
            .is_none());
        let replaced = registry.insert("u1", Session::new(StudyKind::Flashcard, Mode::Review));
        assert_eq!(replaced.map(|s| s.kind()), Some(StudyKind::Quiz));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("u1").map(|s| s.mode()), Some(Mode::Review));
    }

    #[test]
    fn test_evict_idle() {
        let registry = SessionRegistry::new();
        registry.insert("u1", Session::new(StudyKind::Quiz, Mode::New));
        assert_eq!(registry.evict_idle(Duration::from_secs(60)), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(registry.evict_idle(Duration::ZERO), 1);
        assert!(registry.is_empty());
    }
}
