use std::sync::{Arc, Mutex};

use crate::pool::Pool;

/// State that exists only while a control channel is connected: the
/// control connection's address and the pool of tunnel connections it
/// has offered. Created when a control channel is adopted, discarded
/// (and its pool entries dropped with it) when that channel is lost.
pub struct Session {
    pub control_addr: String,
    pub pool: Pool,
}

/// The single slot a control channel occupies. `None` means no control
/// channel is currently connected.
#[derive(Clone, Default)]
pub struct SessionSlot {
    inner: Arc<Mutex<Option<Arc<Session>>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.inner.lock().unwrap().clone()
    }

    /// Installs a fresh session for `control_addr` iff the slot is
    /// currently empty.
    pub fn try_adopt(&self, control_addr: String) -> Option<Arc<Session>> {
        let mut guard = self.inner.lock().unwrap();
        if guard.is_some() {
            return None;
        }

        let session = Arc::new(Session {
            control_addr,
            pool: Pool::new(),
        });
        *guard = Some(Arc::clone(&session));
        Some(session)
    }

    /// Returns whether `session` is still the slot's occupant.
    pub fn is_active(&self, session: &Arc<Session>) -> bool {
        match &*self.inner.lock().unwrap() {
            Some(current) => Arc::ptr_eq(current, session),
            None => false,
        }
    }

    /// Vacates the slot if `session` is still its occupant, and closes
    /// every connection the session was holding.
    pub fn retire(&self, session: &Arc<Session>) {
        let mut guard = self.inner.lock().unwrap();
        if matches!(&*guard, Some(current) if Arc::ptr_eq(current, session)) {
            *guard = None;
        }
        drop(guard);
        session.pool.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_adopt_is_rejected_until_retired() {
        let slot = SessionSlot::new();
        let first = slot.try_adopt("1.2.3.4:1".to_string()).expect("slot starts empty");
        assert!(slot.try_adopt("5.6.7.8:2".to_string()).is_none());

        slot.retire(&first);
        assert!(slot.try_adopt("5.6.7.8:2".to_string()).is_some());
    }

    #[test]
    fn retire_ignores_a_session_that_was_already_replaced() {
        let slot = SessionSlot::new();
        let first = slot.try_adopt("1.2.3.4:1".to_string()).unwrap();
        slot.retire(&first);
        let second = slot.try_adopt("5.6.7.8:2".to_string()).unwrap();

        slot.retire(&first);
        assert!(slot.is_active(&second));
    }
}
