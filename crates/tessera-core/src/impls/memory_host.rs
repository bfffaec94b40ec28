//! MemoryHost - ブラウザの window/history を模したインメモリ HostWindow
//!
//! - push_state / replace_state はイベントを発火しない（ブラウザと同じ）
//! - back / forward は PopState を、set_hash は HashChange を発火する

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{EventKind, HostEvent, Location, OrchestratorError};
use crate::ports::{HostWindow, Listener};

struct Entry {
    location: Location,
    state: Option<serde_json::Value>,
}

struct MemoryHostState {
    current: Entry,
    back: Vec<Entry>,
    forward: Vec<Entry>,
    listeners: Vec<(EventKind, Listener)>,
}

pub struct MemoryHost {
    state: Mutex<MemoryHostState>,
}

impl MemoryHost {
    pub fn new(initial: Location) -> Self {
        Self {
            state: Mutex::new(MemoryHostState {
                current: Entry {
                    location: initial,
                    state: None,
                },
                back: Vec::new(),
                forward: Vec::new(),
                listeners: Vec::new(),
            }),
        }
    }

    pub fn parse(href: &str) -> Result<Self, OrchestratorError> {
        Location::parse(href)
            .map(Self::new)
            .map_err(|source| OrchestratorError::InvalidUrl {
                url: href.to_string(),
                source,
            })
    }

    /// Go back one entry and dispatch PopState. Returns false at the start of history.
    pub fn back(&self) -> bool {
        let event = {
            let mut state = self.lock();
            let Some(previous) = state.back.pop() else {
                return false;
            };
            let current = std::mem::replace(&mut state.current, previous);
            state.forward.push(current);
            Self::current_event(&state, EventKind::PopState)
        };
        self.dispatch(&event);
        true
    }

    pub fn forward(&self) -> bool {
        let event = {
            let mut state = self.lock();
            let Some(next) = state.forward.pop() else {
                return false;
            };
            let current = std::mem::replace(&mut state.current, next);
            state.back.push(current);
            Self::current_event(&state, EventKind::PopState)
        };
        self.dispatch(&event);
        true
    }

    /// Navigate to a new fragment and dispatch HashChange.
    pub fn set_hash(&self, hash: &str) {
        let event = {
            let mut state = self.lock();
            let location = state.current.location.with_hash(hash);
            if location == state.current.location {
                return;
            }
            let previous = std::mem::replace(
                &mut state.current,
                Entry {
                    location,
                    state: None,
                },
            );
            state.back.push(previous);
            state.forward.clear();
            Self::current_event(&state, EventKind::HashChange)
        };
        self.dispatch(&event);
    }

    /// Deliver an event to every listener registered for its kind.
    pub fn dispatch(&self, event: &HostEvent) {
        let listeners: Vec<Listener> = self
            .lock()
            .listeners
            .iter()
            .filter(|(kind, _)| *kind == event.kind)
            .map(|(_, listener)| listener.clone())
            .collect();
        // listeners may call back into the host, so the lock is released first
        for listener in listeners {
            listener.call(event);
        }
    }

    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.lock()
            .listeners
            .iter()
            .filter(|(k, _)| k == kind)
            .count()
    }

    pub fn history_len(&self) -> usize {
        let state = self.lock();
        state.back.len() + 1 + state.forward.len()
    }

    fn current_event(state: &MemoryHostState, kind: EventKind) -> HostEvent {
        HostEvent {
            kind,
            location: state.current.location.clone(),
            state: state.current.state.clone(),
            synthetic: false,
        }
    }

    fn resolve(state: &MemoryHostState, url: &str) -> Result<Location, OrchestratorError> {
        state
            .current
            .location
            .resolve(url)
            .map_err(|source| OrchestratorError::InvalidUrl {
                url: url.to_string(),
                source,
            })
    }

    fn lock(&self) -> MutexGuard<'_, MemoryHostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostWindow for MemoryHost {
    fn location(&self) -> Location {
        self.lock().current.location.clone()
    }

    fn push_state(&self, state: serde_json::Value, url: &str) -> Result<(), OrchestratorError> {
        let mut guard = self.lock();
        let location = Self::resolve(&guard, url)?;
        let previous = std::mem::replace(
            &mut guard.current,
            Entry {
                location,
                state: Some(state),
            },
        );
        guard.back.push(previous);
        guard.forward.clear();
        Ok(())
    }

    fn replace_state(
        &self,
        state: serde_json::Value,
        url: &str,
    ) -> Result<(), OrchestratorError> {
        let mut guard = self.lock();
        let location = Self::resolve(&guard, url)?;
        guard.current = Entry {
            location,
            state: Some(state),
        };
        Ok(())
    }

    fn add_event_listener(&self, kind: &EventKind, listener: Listener) {
        let mut state = self.lock();
        let exists = state
            .listeners
            .iter()
            .any(|(k, l)| k == kind && *l == listener);
        if !exists {
            state.listeners.push((kind.clone(), listener));
        }
    }

    fn remove_event_listener(&self, kind: &EventKind, listener: &Listener) {
        self.lock()
            .listeners
            .retain(|(k, l)| !(k == kind && l == listener));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let listener = {
            let count = Arc::clone(&count);
            Listener::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, listener)
    }

    #[test]
    fn test_push_state_is_silent() {
        let host = MemoryHost::parse("http://localhost/").unwrap();
        let (count, listener) = counter();
        host.add_event_listener(&EventKind::PopState, listener);

        host.push_state(serde_json::Value::Null, "/widgets").unwrap();
        assert_eq!(host.location().pathname(), "/widgets");
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(host.history_len(), 2);
    }

    #[test]
    fn test_back_and_forward_dispatch_pop_state() {
        let host = MemoryHost::parse("http://localhost/").unwrap();
        let (count, listener) = counter();
        host.add_event_listener(&EventKind::PopState, listener);
        host.push_state(serde_json::json!({ "n": 1 }), "/a").unwrap();

        assert!(host.back());
        assert_eq!(host.location().pathname(), "/");
        assert!(host.forward());
        assert_eq!(host.location().pathname(), "/a");
        assert!(!host.forward());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_set_hash_dispatches_hash_change() {
        let host = MemoryHost::parse("http://localhost/").unwrap();
        let (count, listener) = counter();
        host.add_event_listener(&EventKind::HashChange, listener);

        host.set_hash("#/settings");
        host.set_hash("#/settings");
        assert_eq!(host.location().hash(), "/settings");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_registered_once_and_removable() {
        let host = MemoryHost::parse("http://localhost/").unwrap();
        let (_, listener) = counter();
        let kind = EventKind::parse("resize");
        host.add_event_listener(&kind, listener.clone());
        host.add_event_listener(&kind, listener.clone());
        assert_eq!(host.listener_count(&kind), 1);

        host.remove_event_listener(&kind, &listener);
        assert_eq!(host.listener_count(&kind), 0);
    }

    #[test]
    fn test_invalid_url_is_reported() {
        let host = MemoryHost::parse("http://localhost/").unwrap();
        let err = host
            .push_state(serde_json::Value::Null, "http://[::1")
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidUrl { .. }));
    }
}
