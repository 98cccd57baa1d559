//! Lifecycle notifications of a host project session.
//!
//! Listeners are one-shot: a listener is removed from the registry before it is
//! called, so it can never fire twice even if the session is reopened.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened(PathBuf),
    Closed,
}

impl SessionEvent {
    pub fn kind(&self) -> SessionEventKind {
        match self {
            SessionEvent::Opened(_) => SessionEventKind::Opened,
            SessionEvent::Closed => SessionEventKind::Closed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    Opened,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnOnce(&SessionEvent) + Send>;

struct Registry {
    next_id: u64,
    listeners: Vec<(ListenerId, SessionEventKind, Listener)>,
}

/// Registry of one-shot listeners for [`SessionEvent`]s.
pub struct SessionEvents {
    registry: Mutex<Registry>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            }),
        }
    }

    /// Registers `listener` for the next event of `kind`.
    pub fn once<F>(&self, kind: SessionEventKind, listener: F) -> ListenerId
    where
        F: FnOnce(&SessionEvent) + Send + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.push((id, kind, Box::new(listener)));
        id
    }

    /// Removes a listener that has not fired yet. Returns `false` if it already fired.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.listeners.len();
        registry.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        registry.listeners.len() != before
    }

    /// Fires and deregisters every listener waiting for this event's kind.
    /// Returns how many listeners fired.
    pub fn emit(&self, event: SessionEvent) -> usize {
        let kind = event.kind();
        let fired: Vec<Listener> = {
            let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            let (matching, remaining): (Vec<_>, Vec<_>) = registry
                .listeners
                .drain(..)
                .partition(|(_, listener_kind, _)| *listener_kind == kind);
            registry.listeners = remaining;
            matching.into_iter().map(|(_, _, listener)| listener).collect()
        };

        let count = fired.len();
        for listener in fired {
            listener(&event);
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}
