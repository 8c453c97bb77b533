//! Callback registry for marker interaction events.
//!
//! Listeners are plain closures registered per event kind. They run
//! synchronously inside the interaction system, in registration order, and
//! receive the record of the marker involved. The same events are also
//! written as [`crate::GlobeEvent`] messages for systems that prefer those.

use std::fmt;

use bevy::prelude::*;

use crate::record::EventRecord;

/// Kind of interaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobeEventKind {
    /// The pointer moved onto a marker.
    MarkerHover,
    /// The pointer left the previously hovered marker.
    MarkerLeave,
    /// The hovered marker was clicked.
    MarkerClick,
}

impl GlobeEventKind {
    /// Event name as used by the web frontend.
    pub fn name(self) -> &'static str {
        match self {
            Self::MarkerHover => "markerHover",
            Self::MarkerLeave => "markerLeave",
            Self::MarkerClick => "markerClick",
        }
    }
}

impl fmt::Display for GlobeEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle returned by [`GlobeListeners::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Callback = Box<dyn Fn(&EventRecord) + Send + Sync>;

struct Listener {
    id: ListenerId,
    kind: GlobeEventKind,
    callback: Callback,
}

/// Registered interaction listeners.
#[derive(Resource, Default)]
pub struct GlobeListeners {
    next_id: u64,
    listeners: Vec<Listener>,
}

impl GlobeListeners {
    /// Register a callback for one event kind.
    pub fn add_listener(
        &mut self,
        kind: GlobeEventKind,
        callback: impl Fn(&EventRecord) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a listener. Returns `false` if the id was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    /// Invoke every listener for `kind` in registration order.
    pub fn dispatch(&self, kind: GlobeEventKind, record: &EventRecord) {
        for listener in self.listeners.iter().filter(|l| l.kind == kind) {
            (listener.callback)(record);
        }
    }

    /// Number of registered listeners across all kinds.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Drop every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl fmt::Debug for GlobeListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobeListeners")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_dispatch_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = GlobeListeners::default();
        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            listeners.add_listener(GlobeEventKind::MarkerClick, move |record| {
                log.lock().unwrap().push(format!("{tag}:{}", record.id));
            });
        }

        listeners.dispatch(GlobeEventKind::MarkerClick, &EventRecord::new("a", 0.0, 0.0, 5));
        assert_eq!(*log.lock().unwrap(), ["first:a", "second:a", "third:a"]);
    }

    #[test]
    fn test_dispatch_filters_by_kind() {
        let hits = Arc::new(Mutex::new(0));
        let mut listeners = GlobeListeners::default();
        let counter = Arc::clone(&hits);
        listeners.add_listener(GlobeEventKind::MarkerHover, move |_| {
            *counter.lock().unwrap() += 1;
        });

        let record = EventRecord::new("a", 0.0, 0.0, 5);
        listeners.dispatch(GlobeEventKind::MarkerLeave, &record);
        listeners.dispatch(GlobeEventKind::MarkerHover, &record);
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_remove_listener() {
        let hits = Arc::new(Mutex::new(0));
        let mut listeners = GlobeListeners::default();
        let counter = Arc::clone(&hits);
        let id = listeners.add_listener(GlobeEventKind::MarkerClick, move |_| {
            *counter.lock().unwrap() += 1;
        });

        assert!(listeners.remove_listener(id));
        assert!(!listeners.remove_listener(id));
        assert!(listeners.is_empty());

        listeners.dispatch(GlobeEventKind::MarkerClick, &EventRecord::new("a", 0.0, 0.0, 5));
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut listeners = GlobeListeners::default();
        let a = listeners.add_listener(GlobeEventKind::MarkerHover, |_| {});
        listeners.remove_listener(a);
        let b = listeners.add_listener(GlobeEventKind::MarkerHover, |_| {});
        assert_ne!(a, b);
    }
}
