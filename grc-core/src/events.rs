use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;

use crate::tenant::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

static LISTENER_ID: AtomicU64 = AtomicU64::new(1);

fn next_listener_id() -> ListenerId {
    ListenerId(LISTENER_ID.fetch_add(1, Ordering::Relaxed))
}

/// What changed in the organization context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionEventKind {
    /// The selection was (re)built from the durable store.
    Initialized,
    /// A different tenant is selected. The workspace was reset with it.
    TenantChanged,
    /// Only the workspace changed.
    WorkspaceChanged,
}

impl SelectionEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionEventKind::Initialized => "initialized",
            SelectionEventKind::TenantChanged => "tenant.changed",
            SelectionEventKind::WorkspaceChanged => "workspace.changed",
        }
    }
}

/// Delivered to listeners after the store has applied the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionEvent {
    pub kind: SelectionEventKind,
    pub selection: Selection,
}

pub type SelectionListener = Arc<dyn Fn(&SelectionEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPat {
    Any,
    Exact(SelectionEventKind),
}

impl EventPat {
    pub fn matches(&self, kind: SelectionEventKind) -> bool {
        match self {
            EventPat::Any => true,
            EventPat::Exact(k) => *k == kind,
        }
    }
}

#[derive(Clone)]
struct ListenerEntry {
    id: ListenerId,
    pattern: EventPat,
    listener: SelectionListener,
    once: bool,
}

/// Listener registry for selection changes.
///
/// The store keeps this behind a lock, and listeners are allowed to call back
/// into the store. So the store takes the matching listeners under the lock
/// and calls them after releasing it.
#[derive(Default)]
pub struct SelectionHub {
    listeners: Vec<ListenerEntry>,
}

impl SelectionHub {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn on(&mut self, pattern: EventPat, listener: SelectionListener) -> ListenerId {
        self.push(pattern, listener, false)
    }

    pub fn once(&mut self, pattern: EventPat, listener: SelectionListener) -> ListenerId {
        self.push(pattern, listener, true)
    }

    fn push(&mut self, pattern: EventPat, listener: SelectionListener, once: bool) -> ListenerId {
        let id = next_listener_id();
        self.listeners.push(ListenerEntry {
            id,
            pattern,
            listener,
            once,
        });
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|e| e.id != id);
        before != self.listeners.len()
    }

    /// Remove every listener, or only those registered with `pattern`.
    pub fn remove_all(&mut self, pattern: Option<EventPat>) -> usize {
        let before = self.listeners.len();
        if let Some(p) = pattern {
            self.listeners.retain(|e| e.pattern != p);
        } else {
            self.listeners.clear();
        }
        before - self.listeners.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Matching listeners in registration order. Fired `once` entries are
    /// dropped here, before any listener runs, so a nested emit cannot reach
    /// them again.
    pub fn take_listeners(&mut self, kind: SelectionEventKind) -> Vec<SelectionListener> {
        let mut to_call = Vec::new();
        self.listeners.retain(|entry| {
            if !entry.pattern.matches(kind) {
                return true;
            }
            to_call.push(Arc::clone(&entry.listener));
            !entry.once
        });
        to_call
    }

    /// For callers that own the hub outright.
    pub fn emit(&mut self, event: &SelectionEvent) {
        for f in &self.take_listeners(event.kind) {
            f(event);
        }
    }
}

/// Parse "initialized", "tenant.changed", "workspace.changed" or "*".
pub fn parse_event_pattern(input: &str) -> anyhow::Result<EventPat> {
    let norm = input.trim().to_lowercase();
    match norm.as_str() {
        "*" => Ok(EventPat::Any),
        "initialized" => Ok(EventPat::Exact(SelectionEventKind::Initialized)),
        "tenant.changed" | "tenant" => Ok(EventPat::Exact(SelectionEventKind::TenantChanged)),
        "workspace.changed" | "workspace" => Ok(EventPat::Exact(SelectionEventKind::WorkspaceChanged)),
        other => Err(anyhow::anyhow!(
            "Invalid selection event '{other}'. Expected 'initialized', 'tenant.changed', 'workspace.changed' or '*'."
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn event(kind: SelectionEventKind) -> SelectionEvent {
        SelectionEvent {
            kind,
            selection: Selection::empty(),
        }
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> SelectionListener {
        let log = Arc::clone(log);
        Arc::new(move |e: &SelectionEvent| {
            log.lock().push(format!("{tag}:{}", e.kind.as_str()));
        })
    }

    #[test]
    fn patterns_filter_delivery() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hub = SelectionHub::new();
        hub.on(EventPat::Any, recorder(&log, "all"));
        hub.on(EventPat::Exact(SelectionEventKind::TenantChanged), recorder(&log, "tenant"));

        hub.emit(&event(SelectionEventKind::WorkspaceChanged));
        hub.emit(&event(SelectionEventKind::TenantChanged));

        assert_eq!(
            *log.lock(),
            vec![
                "all:workspace.changed",
                "all:tenant.changed",
                "tenant:tenant.changed"
            ]
        );
    }

    #[test]
    fn once_listener_fires_a_single_time() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hub = SelectionHub::new();
        hub.once(EventPat::Any, recorder(&log, "once"));

        hub.emit(&event(SelectionEventKind::Initialized));
        hub.emit(&event(SelectionEventKind::Initialized));

        assert_eq!(log.lock().len(), 1);
        assert!(hub.is_empty());
    }

    #[test]
    fn once_listener_is_gone_before_it_runs() {
        let mut hub = SelectionHub::new();
        hub.once(EventPat::Any, Arc::new(|_: &SelectionEvent| {}));
        hub.on(EventPat::Exact(SelectionEventKind::TenantChanged), Arc::new(|_: &SelectionEvent| {}));

        let taken = hub.take_listeners(SelectionEventKind::TenantChanged);

        assert_eq!(taken.len(), 2);
        assert_eq!(hub.len(), 1);
        assert!(hub.take_listeners(SelectionEventKind::Initialized).is_empty());
    }

    #[test]
    fn off_and_remove_all() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hub = SelectionHub::new();
        let a = hub.on(EventPat::Any, recorder(&log, "a"));
        hub.on(EventPat::Exact(SelectionEventKind::Initialized), recorder(&log, "b"));
        hub.on(EventPat::Exact(SelectionEventKind::Initialized), recorder(&log, "c"));

        assert!(hub.off(a));
        assert!(!hub.off(a));
        assert_eq!(hub.remove_all(Some(EventPat::Exact(SelectionEventKind::Initialized))), 2);
        assert_eq!(hub.remove_all(None), 0);
    }

    #[test]
    fn parse_patterns() {
        assert_eq!(parse_event_pattern("*").unwrap(), EventPat::Any);
        assert_eq!(
            parse_event_pattern(" Tenant.Changed ").unwrap(),
            EventPat::Exact(SelectionEventKind::TenantChanged)
        );
        assert!(parse_event_pattern("user.changed").is_err());
    }
}
