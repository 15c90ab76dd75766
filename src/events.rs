//! Change notifications for directories and directory symlinks.
//!
//! Listeners are plain callbacks registered per [`ChildEvent`]. Dispatch is
//! synchronous: every handler has run by the time the mutation that
//! triggered it returns.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::Entry;

/// Which change a listener is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildEvent {
    /// A child was appended to the container.
    Added,
    /// A child was detached from the container.
    Removed,
}

/// Token returned by `add_listener`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) type ChildHandler = Rc<dyn Fn(&Entry)>;

/// Listener registry owned by a container.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(ListenerId, ChildEvent, ChildHandler)>>,
}

impl Listeners {
    pub(crate) fn add(&self, event: ChildEvent, handler: ChildHandler) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, event, handler));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(existing, _, _)| *existing != id);
        handlers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Run every handler registered for `event`.
    ///
    /// Handlers run against a snapshot, so they may add or remove listeners
    /// (including themselves) while dispatch is in progress.
    pub(crate) fn emit(&self, event: ChildEvent, entry: &Entry) {
        let snapshot: Vec<ChildHandler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, wanted, _)| *wanted == event)
            .map(|(_, _, handler)| Rc::clone(handler))
            .collect();

        if snapshot.is_empty() {
            return;
        }
        trace!(?event, path = entry.path(), listeners = snapshot.len(), "dispatching child event");
        for handler in snapshot {
            handler(entry);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CaseSensitivity, FileSystem};

    fn sample_entry() -> Entry {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        fs.add_file("/a.ts", "x").unwrap().unwrap().into_entry()
    }

    #[test]
    fn emit_reaches_matching_listeners_only() {
        let listeners = Listeners::default();
        let added = Rc::new(Cell::new(0));
        let removed = Rc::new(Cell::new(0));

        let counter = Rc::clone(&added);
        listeners.add(ChildEvent::Added, Rc::new(move |_| counter.set(counter.get() + 1)));
        let counter = Rc::clone(&removed);
        listeners.add(ChildEvent::Removed, Rc::new(move |_| counter.set(counter.get() + 1)));

        let entry = sample_entry();
        listeners.emit(ChildEvent::Added, &entry);
        listeners.emit(ChildEvent::Added, &entry);
        listeners.emit(ChildEvent::Removed, &entry);

        assert_eq!(added.get(), 2);
        assert_eq!(removed.get(), 1);
    }

    #[test]
    fn remove_unsubscribes() {
        let listeners = Listeners::default();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let id = listeners.add(ChildEvent::Added, Rc::new(move |_| counter.set(counter.get() + 1)));

        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        listeners.emit(ChildEvent::Added, &sample_entry());
        assert_eq!(calls.get(), 0);
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn handler_may_unsubscribe_during_dispatch() {
        let listeners = Rc::new(Listeners::default());
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let registry = Rc::clone(&listeners);
        let own_id = Rc::clone(&slot);
        let id = listeners.add(
            ChildEvent::Added,
            Rc::new(move |_| {
                if let Some(id) = own_id.get() {
                    registry.remove(id);
                }
            }),
        );
        slot.set(Some(id));

        listeners.emit(ChildEvent::Added, &sample_entry());
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn ids_are_unique() {
        let listeners = Listeners::default();
        let a = listeners.add(ChildEvent::Added, Rc::new(|_| {}));
        let b = listeners.add(ChildEvent::Added, Rc::new(|_| {}));
        assert_ne!(a, b);
    }
}
