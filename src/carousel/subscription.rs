use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// What a carousel listener is told.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ScrollEvent {
    /// The user grabbed the carousel.
    DragStarted,
    /// The user let go; a settle animation follows.
    DragEnded,
    /// The scroll offset moved to this value.
    Offset(f64),
}

type Handler = Box<dyn FnMut(ScrollEvent)>;

#[derive(Default)]
pub(super) struct Listeners {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

impl Listeners {
    pub(super) fn add(&mut self, handler: Handler) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.push((id, handler));
        id
    }

    fn remove(&mut self, id: u64) {
        self.handlers.retain(|(hid, _)| *hid != id);
    }

    pub(super) fn emit(&mut self, event: ScrollEvent) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }

    pub(super) fn len(&self) -> usize {
        self.handlers.len()
    }
}

/// A registered carousel listener. Dropping it unregisters the handler.
///
/// Handlers run inside `Carousel` calls and must not drop subscriptions
/// themselves.
#[must_use = "dropping the subscription unregisters its handler"]
pub struct OffsetSubscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl OffsetSubscription {
    pub(super) fn new(id: u64, listeners: &Rc<RefCell<Listeners>>) -> Self {
        Self {
            id,
            listeners: Rc::downgrade(listeners),
        }
    }

    /// Explicitly end the subscription (same as dropping it).
    pub fn unsubscribe(self) {}
}

impl Drop for OffsetSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().remove(self.id);
        }
    }
}
