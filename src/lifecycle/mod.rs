//! Host lifecycle signals
//!
//! The host (a page, a desktop shell, a test harness) reports visibility
//! changes, user gestures and imminent unload. Listeners subscribe through a
//! [`LifecycleSource`] and get an id back; a [`Subscription`] unsubscribes
//! when dropped.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::trace;

/// Whether the host surface is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Something the host tells the engine about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    VisibilityChanged(Visibility),
    /// A click, key press or touch the platform counts as user activation
    UserGesture,
    /// The host is about to go away
    BeforeUnload,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::VisibilityChanged(Visibility::Visible) => write!(f, "visible"),
            LifecycleEvent::VisibilityChanged(Visibility::Hidden) => write!(f, "hidden"),
            LifecycleEvent::UserGesture => write!(f, "user-gesture"),
            LifecycleEvent::BeforeUnload => write!(f, "before-unload"),
        }
    }
}

/// Subscription handle returned by a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub type LifecycleListener = Box<dyn FnMut(LifecycleEvent)>;

/// Where lifecycle events come from
pub trait LifecycleSource {
    fn subscribe(&self, listener: LifecycleListener) -> ListenerId;

    /// Returns false if `id` was not subscribed
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

/// Unsubscribes on drop
pub struct Subscription {
    id: ListenerId,
    source: Weak<dyn LifecycleSource>,
}

impl Subscription {
    pub fn new(id: ListenerId, source: &Rc<dyn LifecycleSource>) -> Self {
        Self {
            id,
            source: Rc::downgrade(source),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(source) = self.source.upgrade() {
            source.unsubscribe(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// In-process lifecycle source; the host calls [`LifecycleBus::emit`]
#[derive(Default)]
pub struct LifecycleBus {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Rc<RefCell<LifecycleListener>>)>>,
}

impl LifecycleBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every listener subscribed when the call starts
    pub fn emit(&self, event: LifecycleEvent) {
        let listeners: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        trace!("lifecycle: {event} -> {} listener(s)", listeners.len());
        for listener in listeners {
            (listener.borrow_mut())(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl LifecycleSource for LifecycleBus {
    fn subscribe(&self, listener: LifecycleListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_subscribers() {
        let bus = LifecycleBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(Box::new(move |event| sink.borrow_mut().push(event)));

        bus.emit(LifecycleEvent::VisibilityChanged(Visibility::Hidden));
        bus.emit(LifecycleEvent::BeforeUnload);

        assert_eq!(
            *seen.borrow(),
            vec![
                LifecycleEvent::VisibilityChanged(Visibility::Hidden),
                LifecycleEvent::BeforeUnload
            ]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let bus = LifecycleBus::new();
        let id = bus.subscribe(Box::new(|_| {}));
        assert_eq!(bus.listener_count(), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_subscription_drop_unsubscribes() {
        let bus: Rc<dyn LifecycleSource> = Rc::new(LifecycleBus::new());
        let id = bus.subscribe(Box::new(|_| {}));
        let subscription = Subscription::new(id, &bus);
        drop(subscription);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_listener_may_unsubscribe_during_emit() {
        let bus = Rc::new(LifecycleBus::new());
        let weak = Rc::downgrade(&bus);
        let own_id = Rc::new(Cell::new(None));
        let slot = Rc::clone(&own_id);
        let id = bus.subscribe(Box::new(move |_| {
            if let (Some(bus), Some(id)) = (weak.upgrade(), slot.get()) {
                bus.unsubscribe(id);
            }
        }));
        own_id.set(Some(id));

        bus.emit(LifecycleEvent::UserGesture);
        assert_eq!(bus.listener_count(), 0);
    }
}
