//=========================================================================
// Message Bus
//=========================================================================
//
// Publish/subscribe hub with immediate and deferred delivery.
//
// Architecture:
//   trigger_message() ──► typed listeners ──► wildcard listeners
//
//   queue_message() ──► DoubleBufferedQueue
//                              │ dispatch_messages() (once per frame)
//                              ▼
//                       flip → drain → trigger_message()
//                              │ NotConsumed
//                              └──► back into the accepting buffer
//
//   MessagePoster (any thread) ──► Inbox ──► queue_message() at dispatch
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::{debug, trace, warn};

//=== Internal Dependencies ===============================================

use super::inbox::{Inbox, MessagePoster};
use super::listener::{Listener, ListenerRef, ListenerRegistry};
use super::message_queue::{DoubleBufferedQueue, Pending};
use super::{Message, MessageType};

//=== Status Types ========================================================

/// Outcome of [`MessageBus::queue_message`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    /// The message will be delivered on the next dispatch.
    Success,

    /// Nothing is registered for the message's type; it was not stored.
    NoListener,
}

/// Outcome of [`MessageBus::trigger_message`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerStatus {
    /// Listeners ran but none consumed the message.
    NotConsumed,

    /// At least one listener (typed or wildcard) consumed it.
    Consumed,

    /// No listener list exists for the message's type. Wildcards still ran.
    NoListener,
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "queued"),
            Self::NoListener => write!(f, "no listener"),
        }
    }
}

impl fmt::Display for TriggerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConsumed => write!(f, "not consumed"),
            Self::Consumed => write!(f, "consumed"),
            Self::NoListener => write!(f, "no listener"),
        }
    }
}

//=== MessageBus ==========================================================

/// Default capacity of the cross-thread inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 128;

/// Routes typed messages between producers and listeners.
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use frame_driver::core::message_bus::{
///     Listener, Message, MessageBus, QueueStatus,
/// };
///
/// #[derive(Default)]
/// struct Counter(u32);
///
/// impl Listener for Counter {
///     fn on_message(&mut self, _msg: &Message, _bus: &mut MessageBus) -> bool {
///         self.0 += 1;
///         true
///     }
/// }
///
/// let mut bus = MessageBus::new();
/// let counter = Rc::new(RefCell::new(Counter::default()));
/// bus.add_listener(counter.clone(), 7);
///
/// assert_eq!(bus.queue_message(Message::new(7, 0.0)), QueueStatus::Success);
/// assert_eq!(counter.borrow().0, 0);
///
/// bus.dispatch_messages();
/// assert_eq!(counter.borrow().0, 1);
/// ```
pub struct MessageBus {
    registry: ListenerRegistry,
    queue: DoubleBufferedQueue,
    inbox: Inbox,
    max_attempts: Option<u32>,
    dropped: u64,
    dispatching: Rc<Cell<bool>>,
}

impl MessageBus {
    //--- Construction -----------------------------------------------------

    /// Creates an empty bus with the default inbox capacity and unlimited
    /// redelivery.
    pub fn new() -> Self {
        Self::with_inbox_capacity(DEFAULT_INBOX_CAPACITY)
    }

    pub fn with_inbox_capacity(capacity: usize) -> Self {
        Self {
            registry: ListenerRegistry::new(),
            queue: DoubleBufferedQueue::new(),
            inbox: Inbox::new(capacity),
            max_attempts: None,
            dropped: 0,
            dispatching: Rc::new(Cell::new(false)),
        }
    }

    /// Caps how many dispatch passes a queued message gets.
    ///
    /// `None` retries an unconsumed message every frame until something
    /// consumes it. With `Some(n)`, a message still unconsumed after `n`
    /// passes is dropped.
    pub fn set_max_dispatch_attempts(&mut self, max_attempts: Option<u32>) {
        self.max_attempts = max_attempts;
    }

    //--- Listener Registration --------------------------------------------

    /// Registers `listener` for `kind`. Returns false if it already is.
    pub fn add_listener(&mut self, listener: ListenerRef, kind: impl Into<MessageType>) -> bool {
        let kind = kind.into();
        let added = self.registry.add(listener, kind);
        if added {
            debug!("Listener added for message {}", kind);
        } else {
            warn!("Listener already registered for message {}", kind);
        }
        added
    }

    /// Removes `listener` from `kind`. Returns whether it was registered.
    pub fn delete_listener<L>(
        &mut self,
        listener: &Rc<RefCell<L>>,
        kind: impl Into<MessageType>,
    ) -> bool
    where
        L: Listener + ?Sized,
    {
        self.registry.remove(listener, kind.into())
    }

    /// Registers `listener` for every message. Returns false if it already is.
    pub fn add_wildcard_listener(&mut self, listener: ListenerRef) -> bool {
        let added = self.registry.add_wildcard(listener);
        if added {
            debug!("Wildcard listener added");
        } else {
            warn!("Wildcard listener already registered");
        }
        added
    }

    pub fn delete_wildcard_listener<L>(&mut self, listener: &Rc<RefCell<L>>) -> bool
    where
        L: Listener + ?Sized,
    {
        self.registry.remove_wildcard(listener)
    }

    /// Removes `listener` from every type and from the wildcard list.
    pub fn delete_listener_everywhere<L>(&mut self, listener: &Rc<RefCell<L>>) -> bool
    where
        L: Listener + ?Sized,
    {
        self.registry.remove_everywhere(listener)
    }

    pub fn listener_count(&self, kind: impl Into<MessageType>) -> usize {
        self.registry.count(kind.into())
    }

    pub fn wildcard_listener_count(&self) -> usize {
        self.registry.wildcard_count()
    }

    /// True once anything has registered for `kind`, even if every
    /// listener has since been deleted.
    pub fn has_listener_list(&self, kind: impl Into<MessageType>) -> bool {
        self.registry.has_entry(kind.into())
    }

    //--- Delivery ---------------------------------------------------------

    /// Delivers `msg` now: typed listeners in registration order, then
    /// wildcard listeners in registration order.
    ///
    /// Every listener runs even after one has consumed the message.
    /// Membership is re-read after each callback: a listener deleted by an
    /// earlier one is not called, one appended during delivery is.
    pub fn trigger_message(&mut self, msg: &Message) -> TriggerStatus {
        let kind = msg.kind();
        let has_list = self.registry.has_entry(kind);
        let mut consumed = false;

        let mut called = Vec::new();
        while let Some(listener) = self.registry.next_typed(kind, &called) {
            consumed |= self.deliver(&listener, msg);
            called.push(listener);
        }

        called.clear();
        while let Some(listener) = self.registry.next_wildcard(&called) {
            consumed |= self.deliver(&listener, msg);
            called.push(listener);
        }

        let status = match (has_list, consumed) {
            (false, _) => TriggerStatus::NoListener,
            (true, true) => TriggerStatus::Consumed,
            (true, false) => TriggerStatus::NotConsumed,
        };
        trace!("Triggered message {}: {}", msg.kind(), status);
        status
    }

    /// Stores `msg` for the next [`MessageBus::dispatch_messages`].
    ///
    /// Wildcard listeners alone do not make a message eligible.
    pub fn queue_message(&mut self, msg: Message) -> QueueStatus {
        if self.registry.count(msg.kind()) == 0 {
            return QueueStatus::NoListener;
        }
        self.queue.push(Pending::new(msg));
        QueueStatus::Success
    }

    /// Drains everything queued before this call.
    ///
    /// Messages queued while draining, including redeliveries of
    /// unconsumed ones, wait for the next call.
    pub fn dispatch_messages(&mut self) {
        if self.dispatching.get() {
            warn!("dispatch_messages called from inside a dispatch, ignoring");
            return;
        }
        let _guard = DispatchGuard::enter(&self.dispatching);

        self.collect_posted();

        let mut draining = self.queue.flip();
        while let Some(mut pending) = draining.pop_front() {
            match self.trigger_message(&pending.message) {
                TriggerStatus::Consumed => {}
                TriggerStatus::NotConsumed => {
                    pending.attempts += 1;
                    self.requeue(pending);
                }
                TriggerStatus::NoListener => {
                    debug!(
                        "Dropping queued message {}: its listeners are gone",
                        pending.message.kind()
                    );
                }
            }
        }
        self.queue.recycle(draining);
    }

    /// Handle for posting messages from other threads.
    pub fn poster(&self) -> MessagePoster {
        self.inbox.poster()
    }

    //--- Queries ----------------------------------------------------------

    /// Messages waiting for the next dispatch. Posted messages still in
    /// the inbox are not counted.
    pub fn pending_messages(&self) -> usize {
        self.queue.len()
    }

    /// Messages discarded after reaching the dispatch attempt cap.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped
    }

    //--- Teardown ---------------------------------------------------------

    /// Drops every registration, queued message and posted message.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.queue.clear();
        drop(self.inbox.drain());
    }

    //--- Internal Helpers -------------------------------------------------

    fn deliver(&mut self, listener: &ListenerRef, msg: &Message) -> bool {
        match listener.try_borrow_mut() {
            Ok(mut listener) => listener.on_message(msg, self),
            Err(_) => {
                warn!(
                    "Listener for message {} is already handling a message, skipping",
                    msg.kind()
                );
                false
            }
        }
    }

    fn requeue(&mut self, pending: Pending) {
        match self.max_attempts {
            Some(cap) if pending.attempts >= cap => {
                warn!(
                    "Dropping message {} after {} unconsumed dispatches",
                    pending.message.kind(),
                    pending.attempts
                );
                self.dropped += 1;
            }
            _ => self.queue.push(pending),
        }
    }

    fn collect_posted(&mut self) {
        for msg in self.inbox.drain() {
            let kind = msg.kind();
            if self.queue_message(msg) == QueueStatus::NoListener {
                debug!("Dropping posted message {}: no listener", kind);
            }
        }
    }
}

/// Clears the dispatching flag when dropped, including while unwinding
/// from a panicking listener.
struct DispatchGuard(Rc<Cell<bool>>);

impl DispatchGuard {
    fn enter(flag: &Rc<Cell<bool>>) -> Self {
        flag.set(true);
        Self(flag.clone())
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
