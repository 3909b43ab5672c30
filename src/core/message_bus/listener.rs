//=========================================================================
// Listeners
//=========================================================================
//
// Listener contract and the registry that maps message types to them.
//
// Registry layout:
//   typed:    HashMap<MessageType, Vec<ListenerRef>>  (registration order)
//   wildcard: Vec<ListenerRef>                        (every message)
//
// Identity is the allocation behind the handle, so a listener may sit
// under several types and in the wildcard list at the same time, but
// never twice in the same list.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use super::{Message, MessageBus, MessageType};

//=== Listener Trait ======================================================

/// Consumer of bus messages.
///
/// Returns `true` when the message was consumed. The bus is handed back so
/// a listener can queue follow-up messages or change registrations while
/// it runs; anything it queues is delivered on a later dispatch.
pub trait Listener {
    fn on_message(&mut self, msg: &Message, bus: &mut MessageBus) -> bool;
}

/// Shared handle to a listener.
pub type ListenerRef = Rc<RefCell<dyn Listener>>;

/// True if both handles point at the same listener.
fn same_listener<L>(a: &Rc<RefCell<L>>, b: &ListenerRef) -> bool
where
    L: Listener + ?Sized,
{
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

//=== ListenerRegistry ====================================================

/// Type-keyed and wildcard listener lists.
#[derive(Default)]
pub(super) struct ListenerRegistry {
    typed: HashMap<MessageType, Vec<ListenerRef>>,
    wildcard: Vec<ListenerRef>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Registration -----------------------------------------------------

    /// Appends `listener` to the list for `kind`, creating the list if
    /// needed. Returns false if it is already there.
    pub fn add(&mut self, listener: ListenerRef, kind: MessageType) -> bool {
        let list = self.typed.entry(kind).or_default();
        if list.iter().any(|l| same_listener(&listener, l)) {
            return false;
        }
        list.push(listener);
        true
    }

    pub fn add_wildcard(&mut self, listener: ListenerRef) -> bool {
        if self.wildcard.iter().any(|l| same_listener(&listener, l)) {
            return false;
        }
        self.wildcard.push(listener);
        true
    }

    /// Removes every occurrence of `listener` under `kind`.
    ///
    /// The (possibly empty) list itself stays registered. Returns whether
    /// anything was removed.
    pub fn remove<L>(&mut self, listener: &Rc<RefCell<L>>, kind: MessageType) -> bool
    where
        L: Listener + ?Sized,
    {
        match self.typed.get_mut(&kind) {
            Some(list) => retain_others(list, listener),
            None => false,
        }
    }

    pub fn remove_wildcard<L>(&mut self, listener: &Rc<RefCell<L>>) -> bool
    where
        L: Listener + ?Sized,
    {
        retain_others(&mut self.wildcard, listener)
    }

    /// Removes `listener` from every typed list and the wildcard list.
    pub fn remove_everywhere<L>(&mut self, listener: &Rc<RefCell<L>>) -> bool
    where
        L: Listener + ?Sized,
    {
        let mut removed = false;
        for list in self.typed.values_mut() {
            removed |= retain_others(list, listener);
        }
        removed | retain_others(&mut self.wildcard, listener)
    }

    pub fn clear(&mut self) {
        self.typed.clear();
        self.wildcard.clear();
    }

    //--- Queries ----------------------------------------------------------

    /// True if a list exists for `kind`, even an empty one.
    pub fn has_entry(&self, kind: MessageType) -> bool {
        self.typed.contains_key(&kind)
    }

    pub fn count(&self, kind: MessageType) -> usize {
        self.typed.get(&kind).map_or(0, Vec::len)
    }

    pub fn wildcard_count(&self) -> usize {
        self.wildcard.len()
    }

    /// First listener under `kind`, in registration order, that is not in
    /// `called`.
    ///
    /// Dispatch asks again after every callback, so listeners deleted by an
    /// earlier callback are never reached and appended ones still are.
    pub fn next_typed(&self, kind: MessageType, called: &[ListenerRef]) -> Option<ListenerRef> {
        self.typed
            .get(&kind)
            .and_then(|list| first_not_called(list, called))
    }

    pub fn next_wildcard(&self, called: &[ListenerRef]) -> Option<ListenerRef> {
        first_not_called(&self.wildcard, called)
    }
}

fn first_not_called(list: &[ListenerRef], called: &[ListenerRef]) -> Option<ListenerRef> {
    list.iter()
        .find(|l| !called.iter().any(|c| same_listener(c, l)))
        .cloned()
}

fn retain_others<L>(list: &mut Vec<ListenerRef>, listener: &Rc<RefCell<L>>) -> bool
where
    L: Listener + ?Sized,
{
    let before = list.len();
    list.retain(|l| !same_listener(listener, l));
    list.len() != before
}

//=========================================================================
// Tests
//=========================================================================
