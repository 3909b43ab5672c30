//=========================================================================
// State Stack
//=========================================================================
//
// Ordered stack of states; the last entry is the active one.
//
// Lifecycle contract:
//   push(s): active.exit() → s.enter() → s becomes active
//   pop():   active.exit() → previous entry becomes active (no enter())
//   clear(): exit() on every state, active first
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

//=== Internal Dependencies ===============================================

use super::{State, StateRef, StateTransition};
use crate::core::globals::GlobalContext;

//=== StateStack ==========================================================

/// Stack of states with enter/exit bookkeeping.
#[derive(Default)]
pub struct StateStack {
    stack: Vec<StateRef>,
}

impl StateStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    //--- Queries ----------------------------------------------------------

    /// The active state, if any.
    pub fn current(&self) -> Option<StateRef> {
        self.stack.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// True if `state` is anywhere on the stack.
    pub fn contains<T>(&self, state: &Rc<RefCell<T>>) -> bool
    where
        T: State + ?Sized,
    {
        self.stack
            .iter()
            .any(|s| std::ptr::eq(Rc::as_ptr(state) as *const (), Rc::as_ptr(s) as *const ()))
    }

    //--- Stack Operations -------------------------------------------------

    /// Exits the active state, enters `state` and makes it active.
    pub fn push(&mut self, state: StateRef, context: &mut GlobalContext) {
        if let Some(active) = self.stack.last() {
            let mut active = active.borrow_mut();
            debug!("Exiting state {}", active.name());
            active.exit(context);
        }

        {
            let mut entering = state.borrow_mut();
            debug!("Entering state {}", entering.name());
            entering.enter(context);
        }
        self.stack.push(state);
    }

    /// Exits and removes the active state, returning it.
    ///
    /// The state underneath becomes active without `enter()` being called
    /// again. Push it anew if it needs to reinitialize.
    pub fn pop(&mut self, context: &mut GlobalContext) -> Option<StateRef> {
        let Some(state) = self.stack.pop() else {
            debug!("Pop on empty state stack ignored");
            return None;
        };

        {
            let mut leaving = state.borrow_mut();
            debug!("Exiting state {}", leaving.name());
            leaving.exit(context);
        }

        if let Some(exposed) = self.stack.last() {
            debug!("State {} is active again", exposed.borrow().name());
        }
        Some(state)
    }

    /// Applies a queued transition.
    pub fn apply(&mut self, transition: StateTransition, context: &mut GlobalContext) {
        match transition {
            StateTransition::Push(state) => self.push(state, context),
            StateTransition::Pop => {
                self.pop(context);
            }
        }
    }

    /// Exits every state, active first, and empties the stack.
    pub fn clear(&mut self, context: &mut GlobalContext) {
        while let Some(state) = self.stack.pop() {
            let mut leaving = state.borrow_mut();
            debug!("Exiting state {} on clear", leaving.name());
            leaving.exit(context);
        }
    }

    //--- Frame Callbacks --------------------------------------------------

    /// Runs `on_update` on the active state. Empty stack is a no-op.
    pub fn update(&self, delta_time: f64, context: &mut GlobalContext) {
        if let Some(active) = self.stack.last() {
            active.borrow_mut().on_update(delta_time, context);
        }
    }

    /// Runs `on_render` on the active state. Empty stack is a no-op.
    pub fn render(&self, delta_time: f64, context: &mut GlobalContext) {
        if let Some(active) = self.stack.last() {
            active.borrow_mut().on_render(delta_time, context);
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message_bus::{Listener, Message, MessageBus};
    use crate::core::state::SystemLists;
    use crate::core::system::{EngineSystem, SystemFlags};

    type Journal = Rc<RefCell<Vec<String>>>;

    //--- Test States ------------------------------------------------------

    struct Recording {
        name: &'static str,
        journal: Journal,
        systems: SystemLists,
    }

    impl State for Recording {
        fn enter(&mut self, _context: &mut GlobalContext) {
            self.journal.borrow_mut().push(format!("{}.enter", self.name));
        }

        fn exit(&mut self, _context: &mut GlobalContext) {
            self.journal.borrow_mut().push(format!("{}.exit", self.name));
        }

        fn systems(&self) -> &SystemLists {
            &self.systems
        }

        fn on_update(&mut self, delta_time: f64, _context: &mut GlobalContext) {
            self.journal.borrow_mut().push(format!("{}.update", self.name));
            self.systems.update(delta_time);
        }

        fn on_render(&mut self, _delta_time: f64, _context: &mut GlobalContext) {
            self.journal.borrow_mut().push(format!("{}.render", self.name));
            self.systems.render();
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn recording(name: &'static str, journal: &Journal) -> Rc<RefCell<Recording>> {
        Rc::new(RefCell::new(Recording {
            name,
            journal: journal.clone(),
            systems: SystemLists::new(),
        }))
    }

    fn journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.borrow().clone()
    }

    //=====================================================================
    // Push / Pop Tests
    //=====================================================================

    #[test]
    fn empty_stack_has_no_current_state() {
        let stack = StateStack::new();
        assert!(stack.current().is_none());
        assert!(stack.is_empty());
    }

    #[test]
    fn push_enters_and_activates() {
        let log = journal();
        let mut ctx = GlobalContext::new();
        let mut stack = StateStack::new();
        let a = recording("a", &log);

        stack.push(a.clone(), &mut ctx);

        assert_eq!(entries(&log), vec!["a.enter"]);
        assert_eq!(stack.current().unwrap().borrow().name(), "a");
        assert!(stack.contains(&a));
    }

    #[test]
    fn push_exits_previous_before_entering_new() {
        let log = journal();
        let mut ctx = GlobalContext::new();
        let mut stack = StateStack::new();

        stack.push(recording("a", &log), &mut ctx);
        stack.push(recording("b", &log), &mut ctx);

        assert_eq!(entries(&log), vec!["a.enter", "a.exit", "b.enter"]);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.current().unwrap().borrow().name(), "b");
    }

    #[test]
    fn pop_exposes_previous_without_reentering() {
        let log = journal();
        let mut ctx = GlobalContext::new();
        let mut stack = StateStack::new();
        stack.push(recording("a", &log), &mut ctx);
        stack.push(recording("b", &log), &mut ctx);

        let popped = stack.pop(&mut ctx).unwrap();

        assert_eq!(popped.borrow().name(), "b");
        assert_eq!(entries(&log), vec!["a.enter", "a.exit", "b.enter", "b.exit"]);
        assert_eq!(stack.current().unwrap().borrow().name(), "a");
    }

    #[test]
    fn pop_on_empty_stack_is_noop() {
        let mut ctx = GlobalContext::new();
        let mut stack = StateStack::new();
        assert!(stack.pop(&mut ctx).is_none());
    }

    #[test]
    fn state_can_be_reentered_after_push_again() {
        let log = journal();
        let mut ctx = GlobalContext::new();
        let mut stack = StateStack::new();
        let a = recording("a", &log);

        stack.push(a.clone(), &mut ctx);
        stack.pop(&mut ctx);
        stack.push(a.clone(), &mut ctx);

        assert_eq!(entries(&log), vec!["a.enter", "a.exit", "a.enter"]);
    }

    #[test]
    fn apply_routes_transitions() {
        let log = journal();
        let mut ctx = GlobalContext::new();
        let mut stack = StateStack::new();

        stack.apply(StateTransition::Push(recording("a", &log)), &mut ctx);
        stack.apply(StateTransition::Pop, &mut ctx);

        assert!(stack.is_empty());
        assert_eq!(entries(&log), vec!["a.enter", "a.exit"]);
    }

    #[test]
    fn clear_exits_every_state_active_first() {
        let log = journal();
        let mut ctx = GlobalContext::new();
        let mut stack = StateStack::new();
        stack.push(recording("a", &log), &mut ctx);
        stack.push(recording("b", &log), &mut ctx);
        log.borrow_mut().clear();

        stack.clear(&mut ctx);

        assert_eq!(entries(&log), vec!["b.exit", "a.exit"]);
        assert!(stack.is_empty());
    }

    //=====================================================================
    // Frame Callback Tests
    //=====================================================================

    #[test]
    fn update_and_render_reach_active_state_only() {
        let log = journal();
        let mut ctx = GlobalContext::new();
        let mut stack = StateStack::new();
        stack.push(recording("a", &log), &mut ctx);
        stack.push(recording("b", &log), &mut ctx);
        log.borrow_mut().clear();

        stack.update(0.1, &mut ctx);
        stack.render(0.1, &mut ctx);

        assert_eq!(entries(&log), vec!["b.update", "b.render"]);
    }

    #[test]
    fn frame_callbacks_on_empty_stack_are_noops() {
        let mut ctx = GlobalContext::new();
        let stack = StateStack::new();
        stack.update(0.1, &mut ctx);
        stack.render(0.1, &mut ctx);
    }

    #[test]
    fn default_hooks_drive_system_lists() {
        struct Counter {
            flags: SystemFlags,
            updates: u32,
            renders: u32,
        }

        impl EngineSystem for Counter {
            fn flags(&self) -> &SystemFlags {
                &self.flags
            }
            fn flags_mut(&mut self) -> &mut SystemFlags {
                &mut self.flags
            }
            fn on_update(&mut self, _delta_time: f64) {
                self.updates += 1;
            }
            fn on_render(&mut self) {
                self.renders += 1;
            }
        }

        struct Plain {
            systems: SystemLists,
        }

        impl State for Plain {
            fn enter(&mut self, _context: &mut GlobalContext) {}
            fn exit(&mut self, _context: &mut GlobalContext) {}
            fn systems(&self) -> &SystemLists {
                &self.systems
            }
        }

        let counter = Rc::new(RefCell::new(Counter {
            flags: SystemFlags::new(),
            updates: 0,
            renders: 0,
        }));
        let mut systems = SystemLists::new();
        systems.push_back_update(counter.clone());
        systems.push_back_render(counter.clone());

        let mut ctx = GlobalContext::new();
        let mut stack = StateStack::new();
        stack.push(Rc::new(RefCell::new(Plain { systems })), &mut ctx);
        stack.update(0.016, &mut ctx);
        stack.render(0.016, &mut ctx);

        assert_eq!(counter.borrow().updates, 1);
        assert_eq!(counter.borrow().renders, 1);
    }

    #[test]
    fn enter_and_exit_manage_listener_registration() {
        struct Sink;

        impl Listener for Sink {
            fn on_message(&mut self, _msg: &Message, _bus: &mut MessageBus) -> bool {
                true
            }
        }

        struct Subscriber {
            sink: Rc<RefCell<Sink>>,
            systems: SystemLists,
        }

        impl State for Subscriber {
            fn enter(&mut self, context: &mut GlobalContext) {
                context.message_bus.add_listener(self.sink.clone(), 12);
            }

            fn exit(&mut self, context: &mut GlobalContext) {
                context.message_bus.delete_listener(&self.sink, 12);
            }

            fn systems(&self) -> &SystemLists {
                &self.systems
            }
        }

        let mut ctx = GlobalContext::new();
        let mut stack = StateStack::new();
        stack.push(
            Rc::new(RefCell::new(Subscriber {
                sink: Rc::new(RefCell::new(Sink)),
                systems: SystemLists::new(),
            })),
            &mut ctx,
        );
        assert_eq!(ctx.message_bus.listener_count(12), 1);

        stack.pop(&mut ctx);
        assert_eq!(ctx.message_bus.listener_count(12), 0);
    }
}
