//=========================================================================
// Frame Driver Engine
//
// Main entry point and per-frame orchestrator.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──tick()──>  one frame
//         │                          │
//         ├─ with_tps()              ├─ Clock
//         ├─ with_inbox_capacity()   ├─ StateStack
//         ├─ with_max_dispatch_      └─ GlobalContext
//         │    attempts()                 ├─ MessageBus
//         └─ with_time_source()           └─ PendingTransition
// ```
//
// Frame sequence (tick):
//   1. Clock::tick()                 advance time
//   2. MessageBus::dispatch()        deliver queued messages
//   3. PendingTransition → stack     apply queued state change
//   4. active State::on_update(dt)
//   5. active State::on_render(dt)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

//=== Internal Dependencies ===============================================

use crate::core::clock::{Clock, MonotonicTimeSource, TimeSource};
use crate::core::globals::{FrameTime, GlobalContext};
use crate::core::message_bus::{
    Listener, ListenerRef, Message, MessageBus, MessagePoster, MessageType, QueueStatus,
    TriggerStatus, DEFAULT_INBOX_CAPACITY,
};
use crate::core::state::{StateRef, StateStack};
use crate::core::TickControl;

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **TPS**: 60.0 (pacing used by [`Engine::run`])
/// - **Inbox capacity**: 128 cross-thread messages
/// - **Dispatch attempts**: unlimited
/// - **Time source**: [`MonotonicTimeSource`]
///
/// # Examples
///
/// ```
/// use frame_driver::EngineBuilder;
///
/// let engine = EngineBuilder::new()
///     .with_tps(120.0)
///     .with_inbox_capacity(256)
///     .with_max_dispatch_attempts(30)
///     .build();
/// assert!(engine.current_state().is_none());
/// ```
pub struct EngineBuilder {
    tps: f64,
    inbox_capacity: usize,
    max_dispatch_attempts: Option<u32>,
    time_source: Option<Box<dyn TimeSource>>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            tps: 60.0,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            max_dispatch_attempts: None,
            time_source: None,
        }
    }

    /// Sets the ticks per second [`Engine::run`] paces itself to.
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.tps = tps;
        self
    }

    /// Sets how many messages other threads may post between two ticks.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Inbox capacity must be positive");
        self.inbox_capacity = capacity;
        self
    }

    /// Drops a queued message after `attempts` dispatches that did not
    /// consume it. Without this, unconsumed messages are retried forever.
    ///
    /// # Panics
    ///
    /// Panics if `attempts == 0`.
    pub fn with_max_dispatch_attempts(mut self, attempts: u32) -> Self {
        assert!(attempts > 0, "Dispatch attempts must be positive");
        self.max_dispatch_attempts = Some(attempts);
        self
    }

    /// Replaces the monotonic clock, e.g. with a
    /// [`ManualTimeSource`](crate::core::clock::ManualTimeSource) for
    /// deterministic simulation.
    pub fn with_time_source<T>(mut self, source: T) -> Self
    where
        T: TimeSource + 'static,
    {
        self.time_source = Some(Box::new(source));
        self
    }

    /// Builds the engine. Call [`Engine::start`] before the first tick.
    pub fn build(self) -> Engine {
        info!(
            "Building engine (TPS: {}, inbox: {}, dispatch attempts: {})",
            self.tps,
            self.inbox_capacity,
            self.max_dispatch_attempts
                .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
        );

        let mut message_bus = MessageBus::with_inbox_capacity(self.inbox_capacity);
        message_bus.set_max_dispatch_attempts(self.max_dispatch_attempts);

        let source = self
            .time_source
            .unwrap_or_else(|| Box::new(MonotonicTimeSource));

        Engine {
            clock: Clock::from_boxed(source),
            states: StateStack::new(),
            context: GlobalContext::with_bus(message_bus),
            tps: self.tps,
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

/// The frame driver.
///
/// Owns the clock, the state stack and the message bus, and advances all
/// of them with [`Engine::tick`]. Create exactly one per application via
/// [`EngineBuilder`] and hand it to whatever needs it.
///
/// # Examples
///
/// ```
/// use frame_driver::prelude::*;
///
/// struct Title {
///     systems: SystemLists,
/// }
///
/// impl State for Title {
///     fn enter(&mut self, _context: &mut GlobalContext) {}
///     fn exit(&mut self, _context: &mut GlobalContext) {}
///     fn systems(&self) -> &SystemLists {
///         &self.systems
///     }
/// }
///
/// let mut engine = EngineBuilder::new().build();
/// engine.start();
/// engine.queue_state_change(std::rc::Rc::new(std::cell::RefCell::new(Title {
///     systems: SystemLists::new(),
/// })));
///
/// engine.tick();
/// assert!(engine.current_state().is_some());
/// ```
pub struct Engine {
    clock: Clock,
    states: StateStack,
    context: GlobalContext,
    tps: f64,
}

impl Engine {
    //--- Construction -----------------------------------------------------

    /// Builds an engine with default settings.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    //--- Clock Control ----------------------------------------------------

    /// Zeroes the clock. Call once before the first tick.
    pub fn start(&mut self) {
        info!("Engine started");
        self.clock.start();
        self.context.time = FrameTime::default();
    }

    /// Freezes engine time. Ticks keep running with a zero delta.
    pub fn pause(&mut self) {
        debug!("Engine paused");
        self.clock.pause();
    }

    pub fn unpause(&mut self) {
        debug!("Engine resumed");
        self.clock.unpause();
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    //--- Frame ------------------------------------------------------------

    /// Runs one frame: clock, messages, queued transition, update, render.
    pub fn tick(&mut self) {
        //--- Step 1: Advance time ------------------------------------------
        self.clock.tick();
        self.context.time = FrameTime {
            timestamp: self.clock.time_seconds(),
            delta: self.clock.delta_seconds(),
            frame: self.context.time.frame + 1,
        };

        //--- Step 2: Deliver queued messages --------------------------------
        self.context.message_bus.dispatch_messages();

        //--- Step 3: Apply queued state transition --------------------------
        if let Some(transition) = self.context.transition.take() {
            self.states.apply(transition, &mut self.context);
        }

        //--- Step 4 & 5: Update and render the active state -----------------
        let delta = self.context.time.delta;
        self.states.update(delta, &mut self.context);
        self.states.render(delta, &mut self.context);
    }

    /// Engine time (seconds) sampled at the start of the last tick.
    pub fn time_stamp(&self) -> f64 {
        self.context.time.timestamp
    }

    /// Seconds between the last two ticks; zero while paused.
    pub fn delta_t(&self) -> f64 {
        self.context.time.delta
    }

    /// Ticks since [`Engine::start`].
    pub fn frame_count(&self) -> u64 {
        self.context.time.frame
    }

    /// Runs `start()` and then ticks at the configured TPS until `control`
    /// returns [`TickControl::Exit`]. `control` is consulted before every
    /// tick.
    pub fn run<F>(&mut self, mut control: F)
    where
        F: FnMut(&mut Engine) -> TickControl,
    {
        let frame_duration = Duration::from_secs_f64(1.0 / self.tps);
        info!("Starting frame loop (TPS: {})", self.tps);
        self.start();

        loop {
            let frame_start = Instant::now();

            if let TickControl::Exit = control(self) {
                info!("Frame loop exiting after {} frames", self.frame_count());
                break;
            }

            self.tick();

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                thread::sleep(frame_duration - elapsed);
            }
        }
    }

    //--- State Stack ------------------------------------------------------

    /// The active state, if any.
    pub fn current_state(&self) -> Option<StateRef> {
        self.states.current()
    }

    /// Exits the active state, enters `state` and makes it active now.
    pub fn push_state(&mut self, state: StateRef) {
        self.states.push(state, &mut self.context);
    }

    /// Exits and removes the active state now. The state below is not
    /// re-entered.
    pub fn pop_state(&mut self) -> Option<StateRef> {
        self.states.pop(&mut self.context)
    }

    /// Pushes `state` at the start of the next tick's state phase.
    pub fn queue_state_change(&mut self, state: StateRef) {
        self.context.queue_state_change(state);
    }

    /// Pops the active state at the start of the next tick's state phase.
    pub fn queue_state_pop(&mut self) {
        self.context.queue_state_pop();
    }

    pub fn state_depth(&self) -> usize {
        self.states.len()
    }

    //--- Messages ---------------------------------------------------------

    /// See [`MessageBus::queue_message`].
    pub fn queue_message(&mut self, msg: Message) -> QueueStatus {
        self.context.message_bus.queue_message(msg)
    }

    /// See [`MessageBus::trigger_message`].
    pub fn trigger_message(&mut self, msg: &Message) -> TriggerStatus {
        self.context.message_bus.trigger_message(msg)
    }

    pub fn add_listener(&mut self, listener: ListenerRef, kind: impl Into<MessageType>) -> bool {
        self.context.message_bus.add_listener(listener, kind)
    }

    pub fn delete_listener<L>(
        &mut self,
        listener: &Rc<RefCell<L>>,
        kind: impl Into<MessageType>,
    ) -> bool
    where
        L: Listener + ?Sized,
    {
        self.context.message_bus.delete_listener(listener, kind)
    }

    pub fn add_wildcard_listener(&mut self, listener: ListenerRef) -> bool {
        self.context.message_bus.add_wildcard_listener(listener)
    }

    pub fn delete_wildcard_listener<L>(&mut self, listener: &Rc<RefCell<L>>) -> bool
    where
        L: Listener + ?Sized,
    {
        self.context.message_bus.delete_wildcard_listener(listener)
    }

    /// Handle for posting messages from other threads.
    pub fn poster(&self) -> MessagePoster {
        self.context.message_bus.poster()
    }

    /// Creates a message stamped with the last tick's timestamp.
    pub fn message(&self, kind: impl Into<MessageType>) -> Message {
        self.context.message(kind)
    }

    //--- Context Access ---------------------------------------------------

    pub fn context(&self) -> &GlobalContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut GlobalContext {
        &mut self.context
    }

    pub fn message_bus(&self) -> &MessageBus {
        &self.context.message_bus
    }

    pub fn message_bus_mut(&mut self) -> &mut MessageBus {
        &mut self.context.message_bus
    }

    //--- Shutdown ---------------------------------------------------------

    /// Exits every active state, then drops all listeners, queued messages
    /// and the queued transition. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if !self.states.is_empty() {
            info!("Shutting down engine ({} active states)", self.states.len());
        }
        self.states.clear(&mut self.context);
        self.context.transition.clear();
        self.context.message_bus.clear();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualTimeSource;
    use crate::core::globals::GlobalContext;
    use crate::core::state::{State, SystemLists};

    type Journal = Rc<RefCell<Vec<String>>>;

    //--- Test Doubles -----------------------------------------------------

    struct Recording {
        name: &'static str,
        journal: Journal,
        systems: SystemLists,
        on_update: Option<Box<dyn FnMut(&mut GlobalContext)>>,
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

        fn on_update(&mut self, _delta_time: f64, context: &mut GlobalContext) {
            self.journal.borrow_mut().push(format!("{}.update", self.name));
            if let Some(hook) = self.on_update.as_mut() {
                hook(context);
            }
        }

        fn on_render(&mut self, _delta_time: f64, _context: &mut GlobalContext) {
            self.journal.borrow_mut().push(format!("{}.render", self.name));
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
            on_update: None,
        }))
    }

    struct Inbox {
        journal: Journal,
        received: Vec<Message>,
    }

    impl Listener for Inbox {
        fn on_message(&mut self, msg: &Message, _bus: &mut MessageBus) -> bool {
            self.journal
                .borrow_mut()
                .push(format!("listener:{}", msg.kind().0));
            self.received.push(msg.clone());
            true
        }
    }

    fn inbox(journal: &Journal) -> Rc<RefCell<Inbox>> {
        Rc::new(RefCell::new(Inbox {
            journal: journal.clone(),
            received: Vec::new(),
        }))
    }

    fn journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.borrow().clone()
    }

    fn manual_engine() -> (ManualTimeSource, Engine) {
        let time = ManualTimeSource::new();
        let mut engine = EngineBuilder::new().with_time_source(time.clone()).build();
        engine.start();
        (time, engine)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    //=====================================================================
    // EngineBuilder Tests
    //=====================================================================

    #[test]
    fn builder_defaults() {
        let builder = EngineBuilder::new();
        assert_eq!(builder.tps, 60.0);
        assert_eq!(builder.inbox_capacity, 128);
        assert_eq!(builder.max_dispatch_attempts, None);
        assert!(builder.time_source.is_none());
    }

    #[test]
    fn builder_fluent_api_chaining() {
        let builder = EngineBuilder::new()
            .with_tps(120.0)
            .with_inbox_capacity(256)
            .with_max_dispatch_attempts(4);

        assert_eq!(builder.tps, 120.0);
        assert_eq!(builder.inbox_capacity, 256);
        assert_eq!(builder.max_dispatch_attempts, Some(4));

        let engine = builder.build();
        assert_eq!(engine.tps, 120.0);
    }

    #[test]
    #[should_panic(expected = "TPS must be positive")]
    fn builder_with_tps_panics_on_zero() {
        EngineBuilder::new().with_tps(0.0);
    }

    #[test]
    #[should_panic(expected = "Inbox capacity must be positive")]
    fn builder_with_inbox_capacity_panics_on_zero() {
        EngineBuilder::new().with_inbox_capacity(0);
    }

    #[test]
    #[should_panic(expected = "Dispatch attempts must be positive")]
    fn builder_with_max_dispatch_attempts_panics_on_zero() {
        EngineBuilder::new().with_max_dispatch_attempts(0);
    }

    //=====================================================================
    // Frame Sequencing Tests
    //=====================================================================

    #[test]
    fn queued_state_change_applies_within_one_tick() {
        let log = journal();
        let (_time, mut engine) = manual_engine();
        let b = recording("b", &log);

        engine.push_state(recording("a", &log));
        engine.queue_state_change(b.clone());
        engine.tick();

        assert_eq!(
            entries(&log),
            vec!["a.enter", "a.exit", "b.enter", "b.update", "b.render"]
        );
        let current = engine.current_state().unwrap();
        assert!(std::ptr::eq(
            Rc::as_ptr(&current) as *const (),
            Rc::as_ptr(&b) as *const ()
        ));
    }

    #[test]
    fn queued_message_is_delivered_on_next_tick_only() {
        let log = journal();
        let (_time, mut engine) = manual_engine();
        let listener = inbox(&log);
        engine.add_listener(listener.clone(), 7);

        let msg = Message::new(7, 0.0);
        assert_eq!(engine.queue_message(msg), QueueStatus::Success);
        assert!(listener.borrow().received.is_empty());

        engine.tick();
        assert_eq!(listener.borrow().received.len(), 1);
        assert_eq!(listener.borrow().received[0].kind(), MessageType(7));

        engine.tick();
        assert_eq!(listener.borrow().received.len(), 1);
    }

    #[test]
    fn messages_dispatch_before_transition_and_update() {
        let log = journal();
        let (_time, mut engine) = manual_engine();
        engine.add_listener(inbox(&log), 1);

        let _ = engine.queue_message(Message::new(1, 0.0));
        engine.queue_state_change(recording("game", &log));
        engine.tick();

        assert_eq!(
            entries(&log),
            vec!["listener:1", "game.enter", "game.update", "game.render"]
        );
    }

    #[test]
    fn tick_with_empty_stack_is_silent() {
        let (_time, mut engine) = manual_engine();
        engine.tick();
        engine.tick();
        assert!(engine.current_state().is_none());
        assert_eq!(engine.frame_count(), 2);
    }

    #[test]
    fn state_queues_transition_from_update() {
        let log = journal();
        let (_time, mut engine) = manual_engine();

        let next = recording("next", &log);
        let menu = recording("menu", &log);
        let pending: StateRef = next.clone();
        menu.borrow_mut().on_update = Some(Box::new(move |ctx: &mut GlobalContext| {
            if !ctx.has_queued_transition() && ctx.time().frame == 1 {
                ctx.queue_state_change(pending.clone());
            }
        }));

        engine.push_state(menu.clone());
        engine.tick();
        assert_eq!(engine.current_state().unwrap().borrow().name(), "menu");

        engine.tick();
        assert_eq!(engine.current_state().unwrap().borrow().name(), "next");
        assert_eq!(
            entries(&log),
            vec![
                "menu.enter",
                "menu.update",
                "menu.render",
                "menu.exit",
                "next.enter",
                "next.update",
                "next.render",
            ]
        );
    }

    #[test]
    fn queued_pop_exposes_previous_state() {
        let log = journal();
        let (_time, mut engine) = manual_engine();
        engine.push_state(recording("a", &log));
        engine.push_state(recording("b", &log));
        log.borrow_mut().clear();

        engine.queue_state_pop();
        engine.tick();

        assert_eq!(entries(&log), vec!["b.exit", "a.update", "a.render"]);
        assert_eq!(engine.state_depth(), 1);
    }

    #[test]
    fn posted_message_arrives_on_tick() {
        let log = journal();
        let (_time, mut engine) = manual_engine();
        let listener = inbox(&log);
        engine.add_listener(listener.clone(), 5);

        let poster = engine.poster();
        std::thread::spawn(move || poster.post(Message::new(5, 0.0)).unwrap())
            .join()
            .unwrap();

        engine.tick();
        assert_eq!(listener.borrow().received.len(), 1);
    }

    #[test]
    fn max_dispatch_attempts_applies_to_engine_bus() {
        struct Refuser;

        impl Listener for Refuser {
            fn on_message(&mut self, _msg: &Message, _bus: &mut MessageBus) -> bool {
                false
            }
        }

        let mut engine = EngineBuilder::new().with_max_dispatch_attempts(2).build();
        engine.start();
        engine.add_listener(Rc::new(RefCell::new(Refuser)), 1);
        let _ = engine.queue_message(Message::new(1, 0.0));

        for _ in 0..3 {
            engine.tick();
        }
        assert_eq!(engine.message_bus().dropped_messages(), 1);
        assert_eq!(engine.message_bus().pending_messages(), 0);
    }

    //=====================================================================
    // Time Tests
    //=====================================================================

    #[test]
    fn tick_publishes_time_and_delta() {
        let (time, mut engine) = manual_engine();
        assert_eq!(engine.time_stamp(), 0.0);

        time.advance(Duration::from_millis(10));
        engine.tick();
        assert!(approx(engine.delta_t(), 0.010));
        assert!(approx(engine.time_stamp(), 0.010));

        let msg = engine.message(3);
        assert!(approx(msg.timestamp(), 0.010));
    }

    #[test]
    fn pause_freezes_timestamp_and_zeroes_delta() {
        let (time, mut engine) = manual_engine();
        time.advance(Duration::from_millis(10));
        engine.tick();

        engine.pause();
        time.advance(Duration::from_millis(100));
        engine.tick();
        assert!(engine.is_paused());
        assert_eq!(engine.delta_t(), 0.0);
        assert!(approx(engine.time_stamp(), 0.010));

        engine.unpause();
        time.advance(Duration::from_millis(5));
        engine.tick();
        assert!(approx(engine.delta_t(), 0.005));
        assert!(approx(engine.time_stamp(), 0.015));
    }

    #[test]
    fn start_resets_frame_time() {
        let (time, mut engine) = manual_engine();
        time.advance(Duration::from_millis(10));
        engine.tick();

        engine.start();
        assert_eq!(engine.frame_count(), 0);
        assert_eq!(engine.time_stamp(), 0.0);
    }

    //=====================================================================
    // Run Loop Tests
    //=====================================================================

    #[test]
    fn run_ticks_until_exit() {
        let mut engine = EngineBuilder::new().with_tps(1_000.0).build();
        let mut calls = 0;

        engine.run(|engine| {
            calls += 1;
            if engine.frame_count() >= 5 {
                TickControl::Exit
            } else {
                TickControl::Continue
            }
        });

        assert_eq!(engine.frame_count(), 5);
        assert_eq!(calls, 6);
    }

    //=====================================================================
    // Shutdown Tests
    //=====================================================================

    #[test]
    fn shutdown_exits_states_and_releases_listeners() {
        let log = journal();
        let (_time, mut engine) = manual_engine();
        let listener = inbox(&log);
        engine.add_listener(listener.clone(), 1);
        engine.add_wildcard_listener(listener.clone());
        engine.push_state(recording("a", &log));
        engine.push_state(recording("b", &log));
        engine.queue_state_change(recording("c", &log));
        log.borrow_mut().clear();

        engine.shutdown();

        assert_eq!(entries(&log), vec!["b.exit", "a.exit"]);
        assert!(engine.current_state().is_none());
        assert!(!engine.context().has_queued_transition());
        assert_eq!(Rc::strong_count(&listener), 1);

        engine.shutdown();
        assert_eq!(log.borrow().len(), 2, "second shutdown is a no-op");
    }

    #[test]
    fn drop_exits_active_states() {
        let log = journal();
        {
            let (_time, mut engine) = manual_engine();
            engine.push_state(recording("a", &log));
        }
        assert_eq!(entries(&log), vec!["a.enter", "a.exit"]);
    }
}
