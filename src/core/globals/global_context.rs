//=========================================================================
// Global Context
//=========================================================================
//
// Shared data container for states.
//
// Contains the data states read and write during their hooks:
// - message_bus: listener registration and message delivery
// - transition:  the single queued state change
// - time:        timestamp and delta of the current frame
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::message_bus::{Message, MessageBus, MessageType};
use crate::core::state::{PendingTransition, StateRef, StateTransition};

//=== FrameTime ===========================================================

/// Timing of the frame being processed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Engine time in seconds at the start of the frame, pauses excluded.
    pub timestamp: f64,

    /// Seconds since the previous frame.
    pub delta: f64,

    /// Number of ticks since `start()`, counting this one.
    pub frame: u64,
}

//=== GlobalContext =======================================================

/// Shared context passed to states during their hooks.
///
/// States receive `&mut GlobalContext` in `enter`, `exit`, `on_update` and
/// `on_render`. It separates what states may touch from the engine's own
/// clock and state stack.
pub struct GlobalContext {
    /// Message bus for registering listeners and sending messages.
    pub message_bus: MessageBus,

    /// Queued state change, applied at the start of the next tick's state
    /// phase.
    pub(crate) transition: PendingTransition,

    pub(crate) time: FrameTime,
}

impl GlobalContext {
    /// Creates a context with an empty bus and no queued transition.
    pub fn new() -> Self {
        Self::with_bus(MessageBus::new())
    }

    pub(crate) fn with_bus(message_bus: MessageBus) -> Self {
        Self {
            message_bus,
            transition: PendingTransition::new(),
            time: FrameTime::default(),
        }
    }

    //--- State Transitions ------------------------------------------------

    /// Queues `state` to be pushed on the next tick. Replaces any earlier
    /// queued transition.
    pub fn queue_state_change(&mut self, state: StateRef) {
        self.transition.set(StateTransition::Push(state));
    }

    /// Queues a pop of the active state for the next tick. Replaces any
    /// earlier queued transition.
    pub fn queue_state_pop(&mut self) {
        self.transition.set(StateTransition::Pop);
    }

    pub fn has_queued_transition(&self) -> bool {
        self.transition.is_pending()
    }

    //--- Time -------------------------------------------------------------

    pub fn time(&self) -> FrameTime {
        self.time
    }

    pub fn timestamp(&self) -> f64 {
        self.time.timestamp
    }

    pub fn delta_time(&self) -> f64 {
        self.time.delta
    }

    /// Creates a message stamped with the current frame's timestamp.
    pub fn message(&self, kind: impl Into<MessageType>) -> Message {
        Message::new(kind, self.time.timestamp)
    }
}

impl Default for GlobalContext {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
