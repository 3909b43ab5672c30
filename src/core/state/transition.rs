//=========================================================================
// State Transitions
//=========================================================================
//
// Single-slot request for a state change.
//
// Hosts, states and the engine facade queue a transition here; the engine
// applies it once per tick, after message dispatch and before the active
// state updates. A second request before that point replaces the first.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use log::warn;

//=== Internal Dependencies ===============================================

use super::StateRef;

//=== StateTransition =====================================================

/// A requested change to the state stack.
#[derive(Clone)]
pub enum StateTransition {
    /// Exits the active state and makes this one active.
    Push(StateRef),

    /// Exits and removes the active state.
    Pop,
}

impl fmt::Debug for StateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The state may be mid-callback when a transition is logged.
            Self::Push(state) => match state.try_borrow() {
                Ok(state) => write!(f, "Push({})", state.name()),
                Err(_) => write!(f, "Push(<busy>)"),
            },
            Self::Pop => write!(f, "Pop"),
        }
    }
}

//=== PendingTransition ===================================================

/// Holds at most one queued transition. Last write wins.
#[derive(Default)]
pub struct PendingTransition {
    slot: Option<StateTransition>,
}

impl PendingTransition {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Queues `transition`, replacing any earlier request.
    pub fn set(&mut self, transition: StateTransition) {
        if let Some(previous) = self.slot.replace(transition) {
            warn!("Queued state transition {:?} overwritten before it was applied", previous);
        }
    }

    /// Takes the queued transition, leaving the slot empty.
    pub fn take(&mut self) -> Option<StateTransition> {
        self.slot.take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

//=========================================================================
// Tests
//=========================================================================
