//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use frame_driver::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine core
pub use crate::core::TickControl;
pub use crate::engine::{Engine, EngineBuilder};

// Time
pub use crate::core::clock::{Clock, ManualTimeSource, MonotonicTimeSource, TimeSource};

// Systems and states
pub use crate::core::state::{State, StateRef, StateStack, StateTransition, SystemLists};
pub use crate::core::system::{EngineSystem, SystemFlags, SystemRef};

// Shared context
pub use crate::core::globals::{FrameTime, GlobalContext};

// Message bus
pub use crate::core::message_bus::{
    Listener, ListenerRef, Message, MessageBus, MessagePoster, MessageType, PostError,
    QueueStatus, TriggerStatus,
};
