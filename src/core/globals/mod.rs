//=========================================================================
// Global Engine State
//=========================================================================
//
// Shared data handed to states on every lifecycle and frame hook.
//
// Architecture:
//   Engine (owns): Clock + StateStack + GlobalContext
//   GlobalContext: MessageBus + PendingTransition + FrameTime
//
//=========================================================================

//=== Module Declarations =================================================

mod global_context;

//=== Public API ==========================================================

pub use global_context::{FrameTime, GlobalContext};
