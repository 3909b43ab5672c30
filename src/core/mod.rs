//=========================================================================
// Core Systems
//
// Building blocks of the frame driver. `crate::Engine` owns one of each
// and sequences them once per tick.
//
// Responsibilities:
// - `clock`:       pausable monotonic time with per-tick delta
// - `system`:      per-frame component contract (update/render callbacks)
// - `state`:       stack of application states owning their systems
// - `message_bus`: typed listeners, immediate trigger, deferred queue
// - `globals`:     context shared with states during their hooks
//
// Notes:
// Everything here runs on the thread that owns the engine. The only way
// in from another thread is a `MessagePoster`.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod clock;
pub mod globals;
pub mod message_bus;
pub mod state;
pub mod system;

//=== TickControl =========================================================

/// Returned by the run-loop callback to keep going or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Exit,
}
