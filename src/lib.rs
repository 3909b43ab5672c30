//=========================================================================
// Frame Driver — Library Root
//
// Runtime core of a single-threaded game loop: a pausable clock, a stack
// of application states that own their systems, and a double-buffered
// message bus, all advanced once per `Engine::tick()`.
//
// Responsibilities:
// - Expose the engine facade (`Engine`, `EngineBuilder`)
// - Expose the building blocks under `core` for hosts that drive their
//   own loop
//
// Typical usage:
// ```no_run
// use frame_driver::prelude::*;
//
// let mut engine = EngineBuilder::new().with_tps(60.0).build();
// engine.run(|_| TickControl::Continue);
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the clock, systems, states, message bus and the context
// states receive in their hooks. Most applications only need the prelude.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `engine` wires the core pieces together and sequences the frame.
//
mod engine;

//--- Public Exports ------------------------------------------------------

pub use engine::{Engine, EngineBuilder};
