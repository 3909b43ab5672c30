//=========================================================================
// State System
//=========================================================================
//
// Mutually exclusive application modes managed on a stack.
//
// Architecture:
//   StateStack
//     └─ stack: Vec<StateRef>          (last = active)
//   PendingTransition                  (one queued request, last wins)
//   State
//     └─ SystemLists { update, render }
//
// Flow per tick:
//   PendingTransition::take() → StateStack::apply()
//   StateStack::update() → State::on_update() → EngineSystem::on_update()
//   StateStack::render() → State::on_render() → EngineSystem::on_render()
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use crate::core::globals::GlobalContext;

//=== Module Declarations =================================================

mod state_stack;
mod system_lists;
mod transition;

//=== Public API ==========================================================

pub use state_stack::StateStack;
pub use system_lists::SystemLists;
pub use transition::{PendingTransition, StateTransition};

//=== State Trait =========================================================

/// An application mode (menu, gameplay, pause screen, ...).
///
/// The engine calls [`enter`](State::enter) once when the state becomes
/// active and [`exit`](State::exit) once when it stops being active,
/// either popped or covered by a newly pushed state.
///
/// The frame hooks default to driving the state's [`SystemLists`]:
///
/// ```rust
/// # use frame_driver::prelude::*;
/// struct Gameplay {
///     systems: SystemLists,
/// }
///
/// impl State for Gameplay {
///     fn enter(&mut self, context: &mut GlobalContext) {
///         // register listeners, allocate resources...
///     }
///
///     fn exit(&mut self, context: &mut GlobalContext) {}
///
///     fn systems(&self) -> &SystemLists {
///         &self.systems
///     }
/// }
/// ```
pub trait State {
    /// Called when the state becomes the active one.
    fn enter(&mut self, context: &mut GlobalContext);

    /// Called when the state stops being the active one.
    fn exit(&mut self, context: &mut GlobalContext);

    /// Systems driven by the default frame hooks.
    fn systems(&self) -> &SystemLists;

    /// Called once per tick while active. Updates the update list in order.
    fn on_update(&mut self, delta_time: f64, _context: &mut GlobalContext) {
        self.systems().update(delta_time);
    }

    /// Called once per tick after `on_update`. Renders the render list in order.
    fn on_render(&mut self, _delta_time: f64, _context: &mut GlobalContext) {
        self.systems().render();
    }

    /// Label used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a state.
pub type StateRef = Rc<RefCell<dyn State>>;
