//=========================================================================
// Engine Systems
//=========================================================================
//
// Per-frame component contract (rendering, audio, physics, ...).
//
// A system is driven by the state that lists it:
//   State::on_update(dt) → EngineSystem::on_update(dt)   (update list)
//   State::on_render(dt) → EngineSystem::on_render()     (render list)
//
// The pause and visibility flags are bookkeeping only. The driver never
// skips a system because of them; each system decides what they mean.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::Rc;

//=== SystemFlags =========================================================

/// Pause and visibility flags shared by every system.
///
/// Systems embed one of these and expose it through
/// [`EngineSystem::flags`] to get the flag accessors for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemFlags {
    paused: bool,
    visible: bool,
}

impl SystemFlags {
    /// Running and visible.
    pub fn new() -> Self {
        Self {
            paused: false,
            visible: true,
        }
    }
}

impl Default for SystemFlags {
    fn default() -> Self {
        Self::new()
    }
}

//=== EngineSystem Trait ==================================================

/// Contract implemented by every per-frame engine component.
///
/// Only [`on_update`](EngineSystem::on_update),
/// [`on_render`](EngineSystem::on_render) and the two flag accessors are
/// required:
///
/// ```
/// use frame_driver::core::system::{EngineSystem, SystemFlags};
///
/// #[derive(Default)]
/// struct Audio {
///     flags: SystemFlags,
///     mixed: f64,
/// }
///
/// impl EngineSystem for Audio {
///     fn flags(&self) -> &SystemFlags { &self.flags }
///     fn flags_mut(&mut self) -> &mut SystemFlags { &mut self.flags }
///
///     fn on_update(&mut self, delta_time: f64) {
///         if !self.is_paused() {
///             self.mixed += delta_time;
///         }
///     }
///
///     fn on_render(&mut self) {}
/// }
///
/// let mut audio = Audio::default();
/// audio.pause();
/// audio.on_update(0.016);
/// assert_eq!(audio.mixed, 0.0);
/// ```
pub trait EngineSystem {
    fn flags(&self) -> &SystemFlags;

    fn flags_mut(&mut self) -> &mut SystemFlags;

    /// Advances the system by `delta_time` seconds.
    fn on_update(&mut self, delta_time: f64);

    /// Draws (or otherwise presents) the system's current state.
    fn on_render(&mut self);

    //--- Flags ------------------------------------------------------------

    fn pause(&mut self) {
        self.flags_mut().paused = true;
    }

    fn unpause(&mut self) {
        self.flags_mut().paused = false;
    }

    fn is_paused(&self) -> bool {
        self.flags().paused
    }

    fn set_visibility(&mut self, visible: bool) {
        self.flags_mut().visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.flags().visible
    }
}

/// Shared handle to a system.
///
/// A system may be listed by more than one state; the last handle dropped
/// frees it.
pub type SystemRef = Rc<RefCell<dyn EngineSystem>>;

//=========================================================================
// Tests
//=========================================================================
