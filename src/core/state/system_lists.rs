//=========================================================================
// System Lists
//=========================================================================
//
// Ordered update and render lists owned by a state.
//
// Insertion order is invocation order. A system may sit in one list, both
// or neither, but never twice in the same list.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use crate::core::system::{EngineSystem, SystemRef};

/// Initial capacity reserved for each list.
const DEFAULT_SYSTEM_CAPACITY: usize = 5;

//=== SystemLists =========================================================

/// The systems a state drives each frame.
pub struct SystemLists {
    update_list: Vec<SystemRef>,
    render_list: Vec<SystemRef>,
}

impl SystemLists {
    pub fn new() -> Self {
        Self {
            update_list: Vec::with_capacity(DEFAULT_SYSTEM_CAPACITY),
            render_list: Vec::with_capacity(DEFAULT_SYSTEM_CAPACITY),
        }
    }

    //--- Registration -----------------------------------------------------

    /// Appends to the update list. Returns false if already listed.
    pub fn push_back_update(&mut self, system: SystemRef) -> bool {
        push_unique(&mut self.update_list, system)
    }

    /// Appends to the render list. Returns false if already listed.
    pub fn push_back_render(&mut self, system: SystemRef) -> bool {
        push_unique(&mut self.render_list, system)
    }

    /// Removes `system` from both lists. Returns whether it was listed.
    pub fn delete_system<S>(&mut self, system: &Rc<RefCell<S>>) -> bool
    where
        S: EngineSystem + ?Sized,
    {
        let before = self.update_list.len() + self.render_list.len();
        self.update_list.retain(|s| !same_system(system, s));
        self.render_list.retain(|s| !same_system(system, s));
        before != self.update_list.len() + self.render_list.len()
    }

    pub fn clear(&mut self) {
        self.update_list.clear();
        self.render_list.clear();
    }

    //--- Frame Callbacks --------------------------------------------------

    /// Calls `on_update` on every system in the update list, in order.
    pub fn update(&self, delta_time: f64) {
        for system in &self.update_list {
            system.borrow_mut().on_update(delta_time);
        }
    }

    /// Calls `on_render` on every system in the render list, in order.
    pub fn render(&self) {
        for system in &self.render_list {
            system.borrow_mut().on_render();
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn update_len(&self) -> usize {
        self.update_list.len()
    }

    pub fn render_len(&self) -> usize {
        self.render_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.update_list.is_empty() && self.render_list.is_empty()
    }

    pub fn contains<S>(&self, system: &Rc<RefCell<S>>) -> bool
    where
        S: EngineSystem + ?Sized,
    {
        self.update_list
            .iter()
            .chain(&self.render_list)
            .any(|s| same_system(system, s))
    }
}

impl Default for SystemLists {
    fn default() -> Self {
        Self::new()
    }
}

fn same_system<S>(a: &Rc<RefCell<S>>, b: &SystemRef) -> bool
where
    S: EngineSystem + ?Sized,
{
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

fn push_unique(list: &mut Vec<SystemRef>, system: SystemRef) -> bool {
    if list.iter().any(|s| same_system(&system, s)) {
        return false;
    }
    list.push(system);
    true
}

//=========================================================================
// Tests
//=========================================================================
