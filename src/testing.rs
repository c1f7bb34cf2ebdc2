//! Test helpers shared by the unit tests.

use std::{cell::Cell, rc::Rc};

/// Counts how many [`DropToken`]s handed out by it were dropped.
#[derive(Default)]
pub(crate) struct Drops(Rc<Cell<usize>>);

impl Drops {
    pub(crate) fn token(&self) -> DropToken {
        DropToken(Rc::clone(&self.0))
    }

    pub(crate) fn count(&self) -> usize {
        self.0.get()
    }
}

/// Pointer-sized resource reporting its drop. Clones are tracked too.
pub(crate) struct DropToken(Rc<Cell<usize>>);

impl Clone for DropToken {
    fn clone(&self) -> Self {
        DropToken(Rc::clone(&self.0))
    }
}

impl Drop for DropToken {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Resource whose `clone` panics, standing in for a copy that fails half-way.
pub(crate) struct PanickyClone(pub(crate) u32);

impl PanickyClone {
    pub(crate) fn value(&self) -> u32 {
        self.0
    }
}

impl Clone for PanickyClone {
    fn clone(&self) -> Self {
        panic!("clone failed");
    }
}
