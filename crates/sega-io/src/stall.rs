//! Scoped cross-core exclusion around latch commits.

use crate::CoreStall;

/// Idempotent enter/leave wrapper over a [`CoreStall`] primitive.
///
/// The Genesis engine holds it across one latch commit at a time, never
/// across a wait.
#[derive(Debug, Default)]
pub struct StallRegion {
    held: bool,
}

impl StallRegion {
    /// Creates a region that is not held.
    #[must_use]
    pub const fn new() -> Self {
        Self { held: false }
    }

    /// Returns `true` while the other core is stalled.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.held
    }

    /// Stalls the other core unless already stalled.
    pub fn enter<S: CoreStall + ?Sized>(&mut self, stall: &mut S) {
        if !self.held {
            stall.stall_other_core();
            self.held = true;
        }
    }

    /// Releases the other core if it is stalled.
    pub fn leave<S: CoreStall + ?Sized>(&mut self, stall: &mut S) {
        if self.held {
            stall.release_other_core();
            self.held = false;
        }
    }
}
