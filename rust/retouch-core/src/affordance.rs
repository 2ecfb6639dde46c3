use std::{cell::Cell, rc::Rc};

use crate::{Dom, RetouchError};

/// A control bound to one surface, together with every listener and watcher
/// it installed.
pub trait Affordance {
    /// Tear down the control and everything it registered with the host.
    fn dispose(&mut self);
}

/// Builds the affordance for a newly attached surface.
pub trait AffordanceFactory<D: Dom> {
    type Affordance: Affordance + 'static;

    /// Create the control for `surface`. `context` is the document the
    /// surface was discovered in (the top document or a frame's).
    fn create(
        &self,
        surface: &D::Node,
        context: &D::Document,
    ) -> Result<Self::Affordance, RetouchError>;
}

/// One activation of an affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Orders the activations of a single affordance so only the latest one may
/// write to the surface.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    latest: Rc<Cell<u64>>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new activation, superseding every earlier one.
    pub fn issue(&self) -> Ticket {
        let next = self.latest.get().wrapping_add(1);
        self.latest.set(next);
        Ticket(next)
    }

    /// Whether no activation was issued after `ticket`.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.get() == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_only_keeps_the_latest_ticket_current() {
        let sequence = RequestSequence::new();
        let first = sequence.issue();
        assert!(sequence.is_current(first));

        let second = sequence.clone().issue();
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
    }
}
