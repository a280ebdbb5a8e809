//! Destination for rendered and synthetic breaches.

use crate::model::Breach;

/// Receives breaches as they are rendered.
///
/// Template failures are reported here as synthetic value breaches, ahead of
/// the breach whose template failed.
pub trait BreachSink {
    fn add_breach(&mut self, breach: Breach);
}

impl BreachSink for Vec<Breach> {
    fn add_breach(&mut self, breach: Breach) {
        self.push(breach);
    }
}

impl<S: BreachSink + ?Sized> BreachSink for &mut S {
    fn add_breach(&mut self, breach: Breach) {
        (**self).add_breach(breach);
    }
}
