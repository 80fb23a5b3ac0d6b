//! Borrowed collaborators threaded through every transition.
//!
//! The controller owns the ports; for the duration of one transition it
//! lends them to the state machine through this struct.  Nothing here
//! outlives the call.

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, GapPort, OutputPort};
use crate::config::PeripheralConfig;

pub struct TransitionContext<'a, G: ?Sized, O: ?Sized, S: ?Sized> {
    pub gap: &'a mut G,
    pub outputs: &'a mut O,
    pub sink: &'a mut S,
    pub config: &'a PeripheralConfig,
}

impl<'a, G, O, S> TransitionContext<'a, G, O, S>
where
    G: GapPort + ?Sized,
    O: OutputPort + ?Sized,
    S: EventSink + ?Sized,
{
    pub fn new(gap: &'a mut G, outputs: &'a mut O, sink: &'a mut S, config: &'a PeripheralConfig) -> Self {
        Self {
            gap,
            outputs,
            sink,
            config,
        }
    }

    pub(super) fn emit(&mut self, event: &AppEvent) {
        self.sink.emit(event);
    }
}
