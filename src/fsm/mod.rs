//! Connection / advertising state machine.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  state        event                  next          side effect │
//! │  ───────────  ─────────────────────  ────────────  ─────────── │
//! │  Idle         InitComplete(Ok)       Advertising   configure + │
//! │                                                    start adv   │
//! │  Idle         InitComplete(Err)      Idle          report      │
//! │  Advertising  ConnectionComplete     Connected     LEDs        │
//! │  Connected    DisconnectionComplete  Advertising   restart adv │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The state is a plain value owned by the controller.  [`transition`] is
//! its only writer and runs on the worker.  When a side effect fails the
//! state stays where it was; nothing is retried.  Events that make no
//! sense in the current state are logged and ignored.

pub mod context;
mod states;

use core::fmt;

use context::TransitionContext;
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, GapPort, OutputPort};
use crate::error::{BleError, Error, Result};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    #[default]
    Idle = 0,
    Advertising = 1,
    Connected = 2,
}

impl ConnectionState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Advertising => "Advertising",
            Self::Connected => "Connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Stack notifications the state machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    InitComplete(core::result::Result<(), BleError>),
    ConnectionComplete,
    DisconnectionComplete,
}

// ---------------------------------------------------------------------------
// Transition function
// ---------------------------------------------------------------------------

/// Apply `event` to `state`, running the transition's side effects.
///
/// On error the state is left unchanged and the error is returned after it
/// has been reported through the sink.
pub fn transition<G, O, S>(
    state: &mut ConnectionState,
    event: ConnectionEvent,
    ctx: &mut TransitionContext<'_, G, O, S>,
) -> Result<()>
where
    G: GapPort + ?Sized,
    O: OutputPort + ?Sized,
    S: EventSink + ?Sized,
{
    use ConnectionEvent as E;
    use ConnectionState as St;

    let from = *state;
    let to = match (from, event) {
        (St::Idle, E::InitComplete(Ok(()))) => {
            states::start_advertising(ctx)?;
            St::Advertising
        }
        (St::Idle, E::InitComplete(Err(e))) => {
            warn!("BLE: initialization failed: {}", e);
            ctx.emit(&AppEvent::InitFailed(e));
            return Err(Error::Init(e));
        }
        (St::Advertising, E::ConnectionComplete) => {
            states::enter_connected(ctx);
            St::Connected
        }
        (St::Connected, E::DisconnectionComplete) => {
            states::leave_connected(ctx)?;
            St::Advertising
        }
        (s, e) => {
            warn!("FSM: {:?} ignored in state {}", e, s);
            return Ok(());
        }
    };

    info!("FSM transition: {} -> {}", from, to);
    *state = to;
    ctx.emit(&AppEvent::StateChanged { from, to });
    Ok(())
}
