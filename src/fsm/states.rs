//! Side effects of each transition.
//!
//! ```text
//!  IDLE ──[init ok]──▶ ADVERTISING ──[connected]──▶ CONNECTED
//!   │                       ▲                           │
//!   │                       └──────[disconnected]───────┘
//!   └──[init failed]──▶ (stays IDLE, never advertises)
//! ```
//!
//! Every function here runs on the worker.  Advertising failures are
//! reported and returned; the caller keeps the previous state.

use log::{info, warn};

use super::context::TransitionContext;
use crate::advertising::{AdvHandle, AdvertisingParameters, AdvertisingPayload};
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, GapPort, Indicator, OutputPort};
use crate::error::{AdvertisingCall, BleError, Result};

// ═══════════════════════════════════════════════════════════════════════════
//  Advertising
// ═══════════════════════════════════════════════════════════════════════════

fn check<G, O, S>(
    ctx: &mut TransitionContext<'_, G, O, S>,
    call: AdvertisingCall,
    status: core::result::Result<(), BleError>,
) -> Result<()>
where
    G: GapPort + ?Sized,
    O: OutputPort + ?Sized,
    S: EventSink + ?Sized,
{
    status.map_err(|error| {
        warn!("BLE: {} failed: {}", call, error);
        ctx.emit(&AppEvent::AdvertisingFailed { call, error });
        call.failed(error)
    })
}

/// Configure parameters and payload, then start the legacy set.
pub(super) fn start_advertising<G, O, S>(ctx: &mut TransitionContext<'_, G, O, S>) -> Result<()>
where
    G: GapPort + ?Sized,
    O: OutputPort + ?Sized,
    S: EventSink + ?Sized,
{
    let params = AdvertisingParameters::from_config(ctx.config);
    let payload = AdvertisingPayload::from_config(ctx.config);

    let status = ctx.gap.set_advertising_parameters(AdvHandle::LEGACY, &params);
    check(ctx, AdvertisingCall::SetParameters, status)?;
    let status = ctx.gap.set_advertising_payload(AdvHandle::LEGACY, &payload);
    check(ctx, AdvertisingCall::SetPayload, status)?;
    restart_advertising(ctx)
}

/// Start the already-configured legacy set again.
pub(super) fn restart_advertising<G, O, S>(ctx: &mut TransitionContext<'_, G, O, S>) -> Result<()>
where
    G: GapPort + ?Sized,
    O: OutputPort + ?Sized,
    S: EventSink + ?Sized,
{
    let status = ctx.gap.start_advertising(AdvHandle::LEGACY);
    check(ctx, AdvertisingCall::Start, status)?;

    ctx.outputs.set(Indicator::Activity, true);
    let interval_ms = ctx.config.advertising_interval_ms;
    info!("BLE: advertising as '{}' every {} ms", ctx.config.device_name, interval_ms);
    ctx.emit(&AppEvent::AdvertisingStarted { interval_ms });
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
//  Connection
// ═══════════════════════════════════════════════════════════════════════════

/// Steady status LED, activity LED off, report the actuated LED.
pub(super) fn enter_connected<G, O, S>(ctx: &mut TransitionContext<'_, G, O, S>)
where
    G: GapPort + ?Sized,
    O: OutputPort + ?Sized,
    S: EventSink + ?Sized,
{
    ctx.outputs.set(Indicator::Status, true);
    ctx.outputs.set(Indicator::Activity, false);
    let led_on = ctx.outputs.is_on(Indicator::Actuated);
    ctx.emit(&AppEvent::Connected { led_on });
}

/// Report the link loss, then advertise again.  No retry on failure.
///
/// A failed restart leaves the indicators as they were while connected:
/// status steady on, activity off.  The state also stays `Connected`, so
/// the blink task keeps the status LED steady until a later reconnect.
pub(super) fn leave_connected<G, O, S>(ctx: &mut TransitionContext<'_, G, O, S>) -> Result<()>
where
    G: GapPort + ?Sized,
    O: OutputPort + ?Sized,
    S: EventSink + ?Sized,
{
    let led_on = ctx.outputs.is_on(Indicator::Actuated);
    ctx.emit(&AppEvent::Disconnected { led_on });
    restart_advertising(ctx)
}
