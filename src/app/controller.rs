//! Peripheral controller: the hexagonal core.
//!
//! [`PeripheralController`] owns the configuration, the connection state,
//! the characteristic store and the ports.  Every [`Task`] drained from the
//! queue lands in [`PeripheralController::handle`]; stack notifications are
//! routed through its [`StackEventHandler`] implementation.
//!
//! ```text
//!   EventQueue ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                  │     PeripheralController     │
//!   BlePort   ◀──▶ │  fsm · CharacteristicStore   │ ──▶ OutputPort
//!                  └──────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::PeripheralConfig;
use crate::diagnostics::{Counters, RuntimeMetrics};
use crate::drivers::button::{ButtonId, Inputs, Level};
use crate::error::{BleError, Error, Result};
use crate::events::{EventQueue, Task};
use crate::fsm::context::TransitionContext;
use crate::fsm::{self, ConnectionEvent, ConnectionState};
use crate::gatt::{AttrHandle, CHARACTERISTIC_COUNT, CharacteristicStore, Role, ServiceDefinition};
use crate::scheduler::{Dispatcher, TimerId};

use super::events::AppEvent;
use super::ports::{BlePort, EventSink, Indicator, OutputPort, StackEventHandler};

// ───────────────────────────────────────────────────────────────
// PeripheralController
// ───────────────────────────────────────────────────────────────

pub struct PeripheralController<'a, B, O, S> {
    config: PeripheralConfig,
    queue: &'a EventQueue,
    inputs: &'a Inputs,
    ble: B,
    outputs: O,
    sink: S,
    state: ConnectionState,
    store: Option<CharacteristicStore>,
    registration_pending: bool,
    counters: Counters,
    blink_timer: Option<TimerId>,
}

impl<'a, B, O, S> PeripheralController<'a, B, O, S>
where
    B: BlePort,
    O: OutputPort,
    S: EventSink,
{
    /// Construct the controller.  Nothing talks to the stack until
    /// [`start`](Self::start).
    pub fn new(
        config: PeripheralConfig,
        queue: &'a EventQueue,
        inputs: &'a Inputs,
        ble: B,
        outputs: O,
        sink: S,
    ) -> Self {
        Self {
            config,
            queue,
            inputs,
            ble,
            outputs,
            sink,
            state: ConnectionState::Idle,
            store: None,
            registration_pending: false,
            counters: Counters::default(),
            blink_timer: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Register the periodic tasks and ask the stack to initialise.
    pub fn start(&mut self, dispatcher: &mut Dispatcher<'_>, now_ms: u64) -> Result<()> {
        let blink = dispatcher.post_periodic(Task::Blink, self.config.blink_interval_ms, now_ms)?;
        self.blink_timer = Some(blink);
        let diagnostics_ms = self.config.diagnostics_interval_ms;
        if diagnostics_ms > 0 {
            dispatcher.post_periodic(Task::Diagnostics, diagnostics_ms, now_ms)?;
        }

        self.sink.emit(&AppEvent::Started);
        info!("Controller: starting BLE stack as '{}'", self.config.device_name);
        self.ble.initialize();
        Ok(())
    }

    /// Run one task to completion.
    pub fn handle(&mut self, task: Task) {
        self.counters.tasks_handled += 1;
        match task {
            Task::Input { button, level } => self.on_input(button, level),
            Task::Blink => self.on_blink(),
            Task::Diagnostics => self.report_diagnostics(),
            Task::Stack(event) => event.dispatch(self),
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> &PeripheralConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&CharacteristicStore> {
        self.store.as_ref()
    }

    pub fn ble(&self) -> &B {
        &self.ble
    }

    pub fn ble_mut(&mut self) -> &mut B {
        &mut self.ble
    }

    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn blink_timer(&self) -> Option<TimerId> {
        self.blink_timer
    }

    pub fn metrics(&self) -> RuntimeMetrics {
        RuntimeMetrics::collect(&self.counters, self.queue.dropped())
    }

    // ── Task handlers ─────────────────────────────────────────

    /// Button A drives "Button State", button B drives "Button Colour".
    /// Pressed writes 1, released writes 0 and counts as a click.
    fn on_input(&mut self, button: ButtonId, level: Level) {
        let role = match button {
            ButtonId::A => Role::ButtonState,
            ButtonId::B => Role::ButtonColour,
        };
        let Some(store) = self.store.as_mut() else {
            debug!("Controller: {:?} {:?} before service registration, ignored", button, level);
            return;
        };

        let handle = store.handle(role);
        let value = u8::from(level.is_pressed());
        match store.update_notifiable(handle, value, &mut self.ble, &mut self.sink) {
            Ok(_) => self.counters.notifications += 1,
            Err(e) => warn!("Controller: {} update failed: {}", role.description(), e),
        }

        if level == Level::Released {
            self.sink.emit(&AppEvent::ButtonClicked(button));
        }
    }

    /// Heartbeat.  The timer keeps firing while connected; the toggle is
    /// suppressed instead.
    fn on_blink(&mut self) {
        if self.state != ConnectionState::Connected {
            self.outputs.toggle(Indicator::Status);
        }
    }

    fn report_diagnostics(&mut self) {
        let metrics = self.metrics();
        if metrics.is_degraded() {
            warn!(
                "Diagnostics: dropped={} adv_failures={}",
                metrics.tasks_dropped, metrics.advertising_failures
            );
        }
        self.sink.emit(&AppEvent::Diagnostics(metrics));
    }

    // ── Internal ──────────────────────────────────────────────

    fn install_store(&mut self, handles: [AttrHandle; CHARACTERISTIC_COUNT]) {
        let def = ServiceDefinition::automation_io(&self.config);
        info!("Controller: service 0x{:04X} registered, handles {:?}", def.uuid, handles);
        self.store = Some(CharacteristicStore::new(&def, handles));
        self.sink.emit(&AppEvent::ServiceRegistered { handles });
    }

    fn apply(&mut self, event: ConnectionEvent) {
        let mut ctx =
            TransitionContext::new(&mut self.ble, &mut self.outputs, &mut self.sink, &self.config);
        match fsm::transition(&mut self.state, event, &mut ctx) {
            Ok(()) => {}
            Err(Error::Advertising { .. }) => self.counters.advertising_failures += 1,
            Err(e) => debug!("Controller: {:?} failed: {}", event, e),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Stack notifications
// ───────────────────────────────────────────────────────────────

impl<B, O, S> StackEventHandler for PeripheralController<'_, B, O, S>
where
    B: BlePort,
    O: OutputPort,
    S: EventSink,
{
    /// Request the GATT table.  Advertising waits for the table to be
    /// confirmed in [`on_service_registered`](Self::on_service_registered).
    fn on_init_complete(&mut self, status: core::result::Result<(), BleError>) {
        if self.store.is_some() || self.registration_pending {
            warn!("Controller: duplicate init completion ignored");
            return;
        }
        let def = ServiceDefinition::automation_io(&self.config);
        match status.and_then(|()| self.ble.register_service(&def)) {
            Ok(()) => {
                debug!("Controller: service 0x{:04X} requested", def.uuid);
                self.registration_pending = true;
            }
            Err(e) => self.apply(ConnectionEvent::InitComplete(Err(e))),
        }
    }

    /// Mirror the table and arm the buttons before the first
    /// advertisement goes out.
    fn on_service_registered(
        &mut self,
        result: core::result::Result<[AttrHandle; CHARACTERISTIC_COUNT], BleError>,
    ) {
        if !self.registration_pending {
            warn!("Controller: unsolicited service registration ignored");
            return;
        }
        self.registration_pending = false;

        let status = result.map(|handles| {
            self.install_store(handles);
            let address = self.ble.address();
            self.sink.emit(&AppEvent::StackReady { address });
            self.inputs.arm();
        });
        self.apply(ConnectionEvent::InitComplete(status));
    }

    fn on_connection_complete(&mut self) {
        self.apply(ConnectionEvent::ConnectionComplete);
    }

    fn on_disconnection_complete(&mut self) {
        self.apply(ConnectionEvent::DisconnectionComplete);
    }

    /// `len` is the length the peer wrote; `data` may be a truncated copy.
    fn on_data_written(&mut self, handle: AttrHandle, data: &[u8], len: usize) {
        let Some(store) = self.store.as_mut() else {
            debug!("Controller: write to {:?} before service registration, ignored", handle);
            return;
        };
        let outcome = if len != data.len() {
            Err(store.reject_write(handle, len, &mut self.sink))
        } else {
            store.on_external_write(handle, data, &mut self.outputs, &mut self.sink)
        };
        match outcome {
            Ok(_) => {}
            Err(Error::MalformedWrite { .. }) => self.counters.malformed_writes += 1,
            Err(e) => debug!("Controller: write ignored: {}", e),
        }
    }

    fn on_updates_enabled(&mut self, handle: AttrHandle) {
        self.sink.emit(&AppEvent::UpdatesEnabled(handle));
    }

    fn on_updates_disabled(&mut self, handle: AttrHandle) {
        self.sink.emit(&AppEvent::UpdatesDisabled(handle));
    }

    fn on_confirmation_received(&mut self, handle: AttrHandle) {
        self.sink.emit(&AppEvent::ConfirmationReceived(handle));
    }
}
