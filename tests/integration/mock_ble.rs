//! Mock adapters for integration tests.
//!
//! Records every stack, LED and sink call so tests can assert on the full
//! history without a radio or GPIO.  Failures are injected per call.

use buttonled::BleError;
use buttonled::advertising::{AdvHandle, AdvertisingParameters, AdvertisingPayload};
use buttonled::app::controller::PeripheralController;
use buttonled::app::events::AppEvent;
use buttonled::app::ports::{EventSink, GapPort, GattServerPort, Indicator, OutputPort, StackPort};
use buttonled::config::PeripheralConfig;
use buttonled::drivers::button::Inputs;
use buttonled::events::{EventQueue, StackEvent, Task};
use buttonled::gatt::{AttrHandle, CHARACTERISTIC_COUNT, ServiceDefinition};
use buttonled::pins;

/// Value handles the mock GATT server hands out.
pub const HANDLES: [AttrHandle; CHARACTERISTIC_COUNT] = [AttrHandle(3), AttrHandle(7), AttrHandle(11)];
pub const BUTTON_STATE: AttrHandle = HANDLES[0];
pub const BUTTON_COLOUR: AttrHandle = HANDLES[1];
pub const LED_STATE: AttrHandle = HANDLES[2];

// ── BLE call record ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BleCall {
    Initialize,
    RegisterService(u16),
    Write { handle: AttrHandle, value: Vec<u8> },
    SetParameters(AdvertisingParameters),
    SetPayload(Vec<u8>),
    StartAdvertising,
}

// ── MockBle ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBle {
    pub calls: Vec<BleCall>,
    pub fail_register: Option<BleError>,
    pub fail_parameters: Option<BleError>,
    pub fail_payload: Option<BleError>,
    pub fail_start: Option<BleError>,
    pub fail_writes: Option<BleError>,
}

#[allow(dead_code)]
impl MockBle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(AttrHandle, Vec<u8>)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BleCall::Write { handle, value } => Some((*handle, value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn advertising_starts(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == BleCall::StartAdvertising)
            .count()
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.calls.iter().rev().find_map(|c| match c {
            BleCall::SetPayload(p) => Some(p.as_slice()),
            _ => None,
        })
    }
}

fn check(fail: Option<BleError>) -> Result<(), BleError> {
    fail.map_or(Ok(()), Err)
}

impl StackPort for MockBle {
    fn initialize(&mut self) {
        self.calls.push(BleCall::Initialize);
    }

    fn address(&self) -> Option<[u8; 6]> {
        Some([0x66, 0x55, 0x44, 0x33, 0x22, 0x11])
    }
}

impl GattServerPort for MockBle {
    /// Only records the request; tests deliver the completion.
    fn register_service(&mut self, def: &ServiceDefinition) -> Result<(), BleError> {
        check(self.fail_register)?;
        self.calls.push(BleCall::RegisterService(def.uuid));
        Ok(())
    }

    fn write(&mut self, handle: AttrHandle, value: &[u8]) -> Result<(), BleError> {
        check(self.fail_writes)?;
        self.calls.push(BleCall::Write {
            handle,
            value: value.to_vec(),
        });
        Ok(())
    }
}

impl GapPort for MockBle {
    fn set_advertising_parameters(
        &mut self,
        _handle: AdvHandle,
        params: &AdvertisingParameters,
    ) -> Result<(), BleError> {
        check(self.fail_parameters)?;
        self.calls.push(BleCall::SetParameters(*params));
        Ok(())
    }

    fn set_advertising_payload(&mut self, _handle: AdvHandle, payload: &AdvertisingPayload) -> Result<(), BleError> {
        check(self.fail_payload)?;
        self.calls.push(BleCall::SetPayload(payload.as_bytes().to_vec()));
        Ok(())
    }

    fn start_advertising(&mut self, _handle: AdvHandle) -> Result<(), BleError> {
        check(self.fail_start)?;
        self.calls.push(BleCall::StartAdvertising);
        Ok(())
    }
}

// ── MockOutputs ───────────────────────────────────────────────

/// LED states plus every `set` ever made.
pub struct MockOutputs {
    pub on: [bool; 3],
    pub history: Vec<(Indicator, bool)>,
}

#[allow(dead_code)]
impl MockOutputs {
    /// Same power-on levels as the hardware adapter.
    pub fn new(actuated_on: bool) -> Self {
        Self {
            on: [true, true, actuated_on],
            history: Vec::new(),
        }
    }

    pub fn sets_of(&self, indicator: Indicator) -> usize {
        self.history.iter().filter(|(i, _)| *i == indicator).count()
    }
}

impl OutputPort for MockOutputs {
    fn set(&mut self, indicator: Indicator, on: bool) {
        self.on[indicator as usize] = on;
        self.history.push((indicator, on));
    }

    fn is_on(&self, indicator: Indicator) -> bool {
        self.on[indicator as usize]
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type Controller = PeripheralController<'static, MockBle, MockOutputs, RecordingSink>;

/// A controller wired to fresh mocks, plus the queue and inputs it shares
/// with the "ISRs".  Each test gets its own leaked queue and inputs.
pub struct Rig {
    pub controller: Controller,
    pub queue: &'static EventQueue,
    pub inputs: &'static Inputs,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with(PeripheralConfig::default(), MockBle::new())
    }

    pub fn with(config: PeripheralConfig, ble: MockBle) -> Self {
        let queue: &'static EventQueue = Box::leak(Box::new(EventQueue::new()));
        let inputs: &'static Inputs = Box::leak(Box::new(Inputs::new(
            pins::BUTTON_A_POLARITY,
            pins::BUTTON_B_POLARITY,
        )));
        let outputs = MockOutputs::new(config.initial_led_on());
        let controller = PeripheralController::new(
            config,
            queue,
            inputs,
            ble,
            outputs,
            RecordingSink::default(),
        );
        Self {
            controller,
            queue,
            inputs,
        }
    }

    /// Stack came up; service registered and advertising.
    pub fn ready() -> Self {
        let mut rig = Self::new();
        rig.bring_up();
        rig
    }

    /// Deliver stack init and the table completion, in device order.
    pub fn bring_up(&mut self) {
        self.stack(StackEvent::InitComplete(Ok(())));
        self.stack(StackEvent::ServiceRegistered(Ok(HANDLES)));
    }

    pub fn stack(&mut self, event: StackEvent) {
        self.controller.handle(Task::Stack(event));
    }

    /// Run every queued task, like one worker pass.
    pub fn drain(&mut self) -> usize {
        let mut n = 0;
        while let Some(task) = self.queue.try_pop() {
            self.controller.handle(task);
            n += 1;
        }
        n
    }

    pub fn ble(&self) -> &MockBle {
        self.controller.ble()
    }

    pub fn outputs(&self) -> &MockOutputs {
        self.controller.outputs()
    }

    pub fn events(&self) -> &[AppEvent] {
        &self.controller.sink().events
    }

    pub fn led(&self, indicator: Indicator) -> bool {
        self.controller.outputs().is_on(indicator)
    }
}
