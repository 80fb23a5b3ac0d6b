//! Integration tests for the connection lifecycle.
//!
//! Drives the controller through stack notifications the way the BLE
//! adapter delivers them and checks advertising calls, indicator LEDs and
//! the reported state changes.

use buttonled::BleError;
use buttonled::app::events::AppEvent;
use buttonled::app::ports::Indicator;
use buttonled::config::PeripheralConfig;
use buttonled::events::StackEvent;
use buttonled::fsm::ConnectionState;
use buttonled::gatt::AUTOMATION_IO_SERVICE_UUID;

use crate::mock_ble::{BleCall, HANDLES, MockBle, Rig};

// ── Happy path ────────────────────────────────────────────────

#[test]
fn connect_disconnect_cycle_readvertises_once() {
    let mut rig = Rig::new();
    rig.bring_up();
    assert_eq!(rig.controller.state(), ConnectionState::Advertising);

    rig.stack(StackEvent::ConnectionComplete);
    assert_eq!(rig.controller.state(), ConnectionState::Connected);

    rig.stack(StackEvent::DisconnectionComplete);
    assert_eq!(rig.controller.state(), ConnectionState::Advertising);
    assert_eq!(rig.ble().advertising_starts(), 2);

    let changes: Vec<(ConnectionState, ConnectionState)> = rig
        .events()
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (ConnectionState::Idle, ConnectionState::Advertising),
            (ConnectionState::Advertising, ConnectionState::Connected),
            (ConnectionState::Connected, ConnectionState::Advertising),
        ]
    );
}

#[test]
fn advertising_is_configured_once_and_restarted_after_disconnect() {
    let mut rig = Rig::ready();
    rig.stack(StackEvent::ConnectionComplete);
    rig.stack(StackEvent::DisconnectionComplete);

    let parameters = rig
        .ble()
        .calls
        .iter()
        .filter(|c| matches!(c, BleCall::SetParameters(_)))
        .count();
    assert_eq!(parameters, 1);
    assert_eq!(rig.ble().calls.last(), Some(&BleCall::StartAdvertising));
}

#[test]
fn payload_carries_name_and_service() {
    let rig = Rig::ready();
    let payload = rig.ble().payload().expect("payload set");

    assert!(payload.len() <= 31);
    let uuid = AUTOMATION_IO_SERVICE_UUID.to_le_bytes();
    assert!(payload.windows(2).any(|w| w == uuid));
    assert!(payload.windows(9).any(|w| w == b"ButtonLED"));
}

#[test]
fn indicator_leds_follow_the_connection() {
    let mut rig = Rig::ready();
    assert!(rig.led(Indicator::Activity), "activity on while advertising");

    rig.controller.handle(buttonled::events::Task::Blink);
    rig.stack(StackEvent::ConnectionComplete);
    assert!(rig.led(Indicator::Status), "status steady on when connected");
    assert!(!rig.led(Indicator::Activity));
    assert!(rig.events().contains(&AppEvent::Connected { led_on: true }));

    rig.stack(StackEvent::DisconnectionComplete);
    assert!(rig.led(Indicator::Activity));
    assert!(rig.events().contains(&AppEvent::Disconnected { led_on: true }));
}

#[test]
fn connected_report_reflects_peer_writes() {
    let config = PeripheralConfig {
        initial_led_state: 0,
        ..PeripheralConfig::default()
    };
    let mut rig = Rig::with(config, MockBle::new());
    rig.bring_up();
    rig.stack(StackEvent::ConnectionComplete);
    assert!(rig.events().contains(&AppEvent::Connected { led_on: false }));

    let led = rig.controller.store().unwrap().handle(buttonled::gatt::Role::LedState);
    rig.stack(StackEvent::data_written(led, &[1]));
    rig.stack(StackEvent::DisconnectionComplete);
    assert!(rig.events().contains(&AppEvent::Disconnected { led_on: true }));
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn init_failure_stays_idle_and_never_advertises() {
    let mut rig = Rig::new();
    rig.stack(StackEvent::InitComplete(Err(BleError::Stack(-1))));

    assert_eq!(rig.controller.state(), ConnectionState::Idle);
    assert_eq!(rig.ble().advertising_starts(), 0);
    assert!(rig.controller.store().is_none());
    assert!(!rig.inputs.is_armed());
    assert!(rig.events().contains(&AppEvent::InitFailed(BleError::Stack(-1))));
}

#[test]
fn service_registration_failure_counts_as_init_failure() {
    let ble = MockBle {
        fail_register: Some(BleError::NoResources),
        ..MockBle::default()
    };
    let mut rig = Rig::with(PeripheralConfig::default(), ble);
    rig.stack(StackEvent::InitComplete(Ok(())));

    assert_eq!(rig.controller.state(), ConnectionState::Idle);
    assert_eq!(rig.ble().advertising_starts(), 0);
    assert!(rig.events().contains(&AppEvent::InitFailed(BleError::NoResources)));
}

#[test]
fn payload_failure_is_reported_and_advertising_not_started() {
    let ble = MockBle {
        fail_payload: Some(BleError::InvalidParam),
        ..MockBle::default()
    };
    let mut rig = Rig::with(PeripheralConfig::default(), ble);
    rig.bring_up();

    assert_eq!(rig.controller.state(), ConnectionState::Idle);
    assert_eq!(rig.ble().advertising_starts(), 0);
    assert!(rig.events().iter().any(|e| matches!(
        e,
        AppEvent::AdvertisingFailed {
            error: BleError::InvalidParam,
            ..
        }
    )));
    assert_eq!(rig.controller.metrics().advertising_failures, 1);
}

#[test]
fn failed_readvertise_is_not_retried() {
    let mut rig = Rig::ready();
    rig.stack(StackEvent::ConnectionComplete);
    rig.controller.ble_mut().fail_start = Some(BleError::Busy);

    rig.stack(StackEvent::DisconnectionComplete);
    assert_eq!(rig.controller.state(), ConnectionState::Connected);
    assert!(rig.events().contains(&AppEvent::Disconnected { led_on: true }));
    assert!(rig.led(Indicator::Status), "status stays in connected mode");
    assert!(!rig.led(Indicator::Activity));

    // Nothing retries on its own: further blinks and edges leave it alone.
    rig.controller.handle(buttonled::events::Task::Blink);
    assert_eq!(rig.ble().advertising_starts(), 1);
    assert_eq!(rig.controller.metrics().advertising_failures, 1);
}

// ── Service registration ──────────────────────────────────────

#[test]
fn advertising_waits_for_the_attribute_table() {
    let mut rig = Rig::new();
    rig.stack(StackEvent::InitComplete(Ok(())));

    assert_eq!(rig.controller.state(), ConnectionState::Idle);
    assert_eq!(rig.ble().calls, vec![BleCall::RegisterService(AUTOMATION_IO_SERVICE_UUID)]);
    assert!(rig.controller.store().is_none());
    assert!(!rig.inputs.is_armed());

    rig.stack(StackEvent::ServiceRegistered(Ok(HANDLES)));
    assert_eq!(rig.controller.state(), ConnectionState::Advertising);
    assert!(rig.inputs.is_armed());
    assert!(rig.events().contains(&AppEvent::ServiceRegistered { handles: HANDLES }));
}

#[test]
fn failed_attribute_table_counts_as_init_failure() {
    let mut rig = Rig::new();
    rig.stack(StackEvent::InitComplete(Ok(())));
    rig.stack(StackEvent::ServiceRegistered(Err(BleError::Stack(0x85))));

    assert_eq!(rig.controller.state(), ConnectionState::Idle);
    assert_eq!(rig.ble().advertising_starts(), 0);
    assert!(rig.controller.store().is_none());
    assert!(!rig.inputs.is_armed());
    assert!(rig.events().contains(&AppEvent::InitFailed(BleError::Stack(0x85))));
}

#[test]
fn unsolicited_table_completion_is_ignored() {
    let mut rig = Rig::new();
    rig.stack(StackEvent::ServiceRegistered(Ok(HANDLES)));
    assert_eq!(rig.controller.state(), ConnectionState::Idle);
    assert!(rig.controller.store().is_none());

    let mut rig = Rig::ready();
    rig.stack(StackEvent::ServiceRegistered(Ok(HANDLES)));
    assert_eq!(rig.ble().advertising_starts(), 1);
}

#[test]
fn init_completion_while_table_pending_is_ignored() {
    let mut rig = Rig::new();
    rig.stack(StackEvent::InitComplete(Ok(())));
    rig.stack(StackEvent::InitComplete(Ok(())));
    assert_eq!(rig.ble().calls.len(), 1, "one registration request");

    rig.stack(StackEvent::ServiceRegistered(Ok(HANDLES)));
    assert_eq!(rig.controller.state(), ConnectionState::Advertising);
}

// ── Out-of-order notifications ────────────────────────────────

#[test]
fn unexpected_events_leave_state_unchanged() {
    let mut rig = Rig::new();
    rig.stack(StackEvent::ConnectionComplete);
    rig.stack(StackEvent::DisconnectionComplete);
    assert_eq!(rig.controller.state(), ConnectionState::Idle);

    rig.bring_up();
    rig.stack(StackEvent::DisconnectionComplete);
    assert_eq!(rig.controller.state(), ConnectionState::Advertising);
    assert_eq!(rig.ble().advertising_starts(), 1);
}

#[test]
fn duplicate_init_completion_is_ignored() {
    let mut rig = Rig::ready();
    rig.stack(StackEvent::InitComplete(Ok(())));

    let registrations = rig
        .ble()
        .calls
        .iter()
        .filter(|c| matches!(c, BleCall::RegisterService(_)))
        .count();
    assert_eq!(registrations, 1);
    assert_eq!(rig.ble().advertising_starts(), 1);
}
