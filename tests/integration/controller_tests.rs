//! Integration tests for the ISR → queue → controller → GATT pipeline.
//!
//! Edges are injected through the same detectors the GPIO ISRs use, the
//! queue is drained like one worker pass, and the mock stack records what
//! reached the GATT server.

use buttonled::app::events::AppEvent;
use buttonled::app::ports::Indicator;
use buttonled::config::PeripheralConfig;
use buttonled::drivers::button::ButtonId;
use buttonled::events::{QUEUE_CAPACITY, StackEvent, Task};
use buttonled::fsm::ConnectionState;
use buttonled::gatt::{AttrHandle, Role};
use buttonled::scheduler::Dispatcher;

use crate::mock_ble::{BUTTON_COLOUR, BUTTON_STATE, BleCall, LED_STATE, MockBle, Rig};

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_registers_blink_and_initializes_stack() {
    let mut rig = Rig::new();
    let mut dispatcher = Dispatcher::new(rig.queue);

    rig.controller.start(&mut dispatcher, 0).unwrap();

    assert!(rig.controller.blink_timer().is_some());
    assert_eq!(rig.ble().calls, vec![BleCall::Initialize]);
    assert_eq!(rig.controller.state(), ConnectionState::Idle);
    assert_eq!(rig.events().first(), Some(&AppEvent::Started));
}

#[test]
fn inputs_stay_inert_until_stack_is_ready() {
    let mut rig = Rig::new();
    rig.inputs.a.on_falling_edge(rig.queue);
    assert_eq!(rig.drain(), 0, "edges before init must not be queued");

    rig.bring_up();
    assert!(rig.inputs.is_armed());

    rig.inputs.a.on_falling_edge(rig.queue);
    assert_eq!(rig.drain(), 1);
}

#[test]
fn init_registers_service_before_advertising() {
    let rig = Rig::ready();
    let calls = &rig.ble().calls;
    let register = calls
        .iter()
        .position(|c| *c == BleCall::RegisterService(0x1815))
        .expect("service registered");
    let start = calls
        .iter()
        .position(|c| *c == BleCall::StartAdvertising)
        .expect("advertising started");
    assert!(register < start);

    let store = rig.controller.store().expect("store built");
    assert_eq!(store.handle(Role::LedState), LED_STATE);
    assert!(rig.events().iter().any(|e| matches!(
        e,
        AppEvent::StackReady { address: Some(_) }
    )));
}

// ── Buttons ───────────────────────────────────────────────────

#[test]
fn button_a_press_and_release_update_button_state() {
    let mut rig = Rig::ready();

    // Active low: falling = pressed, rising = released.
    rig.inputs.a.on_falling_edge(rig.queue);
    rig.inputs.a.on_rising_edge(rig.queue);
    rig.drain();

    assert_eq!(
        rig.ble().writes(),
        vec![(BUTTON_STATE, vec![1]), (BUTTON_STATE, vec![0])]
    );
    assert!(rig.events().contains(&AppEvent::ButtonClicked(ButtonId::A)));
}

#[test]
fn button_b_uses_inverted_polarity() {
    let mut rig = Rig::ready();

    // Active high: rising = pressed.
    rig.inputs.b.on_rising_edge(rig.queue);
    rig.drain();

    assert_eq!(rig.ble().writes(), vec![(BUTTON_COLOUR, vec![1])]);
    let store = rig.controller.store().unwrap();
    assert_eq!(store.value(BUTTON_COLOUR), Some(1));
    assert_eq!(store.value(BUTTON_STATE), Some(0));
}

#[test]
fn click_is_reported_on_release_only() {
    let mut rig = Rig::ready();
    rig.inputs.b.on_rising_edge(rig.queue);
    rig.drain();
    assert!(!rig.events().contains(&AppEvent::ButtonClicked(ButtonId::B)));

    rig.inputs.b.on_falling_edge(rig.queue);
    rig.drain();
    assert!(rig.events().contains(&AppEvent::ButtonClicked(ButtonId::B)));
}

#[test]
fn repeated_level_still_pushes_and_reports_unchanged() {
    let mut rig = Rig::ready();
    rig.inputs.a.on_falling_edge(rig.queue);
    rig.inputs.a.on_falling_edge(rig.queue);
    rig.drain();

    assert_eq!(rig.ble().writes().len(), 2);
    let notified: Vec<bool> = rig
        .events()
        .iter()
        .filter_map(|e| match e {
            AppEvent::ValueNotified { changed, .. } => Some(*changed),
            _ => None,
        })
        .collect();
    assert_eq!(notified, vec![true, false]);
}

#[test]
fn failed_push_does_not_stop_the_worker() {
    let mut rig = Rig::ready();
    rig.controller.ble_mut().fail_writes = Some(buttonled::BleError::Busy);
    rig.inputs.a.on_falling_edge(rig.queue);
    rig.drain();

    rig.controller.ble_mut().fail_writes = None;
    rig.inputs.a.on_rising_edge(rig.queue);
    rig.drain();

    assert_eq!(rig.ble().writes(), vec![(BUTTON_STATE, vec![0])]);
    assert_eq!(rig.controller.store().unwrap().value(BUTTON_STATE), Some(0));
}

#[test]
fn value_rejected_by_the_server_is_not_stored() {
    let mut rig = Rig::ready();
    rig.controller.ble_mut().fail_writes = Some(buttonled::BleError::Busy);
    rig.inputs.a.on_falling_edge(rig.queue);
    rig.drain();
    assert_eq!(rig.controller.store().unwrap().value(BUTTON_STATE), Some(0));

    rig.controller.ble_mut().fail_writes = None;
    rig.inputs.a.on_falling_edge(rig.queue);
    rig.drain();
    assert!(rig.events().iter().any(|e| matches!(
        e,
        AppEvent::ValueNotified { changed: true, .. }
    )));
}

// ── LED writes ────────────────────────────────────────────────

#[test]
fn two_byte_write_is_discarded() {
    let mut rig = Rig::ready();
    rig.stack(StackEvent::data_written(LED_STATE, &[0, 0]));

    assert!(rig.led(Indicator::Actuated), "LED keeps its initial ON state");
    assert_eq!(rig.outputs().sets_of(Indicator::Actuated), 0);
    assert!(rig.events().contains(&AppEvent::MalformedWrite {
        handle: LED_STATE,
        len: 2
    }));
    assert_eq!(rig.controller.metrics().malformed_writes, 1);
}

#[test]
fn truncated_write_reports_the_length_the_peer_sent() {
    let mut rig = Rig::ready();
    rig.stack(StackEvent::data_written(LED_STATE, &[1; 25]));

    assert!(rig.events().contains(&AppEvent::MalformedWrite {
        handle: LED_STATE,
        len: 25
    }));
    assert_eq!(rig.outputs().sets_of(Indicator::Actuated), 0);
    assert_eq!(rig.controller.metrics().malformed_writes, 1);
}

#[test]
fn write_equal_to_current_state_is_reported_still() {
    let mut rig = Rig::ready();
    rig.stack(StackEvent::data_written(LED_STATE, &[1]));

    assert!(rig.led(Indicator::Actuated));
    assert_eq!(rig.outputs().sets_of(Indicator::Actuated), 0, "no toggle");
    assert!(rig.events().contains(&AppEvent::LedWritten {
        on: true,
        changed: false
    }));
}

#[test]
fn write_of_new_state_switches_led() {
    let mut rig = Rig::ready();
    rig.stack(StackEvent::data_written(LED_STATE, &[0]));
    assert!(!rig.led(Indicator::Actuated));
    assert!(rig.events().contains(&AppEvent::LedWritten {
        on: false,
        changed: true
    }));

    rig.stack(StackEvent::data_written(LED_STATE, &[2]));
    assert!(rig.led(Indicator::Actuated));
}

#[test]
fn writes_to_other_handles_leave_led_alone() {
    let mut rig = Rig::ready();
    rig.stack(StackEvent::data_written(BUTTON_STATE, &[0]));
    rig.stack(StackEvent::data_written(AttrHandle(200), &[0]));

    assert!(rig.led(Indicator::Actuated));
    assert_eq!(rig.outputs().sets_of(Indicator::Actuated), 0);
}

#[test]
fn write_before_registration_is_ignored() {
    let mut rig = Rig::new();
    rig.stack(StackEvent::data_written(LED_STATE, &[0]));
    assert!(rig.led(Indicator::Actuated));
}

// ── Blink ─────────────────────────────────────────────────────

#[test]
fn blink_toggles_status_while_advertising() {
    let mut rig = Rig::ready();
    let before = rig.led(Indicator::Status);

    rig.controller.handle(Task::Blink);
    assert_eq!(rig.led(Indicator::Status), !before);
    rig.controller.handle(Task::Blink);
    assert_eq!(rig.led(Indicator::Status), before);
}

#[test]
fn blink_is_suppressed_while_connected() {
    let mut rig = Rig::ready();
    rig.stack(StackEvent::ConnectionComplete);
    let sets = rig.outputs().sets_of(Indicator::Status);

    for _ in 0..3 {
        rig.controller.handle(Task::Blink);
    }
    assert!(rig.led(Indicator::Status));
    assert_eq!(rig.outputs().sets_of(Indicator::Status), sets);
}

#[test]
fn dispatcher_delivers_blink_every_interval() {
    let mut rig = Rig::ready();
    let mut dispatcher = Dispatcher::new(rig.queue);
    rig.controller.start(&mut dispatcher, 0).unwrap();

    let start = rig.led(Indicator::Status);
    let mut toggles = 0;
    for now in (0..=2_000).step_by(100) {
        dispatcher.dispatch_once(now, |task| {
            if task == Task::Blink {
                toggles += 1;
            }
            rig.controller.handle(task);
        });
    }
    // Fires at 0, 500, 1000, 1500, 2000.
    assert_eq!(toggles, 5);
    assert_eq!(rig.led(Indicator::Status), !start);
}

// ── Subscriptions and diagnostics ─────────────────────────────

#[test]
fn subscription_changes_are_reported() {
    let mut rig = Rig::ready();
    rig.stack(StackEvent::UpdatesEnabled(BUTTON_STATE));
    rig.stack(StackEvent::ConfirmationReceived(BUTTON_STATE));
    rig.stack(StackEvent::UpdatesDisabled(BUTTON_STATE));

    assert!(rig.events().contains(&AppEvent::UpdatesEnabled(BUTTON_STATE)));
    assert!(rig.events().contains(&AppEvent::ConfirmationReceived(BUTTON_STATE)));
    assert!(rig.events().contains(&AppEvent::UpdatesDisabled(BUTTON_STATE)));
}

#[test]
fn diagnostics_report_dropped_tasks() {
    let mut rig = Rig::ready();
    for _ in 0..QUEUE_CAPACITY + 3 {
        rig.inputs.a.on_falling_edge(rig.queue);
    }
    rig.drain();
    rig.controller.handle(Task::Diagnostics);

    let metrics = rig.controller.metrics();
    assert_eq!(metrics.tasks_dropped, 3);
    assert_eq!(metrics.notifications, QUEUE_CAPACITY as u32);
    assert!(metrics.is_degraded());
    assert!(
        rig.events()
            .iter()
            .any(|e| matches!(e, AppEvent::Diagnostics(m) if m.tasks_dropped == 3))
    );
}

#[test]
fn diagnostics_timer_is_optional() {
    let config = PeripheralConfig {
        diagnostics_interval_ms: 1_000,
        ..PeripheralConfig::default()
    };
    let mut rig = Rig::with(config, MockBle::new());
    let mut dispatcher = Dispatcher::new(rig.queue);
    rig.controller.start(&mut dispatcher, 0).unwrap();

    let mut seen = Vec::new();
    dispatcher.dispatch_once(0, |task| seen.push(task));
    assert!(seen.contains(&Task::Blink));
    assert!(seen.contains(&Task::Diagnostics));
}
