//! Fuzz target: peer writes through the stack event path.
//!
//! The first byte picks the target handle, the rest is the written value.
//! Asserts that the store never panics, rejects every write that is not
//! exactly one byte, and that the actuated LED always matches the stored
//! LED State value afterwards.
//!
//! cargo fuzz run fuzz_inbound_write

#![no_main]

use buttonled::app::events::AppEvent;
use buttonled::app::ports::{EventSink, Indicator, OutputPort};
use buttonled::config::PeripheralConfig;
use buttonled::gatt::{AttrHandle, CHARACTERISTIC_COUNT, CharacteristicStore, Role, ServiceDefinition};
use libfuzzer_sys::fuzz_target;

const HANDLES: [AttrHandle; CHARACTERISTIC_COUNT] = [AttrHandle(3), AttrHandle(7), AttrHandle(11)];

struct Leds([bool; 3]);

impl OutputPort for Leds {
    fn set(&mut self, indicator: Indicator, on: bool) {
        self.0[indicator as usize] = on;
    }

    fn is_on(&self, indicator: Indicator) -> bool {
        self.0[indicator as usize]
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, value)) = data.split_first() else {
        return;
    };
    let config = PeripheralConfig::default();
    let def = ServiceDefinition::automation_io(&config);
    let mut store = CharacteristicStore::new(&def, HANDLES);
    let mut leds = Leds([true, true, config.initial_led_on()]);

    let handle = AttrHandle(u16::from(selector % 16));
    let result = store.on_external_write(handle, value, &mut leds, &mut Discard);

    if value.len() != 1 {
        assert!(result.is_err(), "multi-byte write accepted");
    }
    let led = store.value(store.handle(Role::LedState)).expect("LED State");
    assert_eq!(leds.is_on(Indicator::Actuated), led != 0);
});
