//! ButtonLED Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single event-driven worker.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   BleAdapter     SystemClock   │
//! │  (OutputPort)      (EventSink)    (Stack/GATT/   (TimePort)    │
//! │                                    GAP ports)                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          PeripheralController (pure logic)             │    │
//! │  │  Connection FSM · CharacteristicStore                  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Button ISRs ──▶ EventQueue ◀── BLE callbacks                  │
//! │  Dispatcher (periodic blink + worker loop)                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use log::info;

use buttonled::adapters::ble::BleAdapter;
use buttonled::adapters::hardware::HardwareAdapter;
use buttonled::adapters::log_sink::LogEventSink;
use buttonled::adapters::time::SystemClock;
use buttonled::app::controller::PeripheralController;
use buttonled::app::ports::TimePort;
use buttonled::config::PeripheralConfig;
use buttonled::drivers::button::INPUTS;
use buttonled::drivers::hw_init;
use buttonled::events::EVENT_QUEUE;
use buttonled::pins;
use buttonled::scheduler::Dispatcher;

type LedPin = PinDriver<'static, AnyOutputPin, Output>;

fn led_pin(gpio: i32) -> Result<LedPin> {
    // SAFETY: each LED GPIO is claimed exactly once, here.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    Ok(PinDriver::output(pin)?)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  ButtonLED v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = PeripheralConfig::default();

    // ── 2. Indicator LEDs ─────────────────────────────────────
    let hw = HardwareAdapter::new(
        led_pin(pins::STATUS_LED_GPIO)?,
        led_pin(pins::ACTIVITY_LED_GPIO)?,
        led_pin(pins::ACTUATED_LED_GPIO)?,
        config.initial_led_on(),
    );

    // ── 3. Button ISRs (inert until the service is registered) ─
    hw_init::init_button_inputs()?;

    // ── 4. Controller ─────────────────────────────────────────
    let ble = BleAdapter::new(&EVENT_QUEUE, config.device_name.clone());
    let mut controller = PeripheralController::new(
        config,
        &EVENT_QUEUE,
        &INPUTS,
        ble,
        hw,
        LogEventSink::new(),
    );

    let clock = SystemClock::new();
    let mut dispatcher = Dispatcher::new(&EVENT_QUEUE);
    controller.start(&mut dispatcher, clock.now_ms())?;

    info!("System ready. Entering event loop.");

    // ── 5. Worker loop ────────────────────────────────────────
    dispatcher.run_forever(&clock, |task| controller.handle(task))
}
