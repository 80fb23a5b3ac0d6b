//! ISR-side edge detectors for the two buttons.
//!
//! ## Hardware
//!
//! | Button | Wiring                  | Press edge | [`Polarity`]  |
//! |--------|-------------------------|------------|---------------|
//! | A      | switch to GND, pull-up  | falling    | `ActiveLow`   |
//! | B      | switch to 3V3, pull-down| rising     | `ActiveHigh`  |
//!
//! The GPIO ISR calls [`EdgeDetector::on_rising_edge`] or
//! [`EdgeDetector::on_falling_edge`].  The detector translates the
//! electrical edge into a logical [`Level`] through its polarity (the only
//! place polarity is consulted), stores the level with one atomic write and
//! posts a [`Task::Input`] to the queue.  Nothing else happens in interrupt
//! context: no logging, no allocation, no GATT calls.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::events::{EventQueue, Task};
use crate::pins;

/// Which physical button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    A,
    B,
}

impl ButtonId {
    /// 1-based number used in log output.
    pub const fn number(self) -> u8 {
        match self {
            Self::A => 1,
            Self::B => 2,
        }
    }
}

/// Logical level of a button after polarity correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Pressed,
    Released,
}

impl Level {
    pub const fn is_pressed(self) -> bool {
        matches!(self, Self::Pressed)
    }
}

/// Electrical transition seen on the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// How a press shows up electrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pressed pulls the line low: falling edge = press.
    ActiveLow,
    /// Pressed drives the line high: rising edge = press.
    ActiveHigh,
}

impl Polarity {
    /// Translate an electrical edge into a logical level.
    pub const fn level_for(self, edge: Edge) -> Level {
        match (self, edge) {
            (Self::ActiveLow, Edge::Falling) | (Self::ActiveHigh, Edge::Rising) => Level::Pressed,
            (Self::ActiveLow, Edge::Rising) | (Self::ActiveHigh, Edge::Falling) => Level::Released,
        }
    }
}

// ── Edge detector ─────────────────────────────────────────────

/// One physical input.  Shared between the ISR and the worker, so all
/// mutable state is atomic.
pub struct EdgeDetector {
    id: ButtonId,
    polarity: Polarity,
    pressed: AtomicBool,
    armed: AtomicBool,
}

impl EdgeDetector {
    pub const fn new(id: ButtonId, polarity: Polarity) -> Self {
        Self {
            id,
            polarity,
            pressed: AtomicBool::new(false),
            armed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Start forwarding edges to the queue.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    /// Stop forwarding edges.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Last logical level recorded by the ISR.
    pub fn level(&self) -> Level {
        if self.pressed.load(Ordering::Acquire) {
            Level::Pressed
        } else {
            Level::Released
        }
    }

    /// ISR entry point: the pin went high.
    pub fn on_rising_edge(&self, queue: &EventQueue) {
        self.on_edge(Edge::Rising, queue);
    }

    /// ISR entry point: the pin went low.
    pub fn on_falling_edge(&self, queue: &EventQueue) {
        self.on_edge(Edge::Falling, queue);
    }

    fn on_edge(&self, edge: Edge, queue: &EventQueue) {
        if !self.is_armed() {
            return;
        }
        let level = self.polarity.level_for(edge);
        self.pressed.store(level.is_pressed(), Ordering::Release);
        // A full queue counts the drop itself.
        let _ = queue.post(Task::Input {
            button: self.id,
            level,
        });
    }
}

// ── Input pair ────────────────────────────────────────────────

/// Both buttons, armed together once the stack is ready.
pub struct Inputs {
    pub a: EdgeDetector,
    pub b: EdgeDetector,
}

impl Inputs {
    pub const fn new(a: Polarity, b: Polarity) -> Self {
        Self {
            a: EdgeDetector::new(ButtonId::A, a),
            b: EdgeDetector::new(ButtonId::B, b),
        }
    }

    pub fn get(&self, id: ButtonId) -> &EdgeDetector {
        match id {
            ButtonId::A => &self.a,
            ButtonId::B => &self.b,
        }
    }

    pub fn arm(&self) {
        self.a.arm();
        self.b.arm();
    }

    pub fn disarm(&self) {
        self.a.disarm();
        self.b.disarm();
    }

    pub fn is_armed(&self) -> bool {
        self.a.is_armed() && self.b.is_armed()
    }
}

/// The board's buttons, wired per [`crate::pins`].
pub static INPUTS: Inputs = Inputs::new(pins::BUTTON_A_POLARITY, pins::BUTTON_B_POLARITY);
