//! Interrupt-safe task queue.
//!
//! Tasks are produced by:
//! - GPIO ISRs (button edges, via the edge detectors)
//! - BLE stack callbacks (init, connection, writes, subscriptions)
//! - Periodic timers (heartbeat blink, diagnostics)
//!
//! Tasks are consumed by the single worker loop, one at a time, strictly
//! in the order they were posted.  No task preempts another.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ GPIO ISR    │────▶│              │     │              │
//! │ BLE stack   │────▶│  EventQueue  │────▶│    Worker    │
//! │ Timers      │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Posting never blocks and never allocates.  When the queue is full the
//! task is dropped and a counter is bumped; the worker reports the count
//! later, interrupt context never does.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::mpmc::MpMcQueue;

use crate::drivers::button::{ButtonId, Level};
use crate::error::BleError;
use crate::gatt::{AttrHandle, CHARACTERISTIC_COUNT};

/// Maximum number of pending tasks.  Must be a power of two.
pub const QUEUE_CAPACITY: usize = 16;

/// Largest inbound attribute write carried through the queue
/// (default ATT MTU of 23 minus the 3-byte header).
pub const MAX_WRITE_LEN: usize = 20;

// ── Task types ────────────────────────────────────────────────

/// A deferred unit of work, executed exactly once on the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// A button changed logical level.
    Input { button: ButtonId, level: Level },
    /// Heartbeat blink timer fired.
    Blink,
    /// Diagnostics report timer fired.
    Diagnostics,
    /// The BLE stack reported something.
    Stack(StackEvent),
}

/// Inbound notifications from the BLE stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEvent {
    /// Asynchronous stack initialisation finished.
    InitComplete(Result<(), BleError>),
    /// The GATT server finished building the service's attribute table.
    /// Carries the value handles in registration order.
    ServiceRegistered(Result<[AttrHandle; CHARACTERISTIC_COUNT], BleError>),
    /// A central connected.
    ConnectionComplete,
    /// The central disconnected.
    DisconnectionComplete,
    /// A central wrote an attribute.  `len` is the length on the air;
    /// `data` holds at most the first [`MAX_WRITE_LEN`] bytes.
    DataWritten {
        handle: AttrHandle,
        data: heapless::Vec<u8, MAX_WRITE_LEN>,
        len: usize,
    },
    /// A central subscribed to notifications on `handle`.
    UpdatesEnabled(AttrHandle),
    /// A central unsubscribed from `handle`.
    UpdatesDisabled(AttrHandle),
    /// An indication on `handle` was confirmed.
    ConfirmationReceived(AttrHandle),
}

impl StackEvent {
    /// Build a [`StackEvent::DataWritten`], truncating oversized payloads.
    ///
    /// Anything longer than one byte is rejected by the store anyway, so the
    /// truncated tail never matters; the original length is kept for the
    /// report.
    pub fn data_written(handle: AttrHandle, bytes: &[u8]) -> Self {
        let kept = bytes.len().min(MAX_WRITE_LEN);
        let mut data = heapless::Vec::new();
        // Cannot fail: kept <= capacity.
        let _ = data.extend_from_slice(&bytes[..kept]);
        Self::DataWritten {
            handle,
            data,
            len: bytes.len(),
        }
    }

    /// Route the event to the matching handler method.
    pub fn dispatch<H: crate::app::ports::StackEventHandler + ?Sized>(self, handler: &mut H) {
        match self {
            Self::InitComplete(status) => handler.on_init_complete(status),
            Self::ServiceRegistered(result) => handler.on_service_registered(result),
            Self::ConnectionComplete => handler.on_connection_complete(),
            Self::DisconnectionComplete => handler.on_disconnection_complete(),
            Self::DataWritten { handle, data, len } => handler.on_data_written(handle, &data, len),
            Self::UpdatesEnabled(h) => handler.on_updates_enabled(h),
            Self::UpdatesDisabled(h) => handler.on_updates_disabled(h),
            Self::ConfirmationReceived(h) => handler.on_confirmation_received(h),
        }
    }
}

// ── Bounded MPSC queue ────────────────────────────────────────
//
// Any number of producers (ISRs, BLE task, timers), one consumer (the
// worker).  Lock-free: enqueue is a CAS on the ring's write index, so it
// never takes a mutex and is legal from interrupt context.

/// Fixed-capacity FIFO with drop-on-overflow accounting.
pub struct EventQueue {
    ring: MpMcQueue<Task, QUEUE_CAPACITY>,
    posted: AtomicU32,
    popped: AtomicU32,
    dropped: AtomicU32,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            ring: MpMcQueue::new(),
            posted: AtomicU32::new(0),
            popped: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue a task.  Safe from ISR context.
    ///
    /// Returns `false` (and counts the drop) if the queue is full.
    pub fn post(&self, task: Task) -> bool {
        match self.ring.enqueue(task) {
            Ok(()) => {
                self.posted.fetch_add(1, Ordering::Release);
                true
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Dequeue the oldest task, if any.  Worker only.
    pub fn try_pop(&self) -> Option<Task> {
        let task = self.ring.dequeue()?;
        self.popped.fetch_add(1, Ordering::Release);
        Some(task)
    }

    /// Number of tasks currently waiting.  Approximate while a producer
    /// is mid-post.
    pub fn len(&self) -> usize {
        let posted = self.posted.load(Ordering::Acquire);
        let popped = self.popped.load(Ordering::Acquire);
        (posted.wrapping_sub(popped) as i32).clamp(0, QUEUE_CAPACITY as i32) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tasks accepted since boot.
    pub fn posted(&self) -> u32 {
        self.posted.load(Ordering::Relaxed)
    }

    /// Tasks rejected because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// The device-wide queue shared by ISRs, BLE callbacks and the worker.
pub static EVENT_QUEUE: EventQueue = EventQueue::new();
