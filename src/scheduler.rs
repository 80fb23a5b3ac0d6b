//! Cooperative dispatcher: periodic timers plus the worker loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Task Sources                             │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────────────────┐     │
//! │  │ GPIO ISR  │  │ BLE stack │  │ Periodic timers       │     │
//! │  │ (edges)   │  │ callbacks │  │ (blink, diagnostics)  │     │
//! │  └─────┬─────┘  └─────┬─────┘  └───────────┬───────────┘     │
//! │        │              │                    │ due? post       │
//! │        ▼              ▼                    ▼                 │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                    EventQueue (FIFO)                   │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │              handler(task), one at a time                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Timers never run their task directly: when due they post it into the
//! same queue as everything else, so timer work is ordered with ISR and
//! stack work by arrival and is subject to the same overflow accounting.

use log::{debug, info};

use crate::app::ports::TimePort;
use crate::error::{Error, Result};
use crate::events::{EventQueue, QUEUE_CAPACITY, Task};

/// Maximum number of concurrent periodic timers (stack-allocated).
const MAX_PERIODIC: usize = 4;

/// Upper bound on one idle wait, so a missed wake-up costs at most this.
const MAX_IDLE_MS: u32 = 50;

/// Identifies a registered periodic timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(usize);

/// Internal bookkeeping for a live timer.
#[derive(Debug, Clone)]
struct PeriodicEntry {
    task: Task,
    interval_ms: u32,
    next_due_ms: u64,
}

/// Timer table and queue consumer.
pub struct Dispatcher<'q> {
    queue: &'q EventQueue,
    timers: [Option<PeriodicEntry>; MAX_PERIODIC],
}

impl<'q> Dispatcher<'q> {
    pub fn new(queue: &'q EventQueue) -> Self {
        Self {
            queue,
            timers: [None, None, None, None],
        }
    }

    pub fn queue(&self) -> &'q EventQueue {
        self.queue
    }

    /// Post `task` now and then every `interval_ms`, until cancelled.
    pub fn post_periodic(&mut self, task: Task, interval_ms: u32, now_ms: u64) -> Result<TimerId> {
        if interval_ms == 0 {
            return Err(Error::Scheduler("zero interval"));
        }
        let Some(slot) = self.timers.iter().position(Option::is_none) else {
            return Err(Error::Scheduler("no free timer slot"));
        };
        info!("Scheduler: {:?} every {} ms (slot {})", task, interval_ms, slot);
        self.timers[slot] = Some(PeriodicEntry {
            task,
            interval_ms,
            next_due_ms: now_ms,
        });
        Ok(TimerId(slot))
    }

    /// Stop a periodic timer.  Returns `false` if it was not running.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.timers.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                info!("Scheduler: cancelled slot {}", id.0);
                true
            }
            _ => false,
        }
    }

    /// Earliest time any timer is due.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.iter().flatten().map(|t| t.next_due_ms).min()
    }

    /// Post every due timer task.  A timer that fell several periods behind
    /// fires once and re-arms from `now_ms`.
    fn fire_due(&mut self, now_ms: u64) {
        for entry in self.timers.iter_mut().flatten() {
            if now_ms < entry.next_due_ms {
                continue;
            }
            if !self.queue.post(entry.task.clone()) {
                debug!("Scheduler: queue full, {:?} dropped", entry.task);
            }
            let next = entry.next_due_ms + u64::from(entry.interval_ms);
            entry.next_due_ms = if next <= now_ms {
                now_ms + u64::from(entry.interval_ms)
            } else {
                next
            };
        }
    }

    /// One worker pass: fire due timers, then run queued tasks in FIFO
    /// order, each to completion.  Returns the number of tasks run.
    ///
    /// At most one queue's worth of tasks runs per pass so that a storm of
    /// edges cannot starve the timers.
    pub fn dispatch_once<F: FnMut(Task)>(&mut self, now_ms: u64, mut handler: F) -> usize {
        self.fire_due(now_ms);
        let mut handled = 0;
        while handled < QUEUE_CAPACITY {
            let Some(task) = self.queue.try_pop() else {
                break;
            };
            handler(task);
            handled += 1;
        }
        handled
    }

    /// The worker loop.  Never returns.
    pub fn run_forever<C: TimePort, F: FnMut(Task)>(&mut self, clock: &C, mut handler: F) -> ! {
        info!("Scheduler: worker loop started");
        loop {
            let now = clock.now_ms();
            self.dispatch_once(now, &mut handler);

            if self.queue.is_empty() {
                let wait = self.next_deadline().map_or(MAX_IDLE_MS, |due| {
                    due.saturating_sub(clock.now_ms())
                        .min(u64::from(MAX_IDLE_MS)) as u32
                });
                if wait > 0 {
                    clock.idle(wait);
                }
            }
        }
    }
}
