use std::time::{Duration, Instant};

/// Returned by a periodic callback to keep or drop its timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

pub type TickFn<C> = Box<dyn FnMut(&mut C) -> TickFlow>;

/// Periodic timer facility. Callbacks receive the context that owns the
/// scheduled work, so the work itself never holds a reference to the host.
pub trait Scheduler<C> {
    fn register_periodic(&mut self, interval: Duration, callback: TickFn<C>) -> TimerHandle;

    /// Returns false when the handle was not registered.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

struct PeriodicTimer<C> {
    handle: TimerHandle,
    interval: Duration,
    due: Instant,
    callback: TickFn<C>,
}

/// Scheduler polled from a frame loop. Time only moves when `advance` is
/// called, which makes it usable with synthetic instants in tests.
pub struct FrameClock<C> {
    timers: Vec<PeriodicTimer<C>>,
    now: Instant,
    next_id: u64,
}

impl<C> FrameClock<C> {
    pub fn new(origin: Instant) -> Self {
        Self {
            timers: Vec::new(),
            now: origin,
            next_id: 0,
        }
    }

    /// Fires each due timer once. A timer that fell more than one interval
    /// behind is re-armed from `now` instead of replaying missed ticks.
    pub fn advance(&mut self, now: Instant, ctx: &mut C) -> usize {
        if now > self.now {
            self.now = now;
        }
        let mut fired = 0;
        let mut cancelled = Vec::new();
        for timer in &mut self.timers {
            if timer.due > self.now {
                continue;
            }
            fired += 1;
            if (timer.callback)(ctx) == TickFlow::Cancel {
                cancelled.push(timer.handle);
                continue;
            }
            timer.due += timer.interval;
            if timer.due <= self.now {
                timer.due = self.now + timer.interval;
            }
        }
        self.timers.retain(|timer| !cancelled.contains(&timer.handle));
        fired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|timer| timer.due).min()
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }
}

impl<C> Scheduler<C> for FrameClock<C> {
    fn register_periodic(&mut self, interval: Duration, callback: TickFn<C>) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        // Zero intervals would fire on every frame; clamp to one millisecond.
        let interval = interval.max(Duration::from_millis(1));
        self.timers.push(PeriodicTimer {
            handle,
            interval,
            due: self.now + interval,
            callback,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.handle != handle);
        self.timers.len() != before
    }
}
