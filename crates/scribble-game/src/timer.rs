//! One-second countdown windows for the round engine.
//!
//! A [`Countdown`] is the only place the round engine suspends. It ticks
//! once per second and reports elapsed/remaining whole seconds, which is
//! all the engine needs for notices and hint checkpoints. Cancellation is
//! not built in: the caller races [`Countdown::tick`] against its own
//! cancel branches in a `tokio::select!`.
//!
//! ```ignore
//! let mut countdown = Countdown::new(60);
//! loop {
//!     tokio::select! {
//!         biased;
//!         _ = shutdown.wait_for(|stop| *stop) => break,
//!         Some(signal) = signals.recv() => { /* skip or guess */ }
//!         tick = countdown.tick() => {
//!             if tick.is_last() { break; }
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::trace;

/// Resolution of every countdown.
pub const TICK: Duration = Duration::from_secs(1);

/// One observed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Whole seconds since the window opened, capped at the total.
    pub elapsed: u32,
    /// Whole seconds left, 0 on the final tick.
    pub remaining: u32,
}

impl CountdownTick {
    pub fn is_last(&self) -> bool {
        self.remaining == 0
    }
}

/// A countdown of `total` seconds at one-second resolution.
pub struct Countdown {
    interval: Interval,
    started: Instant,
    total: u32,
    elapsed: u32,
}

impl Countdown {
    /// Opens the window now. The first tick fires one second later.
    pub fn new(total_secs: u32) -> Self {
        let started = Instant::now();
        let mut interval = time::interval_at(started + TICK, TICK);
        // A stalled loop resumes from now instead of bursting through
        // the missed seconds.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            started,
            total: total_secs,
            elapsed: 0,
        }
    }

    /// Waits for the next whole second.
    ///
    /// Elapsed time is measured from the window's opening, not by counting
    /// ticks, so a late wake-up still ends the window on time. After the
    /// final tick this future pends forever.
    pub async fn tick(&mut self) -> CountdownTick {
        if self.is_finished() {
            std::future::pending::<()>().await;
        }
        self.interval.tick().await;

        let secs = self.started.elapsed().as_secs();
        self.elapsed = u32::try_from(secs).unwrap_or(u32::MAX).min(self.total);
        let tick = CountdownTick {
            elapsed: self.elapsed,
            remaining: self.total - self.elapsed,
        };
        trace!(elapsed = tick.elapsed, remaining = tick.remaining, "countdown tick");
        tick
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn remaining(&self) -> u32 {
        self.total - self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.total
    }
}
