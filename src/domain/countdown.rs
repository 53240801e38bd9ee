/// Countdown for the emergency-stop phase.
///
/// This is only the counter. The one-second cadence comes from the session's
/// scheduler, which owns the single tick task and cancels it before starting
/// another, so at most one tick is ever in flight.

/// Display color once the count drops to the low-water mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertColor {
    Red,
    Yellow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Not running; the tick was stale.
    Idle,
    Running { remaining: u32, alert: Option<AlertColor> },
    /// Reached zero. The counter has stopped itself.
    Expired,
}

#[derive(Clone, Debug)]
pub struct Countdown {
    start_seconds: u32,
    remaining: u32,
    low_water: u32,
    running: bool,
}

impl Countdown {
    pub fn new(start_seconds: u32, low_water: u32) -> Self {
        Countdown {
            start_seconds,
            remaining: start_seconds,
            low_water,
            running: false,
        }
    }

    /// Reset to `seconds` and run. Any earlier run is simply replaced.
    pub fn start(&mut self, seconds: u32) {
        self.start_seconds = seconds.max(1);
        self.remaining = self.start_seconds;
        self.running = true;
    }

    /// Start again from the last start value (the expiry loop).
    pub fn restart(&mut self) {
        self.start(self.start_seconds);
    }

    /// One second elapsed.
    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return Tick::Expired;
        }
        Tick::Running {
            remaining: self.remaining,
            alert: self.alert(),
        }
    }

    /// Halt and report what was left. The caller turns this into a bonus.
    pub fn stop(&mut self) -> u32 {
        self.running = false;
        self.remaining
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn start_seconds(&self) -> u32 {
        self.start_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Alternates by parity below the low-water mark.
    pub fn alert(&self) -> Option<AlertColor> {
        if self.remaining > self.low_water {
            None
        } else if self.remaining % 2 == 0 {
            Some(AlertColor::Red)
        } else {
            Some(AlertColor::Yellow)
        }
    }
}
