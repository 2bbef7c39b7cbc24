//! Pipeline scheduling cursor
//!
//! The cursor tracks the cycle currently being emitted and the combinational
//! delay accumulated since the last register boundary. Every combinational
//! step goes through [`PipelineCursor::consume_delay`], which inserts a
//! boundary when the step would overflow the clock period.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Arrival time of a signal: the cycle it becomes valid in and the delay
/// since the last register at that point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Timing {
    pub cycle: u32,
    pub critical_path: f64,
}

impl Timing {
    pub fn new(cycle: u32, critical_path: f64) -> Self {
        Self {
            cycle,
            critical_path,
        }
    }

    /// The later of two arrival times
    pub fn latest(self, other: Timing) -> Timing {
        match self.cycle.cmp(&other.cycle) {
            std::cmp::Ordering::Greater => self,
            std::cmp::Ordering::Less => other,
            std::cmp::Ordering::Equal => Timing::new(
                self.cycle,
                self.critical_path.max(other.critical_path),
            ),
        }
    }
}

/// Build-time scheduling state of one component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineCursor {
    cycle: u32,
    critical_path: f64,
    period: f64,
}

impl PipelineCursor {
    /// Cursor at cycle 0 with an empty critical path
    ///
    /// An infinite `period` yields a purely combinational schedule.
    pub fn new(period: f64) -> Self {
        Self {
            cycle: 0,
            critical_path: 0.0,
            period,
        }
    }

    /// Cursor whose inputs arrive `delay` ns into cycle 0
    pub fn with_input_delay(period: f64, delay: f64) -> Self {
        Self {
            cycle: 0,
            critical_path: delay.max(0.0),
            period,
        }
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn critical_path(&self) -> f64 {
        self.critical_path
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Remaining budget before a register is needed
    pub fn slack(&self) -> f64 {
        self.period - self.critical_path
    }

    /// Insert a register boundary
    pub fn advance_cycle(&mut self) {
        self.cycle += 1;
        self.critical_path = 0.0;
    }

    /// Account for a combinational step of `delay` ns
    ///
    /// Returns true when a register boundary was inserted first.
    pub fn consume_delay(&mut self, delay: f64) -> bool {
        if self.critical_path + delay > self.period {
            self.advance_cycle();
            self.critical_path = delay;
            trace!(cycle = self.cycle, delay, "register boundary inserted");
            true
        } else {
            self.critical_path += delay;
            false
        }
    }

    /// Join with another arrival time
    pub fn sync_to(&mut self, other: Timing) {
        let joined = self.snapshot().latest(other);
        self.cycle = joined.cycle;
        self.critical_path = joined.critical_path;
    }

    /// Jump to an arrival time, earlier or later
    pub fn reset_to(&mut self, timing: Timing) {
        self.cycle = timing.cycle;
        self.critical_path = timing.critical_path;
    }

    /// Override the critical path within the current cycle
    pub fn set_critical_path(&mut self, delay: f64) {
        self.critical_path = delay;
    }

    pub fn snapshot(&self) -> Timing {
        Timing::new(self.cycle, self.critical_path)
    }
}
