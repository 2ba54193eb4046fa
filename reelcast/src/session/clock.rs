//! Session clock with pause accounting and seek.

/// Where the clock reads "now" from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockMode {
    /// Mix graph context time; only advances while audio is pulled.
    Audio,
    /// Driver-supplied wall time.
    Wall,
}

/// Elapsed-time bookkeeping. All inputs are seconds in the clock's source domain.
///
/// `elapsed = now - start - paused_total`, frozen at `pause_start` while paused.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderClock {
    mode: ClockMode,
    start: f64,
    paused_total: f64,
    pause_start: Option<f64>,
}

impl RenderClock {
    pub fn new(mode: ClockMode, now: f64) -> Self {
        Self {
            mode,
            start: finite_or_zero(now),
            paused_total: 0.0,
            pause_start: None,
        }
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    pub fn is_paused(&self) -> bool {
        self.pause_start.is_some()
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        let at = self.pause_start.unwrap_or(finite_or_zero(now));
        (at - self.start - self.paused_total).max(0.0)
    }

    pub fn pause(&mut self, now: f64) {
        if self.pause_start.is_none() {
            self.pause_start = Some(finite_or_zero(now));
        }
    }

    pub fn resume(&mut self, now: f64) {
        if let Some(p) = self.pause_start.take() {
            self.paused_total += (finite_or_zero(now) - p).max(0.0);
        }
    }

    /// Make `elapsed` read `t` from `now` on, whatever the pause history.
    pub fn seek(&mut self, t: f64, now: f64) {
        let now = finite_or_zero(now);
        self.start = now - finite_or_zero(t).max(0.0);
        self.paused_total = 0.0;
        if self.pause_start.is_some() {
            self.pause_start = Some(now);
        }
    }

    /// Back to zero, running.
    pub fn reset(&mut self, now: f64) {
        *self = Self::new(self.mode, now);
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/session/clock.rs"]
mod tests;
