//! Transport state machine. Every operation is idempotent and returns whether it changed state.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Running,
    Paused,
    /// A seek is queued for the next tick.
    Seeking,
    /// Terminal.
    Stopped,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transport {
    paused: bool,
    pending_seek: Option<f64>,
    stopped: bool,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransportState {
        if self.stopped {
            TransportState::Stopped
        } else if self.pending_seek.is_some() {
            TransportState::Seeking
        } else if self.paused {
            TransportState::Paused
        } else {
            TransportState::Running
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused && !self.stopped
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn pause(&mut self) -> bool {
        if self.stopped || self.paused {
            return false;
        }
        self.paused = true;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.stopped || !self.paused {
            return false;
        }
        self.paused = false;
        true
    }

    /// Queue a seek to `t`. Seeking to `current` (or to the already queued target) is a no-op.
    pub fn seek(&mut self, t: f64, current: f64) -> bool {
        if self.stopped || !t.is_finite() {
            return false;
        }
        let target = self.pending_seek.unwrap_or(current);
        if (t - target).abs() < 1e-9 {
            return false;
        }
        self.pending_seek = Some(t);
        true
    }

    /// Consume the queued seek, if any.
    pub fn take_seek(&mut self) -> Option<f64> {
        self.pending_seek.take()
    }

    /// Back to running from zero.
    pub fn restart(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.paused = false;
        self.pending_seek = None;
        true
    }

    pub fn stop(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.stopped = true;
        self.pending_seek = None;
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/transport.rs"]
mod tests;
