//! Single-shot deadline timers driven by the caller's clock.
//!
//! A [`DeadlineTimer`] never fires by itself.  The recognizer asks it
//! whether it is due with [`DeadlineTimer::fire_if_due`] from the same loop
//! that feeds touch samples, so timer output is ordered with touch output
//! and a cancel can never race a firing.

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeadlineTimer {
    deadline: Option<u64>,
}

impl DeadlineTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or re-arms) the timer to fire at `deadline_ms`.
    pub fn arm(&mut self, deadline_ms: u64) {
        self.deadline = Some(deadline_ms);
    }

    /// Disarms the timer.  Returns `true` if it was armed.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Disarms and returns `true` if the deadline has been reached.
    pub fn fire_if_due(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(at) if now_ms >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
