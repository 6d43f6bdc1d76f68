// src/budget.rs
// Cooperative cancellation and per-task deadlines.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhausted {
    Cancelled,
    Deadline(Duration),
}

/// Checked by a task between units of work; never interrupts anything.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    cancel: Option<Arc<AtomicBool>>,
    deadline: Option<(Instant, Duration)>,
}

impl Budget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// The deadline clock starts now.
    pub fn new(cancel: Arc<AtomicBool>, limit: Option<Duration>) -> Self {
        Self {
            cancel: Some(cancel),
            deadline: limit.map(|d| (Instant::now() + d, d)),
        }
    }

    pub fn check(&self) -> Result<(), Exhausted> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
        {
            return Err(Exhausted::Cancelled);
        }
        match self.deadline {
            Some((at, limit)) if Instant::now() >= at => Err(Exhausted::Deadline(limit)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_expires() {
        assert_eq!(Budget::unlimited().check(), Ok(()));
    }

    #[test]
    fn cancel_flag_is_observed() {
        let flag = Arc::new(AtomicBool::new(false));
        let b = Budget::new(flag.clone(), None);
        assert_eq!(b.check(), Ok(()));
        flag.store(true, Ordering::Relaxed);
        assert_eq!(b.check(), Err(Exhausted::Cancelled));
    }

    #[test]
    fn zero_deadline_is_already_past() {
        let b = Budget::new(Arc::new(AtomicBool::new(false)), Some(Duration::ZERO));
        assert_eq!(b.check(), Err(Exhausted::Deadline(Duration::ZERO)));
    }
}
