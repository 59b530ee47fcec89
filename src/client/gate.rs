//! Single-flight guard for submit actions.

use std::sync::atomic::{AtomicBool, Ordering};

/// Allows at most one submission in flight.
#[derive(Debug, Default)]
pub struct SubmitGate {
    busy: AtomicBool,
}

/// Held while a submission is in flight; releases the gate on drop.
#[derive(Debug)]
pub struct SubmitPermit<'a> {
    gate: &'a SubmitGate,
}

impl SubmitGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Option<SubmitPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitPermit { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for SubmitPermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight() {
        let gate = SubmitGate::new();
        let permit = gate.try_begin().unwrap();
        assert!(gate.is_busy());
        assert!(gate.try_begin().is_none());
        drop(permit);
        assert!(!gate.is_busy());
        assert!(gate.try_begin().is_some());
    }
}
