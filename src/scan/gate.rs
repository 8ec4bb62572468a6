//! Scan debounce gate.
//!
//! Camera scan callbacks fire repeatedly while a code stays in frame; the
//! gate enforces at most one in-flight attendance submission per cooldown
//! window. It is a rate limiter for serially delivered callbacks, not a
//! mutex across concurrent scanners.
//!
//! The gate is held until the caller reports that the submission settled,
//! bounded by a maximum hold time after which a hung holder is reclaimed.
//! The 2-second cooldown is measured from acquisition, so rapid re-scans
//! stay suppressed even when the work finishes quickly.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Repeat scans within this window are ignored.
const DEFAULT_COOLDOWN: Duration = Duration::from_millis(2000);

/// A holder that never releases (hung request) is reclaimed after this.
const DEFAULT_MAX_HOLD: Duration = Duration::from_millis(15_000);

#[derive(Debug, Default)]
struct GateState {
    /// When the last accepted scan was admitted.
    last_scan: Option<Instant>,
    /// Set while a submission is in flight.
    in_flight_since: Option<Instant>,
}

/// Debounce gate for the scan pipeline.
pub struct ScanGate {
    state: Mutex<GateState>,
    cooldown: Duration,
    max_hold: Duration,
}

impl Default for ScanGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN, DEFAULT_MAX_HOLD)
    }
}

impl ScanGate {
    /// Create a gate with the given cooldown window and maximum hold time.
    pub fn new(cooldown: Duration, max_hold: Duration) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            cooldown,
            max_hold,
        }
    }

    /// Attempt to admit a scan at `now`.
    ///
    /// Refused while a submission is in flight (up to the max hold bound)
    /// or while the cooldown window from the last admitted scan is open.
    pub fn try_acquire(&self, now: Instant) -> bool {
        let mut state = self.state.lock();

        if let Some(since) = state.in_flight_since {
            if now.duration_since(since) < self.max_hold {
                return false;
            }
            // Holder exceeded the bound; reclaim rather than stay stuck
            tracing::warn!("scan gate held past max hold; reclaiming");
            state.in_flight_since = None;
        }

        if let Some(last) = state.last_scan {
            if now.duration_since(last) < self.cooldown {
                return false;
            }
        }

        state.last_scan = Some(now);
        state.in_flight_since = Some(now);
        true
    }

    /// Release the gate once the admitted scan's work has settled.
    /// Idempotent; releasing an idle gate is a no-op.
    pub fn release(&self) {
        self.state.lock().in_flight_since = None;
    }

    /// Whether a submission is currently in flight.
    pub fn in_flight(&self) -> bool {
        self.state.lock().in_flight_since.is_some()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn second_acquire_within_cooldown_is_refused() {
        let gate = ScanGate::default();
        let t0 = Instant::now();

        assert!(gate.try_acquire(t0));
        gate.release();
        assert!(!gate.try_acquire(at(t0, 1999)));
    }

    #[test]
    fn acquire_after_cooldown_succeeds() {
        let gate = ScanGate::default();
        let t0 = Instant::now();

        assert!(gate.try_acquire(t0));
        gate.release();
        assert!(gate.try_acquire(at(t0, 2000)));
    }

    #[test]
    fn refused_while_in_flight_even_past_cooldown() {
        let gate = ScanGate::default();
        let t0 = Instant::now();

        assert!(gate.try_acquire(t0));
        // Cooldown elapsed but the submission has not settled
        assert!(!gate.try_acquire(at(t0, 5000)));

        gate.release();
        assert!(gate.try_acquire(at(t0, 5000)));
    }

    #[test]
    fn hung_holder_is_reclaimed_after_max_hold() {
        let gate = ScanGate::default();
        let t0 = Instant::now();

        assert!(gate.try_acquire(t0));
        // Never released — a hung request
        assert!(!gate.try_acquire(at(t0, 14_999)));
        assert!(gate.try_acquire(at(t0, 15_000)));
    }

    #[test]
    fn release_is_idempotent() {
        let gate = ScanGate::default();
        let t0 = Instant::now();

        gate.release();
        assert!(gate.try_acquire(t0));
        gate.release();
        gate.release();
        assert!(!gate.in_flight());
    }

    #[test]
    fn cooldown_measured_from_acquisition() {
        let gate = ScanGate::default();
        let t0 = Instant::now();

        assert!(gate.try_acquire(t0));
        // Work settles quickly; the window still runs from t0
        gate.release();
        assert!(!gate.try_acquire(at(t0, 100)));
        assert!(!gate.try_acquire(at(t0, 1900)));
        assert!(gate.try_acquire(at(t0, 2100)));
    }

    #[test]
    fn zero_cooldown_gate_admits_back_to_back() {
        let gate = ScanGate::new(Duration::ZERO, DEFAULT_MAX_HOLD);
        let t0 = Instant::now();

        assert!(gate.try_acquire(t0));
        gate.release();
        assert!(gate.try_acquire(t0));
    }
}
