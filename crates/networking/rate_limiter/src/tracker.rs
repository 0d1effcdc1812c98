use std::{collections::VecDeque, sync::Arc, time::Duration};

use parking_lot::Mutex;
use skein_metrics::{RATE_LIMITER_REJECTIONS, inc_int_counter_vec};
use tracing::debug;

use crate::{config::ResourceKind, time::TimeProvider};

/// Receipt for units reserved by [`RateTracker::approve_objects_request`]. Handing it back
/// through [`RateTracker::adjust_objects_request`] refunds whatever was not actually served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestApproval {
    id: u64,
    timestamp: Duration,
    units: u64,
}

impl RequestApproval {
    pub fn units(&self) -> u64 {
        self.units
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }
}

#[derive(Debug)]
struct LedgerEntry {
    id: u64,
    timestamp: Duration,
    units: u64,
}

#[derive(Debug, Default)]
struct Ledger {
    entries: VecDeque<LedgerEntry>,
    used: u64,
    next_id: u64,
}

impl Ledger {
    /// Entries are appended in arrival order, so expired ones collect at the front.
    fn prune(&mut self, now: Duration, window: Duration) {
        while let Some(front) = self.entries.front() {
            if front.timestamp.saturating_add(window) > now {
                break;
            }
            self.used = self.used.saturating_sub(front.units);
            self.entries.pop_front();
        }
    }
}

/// Sliding-window budget for one resource of one peer.
///
/// Units accepted at time `t` count against the budget until `t + window`. The check and the
/// reservation happen under a single lock, so concurrent callers can never push the in-window
/// total past `max_units`.
#[derive(Debug)]
pub struct RateTracker {
    resource: ResourceKind,
    max_units: u64,
    window: Duration,
    time_provider: Arc<dyn TimeProvider>,
    ledger: Mutex<Ledger>,
}

impl RateTracker {
    pub fn new(
        resource: ResourceKind,
        max_units: u64,
        window: Duration,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            resource,
            max_units,
            window,
            time_provider,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    pub fn max_units(&self) -> u64 {
        self.max_units
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Reserves `units` if they fit in what remains of the current window.
    pub fn approve_objects_request(&self, units: u64) -> Option<RequestApproval> {
        let now = self.time_provider.now();
        let mut ledger = self.ledger.lock();
        ledger.prune(now, self.window);

        if ledger.used.saturating_add(units) > self.max_units {
            let used = ledger.used;
            drop(ledger);
            debug!(
                resource = %self.resource,
                requested = units,
                used,
                max = self.max_units,
                "Rate limit exceeded"
            );
            inc_int_counter_vec(&RATE_LIMITER_REJECTIONS, &[self.resource.as_str()]);
            return None;
        }

        let id = ledger.next_id;
        ledger.next_id = ledger.next_id.wrapping_add(1);
        if units > 0 {
            ledger.entries.push_back(LedgerEntry {
                id,
                timestamp: now,
                units,
            });
            ledger.used += units;
        }

        Some(RequestApproval {
            id,
            timestamp: now,
            units,
        })
    }

    pub fn approve(&self, units: u64) -> bool {
        self.approve_objects_request(units).is_some()
    }

    /// Shrinks a previous reservation to `returned_units`. Reservations that already left the
    /// window are ignored, as is any attempt to grow a reservation.
    pub fn adjust_objects_request(&self, approval: RequestApproval, returned_units: u64) {
        if returned_units >= approval.units {
            return;
        }
        let refund = approval.units - returned_units;

        let now = self.time_provider.now();
        let mut ledger = self.ledger.lock();
        ledger.prune(now, self.window);

        let Some(entry) = ledger.entries.iter_mut().find(|entry| entry.id == approval.id) else {
            return;
        };
        entry.units -= refund;
        ledger.used = ledger.used.saturating_sub(refund);
    }

    /// Units counted against the budget right now.
    pub fn used_units(&self) -> u64 {
        let now = self.time_provider.now();
        let mut ledger = self.ledger.lock();
        ledger.prune(now, self.window);
        ledger.used
    }

    pub fn remaining_units(&self) -> u64 {
        self.max_units.saturating_sub(self.used_units())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use tracing_test::traced_test;

    use super::*;
    use crate::time::StubTimeProvider;

    const WINDOW: Duration = Duration::from_secs(60);

    fn tracker(max_units: u64) -> (RateTracker, Arc<StubTimeProvider>) {
        let time = Arc::new(StubTimeProvider::with_time(Duration::from_secs(1_000)));
        (
            RateTracker::new(ResourceKind::Blocks, max_units, WINDOW, time.clone()),
            time,
        )
    }

    #[traced_test]
    #[test]
    fn test_rejects_request_over_budget() {
        let (tracker, _time) = tracker(10);

        for _ in 0..10 {
            assert!(tracker.approve(1));
        }
        assert!(!tracker.approve(1));
        assert_eq!(tracker.used_units(), 10);
        assert!(logs_contain("Rate limit exceeded"));
    }

    #[test]
    fn test_budget_recovers_after_window() {
        let (tracker, time) = tracker(10);
        assert!(tracker.approve(10));
        assert!(!tracker.approve(1));

        time.advance_time_by(WINDOW - Duration::from_millis(1));
        assert!(!tracker.approve(1));

        time.advance_time_by(Duration::from_millis(1));
        assert!(tracker.approve(10));
    }

    #[test]
    fn test_entries_expire_independently() {
        let (tracker, time) = tracker(10);
        assert!(tracker.approve(4));
        time.advance_time_by(Duration::from_secs(30));
        assert!(tracker.approve(6));
        assert!(!tracker.approve(1));

        time.advance_time_by(Duration::from_secs(30));
        assert_eq!(tracker.used_units(), 6);
        assert!(tracker.approve(4));
        assert!(!tracker.approve(1));
    }

    #[test]
    fn test_request_larger_than_budget_is_rejected() {
        let (tracker, _time) = tracker(10);
        assert!(tracker.approve_objects_request(11).is_none());
        assert_eq!(tracker.used_units(), 0);
    }

    #[test]
    fn test_zero_unit_request_always_fits() {
        let (tracker, _time) = tracker(1);
        assert!(tracker.approve(1));
        let approval = tracker.approve_objects_request(0).expect("zero units fit");
        assert_eq!(approval.units(), 0);
    }

    #[test]
    fn test_adjust_refunds_unused_units() {
        let (tracker, _time) = tracker(10);
        let approval = tracker.approve_objects_request(8).expect("within budget");
        assert_eq!(tracker.remaining_units(), 2);

        tracker.adjust_objects_request(approval, 3);
        assert_eq!(tracker.used_units(), 3);
        assert!(tracker.approve(7));
        assert!(!tracker.approve(1));
    }

    #[test]
    fn test_adjust_ignores_growth_and_expired_approvals() {
        let (tracker, time) = tracker(10);
        let approval = tracker.approve_objects_request(5).expect("within budget");

        tracker.adjust_objects_request(approval, 9);
        assert_eq!(tracker.used_units(), 5);

        time.advance_time_by(WINDOW);
        assert!(tracker.approve(10));
        tracker.adjust_objects_request(approval, 0);
        assert_eq!(tracker.used_units(), 10);
    }

    #[test]
    fn test_concurrent_approvals_never_exceed_budget() {
        let (tracker, _time) = tracker(100);

        let accepted: u64 = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| (0..50).filter(|_| tracker.approve(1)).count() as u64)
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("worker panicked"))
                .sum()
        });

        assert_eq!(accepted, 100);
        assert_eq!(tracker.used_units(), 100);
    }
}
