//! Record id generation.
//!
//! Ids stay epoch-millisecond shaped, but two ids issued in the same clock
//! tick (or after a clock step backwards) still differ: every id is strictly
//! greater than the previously issued one and than a caller-provided floor.

use crate::model::record::RecordId;
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock based on `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Monotonic, timestamp-derived id source.
#[derive(Debug, Clone, Default)]
pub struct RecordIdGenerator<C: Clock = SystemClock> {
    clock: C,
    last_issued: Option<RecordId>,
}

impl RecordIdGenerator<SystemClock> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> RecordIdGenerator<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            last_issued: None,
        }
    }

    /// Issues the next id.
    ///
    /// `floor` is the largest id already in use (typically
    /// `StoreState::max_id()`); the returned id is strictly above it.
    pub fn next_id(&mut self, floor: Option<RecordId>) -> RecordId {
        let mut candidate = self.clock.now_ms();
        for taken in [self.last_issued, floor].into_iter().flatten() {
            candidate = candidate.max(taken.saturating_add(1));
        }
        self.last_issued = Some(candidate);
        candidate
    }

    pub fn last_issued(&self) -> Option<RecordId> {
        self.last_issued
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, RecordIdGenerator, SystemClock};
    use std::cell::Cell;

    struct FixedClock(Cell<i64>);

    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0.get()
        }
    }

    #[test]
    fn ids_within_one_tick_do_not_collide() {
        let mut ids = RecordIdGenerator::with_clock(FixedClock(Cell::new(1_000)));

        assert_eq!(ids.next_id(None), 1_000);
        assert_eq!(ids.next_id(None), 1_001);
        assert_eq!(ids.next_id(None), 1_002);
    }

    #[test]
    fn ids_follow_clock_when_it_moves_ahead() {
        let clock = FixedClock(Cell::new(1_000));
        let mut ids = RecordIdGenerator::with_clock(clock);
        assert_eq!(ids.next_id(None), 1_000);

        ids.clock.0.set(5_000);
        assert_eq!(ids.next_id(None), 5_000);

        ids.clock.0.set(10);
        assert_eq!(ids.next_id(None), 5_001);
    }

    #[test]
    fn ids_stay_above_floor() {
        let mut ids = RecordIdGenerator::with_clock(FixedClock(Cell::new(100)));

        assert_eq!(ids.next_id(Some(900)), 901);
        assert_eq!(ids.last_issued(), Some(901));
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now_ms() > 0);
    }
}
