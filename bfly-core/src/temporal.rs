/// Process-wide temporal filtering state
use crate::error::{MonitorError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An inclusive low/high date window.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TemporalRange {
    pub low: NaiveDate,
    pub high: NaiveDate,
}

impl TemporalRange {
    /// Fails with `InvalidRange` if `low > high`.
    pub fn new(low: NaiveDate, high: NaiveDate) -> Result<Self> {
        if low > high {
            return Err(MonitorError::InvalidRange { low, high });
        }
        Ok(TemporalRange { low, high })
    }

    /// The widest possible range; every observation date falls inside it.
    pub fn unbounded() -> Self {
        TemporalRange {
            low: NaiveDate::MIN,
            high: NaiveDate::MAX,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.low <= date && date <= self.high
    }
}

impl Default for TemporalRange {
    fn default() -> Self {
        TemporalRange::unbounded()
    }
}

/// The mutable date window consumed by every time-filtered accessor.
///
/// Carries a generation counter instead of change listeners: consumers
/// remember the generation their derived views were computed against and
/// re-derive when it moves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemporalFilter {
    range: TemporalRange,
    generation: u64,
}

impl TemporalFilter {
    pub fn new(range: TemporalRange) -> Self {
        TemporalFilter {
            range,
            generation: 0,
        }
    }

    pub fn range(&self) -> TemporalRange {
        self.range
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the window.
    ///
    /// Inverted bounds fail with `InvalidRange` and the previous range is
    /// retained. Reapplying the current bounds is a no-op: the generation
    /// does not move, so dependent views stay valid.
    pub fn set_range(&mut self, low: NaiveDate, high: NaiveDate) -> Result<()> {
        let next = TemporalRange::new(low, high)?;
        if next == self.range {
            return Ok(());
        }
        self.range = next;
        self.generation += 1;
        Ok(())
    }
}

impl Default for TemporalFilter {
    fn default() -> Self {
        TemporalFilter::new(TemporalRange::unbounded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_inverted_bounds_rejected_and_previous_retained() {
        let mut filter = TemporalFilter::new(
            TemporalRange::new(date(2023, 1, 1), date(2023, 12, 31)).unwrap(),
        );
        let result = filter.set_range(date(2023, 6, 1), date(2023, 5, 1));
        assert_eq!(
            result,
            Err(MonitorError::InvalidRange {
                low: date(2023, 6, 1),
                high: date(2023, 5, 1),
            })
        );
        assert_eq!(filter.range().low, date(2023, 1, 1));
        assert_eq!(filter.range().high, date(2023, 12, 31));
        assert_eq!(filter.generation(), 0);
    }

    #[test]
    fn test_set_range_is_idempotent() {
        let mut filter = TemporalFilter::default();
        filter.set_range(date(2023, 1, 1), date(2023, 6, 30)).unwrap();
        let generation = filter.generation();
        filter.set_range(date(2023, 1, 1), date(2023, 6, 30)).unwrap();
        assert_eq!(filter.generation(), generation);
        filter.set_range(date(2023, 1, 1), date(2023, 7, 31)).unwrap();
        assert_eq!(filter.generation(), generation + 1);
    }

    #[test]
    fn test_unbounded_contains_everything() {
        let range = TemporalRange::unbounded();
        assert!(range.contains(date(1900, 1, 1)));
        assert!(range.contains(date(2100, 12, 31)));
    }

    #[test]
    fn test_single_day_range_is_valid() {
        let range = TemporalRange::new(date(2023, 1, 1), date(2023, 1, 1)).unwrap();
        assert!(range.contains(date(2023, 1, 1)));
        assert!(!range.contains(date(2023, 1, 2)));
    }
}
