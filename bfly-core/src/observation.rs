/// Observation data structures and the per-point ordered store
use crate::{
    error::{MonitorError, Result},
    temporal::TemporalRange,
};
use chrono::naive::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Human-facing date format: "YYYY-MM-DD"
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Compact date format used in observation CSV rows: "YYYYMMDD"
pub const DATE_FORMAT_COMPACT: &str = "%Y%m%d";

/// A single measurement event for one control point.
///
/// Any subset of the coordinate axes may be absent depending on the point's
/// dimension. Observations are immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Date the measurement was taken
    pub date: NaiveDate,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    /// Surveyor or crew that took the measurement
    pub operator: Option<String>,
    /// Instrument used for the measurement
    pub instrument: Option<String>,
    /// This observation defines (or re-anchors) the zero baseline
    pub is_zero_measurement: bool,
    /// Corrective re-survey, not a natural trend point
    pub is_replacement_measurement: bool,
}

impl Observation {
    /// A measurement with coordinates only; metadata and flags default off.
    pub fn new(date: NaiveDate, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Self {
        Observation {
            date,
            x,
            y,
            z,
            operator: None,
            instrument: None,
            is_zero_measurement: false,
            is_replacement_measurement: false,
        }
    }

    pub fn with_zero_flag(mut self, flag: bool) -> Self {
        self.is_zero_measurement = flag;
        self
    }

    pub fn with_replacement_flag(mut self, flag: bool) -> Self {
        self.is_replacement_measurement = flag;
        self
    }
}

impl Ord for Observation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date.cmp(&other.date)
    }
}

impl Eq for Observation {}

impl PartialEq for Observation {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date
    }
}

impl PartialOrd for Observation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-point time series of raw measurements, kept in ascending date order.
///
/// The store only grows; observations are never mutated in place. Filtered
/// views are non-owning subslices and never touch the underlying vector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
}

impl ObservationSeries {
    pub fn new() -> Self {
        ObservationSeries {
            observations: Vec::new(),
        }
    }

    /// Insert an observation in date order.
    ///
    /// Fails with `DuplicateTimestamp` if an observation with the same date
    /// already exists for this point; `point_name` is only used to report
    /// the failure.
    pub fn insert(&mut self, point_name: &str, observation: Observation) -> Result<()> {
        match self
            .observations
            .binary_search_by(|probe| probe.date.cmp(&observation.date))
        {
            Ok(_) => Err(MonitorError::DuplicateTimestamp {
                point: point_name.to_string(),
                date: observation.date,
            }),
            Err(position) => {
                self.observations.insert(position, observation);
                Ok(())
            }
        }
    }

    /// The full immutable raw sequence.
    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Non-owning view restricted to `[range.low, range.high]` inclusive.
    pub fn filtered(&self, range: &TemporalRange) -> &[Observation] {
        let lo = self
            .observations
            .partition_point(|obs| obs.date < range.low);
        let hi = self
            .observations
            .partition_point(|obs| obs.date <= range.high);
        &self.observations[lo..hi]
    }

    /// Ordered dates of the time-filtered view.
    pub fn filtered_dates(&self, range: &TemporalRange) -> Vec<NaiveDate> {
        self.filtered(range).iter().map(|obs| obs.date).collect()
    }

    /// The filtered observation at an exact date, if any.
    pub fn at_date(&self, date: NaiveDate) -> Option<&Observation> {
        self.observations
            .binary_search_by(|probe| probe.date.cmp(&date))
            .ok()
            .map(|position| &self.observations[position])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_insert_keeps_ascending_order() {
        let mut series = ObservationSeries::new();
        series
            .insert("P1", Observation::new(date(2023, 3, 1), None, None, Some(1.0)))
            .unwrap();
        series
            .insert("P1", Observation::new(date(2023, 1, 1), None, None, Some(0.0)))
            .unwrap();
        series
            .insert("P1", Observation::new(date(2023, 2, 1), None, None, Some(0.5)))
            .unwrap();
        let dates: Vec<NaiveDate> = series.as_slice().iter().map(|o| o.date).collect();
        assert_eq!(
            dates,
            vec![date(2023, 1, 1), date(2023, 2, 1), date(2023, 3, 1)]
        );
    }

    #[test]
    fn test_insert_rejects_duplicate_date() {
        let mut series = ObservationSeries::new();
        series
            .insert("P1", Observation::new(date(2023, 1, 1), None, None, Some(0.0)))
            .unwrap();
        let result = series.insert(
            "P1",
            Observation::new(date(2023, 1, 1), None, None, Some(9.9)),
        );
        assert_eq!(
            result,
            Err(MonitorError::DuplicateTimestamp {
                point: "P1".to_string(),
                date: date(2023, 1, 1),
            })
        );
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_filtered_is_inclusive_subsequence() {
        let mut series = ObservationSeries::new();
        for day in 1..=9 {
            series
                .insert(
                    "P1",
                    Observation::new(date(2023, 1, day), None, None, Some(day as f64)),
                )
                .unwrap();
        }
        let range = TemporalRange::new(date(2023, 1, 3), date(2023, 1, 6)).unwrap();
        let view = series.filtered(&range);
        assert_eq!(view.len(), 4);
        assert_eq!(view.first().unwrap().date, date(2023, 1, 3));
        assert_eq!(view.last().unwrap().date, date(2023, 1, 6));
        // the raw store is untouched
        assert_eq!(series.len(), 9);
    }

    #[test]
    fn test_filtered_outside_data_is_empty() {
        let mut series = ObservationSeries::new();
        series
            .insert("P1", Observation::new(date(2023, 1, 1), None, None, Some(0.0)))
            .unwrap();
        let range = TemporalRange::new(date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        assert!(series.filtered(&range).is_empty());
    }

    #[test]
    fn test_serializes_to_json() {
        let obs = Observation::new(date(2023, 1, 1), Some(1.0), Some(2.0), Some(3.0))
            .with_zero_flag(true);
        let json = serde_json::to_string(&obs).unwrap();
        assert!(json.contains("\"is_zero_measurement\":true"));
    }
}
