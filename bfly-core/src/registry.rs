/// The Butterfly control-point registry and its facade operations
use crate::{
    alarm::{self, AlarmTable, Axis, Severity},
    control_point::ControlPoint,
    error::{MonitorError, Result},
    grade::{derive_grades, GradeConfig, GradeSet},
    observation::Observation,
    temporal::{TemporalFilter, TemporalRange},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The populated monitoring network: typed control points, the alarm table,
/// and the process-wide temporal filter.
///
/// Points are keyed by name in a BTreeMap, so iteration is name-sorted.
/// That order is a contract: the grade engine's canonical pair orientation
/// depends on it. A generation counter is bumped by every write; consumers
/// compare generations to decide whether derived views are stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Butterfly {
    points: BTreeMap<String, ControlPoint>,
    alarms: AlarmTable,
    filter: TemporalFilter,
    generation: u64,
}

impl Butterfly {
    pub fn new() -> Self {
        Butterfly::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filter_generation(&self) -> u64 {
        self.filter.generation()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn alarms(&self) -> &AlarmTable {
        &self.alarms
    }

    pub fn alarms_mut(&mut self) -> &mut AlarmTable {
        self.generation += 1;
        &mut self.alarms
    }

    /// Insert (or replace) a control point. Loader-only in the reference
    /// design, but nothing enforces that here beyond the generation bump.
    pub fn insert_point(&mut self, point: ControlPoint) {
        self.generation += 1;
        self.points.insert(point.name.clone(), point);
    }

    pub fn point(&self, name: &str) -> Option<&ControlPoint> {
        self.points.get(name)
    }

    /// All points, name-sorted.
    pub fn iter_points(&self) -> impl Iterator<Item = &ControlPoint> {
        self.points.values()
    }

    /// Points of one kind, name-sorted.
    pub fn points_of_kind<'a>(&'a self, kind_tag: &'a str) -> impl Iterator<Item = &'a ControlPoint> {
        self.points
            .values()
            .filter(move |point| point.kind.matches_tag(kind_tag))
    }

    /// Append an observation to a named point, rejecting duplicate dates.
    pub fn add_observation(&mut self, name: &str, observation: Observation) -> Result<()> {
        let point = self
            .points
            .get_mut(name)
            .ok_or_else(|| MonitorError::UnknownPoint {
                name: name.to_string(),
            })?;
        point.add_observation(observation)?;
        self.generation += 1;
        Ok(())
    }

    /// Resolve the zero-reference baseline of every point. Run once per
    /// load, after ingestion; a mere filter change must not re-run this.
    pub fn resolve_baselines(&mut self) {
        for point in self.points.values_mut() {
            point.resolve_baseline();
        }
        self.generation += 1;
    }

    /// Min/max observation dates across all points, if any observations
    /// are loaded.
    pub fn observation_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut span: Option<(NaiveDate, NaiveDate)> = None;
        for point in self.points.values() {
            let series = point.series();
            let (Some(first), Some(last)) = (series.first(), series.last()) else {
                continue;
            };
            span = Some(match span {
                None => (first.date, last.date),
                Some((low, high)) => (low.min(first.date), high.max(last.date)),
            });
        }
        span
    }

    /// Initialize the temporal filter to the full observation span. With no
    /// observations loaded the filter stays unbounded.
    pub fn reset_temporal_range(&mut self) {
        if let Some((low, high)) = self.observation_span() {
            // span is ordered by construction, set_range cannot fail
            let _ = self.filter.set_range(low, high);
        }
    }

    pub fn temporal_range(&self) -> TemporalRange {
        self.filter.range()
    }

    pub fn set_temporal_range(&mut self, low: NaiveDate, high: NaiveDate) -> Result<()> {
        self.filter.set_range(low, high)
    }

    /// The named point's observations restricted to the current filter.
    pub fn time_filtered_observations(&self, name: &str) -> Result<&[Observation]> {
        let point = self
            .points
            .get(name)
            .ok_or_else(|| MonitorError::UnknownPoint {
                name: name.to_string(),
            })?;
        Ok(point.series().filtered(&self.filter.range()))
    }

    /// Derive the ranked grade set for the current registry contents and
    /// temporal filter.
    pub fn derive_grades(&self, config: &GradeConfig) -> GradeSet {
        derive_grades(self, &self.filter.range(), config)
    }

    /// Classify a named point's current displacement on an axis.
    pub fn classify(&self, name: &str, axis: Axis) -> Result<Severity> {
        let point = self
            .points
            .get(name)
            .ok_or_else(|| MonitorError::UnknownPoint {
                name: name.to_string(),
            })?;
        alarm::classify(point, axis, &self.alarms, &self.filter.range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_point::{Dimension, PointKind};
    use crate::geo::{GeoPoint, PlanarPosition};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(name: &str, kind: PointKind) -> ControlPoint {
        ControlPoint::new(
            name,
            GeoPoint::new(45.0, 7.0),
            Some(PlanarPosition::new(0.0, 0.0, Some(100.0))),
            Dimension::ThreeD,
            7,
            kind,
        )
    }

    #[test]
    fn test_points_of_kind_is_name_sorted() {
        let mut butterfly = Butterfly::new();
        butterfly.insert_point(point("T2", PointKind::Topographic));
        butterfly.insert_point(point(
            "W1",
            PointKind::Groundwater {
                ground_elevation: 200.0,
                sensor_depth: 10.0,
            },
        ));
        butterfly.insert_point(point("T1", PointKind::Topographic));
        let names: Vec<&str> = butterfly
            .points_of_kind("topographic")
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["T1", "T2"]);
        assert_eq!(butterfly.points_of_kind("groundwater").count(), 1);
        assert_eq!(butterfly.points_of_kind("inclinometer").count(), 0);
    }

    #[test]
    fn test_add_observation_to_unknown_point() {
        let mut butterfly = Butterfly::new();
        let result = butterfly.add_observation(
            "NOPE",
            Observation::new(date(2023, 1, 1), None, None, Some(1.0)),
        );
        assert_eq!(
            result,
            Err(MonitorError::UnknownPoint {
                name: "NOPE".to_string(),
            })
        );
    }

    #[test]
    fn test_observation_span_and_reset_range() {
        let mut butterfly = Butterfly::new();
        butterfly.insert_point(point("A", PointKind::Topographic));
        butterfly.insert_point(point("B", PointKind::Topographic));
        butterfly
            .add_observation("A", Observation::new(date(2023, 2, 1), None, None, Some(1.0)))
            .unwrap();
        butterfly
            .add_observation("B", Observation::new(date(2022, 11, 5), None, None, Some(1.0)))
            .unwrap();
        butterfly
            .add_observation("B", Observation::new(date(2023, 6, 30), None, None, Some(1.1)))
            .unwrap();
        assert_eq!(
            butterfly.observation_span(),
            Some((date(2022, 11, 5), date(2023, 6, 30)))
        );
        butterfly.reset_temporal_range();
        assert_eq!(butterfly.temporal_range().low, date(2022, 11, 5));
        assert_eq!(butterfly.temporal_range().high, date(2023, 6, 30));
    }

    #[test]
    fn test_empty_registry_has_no_span_and_keeps_unbounded_filter() {
        let mut butterfly = Butterfly::new();
        assert_eq!(butterfly.observation_span(), None);
        butterfly.reset_temporal_range();
        assert_eq!(butterfly.temporal_range(), TemporalRange::unbounded());
    }

    #[test]
    fn test_writes_bump_generation() {
        let mut butterfly = Butterfly::new();
        let g0 = butterfly.generation();
        butterfly.insert_point(point("A", PointKind::Topographic));
        let g1 = butterfly.generation();
        assert!(g1 > g0);
        butterfly
            .add_observation("A", Observation::new(date(2023, 1, 1), None, None, Some(1.0)))
            .unwrap();
        assert!(butterfly.generation() > g1);
    }

    #[test]
    fn test_point_without_observations_is_unaffected_by_range_changes() {
        let mut butterfly = Butterfly::new();
        butterfly.insert_point(point("A", PointKind::Topographic));
        butterfly
            .set_temporal_range(date(2023, 1, 1), date(2023, 12, 31))
            .unwrap();
        let view = butterfly.time_filtered_observations("A").unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn test_time_filtered_observations_follow_filter() {
        let mut butterfly = Butterfly::new();
        butterfly.insert_point(point("A", PointKind::Topographic));
        for day in 1..=5 {
            butterfly
                .add_observation(
                    "A",
                    Observation::new(date(2023, 1, day), None, None, Some(day as f64)),
                )
                .unwrap();
        }
        butterfly.set_temporal_range(date(2023, 1, 2), date(2023, 1, 4)).unwrap();
        let view = butterfly.time_filtered_observations("A").unwrap();
        assert_eq!(view.len(), 3);
        assert_eq!(view[0].date, date(2023, 1, 2));
    }
}
