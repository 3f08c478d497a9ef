/// Pairwise grade derivation: relative-displacement rates between nearby
/// control points
use crate::{
    control_point::{ControlPoint, Dimension},
    geo::GeoPoint,
    observation::Observation,
    registry::Butterfly,
    temporal::TemporalRange,
};
use chrono::NaiveDate;
use itertools::{
    EitherOrBoth::{Both, Left, Right},
    Itertools,
};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Default minimum planar separation between paired points
pub const DEFAULT_MIN_RADIUS: f64 = 0.05;

/// Default maximum planar separation between paired points
pub const DEFAULT_MAX_RADIUS: f64 = 50.0;

/// Default global cap on the ranked grade set
pub const DEFAULT_TOP_K: usize = 1000;

/// Tunables for one derivation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeConfig {
    pub min_radius: f64,
    pub max_radius: f64,
    pub top_k: usize,
}

impl Default for GradeConfig {
    fn default() -> Self {
        GradeConfig {
            min_radius: DEFAULT_MIN_RADIUS,
            max_radius: DEFAULT_MAX_RADIUS,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Per-mille rates of relative movement between the two endpoints over the
/// common-date window, each scaled by the pair's planar separation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Differential {
    pub height_per_mille: f64,
    pub plane_per_mille: f64,
    /// Resultant rate; carries the sign of the height component
    pub resultant_per_mille: f64,
    /// |resultant_per_mille|, the ranking key
    pub resultant_abs: f64,
}

/// The relative deformation relationship between exactly two control
/// points. Ephemeral: recomputed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub p1: String,
    pub p2: String,
    /// Planar separation of the endpoints' anchor coordinates
    pub plane_distance: f64,
    /// Height separation of the baselines
    pub height_distance: f64,
    /// 3D separation
    pub resultant_distance: f64,
    /// Dates present in both points' time-filtered series (always >= 2)
    pub common_dates: Vec<NaiveDate>,
    pub differential: Differential,
    /// Geodesic midpoint of the endpoints, for placement
    pub position: GeoPoint,
}

impl Grade {
    /// True if this grade relates the given unordered pair.
    pub fn relates(&self, a: &str, b: &str) -> bool {
        (self.p1 == a && self.p2 == b) || (self.p1 == b && self.p2 == a)
    }
}

/// A ranked derivation result, stamped with the input generations so a
/// consumer can discard results whose inputs have moved on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeSet {
    pub grades: Vec<Grade>,
    pub registry_generation: u64,
    pub filter_generation: u64,
}

impl GradeSet {
    /// Whether the registry and filter still match the inputs this set was
    /// derived from.
    pub fn is_current(&self, butterfly: &Butterfly) -> bool {
        self.registry_generation == butterfly.generation()
            && self.filter_generation == butterfly.filter_generation()
    }
}

/// Derive the ranked grade set for a registry snapshot under a temporal
/// range.
///
/// Candidate generation and deduplication run as one deterministic
/// sequential pass over the name-sorted eligible points; only the pure
/// per-pair differential computation is parallelized. An empty registry
/// yields an empty set.
pub fn derive_grades(
    butterfly: &Butterfly,
    range: &TemporalRange,
    config: &GradeConfig,
) -> GradeSet {
    let eligible: Vec<(&ControlPoint, (f64, f64))> = butterfly
        .iter_points()
        .filter(|point| point.dimension != Dimension::TwoD)
        .filter(|point| point.baseline().is_some())
        .filter(|point| point.series().filtered(range).len() >= 2)
        .filter_map(|point| match planar_anchor(point) {
            Some(anchor) => Some((point, anchor)),
            None => {
                debug!(
                    "grade derivation: {} has no planar coordinates, skipped",
                    point.name
                );
                None
            }
        })
        .collect();

    // One sequential pass: radial window, then unordered-pair dedup. The
    // first-encountered orientation is canonical, and name-sorted iteration
    // makes that reproducible.
    let mut partners: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut candidates: Vec<(&ControlPoint, &ControlPoint, f64)> = Vec::new();
    for (i, (p1, anchor1)) in eligible.iter().enumerate() {
        for (j, (p2, anchor2)) in eligible.iter().enumerate() {
            if i == j {
                continue;
            }
            let plane_distance = (anchor2.0 - anchor1.0).hypot(anchor2.1 - anchor1.1);
            if plane_distance < config.min_radius || plane_distance > config.max_radius {
                continue;
            }
            if partners
                .get(p2.name.as_str())
                .is_some_and(|set| set.contains(p1.name.as_str()))
            {
                continue;
            }
            partners
                .entry(p1.name.as_str())
                .or_default()
                .insert(p2.name.as_str());
            candidates.push((*p1, *p2, plane_distance));
        }
    }

    // Pure and pair-independent, so fan out.
    let mut grades: Vec<Grade> = candidates
        .par_iter()
        .filter_map(|&(p1, p2, plane_distance)| compute_grade(p1, p2, plane_distance, range))
        .collect();

    grades.sort_by(|a, b| {
        b.differential
            .resultant_abs
            .partial_cmp(&a.differential.resultant_abs)
            .unwrap_or(Ordering::Equal)
            .then_with(|| (&a.p1, &a.p2).cmp(&(&b.p1, &b.p2)))
    });
    grades.truncate(config.top_k);

    debug!(
        "grade derivation: {} eligible points, {} candidate pairs, {} grades retained",
        eligible.len(),
        candidates.len(),
        grades.len()
    );

    GradeSet {
        grades,
        registry_generation: butterfly.generation(),
        filter_generation: butterfly.filter_generation(),
    }
}

/// Planar coordinates a pair distance is measured between: the baseline
/// X/Y when the observations carry planar data, else the point's projected
/// position (1d points observe height only).
fn planar_anchor(point: &ControlPoint) -> Option<(f64, f64)> {
    if let Some(baseline) = point.baseline() {
        if let (Some(x), Some(y)) = (baseline.x0, baseline.y0) {
            return Some((x, y));
        }
    }
    point.planar.map(|position| (position.x, position.y))
}

/// Movement of one endpoint over the common window, per axis. An axis
/// absent at either end contributes no movement.
struct Movement {
    dx: f64,
    dy: f64,
    dz: f64,
}

fn axis_movement(first: Option<f64>, last: Option<f64>) -> f64 {
    match (first, last) {
        (Some(a), Some(b)) => b - a,
        _ => 0.0,
    }
}

fn movement_over(first: &Observation, last: &Observation) -> Movement {
    Movement {
        dx: axis_movement(first.x, last.x),
        dy: axis_movement(first.y, last.y),
        dz: axis_movement(first.z, last.z),
    }
}

fn compute_grade(
    p1: &ControlPoint,
    p2: &ControlPoint,
    plane_distance: f64,
    range: &TemporalRange,
) -> Option<Grade> {
    let series1 = p1.series().filtered(range);
    let series2 = p2.series().filtered(range);

    let common_dates: Vec<NaiveDate> = series1
        .iter()
        .merge_join_by(series2.iter(), |a, b| a.date.cmp(&b.date))
        .filter_map(|joined| match joined {
            Both(a, _) => Some(a.date),
            Left(_) | Right(_) => None,
        })
        .collect();
    if common_dates.len() < 2 {
        return None;
    }

    let window_start = *common_dates.first()?;
    let window_end = *common_dates.last()?;
    let movement1 = movement_over(
        p1.series().at_date(window_start)?,
        p1.series().at_date(window_end)?,
    );
    let movement2 = movement_over(
        p2.series().at_date(window_start)?,
        p2.series().at_date(window_end)?,
    );

    // Relative movement of P1 against P2; baselines cancel in differences.
    let height_rel = movement1.dz - movement2.dz;
    let plane_rel = (movement1.dx - movement2.dx).hypot(movement1.dy - movement2.dy);
    let sign = if height_rel < 0.0 { -1.0 } else { 1.0 };
    let resultant_rel = height_rel.hypot(plane_rel) * sign;

    let scale = 1000.0 / plane_distance;
    let differential = Differential {
        height_per_mille: height_rel * scale,
        plane_per_mille: plane_rel * scale,
        resultant_per_mille: resultant_rel * scale,
        resultant_abs: (resultant_rel * scale).abs(),
    };

    let baseline1 = p1.baseline()?;
    let baseline2 = p2.baseline()?;
    let height_distance = match (baseline1.z0, baseline2.z0) {
        (Some(a), Some(b)) => (a - b).abs(),
        _ => 0.0,
    };

    Some(Grade {
        p1: p1.name.clone(),
        p2: p2.name.clone(),
        plane_distance,
        height_distance,
        resultant_distance: plane_distance.hypot(height_distance),
        common_dates,
        differential,
        position: p1.position.midpoint_to(&p2.position),
    })
}
