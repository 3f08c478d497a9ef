/// Control point data structures and baseline resolution
use crate::{
    geo::{GeoPoint, PlanarPosition},
    observation::{Observation, ObservationSeries},
    temporal::TemporalRange,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a point's data model carries height-only, planar-only, or full
/// 3D information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    OneD,
    TwoD,
    ThreeD,
}

impl Dimension {
    /// Parse the source-file dimension tag ("1d", "2d", "3d").
    pub fn parse(tag: &str) -> Option<Dimension> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "1d" => Some(Dimension::OneD),
            "2d" => Some(Dimension::TwoD),
            "3d" => Some(Dimension::ThreeD),
            _ => None,
        }
    }
}

/// Monitoring point variants over the shared core record.
///
/// Kind-specific derived values are computed by free functions over this
/// variant rather than virtual overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointKind {
    Topographic,
    Groundwater {
        /// Collar elevation of the piezometer, in the height datum
        ground_elevation: f64,
        sensor_depth: f64,
    },
    Extensometer {
        sensor_depth: f64,
    },
    Inclinometer {
        sensor_depth: f64,
        /// Sensor A-axis azimuth in degrees from north
        azimuth_deg: f64,
    },
}

impl PointKind {
    /// Stable discriminant for grouping and source-file naming.
    pub fn tag(&self) -> &'static str {
        match self {
            PointKind::Topographic => "topographic",
            PointKind::Groundwater { .. } => "groundwater",
            PointKind::Extensometer { .. } => "extensometer",
            PointKind::Inclinometer { .. } => "inclinometer",
        }
    }

    pub fn matches_tag(&self, tag: &str) -> bool {
        self.tag() == tag
    }
}

/// The zero-reference snapshot displacement is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub x0: Option<f64>,
    pub y0: Option<f64>,
    pub z0: Option<f64>,
    pub date0: NaiveDate,
}

impl Baseline {
    fn from_observation(obs: &Observation) -> Self {
        Baseline {
            x0: obs.x,
            y0: obs.y,
            z0: obs.z,
            date0: obs.date,
        }
    }
}

/// A fixed physical monitoring location owning its observation series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Unique name, the registry key
    pub name: String,
    pub position: GeoPoint,
    /// Planar projected position for metric distance work, when available
    pub planar: Option<PlanarPosition>,
    pub dimension: Dimension,
    /// Expected days between measurements
    pub frequency_days: u32,
    /// Alarm threshold reference for the height axis, by name
    pub alarm_height: Option<String>,
    /// Alarm threshold reference for the plane axis, by name
    pub alarm_plane: Option<String>,
    pub kind: PointKind,
    series: ObservationSeries,
    baseline: Option<Baseline>,
}

impl ControlPoint {
    pub fn new(
        name: impl Into<String>,
        position: GeoPoint,
        planar: Option<PlanarPosition>,
        dimension: Dimension,
        frequency_days: u32,
        kind: PointKind,
    ) -> Self {
        ControlPoint {
            name: name.into(),
            position,
            planar,
            dimension,
            frequency_days,
            alarm_height: None,
            alarm_plane: None,
            kind,
            series: ObservationSeries::new(),
            baseline: None,
        }
    }

    pub fn series(&self) -> &ObservationSeries {
        &self.series
    }

    /// Append an observation in date order; duplicate dates are rejected.
    /// Any cached baseline is dropped so the next resolution sees the new
    /// series contents.
    pub fn add_observation(&mut self, observation: Observation) -> crate::error::Result<()> {
        self.series.insert(&self.name, observation)?;
        self.baseline = None;
        Ok(())
    }

    /// The cached zero-reference, if resolution has run.
    pub fn baseline(&self) -> Option<Baseline> {
        self.baseline
    }

    /// Resolve and cache the zero-reference baseline.
    ///
    /// The first observation flagged `is_zero_measurement` wins; with no
    /// flagged observation the chronologically first one is the baseline.
    /// Runs once per load; re-run after reloading observations, never after
    /// a mere filter change.
    pub fn resolve_baseline(&mut self) -> Option<Baseline> {
        let raw = self.series.as_slice();
        let chosen = raw
            .iter()
            .find(|obs| obs.is_zero_measurement)
            .or_else(|| raw.first());
        self.baseline = chosen.map(Baseline::from_observation);
        self.baseline
    }

    /// Displacement of an observation against the baseline on the height axis.
    pub fn height_displacement(&self, obs: &Observation) -> Option<f64> {
        let baseline = self.baseline?;
        Some(obs.z? - baseline.z0?)
    }

    /// Planar displacement magnitude of an observation against the baseline.
    pub fn plane_displacement(&self, obs: &Observation) -> Option<f64> {
        let baseline = self.baseline?;
        let dx = obs.x? - baseline.x0?;
        let dy = obs.y? - baseline.y0?;
        Some(dx.hypot(dy))
    }

    /// Current displacement for an axis: the latest time-filtered
    /// observation against the baseline. 0.0 with no data or no baseline.
    pub fn current_displacement(&self, axis: crate::alarm::Axis, range: &TemporalRange) -> f64 {
        let latest = match self.series.filtered(range).last() {
            Some(obs) => obs,
            None => return 0.0,
        };
        let displacement = match axis {
            crate::alarm::Axis::Height => self.height_displacement(latest),
            crate::alarm::Axis::Plane => self.plane_displacement(latest),
        };
        displacement.unwrap_or(0.0)
    }
}

/// Groundwater level for a piezometer reading: collar elevation minus the
/// recorded depth to water (the observation's z axis).
pub fn groundwater_level(point: &ControlPoint, obs: &Observation) -> Option<f64> {
    match point.kind {
        PointKind::Groundwater {
            ground_elevation, ..
        } => Some(ground_elevation - obs.z?),
        _ => None,
    }
}

/// Extensometer elongation: height-axis movement against the baseline.
pub fn extensometer_elongation(point: &ControlPoint, obs: &Observation) -> Option<f64> {
    match point.kind {
        PointKind::Extensometer { .. } => point.height_displacement(obs),
        _ => None,
    }
}

/// Inclinometer deflection: planar displacement projected onto the sensor
/// A-axis azimuth.
pub fn inclinometer_deflection(point: &ControlPoint, obs: &Observation) -> Option<f64> {
    match point.kind {
        PointKind::Inclinometer { azimuth_deg, .. } => {
            let baseline = point.baseline()?;
            let dx = obs.x? - baseline.x0?;
            let dy = obs.y? - baseline.y0?;
            let azimuth = azimuth_deg.to_radians();
            Some(dx * azimuth.sin() + dy * azimuth.cos())
        }
        _ => None,
    }
}
