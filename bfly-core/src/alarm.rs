/// Alarm threshold definitions and severity classification
use crate::{
    control_point::ControlPoint,
    error::{MonitorError, Result},
    temporal::TemporalRange,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The axis a classification runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Height,
    Plane,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Height => write!(f, "height"),
            Axis::Plane => write!(f, "plane"),
        }
    }
}

/// Discrete severity levels, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Nominal,
    Warning,
    Action,
}

/// One or two ordered break levels for a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breaks {
    pub warning: f64,
    pub action: Option<f64>,
}

impl Breaks {
    /// Classify a displacement magnitude; the highest break exceeded wins.
    pub fn classify(&self, magnitude: f64) -> Severity {
        if let Some(action) = self.action {
            if magnitude >= action {
                return Severity::Action;
            }
        }
        if magnitude >= self.warning {
            Severity::Warning
        } else {
            Severity::Nominal
        }
    }
}

/// A named threshold definition, independent of any single point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub name: String,
    pub height: Option<Breaks>,
    pub plane: Option<Breaks>,
}

impl Alarm {
    pub fn breaks_for(&self, axis: Axis) -> Option<Breaks> {
        match axis {
            Axis::Height => self.height,
            Axis::Plane => self.plane,
        }
    }

    /// Validate break ordering. Misconfiguration is a load-time error, not a
    /// classification-time one.
    fn validate(&self) -> Result<()> {
        if self.height.is_none() && self.plane.is_none() {
            return Err(MonitorError::MalformedAlarmConfiguration {
                alarm: self.name.clone(),
                reason: "no break levels on either axis".to_string(),
            });
        }
        for (axis, breaks) in [(Axis::Height, self.height), (Axis::Plane, self.plane)] {
            let Some(breaks) = breaks else { continue };
            if breaks.warning <= 0.0 {
                return Err(MonitorError::MalformedAlarmConfiguration {
                    alarm: self.name.clone(),
                    reason: format!("{axis} warning break {} is not positive", breaks.warning),
                });
            }
            if let Some(action) = breaks.action {
                if action <= breaks.warning {
                    return Err(MonitorError::MalformedAlarmConfiguration {
                        alarm: self.name.clone(),
                        reason: format!(
                            "{axis} breaks not ascending: warning {} >= action {}",
                            breaks.warning, action
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Name-keyed registry of alarm definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmTable {
    alarms: BTreeMap<String, Alarm>,
}

impl AlarmTable {
    pub fn new() -> Self {
        AlarmTable {
            alarms: BTreeMap::new(),
        }
    }

    /// Register an alarm, validating its break ordering.
    pub fn register(&mut self, alarm: Alarm) -> Result<()> {
        alarm.validate()?;
        self.alarms.insert(alarm.name.clone(), alarm);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<&Alarm> {
        self.alarms.get(name)
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}

/// Classify a point's current displacement on an axis against its named
/// alarm.
///
/// A dangling alarm reference fails with `UnresolvedAlarm`; a point with no
/// reference for the axis, or whose alarm defines no breaks for it, fails
/// with `MissingAlarmReference`. Never silently defaults: the result colors
/// safety-relevant displays.
pub fn classify(
    point: &ControlPoint,
    axis: Axis,
    alarms: &AlarmTable,
    range: &TemporalRange,
) -> Result<Severity> {
    let reference = match axis {
        Axis::Height => point.alarm_height.as_deref(),
        Axis::Plane => point.alarm_plane.as_deref(),
    };
    let Some(name) = reference else {
        return Err(MonitorError::MissingAlarmReference {
            point: point.name.clone(),
            axis,
        });
    };
    let alarm = alarms
        .resolve(name)
        .ok_or_else(|| MonitorError::UnresolvedAlarm {
            point: point.name.clone(),
            alarm: name.to_string(),
        })?;
    let Some(breaks) = alarm.breaks_for(axis) else {
        return Err(MonitorError::MissingAlarmReference {
            point: point.name.clone(),
            axis,
        });
    };
    let magnitude = point.current_displacement(axis, range).abs();
    Ok(breaks.classify(magnitude))
}
