/// Error types for the Butterfly monitoring core
use crate::alarm::Axis;
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for monitoring-core operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// Two observations for one point share a date; rejected at ingestion
    #[error("Duplicate observation date {date} for point {point}")]
    DuplicateTimestamp { point: String, date: NaiveDate },

    /// Temporal filter bounds are inverted; the previous range is retained
    #[error("Invalid temporal range: low {low} is after high {high}")]
    InvalidRange { low: NaiveDate, high: NaiveDate },

    /// A point references an alarm name that is not registered
    #[error("Point {point} references unresolved alarm {alarm}")]
    UnresolvedAlarm { point: String, alarm: String },

    /// A point carries no alarm reference (or no breaks) for the requested axis
    #[error("Point {point} has no alarm configured for the {axis} axis")]
    MissingAlarmReference { point: String, axis: Axis },

    /// An alarm's break levels are not monotonically ordered
    #[error("Malformed alarm configuration for {alarm}: {reason}")]
    MalformedAlarmConfiguration { alarm: String, reason: String },

    /// A facade operation addressed a point name the registry does not hold
    #[error("Unknown control point: {name}")]
    UnknownPoint { name: String },
}

/// Type alias for Results using MonitorError
pub type Result<T> = std::result::Result<T, MonitorError>;
