//! CSV source loading for Butterfly monitoring networks.
//!
//! Each loader function parses CSV data from a string slice and feeds the
//! registry; `load_butterfly` walks a source directory and runs the whole
//! ingestion: alarms, then points and observations per kind, then baseline
//! resolution and the initial temporal range.
//!
//! # CSV Formats
//!
//! - **Alarms** (has headers):
//!   `NAME,HEIGHT_WARNING,HEIGHT_ACTION,PLANE_WARNING,PLANE_ACTION`
//! - **Points** (has headers, one file per kind, e.g. `topographic.csv`):
//!   `NAME,LAT,LON,X,Y,Z,DIMENSION,FREQUENCY_DAYS,ALARM_HEIGHT,ALARM_PLANE[,extras]`
//!   where the kind-specific extras are: groundwater
//!   `GROUND_ELEVATION,SENSOR_DEPTH`; extensometer `SENSOR_DEPTH`;
//!   inclinometer `SENSOR_DEPTH,AZIMUTH`
//! - **Observations** (no headers, e.g. `topographic_observations.csv`):
//!   `NAME,DATE(YYYYMMDD),X,Y,Z,ZERO,REPL,OPERATOR,INSTRUMENT`
//!
//! Empty numeric fields mean "absent"; flag fields accept `1`/`true`/`yes`.
//! Timestamps must be unique per point; violations are recorded in the
//! [`LoadReport`] and the row skipped.

mod error;
mod report;

pub use error::{LoaderError, Result};
pub use report::{LoadFailure, LoadReport};

use bfly_core::{
    alarm::{Alarm, Breaks},
    control_point::{ControlPoint, Dimension, PointKind},
    geo::{GeoPoint, PlanarPosition},
    observation::Observation,
    registry::Butterfly,
};
use bfly_utils::{dates, fields};
use csv::{ReaderBuilder, StringRecord};
use std::fs;
use std::path::Path;

/// Point kinds in the order their source files are loaded.
pub const POINT_KINDS: [&str; 4] = [
    "topographic",
    "groundwater",
    "extensometer",
    "inclinometer",
];

/// A populated registry plus the aggregate report of what was skipped.
#[derive(Debug)]
pub struct LoadOutcome {
    pub butterfly: Butterfly,
    pub report: LoadReport,
}

/// Load a monitoring network from a source directory.
///
/// Missing source files are skipped (a site rarely carries every point
/// kind). Bad rows are skipped and recorded, never fatal. After ingestion
/// the baselines are resolved and the temporal filter initialized to the
/// min/max observation dates.
pub fn load_butterfly(dir: &Path) -> anyhow::Result<LoadOutcome> {
    let mut butterfly = Butterfly::new();
    let mut report = LoadReport::default();

    let alarms_path = dir.join("alarms.csv");
    if alarms_path.is_file() {
        let data = fs::read_to_string(&alarms_path)?;
        load_alarms_str(&mut butterfly, &data, &mut report);
    } else {
        log::debug!("loader: no alarms.csv under {}", dir.display());
    }

    for kind in POINT_KINDS {
        let points_path = dir.join(format!("{kind}.csv"));
        if points_path.is_file() {
            let data = fs::read_to_string(&points_path)?;
            load_points_str(&mut butterfly, kind, &data, &mut report);
        }
        let observations_path = dir.join(format!("{kind}_observations.csv"));
        if observations_path.is_file() {
            let data = fs::read_to_string(&observations_path)?;
            load_observations_str(&mut butterfly, kind, &data, &mut report);
        }
    }

    butterfly.resolve_baselines();
    butterfly.reset_temporal_range();

    log::info!(
        "loader: {} alarms, {} points, {} observations loaded, {} records skipped",
        report.alarms_loaded,
        report.points_loaded,
        report.observations_loaded,
        report.failures.len()
    );
    Ok(LoadOutcome { butterfly, report })
}

/// Load alarm definitions from CSV data.
///
/// Expected format (with headers):
/// `NAME,HEIGHT_WARNING,HEIGHT_ACTION,PLANE_WARNING,PLANE_ACTION`
pub fn load_alarms_str(butterfly: &mut Butterfly, csv_data: &str, report: &mut LoadReport) {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    for (index, result) in rdr.records().enumerate() {
        let record_number = index as u64 + 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                report.record_failure("alarms", record_number, e);
                continue;
            }
        };
        match alarm_from_record(&record) {
            Ok(alarm) => match butterfly.alarms_mut().register(alarm) {
                Ok(()) => report.alarms_loaded += 1,
                Err(e) => report.record_failure("alarms", record_number, e),
            },
            Err(e) => report.record_failure("alarms", record_number, e),
        }
    }
    log::info!("loader: {} alarms registered", report.alarms_loaded);
}

/// Load control point definitions of one kind from CSV data.
pub fn load_points_str(
    butterfly: &mut Butterfly,
    kind_tag: &str,
    csv_data: &str,
    report: &mut LoadReport,
) {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let mut count = 0u32;
    for (index, result) in rdr.records().enumerate() {
        let record_number = index as u64 + 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                report.record_failure(kind_tag, record_number, e);
                continue;
            }
        };
        match point_from_record(kind_tag, &record) {
            Ok(point) => {
                butterfly.insert_point(point);
                count += 1;
            }
            Err(e) => report.record_failure(kind_tag, record_number, e),
        }
    }
    report.points_loaded += count;
    log::info!("loader: {} {} points loaded", count, kind_tag);
}

/// Load observations from CSV data (no headers); rows address points by
/// name, `source_tag` only labels failures.
pub fn load_observations_str(
    butterfly: &mut Butterfly,
    source_tag: &str,
    csv_data: &str,
    report: &mut LoadReport,
) {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let mut count = 0u32;
    let mut skipped = 0u32;
    for (index, result) in rdr.records().enumerate() {
        let record_number = index as u64 + 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                report.record_failure(source_tag, record_number, e);
                skipped += 1;
                continue;
            }
        };
        let (name, observation) = match observation_from_record(&record) {
            Ok(parsed) => parsed,
            Err(e) => {
                report.record_failure(source_tag, record_number, e);
                skipped += 1;
                continue;
            }
        };
        match butterfly.add_observation(&name, observation) {
            Ok(()) => count += 1,
            Err(e) => {
                report.record_failure(source_tag, record_number, e);
                skipped += 1;
            }
        }
    }
    report.observations_loaded += count;
    log::info!(
        "loader: {} observations loaded from {}, {} skipped",
        count,
        source_tag,
        skipped
    );
}

fn field<'r>(record: &'r StringRecord, index: usize) -> &'r str {
    record.get(index).unwrap_or("").trim()
}

fn required_f64(record: &StringRecord, index: usize, what: &str) -> Result<f64> {
    field(record, index)
        .parse::<f64>()
        .map_err(|_| LoaderError::InvalidRow(format!("missing or non-numeric {what}")))
}

fn optional_breaks(record: &StringRecord, warning_index: usize) -> Result<Option<Breaks>> {
    let warning = fields::parse_optional_f64(field(record, warning_index))
        .map_err(|e| LoaderError::InvalidRow(e.to_string()))?;
    let action = fields::parse_optional_f64(field(record, warning_index + 1))
        .map_err(|e| LoaderError::InvalidRow(e.to_string()))?;
    match warning {
        Some(warning) => Ok(Some(Breaks { warning, action })),
        None if action.is_some() => Err(LoaderError::InvalidRow(
            "action break without a warning break".to_string(),
        )),
        None => Ok(None),
    }
}

fn alarm_from_record(record: &StringRecord) -> Result<Alarm> {
    let name = field(record, 0);
    if name.is_empty() {
        return Err(LoaderError::InvalidRow("empty alarm name".to_string()));
    }
    Ok(Alarm {
        name: name.to_string(),
        height: optional_breaks(record, 1)?,
        plane: optional_breaks(record, 3)?,
    })
}

fn kind_from_record(kind_tag: &str, record: &StringRecord) -> Result<PointKind> {
    match kind_tag {
        "topographic" => Ok(PointKind::Topographic),
        "groundwater" => Ok(PointKind::Groundwater {
            ground_elevation: required_f64(record, 10, "GROUND_ELEVATION")?,
            sensor_depth: required_f64(record, 11, "SENSOR_DEPTH")?,
        }),
        "extensometer" => Ok(PointKind::Extensometer {
            sensor_depth: required_f64(record, 10, "SENSOR_DEPTH")?,
        }),
        "inclinometer" => Ok(PointKind::Inclinometer {
            sensor_depth: required_f64(record, 10, "SENSOR_DEPTH")?,
            azimuth_deg: required_f64(record, 11, "AZIMUTH")?,
        }),
        other => Err(LoaderError::InvalidRow(format!(
            "unknown point kind: {other}"
        ))),
    }
}

fn point_from_record(kind_tag: &str, record: &StringRecord) -> Result<ControlPoint> {
    let name = field(record, 0);
    if name.is_empty() {
        return Err(LoaderError::InvalidRow("empty point name".to_string()));
    }
    let lat = required_f64(record, 1, "LAT")?;
    let lon = required_f64(record, 2, "LON")?;
    let x = fields::parse_optional_f64(field(record, 3))
        .map_err(|e| LoaderError::InvalidRow(e.to_string()))?;
    let y = fields::parse_optional_f64(field(record, 4))
        .map_err(|e| LoaderError::InvalidRow(e.to_string()))?;
    let z = fields::parse_optional_f64(field(record, 5))
        .map_err(|e| LoaderError::InvalidRow(e.to_string()))?;
    let planar = match (x, y) {
        (Some(x), Some(y)) => Some(PlanarPosition::new(x, y, z)),
        _ => None,
    };
    let dimension = Dimension::parse(field(record, 6))
        .ok_or_else(|| LoaderError::InvalidRow(format!("bad dimension tag: {}", field(record, 6))))?;
    let frequency_days = field(record, 7)
        .parse::<u32>()
        .map_err(|_| LoaderError::InvalidRow("missing or non-numeric FREQUENCY_DAYS".to_string()))?;
    let kind = kind_from_record(kind_tag, record)?;

    let mut point = ControlPoint::new(
        name,
        GeoPoint::new(lat, lon),
        planar,
        dimension,
        frequency_days,
        kind,
    );
    let alarm_height = field(record, 8);
    if !alarm_height.is_empty() {
        point.alarm_height = Some(alarm_height.to_string());
    }
    let alarm_plane = field(record, 9);
    if !alarm_plane.is_empty() {
        point.alarm_plane = Some(alarm_plane.to_string());
    }
    Ok(point)
}

fn observation_from_record(record: &StringRecord) -> Result<(String, Observation)> {
    let name = field(record, 0);
    if name.is_empty() {
        return Err(LoaderError::InvalidRow("empty point name".to_string()));
    }
    let date = dates::parse_date_lenient(field(record, 1))
        .map_err(|e| LoaderError::InvalidRow(format!("bad date: {e}")))?;
    let x = fields::parse_optional_f64(field(record, 2))
        .map_err(|e| LoaderError::InvalidRow(e.to_string()))?;
    let y = fields::parse_optional_f64(field(record, 3))
        .map_err(|e| LoaderError::InvalidRow(e.to_string()))?;
    let z = fields::parse_optional_f64(field(record, 4))
        .map_err(|e| LoaderError::InvalidRow(e.to_string()))?;

    let mut observation = Observation::new(date, x, y, z)
        .with_zero_flag(fields::parse_flag(field(record, 5)))
        .with_replacement_flag(fields::parse_flag(field(record, 6)));
    let operator = field(record, 7);
    if !operator.is_empty() {
        observation.operator = Some(operator.to_string());
    }
    let instrument = field(record, 8);
    if !instrument.is_empty() {
        observation.instrument = Some(instrument.to_string());
    }
    Ok((name.to_string(), observation))
}
