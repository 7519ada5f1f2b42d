//! Serialized vehicle records exchanged with external producers
//!
//! One vehicle per line, fourteen comma-separated fields, no header:
//! `id,type,startDirection,endDirection,startLane,endLane,x,y,speed,turnAngle,turning,progress,waitTime,passedIntersection`

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use super::types::{
    queue_index_from_codes, Direction, LanePosition, Position, VehicleId, VehicleType,
};
use super::vehicle::SimVehicle;

/// Flat, integer-coded form of a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: u32,
    pub vehicle_type: u8,
    pub start_direction: u8,
    pub end_direction: u8,
    pub start_lane: u8,
    pub end_lane: u8,
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub turn_angle: f32,
    pub turning: u8,
    pub progress: f32,
    pub wait_time: u32,
    pub passed_intersection: u8,
}

impl VehicleRecord {
    /// Queue the record asks to be admitted to, `None` for out-of-range codes
    pub fn start_queue(&self) -> Option<usize> {
        queue_index_from_codes(self.start_direction, self.start_lane)
    }
}

fn flag(value: u8, field: &str) -> Result<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => bail!("{} must be 0 or 1, got {}", field, other),
    }
}

impl From<&SimVehicle> for VehicleRecord {
    fn from(vehicle: &SimVehicle) -> Self {
        Self {
            id: vehicle.id.0,
            vehicle_type: vehicle.vehicle_type.code(),
            start_direction: vehicle.start_direction.index() as u8,
            end_direction: vehicle.end_direction.index() as u8,
            start_lane: vehicle.start_lane.index() as u8,
            end_lane: vehicle.end_lane.index() as u8,
            x: vehicle.position.x,
            y: vehicle.position.y,
            speed: vehicle.speed,
            turn_angle: vehicle.turn_angle,
            turning: vehicle.turning as u8,
            progress: vehicle.progress,
            wait_time: vehicle.wait_time,
            passed_intersection: vehicle.passed_intersection as u8,
        }
    }
}

impl TryFrom<&VehicleRecord> for SimVehicle {
    type Error = anyhow::Error;

    fn try_from(record: &VehicleRecord) -> Result<Self> {
        let vehicle_type = VehicleType::try_from(record.vehicle_type)?;
        let start_direction =
            Direction::try_from(record.start_direction).context("start direction")?;
        let end_direction = Direction::try_from(record.end_direction).context("end direction")?;
        let start_lane = LanePosition::try_from(record.start_lane).context("start lane")?;
        let end_lane = LanePosition::try_from(record.end_lane).context("end lane")?;

        if !(record.speed.is_finite() && record.speed >= 0.0) {
            bail!("speed {} is not a valid speed", record.speed);
        }
        if !(0.0..=1.0).contains(&record.progress) {
            bail!("progress {} outside [0, 1]", record.progress);
        }
        if !(record.x.is_finite() && record.y.is_finite()) {
            bail!("position ({}, {}) is not finite", record.x, record.y);
        }

        Ok(SimVehicle {
            id: VehicleId(record.id),
            vehicle_type,
            start_direction,
            start_lane,
            end_direction,
            end_lane,
            position: Position::new(record.x, record.y),
            speed: record.speed,
            turn_angle: record.turn_angle,
            turning: flag(record.turning, "turning")?,
            progress: record.progress,
            wait_time: record.wait_time,
            is_priority_lane: false,
            passed_intersection: flag(record.passed_intersection, "passedIntersection")?,
        })
    }
}

/// Number of comma-separated fields in a record line
pub const RECORD_FIELDS: usize = 14;

/// Decode one CSV row, insisting on exactly [`RECORD_FIELDS`] fields
fn decode(row: &csv::StringRecord) -> Result<VehicleRecord> {
    if row.len() != RECORD_FIELDS {
        bail!("expected {} fields, got {}", RECORD_FIELDS, row.len());
    }
    row.deserialize::<VehicleRecord>(None)
        .context("invalid field value")
}

/// Parse a single record line
pub fn parse_record(line: &str) -> Result<VehicleRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(row) => {
            let row = row.with_context(|| format!("malformed vehicle record: {:?}", line))?;
            decode(&row).with_context(|| format!("malformed vehicle record: {:?}", line))
        }
        None => bail!("empty vehicle record"),
    }
}

/// Render a record as a single line without the trailing newline
pub fn format_record(record: &VehicleRecord) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.serialize(record)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush record: {}", e.error()))?;
    let line = String::from_utf8(bytes).context("Record is not valid UTF-8")?;
    Ok(line.trim_end().to_string())
}

/// Records read from a vehicle file in one pass
#[derive(Debug, Clone, Default)]
pub struct IngestBatch {
    pub records: Vec<VehicleRecord>,
    /// Lines that could not be parsed and were skipped
    pub malformed: usize,
}

/// Read every record from `path`, then truncate the file.
///
/// Each line is delivered at most once. A missing file is an empty batch.
pub fn ingest_file(path: &Path) -> Result<IngestBatch> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(IngestBatch::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to open {}", path.display()));
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut batch = IngestBatch::default();
    for (line, result) in reader.records().enumerate() {
        let decoded = match result {
            Ok(row) => decode(&row),
            Err(e) if e.is_io_error() => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
            Err(e) => Err(e.into()),
        };
        match decoded {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                batch.malformed += 1;
                warn!("Skipping malformed record on line {}: {:#}", line + 1, e);
            }
        }
    }

    File::create(path).with_context(|| format!("Failed to truncate {}", path.display()))?;
    Ok(batch)
}

/// Append one record to `path`, creating the file if needed
pub fn append_record(path: &Path, record: &VehicleRecord) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {} for append", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer
        .serialize(record)
        .with_context(|| format!("Failed to write record {}", record.id))?;
    writer.flush()?;
    Ok(())
}
