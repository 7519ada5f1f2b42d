//! Vehicle record codec and file ingestion tests

use std::fs;
use std::path::PathBuf;

use intersection_sim::simulation::{
    append_record, format_record, ingest_file, parse_record, Direction, LanePosition, Position,
    SimVehicle, VehicleId, VehicleRecord, VehicleType, RECORD_FIELDS,
};

const SAMPLE: &str = "12,1,0,3,0,2,415.0,620.0,3.0,0.0,1,0.0,0,0";

fn temp_file(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "intersection_sim_{}_{}.csv",
        name,
        std::process::id()
    ));
    let _ = fs::remove_file(&path);
    path
}

#[test]
fn test_parse_record_fields() {
    let record = parse_record(SAMPLE).unwrap();
    assert_eq!(record.id, 12);
    assert_eq!(record.vehicle_type, 1);
    assert_eq!(record.start_direction, 0);
    assert_eq!(record.end_direction, 3);
    assert_eq!(record.start_lane, 0);
    assert_eq!(record.end_lane, 2);
    assert_eq!(record.x, 415.0);
    assert_eq!(record.y, 620.0);
    assert_eq!(record.speed, 3.0);
    assert_eq!(record.turning, 1);
    assert_eq!(record.start_queue(), Some(0));

    let vehicle = SimVehicle::try_from(&record).unwrap();
    assert_eq!(vehicle.id, VehicleId(12));
    assert_eq!(vehicle.vehicle_type, VehicleType::Ambulance);
    assert_eq!(vehicle.start_direction, Direction::North);
    assert_eq!(vehicle.end_direction, Direction::West);
    assert_eq!(vehicle.end_lane, LanePosition::Right);
    assert!(vehicle.turning);
    assert!(!vehicle.passed_intersection);
}

#[test]
fn test_parse_record_tolerates_spaces() {
    let spaced = SAMPLE.replace(',', ", ");
    assert_eq!(parse_record(&spaced).unwrap(), parse_record(SAMPLE).unwrap());
}

#[test]
fn test_parse_record_rejects_malformed_lines() {
    assert!(parse_record("").is_err());
    assert!(parse_record("garbage").is_err());
    assert!(parse_record("1,0,0,3").is_err());
    assert!(parse_record("x,0,0,3,0,2,415.0,620.0,3.0,0.0,1,0.0,0,0").is_err());
}

#[test]
fn test_parse_record_requires_exact_field_count() {
    assert_eq!(SAMPLE.split(',').count(), RECORD_FIELDS);

    // Last field missing
    let short = SAMPLE.rsplit_once(',').map(|(head, _)| head).unwrap();
    assert_eq!(short.split(',').count(), RECORD_FIELDS - 1);
    assert!(parse_record(short).is_err());

    // Trailing extra field
    let long = format!("{},7", SAMPLE);
    assert!(parse_record(&long).is_err());
    assert!(parse_record(&format!("{},", SAMPLE)).is_err());
}

#[test]
fn test_out_of_range_codes_are_rejected() {
    let mut record = parse_record(SAMPLE).unwrap();
    record.start_direction = 4;
    assert_eq!(record.start_queue(), None);
    assert!(SimVehicle::try_from(&record).is_err());

    let mut record = parse_record(SAMPLE).unwrap();
    record.vehicle_type = 9;
    assert!(SimVehicle::try_from(&record).is_err());

    let mut record = parse_record(SAMPLE).unwrap();
    record.passed_intersection = 2;
    assert!(SimVehicle::try_from(&record).is_err());

    let mut record = parse_record(SAMPLE).unwrap();
    record.progress = 1.5;
    assert!(SimVehicle::try_from(&record).is_err());
}

#[test]
fn test_format_record_matches_wire_layout() {
    let mut vehicle = SimVehicle::new(
        VehicleId(3),
        VehicleType::FireTruck,
        Direction::South,
        LanePosition::Center,
        Position::new(385.0, -20.0),
        3.0,
    );
    vehicle.end_direction = Direction::West;
    vehicle.end_lane = LanePosition::Right;
    vehicle.turning = true;

    let line = format_record(&VehicleRecord::from(&vehicle)).unwrap();
    assert_eq!(line.split(',').count(), 14);
    assert!(line.starts_with("3,3,2,3,1,2,"));
    assert!(!line.ends_with('\n'));

    let back = SimVehicle::try_from(&parse_record(&line).unwrap()).unwrap();
    assert_eq!(back, vehicle);
}

#[test]
fn test_ingest_file_drains_and_truncates() {
    let path = temp_file("drain");
    fs::write(
        &path,
        format!("{}\nnot,a,record\n{}\n", SAMPLE, SAMPLE.replacen("12", "13", 1)),
    )
    .unwrap();

    let batch = ingest_file(&path).unwrap();
    assert_eq!(batch.records.len(), 2);
    assert_eq!(batch.malformed, 1);
    assert_eq!(batch.records[1].id, 13);

    // Each line is delivered once
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    let again = ingest_file(&path).unwrap();
    assert!(again.records.is_empty());
    assert_eq!(again.malformed, 0);

    fs::remove_file(&path).unwrap();
}

#[test]
fn test_ingest_file_counts_wrong_width_lines_as_malformed() {
    let path = temp_file("width");
    let short = SAMPLE.rsplit_once(',').map(|(head, _)| head).unwrap();
    fs::write(
        &path,
        format!("{}\n{},0\n{},0,0\n{}\n", short, SAMPLE, SAMPLE, SAMPLE),
    )
    .unwrap();

    let batch = ingest_file(&path).unwrap();
    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.records[0].id, 12);
    assert_eq!(batch.malformed, 3);
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);

    fs::remove_file(&path).unwrap();
}

#[test]
fn test_missing_file_is_empty_batch() {
    let path = temp_file("missing");
    let batch = ingest_file(&path).unwrap();
    assert!(batch.records.is_empty());
    assert!(!path.exists());
}

#[test]
fn test_append_then_ingest() {
    let path = temp_file("append");
    let first = parse_record(SAMPLE).unwrap();
    let mut second = first.clone();
    second.id = 99;
    second.vehicle_type = 0;

    append_record(&path, &first).unwrap();
    append_record(&path, &second).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);

    let batch = ingest_file(&path).unwrap();
    assert_eq!(batch.records, vec![first, second]);

    fs::remove_file(&path).unwrap();
}
