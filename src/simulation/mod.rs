//! Standalone intersection simulation module
//!
//! This module contains all the core simulation logic that can run
//! independently of the Bevy game engine. It can be tested via console
//! without needing to boot up the full game.

mod config;
mod geometry;
mod lane_queue;
mod path;
mod record;
mod safety;
mod spawner;
mod stats;
mod stepper;
mod traffic_light;
mod types;
mod vehicle;
mod world;

pub use config::{LightPolicy, SimConfig};
pub use geometry::IntersectionGeometry;
pub use lane_queue::{LaneQueue, DEFAULT_PRIORITY_THRESHOLD, DEFAULT_QUEUE_CAPACITY};
pub use path::{assign_path, paths_compatible, turn_of, RandomTurns, TurnChooser};
pub use record::{
    append_record, format_record, ingest_file, parse_record, IngestBatch, VehicleRecord,
    RECORD_FIELDS,
};
pub use safety::{SafetyChecker, EMERGENCY_DISTANCE_MULTIPLIER, SAFE_DISTANCE};
pub use spawner::{generate_vehicle, random_vehicle, VehicleSpawner};
pub use stats::SimStats;
pub use stepper::{IntersectionStepper, StepReport};
pub use traffic_light::TrafficLightController;
pub use types::{
    queue_index, queue_index_from_codes, Direction, LanePosition, Position, Turn, VehicleId,
    VehicleType, DIRECTION_COUNT, LANES_PER_DIRECTION, QUEUE_COUNT,
};
pub use vehicle::SimVehicle;
pub use world::{RenderFrame, SimWorld, VehicleView};
