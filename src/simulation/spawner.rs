//! Vehicle generation at the map edges

use log::debug;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::config::SimConfig;
use super::geometry::IntersectionGeometry;
use super::lane_queue::LaneQueue;
use super::path::{assign_path, RandomTurns};
use super::safety::SafetyChecker;
use super::types::{
    queue_index, Direction, LanePosition, VehicleId, VehicleType, LANES_PER_DIRECTION,
};
use super::vehicle::SimVehicle;

/// Speed of emergency vehicles
pub const EMERGENCY_SPEED: f32 = 3.0;

/// Base speed of regular vehicles, a random 0.0..1.5 is added on top
pub const REGULAR_BASE_SPEED: f32 = 2.0;

/// Build a routed vehicle at the entry point of `(direction, lane)`
pub fn generate_vehicle<R: Rng + ?Sized>(
    id: VehicleId,
    direction: Direction,
    lane: LanePosition,
    config: &SimConfig,
    geometry: &IntersectionGeometry,
    rng: &mut R,
) -> SimVehicle {
    let vehicle_type = if rng.random_bool(config.emergency_chance.clamp(0.0, 1.0)) {
        VehicleType::EMERGENCY
            .choose(rng)
            .copied()
            .unwrap_or(VehicleType::Ambulance)
    } else {
        VehicleType::Regular
    };

    let speed = if vehicle_type.is_emergency() {
        EMERGENCY_SPEED
    } else {
        REGULAR_BASE_SPEED + rng.random_range(0..15) as f32 / 10.0
    };

    let mut vehicle = SimVehicle::new(
        id,
        vehicle_type,
        direction,
        lane,
        geometry.entry_point(direction, lane),
        speed.min(config.max_speed),
    );
    assign_path(&mut vehicle, &mut RandomTurns(rng));
    vehicle
}

/// Lanes the spawner may place new vehicles in
pub fn spawn_lanes(config: &SimConfig) -> &'static [LanePosition] {
    if config.spawn_right_lane {
        &LanePosition::ALL
    } else {
        &[LanePosition::Left, LanePosition::Center]
    }
}

/// Build a routed vehicle on a random approach and spawn lane
pub fn random_vehicle<R: Rng + ?Sized>(
    id: VehicleId,
    config: &SimConfig,
    geometry: &IntersectionGeometry,
    rng: &mut R,
) -> SimVehicle {
    let direction = Direction::ALL
        .choose(rng)
        .copied()
        .unwrap_or(Direction::North);
    let lane = spawn_lanes(config)
        .choose(rng)
        .copied()
        .unwrap_or(LanePosition::Left);
    generate_vehicle(id, direction, lane, config, geometry, rng)
}

/// Periodically feeds every approach with new vehicles
#[derive(Debug, Clone)]
pub struct VehicleSpawner {
    next_id: u32,
    countdown: u32,
}

impl VehicleSpawner {
    pub fn new(first_id: u32, first_wave_in: u32) -> Self {
        Self {
            next_id: first_id,
            countdown: first_wave_in,
        }
    }

    pub fn next_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Count down to the next wave and spawn it when due. Returns how many vehicles
    /// were admitted.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        queues: &mut [LaneQueue],
        config: &SimConfig,
        geometry: &IntersectionGeometry,
        safety: &SafetyChecker,
        rng: &mut R,
    ) -> usize {
        if self.countdown > 0 {
            self.countdown -= 1;
            return 0;
        }

        let low = config.spawn_interval_min.min(config.spawn_interval_max);
        let high = config.spawn_interval_min.max(config.spawn_interval_max);
        self.countdown = rng.random_range(low..=high);

        let mut spawned = 0;
        for direction in Direction::ALL {
            let first = direction.index() * LANES_PER_DIRECTION;
            let load: usize = queues[first..first + LANES_PER_DIRECTION]
                .iter()
                .map(LaneQueue::len)
                .sum();
            if load >= config.spawn_direction_limit {
                continue;
            }

            let Some(lane) = spawn_lanes(config).choose(rng).copied() else {
                continue;
            };
            let id = self.next_id();
            let vehicle = generate_vehicle(id, direction, lane, config, geometry, rng);

            let index = queue_index(direction, lane);
            let blocked = !safety.is_safe_distance(Some(&vehicle), queues[index].peek_back())
                || queues
                    .iter()
                    .flat_map(|queue| queue.iter())
                    .any(|other| safety.check_collision(Some(&vehicle), Some(other)));
            if blocked {
                debug!("Entry of {:?} {:?} is blocked, skipping spawn", direction, lane);
                continue;
            }
            if queues[index].enqueue(vehicle) {
                spawned += 1;
            }
        }
        spawned
    }
}
