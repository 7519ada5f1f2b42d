//! Main simulation world that ties everything together
//!
//! This is the entry point for running the intersection simulation
//! without any Bevy dependencies.

use std::path::Path;

use anyhow::Result;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::config::SimConfig;
use super::geometry::IntersectionGeometry;
use super::lane_queue::LaneQueue;
use super::record::{ingest_file, IngestBatch};
use super::safety::SafetyChecker;
use super::spawner::VehicleSpawner;
use super::stats::SimStats;
use super::stepper::{IntersectionStepper, StepReport};
use super::traffic_light::TrafficLightController;
use super::types::{
    queue_index, Direction, LanePosition, Position, VehicleId, VehicleType, DIRECTION_COUNT,
    LANES_PER_DIRECTION, QUEUE_COUNT,
};
use super::vehicle::SimVehicle;

/// What a renderer needs to know about one vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleView {
    pub id: VehicleId,
    pub vehicle_type: VehicleType,
    pub position: Position,
    pub heading: Direction,
    pub turn_angle: f32,
    pub turning: bool,
}

/// Read-only view of the world after a tick
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub time: f32,
    pub vehicles: Vec<VehicleView>,
    pub lights: [bool; DIRECTION_COUNT],
}

/// The main simulation world
pub struct SimWorld {
    pub config: SimConfig,

    /// One queue per (direction, lane), indexed by `direction * 3 + lane`
    pub queues: [LaneQueue; QUEUE_COUNT],

    pub lights: TrafficLightController,

    pub stepper: IntersectionStepper,

    spawner: VehicleSpawner,

    pub stats: SimStats,

    /// Simulation time
    pub time: f32,

    pub ticks: u64,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl SimWorld {
    fn new_internal(config: SimConfig, rng: Option<StdRng>) -> Self {
        let queues = std::array::from_fn(|index| {
            LaneQueue::with_limits(
                Direction::ALL[index / LANES_PER_DIRECTION],
                LanePosition::ALL[index % LANES_PER_DIRECTION],
                config.queue_capacity,
                config.priority_threshold,
            )
        });
        let geometry = IntersectionGeometry::from_config(&config);
        let safety = SafetyChecker::from_config(&config);

        Self {
            lights: TrafficLightController::new(config.light_policy),
            stepper: IntersectionStepper::new(geometry, safety),
            spawner: VehicleSpawner::new(0, 0),
            stats: SimStats::default(),
            queues,
            time: 0.0,
            ticks: 0,
            rng,
            config,
        }
    }

    pub fn new(config: SimConfig) -> Self {
        Self::new_internal(config, None)
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(config: SimConfig, seed: u64) -> Self {
        Self::new_internal(config, Some(StdRng::seed_from_u64(seed)))
    }

    pub fn queue(&self, direction: Direction, lane: LanePosition) -> &LaneQueue {
        &self.queues[queue_index(direction, lane)]
    }

    pub fn geometry(&self) -> &IntersectionGeometry {
        &self.stepper.geometry
    }

    /// Vehicles still approaching the intersection, per heading
    pub fn direction_loads(&self) -> [usize; DIRECTION_COUNT] {
        let mut loads = [0; DIRECTION_COUNT];
        for queue in &self.queues {
            loads[queue.direction.index()] += queue
                .iter()
                .filter(|vehicle| !vehicle.passed_intersection)
                .count();
        }
        loads
    }

    pub fn vehicle_count(&self) -> usize {
        self.queues.iter().map(LaneQueue::len).sum()
    }

    /// Admit an already routed vehicle into the queue of its origin lane
    pub fn admit(&mut self, vehicle: SimVehicle) -> bool {
        let id = vehicle.id;
        let admitted = self.queues[vehicle.origin_queue()].enqueue(vehicle);
        if !admitted {
            warn!("Origin queue full, vehicle {:?} not admitted", id);
        }
        admitted
    }

    /// Enqueue a batch of external records. Returns how many were admitted.
    pub fn ingest(&mut self, batch: IngestBatch) -> usize {
        self.stats.malformed += batch.malformed as u64;
        let mut admitted = 0;

        for record in &batch.records {
            let vehicle = match (record.start_queue(), SimVehicle::try_from(record)) {
                (Some(_), Ok(vehicle)) => vehicle,
                (_, Err(e)) => {
                    self.stats.discarded += 1;
                    warn!("Discarding record {}: {:#}", record.id, e);
                    continue;
                }
                (None, Ok(_)) => {
                    self.stats.discarded += 1;
                    warn!("Discarding record {}: no queue for its start lane", record.id);
                    continue;
                }
            };

            if self.admit(vehicle) {
                admitted += 1;
            }
        }

        self.stats.ingested += admitted as u64;
        admitted
    }

    /// Drain a vehicle file into the queues
    pub fn ingest_file(&mut self, path: &Path) -> Result<usize> {
        let batch = ingest_file(path)?;
        Ok(self.ingest(batch))
    }

    /// Advance the world by one tick of `delta_secs` simulated seconds
    pub fn tick(&mut self, delta_secs: f32) -> StepReport {
        self.time += delta_secs;
        self.ticks += 1;

        if self.config.spawn_enabled {
            let spawned = match &mut self.rng {
                Some(rng) => self.spawner.tick(
                    &mut self.queues,
                    &self.config,
                    &self.stepper.geometry,
                    &self.stepper.safety,
                    rng,
                ),
                None => self.spawner.tick(
                    &mut self.queues,
                    &self.config,
                    &self.stepper.geometry,
                    &self.stepper.safety,
                    &mut rand::rng(),
                ),
            };
            self.stats.spawned += spawned as u64;
        }

        let report = self.stepper.tick(&mut self.queues, &self.lights);
        self.stats.absorb(&report);

        let loads = self.direction_loads();
        if self.lights.update(delta_secs, loads) {
            debug!("Loads at phase change: {:?}", loads);
        }

        let collisions = self.count_collisions();
        if collisions > 0 {
            self.stats.collisions += collisions as u64;
            warn!("{} overlapping vehicle pairs at tick {}", collisions, self.ticks);
        }

        report
    }

    /// Number of vehicle pairs whose boxes overlap
    pub fn count_collisions(&self) -> usize {
        let vehicles: Vec<&SimVehicle> = self.queues.iter().flat_map(|queue| queue.iter()).collect();
        let safety = &self.stepper.safety;
        let mut count = 0;
        for (i, a) in vehicles.iter().enumerate() {
            for b in &vehicles[i + 1..] {
                if safety.check_collision(Some(*a), Some(*b)) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Positions, types and light states for a renderer
    pub fn snapshot(&self) -> RenderFrame {
        let vehicles = self
            .queues
            .iter()
            .flat_map(|queue| queue.iter())
            .map(|vehicle| VehicleView {
                id: vehicle.id,
                vehicle_type: vehicle.vehicle_type,
                position: vehicle.position,
                heading: vehicle.heading(),
                turn_angle: vehicle.turn_angle,
                turning: vehicle.turning,
            })
            .collect();

        RenderFrame {
            time: self.time,
            vehicles,
            lights: self.lights.signals(),
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Intersection Simulation Summary ===");
        println!("Time: {:.2}s ({} ticks)", self.time, self.ticks);
        println!("Vehicles: {}", self.vehicle_count());

        let signals: String = Direction::ALL
            .iter()
            .map(|d| {
                let state = if self.lights.is_green(*d) { "green" } else { "red" };
                format!("{}={} ", d.short_name(), state)
            })
            .collect();
        println!("Lights: {}(dwell {:.1}s)", signals, self.lights.dwell());
        println!();

        println!("--- Queues ---");
        for queue in &self.queues {
            println!(
                "  {:?}/{:?}: size={}/{}, waiting={:.1}{}",
                queue.direction,
                queue.lane,
                queue.len(),
                queue.capacity(),
                queue.waiting_time(),
                if queue.is_priority_lane_active() {
                    ", priority active"
                } else {
                    ""
                }
            );
        }

        println!("--- Totals ---");
        println!(
            "  spawned={}, ingested={}, completed={}, transferred={}",
            self.stats.spawned, self.stats.ingested, self.stats.completed, self.stats.transferred
        );
        println!(
            "  dropped={}, discarded={}, malformed={}, collisions={}",
            self.stats.dropped, self.stats.discarded, self.stats.malformed, self.stats.collisions
        );
        println!(
            "  wait ticks={}, light phases={}",
            self.stats.wait_ticks,
            self.lights.phase_changes()
        );
    }

    /// Draw a visual map of the intersection in the terminal
    pub fn draw_map(&self) {
        const CELL: f32 = 20.0;
        let width = (self.config.window_width / CELL).ceil() as usize;
        let height = (self.config.window_height / CELL).ceil() as usize;
        let mut grid = vec![vec![' '; width]; height];

        let geometry = self.geometry();
        let to_grid = |position: &Position| -> Option<(usize, usize)> {
            if position.x < 0.0 || position.y < 0.0 {
                return None;
            }
            let col = (position.x / CELL) as usize;
            let row = (position.y / CELL) as usize;
            (row < height && col < width).then_some((row, col))
        };

        // Roads
        for (row, line) in grid.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                let x = (col as f32 + 0.5) * CELL;
                let y = (row as f32 + 0.5) * CELL;
                let on_vertical = (x - geometry.center.x).abs() < geometry.half_road;
                let on_horizontal = (y - geometry.center.y).abs() < geometry.half_road;
                if on_vertical || on_horizontal {
                    *cell = '.';
                }
            }
        }

        // Lights sit at the stop line of each approach's Left lane
        for direction in Direction::ALL {
            let position =
                geometry.lane_point(direction, LanePosition::Left, geometry.stop_line() + CELL);
            if let Some((row, col)) = to_grid(&position) {
                grid[row][col] = if self.lights.is_green(direction) { 'G' } else { 'R' };
            }
        }

        // Vehicles
        for view in self.snapshot().vehicles {
            if let Some((row, col)) = to_grid(&view.position) {
                grid[row][col] = match view.vehicle_type {
                    VehicleType::Regular => 'o',
                    VehicleType::Ambulance => 'A',
                    VehicleType::Police => 'P',
                    VehicleType::FireTruck => 'F',
                };
            }
        }

        println!("\n=== Intersection Map ===");
        println!("Legend: o=Vehicle, A=Ambulance, P=Police, F=Fire truck, G/R=Light, .=Road");
        println!();
        for row in &grid {
            let line: String = row.iter().collect();
            println!("{}", line);
        }
        println!();
    }
}
