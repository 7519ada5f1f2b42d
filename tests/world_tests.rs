//! Intersection stepper and world tests
//!
//! Vehicles are placed by hand on a world with the spawner turned off so every
//! movement can be predicted.

use intersection_sim::simulation::{
    assign_path, Direction, IntersectionGeometry, IntersectionStepper, LanePosition, LaneQueue,
    SafetyChecker, SimConfig, SimVehicle, SimWorld, TrafficLightController, Turn, VehicleId,
    VehicleType,
};

/// Small enough that the fixed 5s phase never changes on its own during a test
const DELTA: f32 = 0.001;

fn quiet_world() -> SimWorld {
    SimWorld::new(SimConfig {
        spawn_enabled: false,
        ..SimConfig::default()
    })
}

fn place(
    world: &SimWorld,
    id: u32,
    vehicle_type: VehicleType,
    direction: Direction,
    lane: LanePosition,
    s: f32,
    speed: f32,
    mut turn: Turn,
) -> SimVehicle {
    let position = world.geometry().lane_point(direction, lane, s);
    let mut vehicle = SimVehicle::new(VehicleId(id), vehicle_type, direction, lane, position, speed);
    assign_path(&mut vehicle, &mut turn);
    vehicle
}

fn longitudinal(world: &SimWorld, vehicle: &SimVehicle) -> f32 {
    world.geometry().longitudinal(&vehicle.position, vehicle.heading())
}

#[test]
fn test_geometry_lines() {
    let geometry = IntersectionGeometry::from_config(&SimConfig::default());
    assert_eq!(geometry.stop_line(), -100.0);
    assert_eq!(geometry.exit_line(), 100.0);
    assert!(geometry.in_boundary_zone(-120.0));
    assert!(geometry.in_boundary_zone(-100.0));
    assert!(!geometry.in_boundary_zone(-150.0));
    assert!(!geometry.in_boundary_zone(-90.0));

    let entry = geometry.entry_point(Direction::North, LanePosition::Left);
    assert_eq!(entry.x, 415.0);
    assert_eq!(entry.y, 620.0);
    assert!(!geometry.beyond_map(&entry, Direction::North));
}

#[test]
fn test_turn_arc_endpoints() {
    let geometry = IntersectionGeometry::from_config(&SimConfig::default());
    let from = (Direction::North, LanePosition::Left);
    let to = (Direction::West, LanePosition::Right);

    let start = geometry.turn_point(from.0, from.1, to.0, to.1, 0.0);
    let end = geometry.turn_point(from.0, from.1, to.0, to.1, 1.0);
    let expected_start = geometry.lane_point(from.0, from.1, geometry.stop_line());
    let expected_end = geometry.lane_point(to.0, to.1, geometry.exit_line());

    assert!(start.distance(&expected_start) < 1e-3);
    assert!(end.distance(&expected_end) < 1e-3);

    // Midway the arc stays inside the intersection box
    let mid = geometry.turn_point(from.0, from.1, to.0, to.1, 0.5);
    assert!(mid.distance(&geometry.center) < geometry.half_road * 1.5);
}

#[test]
fn test_vehicle_waits_at_red_and_goes_on_green() {
    let mut world = quiet_world();
    let vehicle = place(
        &world,
        1,
        VehicleType::Regular,
        Direction::North,
        LanePosition::Right,
        -130.0,
        5.0,
        Turn::Left,
    );
    assert!(world.admit(vehicle));

    for _ in 0..20 {
        world.tick(DELTA);
    }
    let waiting = world.queue(Direction::North, LanePosition::Right).peek_front().cloned();
    let waiting = waiting.expect("vehicle should still be queued");
    assert!(longitudinal(&world, &waiting) <= world.geometry().stop_line());
    assert!(waiting.wait_time >= 20);

    world.lights.advance();
    assert!(world.lights.is_green(Direction::North));

    for _ in 0..20 {
        world.tick(DELTA);
    }
    let moving = world
        .queue(Direction::North, LanePosition::Right)
        .peek_front()
        .cloned()
        .expect("vehicle should still be on the map");
    assert!(longitudinal(&world, &moving) > world.geometry().stop_line());

    for _ in 0..200 {
        world.tick(DELTA);
    }
    assert_eq!(world.vehicle_count(), 0);
    assert_eq!(world.stats.completed, 1);
    assert_eq!(world.stats.transferred, 0);
}

#[test]
fn test_upstream_vehicle_holds_on_red() {
    let mut world = quiet_world();
    let vehicle = place(
        &world,
        1,
        VehicleType::Regular,
        Direction::East,
        LanePosition::Right,
        -300.0,
        4.0,
        Turn::Left,
    );
    let start = vehicle.position;
    world.admit(vehicle);

    for _ in 0..10 {
        world.tick(DELTA);
    }

    let vehicle = world
        .queue(Direction::East, LanePosition::Right)
        .peek_front()
        .cloned()
        .expect("vehicle should be held on red");
    assert_eq!(vehicle.position, start);
    assert_eq!(vehicle.wait_time, 10);

    // East gets green on the second phase
    world.lights.advance();
    world.lights.advance();
    world.tick(DELTA);

    let vehicle = world
        .queue(Direction::East, LanePosition::Right)
        .peek_front()
        .cloned()
        .expect("vehicle should still be on the map");
    assert!(longitudinal(&world, &vehicle) > -300.0);
    assert_eq!(vehicle.wait_time, 10);
}

#[test]
fn test_emergency_vehicle_runs_red() {
    let mut world = quiet_world();
    let vehicle = place(
        &world,
        1,
        VehicleType::Ambulance,
        Direction::South,
        LanePosition::Right,
        -120.0,
        3.0,
        Turn::Left,
    );
    world.admit(vehicle);
    assert_eq!(world.lights.current_green(), None);

    for _ in 0..15 {
        world.tick(DELTA);
    }

    let vehicle = world
        .queue(Direction::South, LanePosition::Right)
        .peek_front()
        .cloned()
        .expect("ambulance should still be on the map");
    assert!(longitudinal(&world, &vehicle) > world.geometry().stop_line());
}

#[test]
fn test_left_turn_transfers_to_destination_queue() {
    let mut world = quiet_world();
    let vehicle = place(
        &world,
        7,
        VehicleType::Regular,
        Direction::North,
        LanePosition::Left,
        -100.0,
        5.0,
        Turn::Left,
    );
    assert_eq!(vehicle.end_direction, Direction::West);
    world.admit(vehicle);
    world.lights.advance();

    for _ in 0..30 {
        world.tick(DELTA);
    }

    assert!(world.queue(Direction::North, LanePosition::Left).is_empty());
    let merged = world
        .queue(Direction::West, LanePosition::Right)
        .peek_front()
        .cloned()
        .expect("vehicle should have merged into the West right lane");
    assert_eq!(merged.id, VehicleId(7));
    assert!(merged.passed_intersection);
    assert!(!merged.turning);
    assert_eq!(world.stats.transferred, 1);

    for _ in 0..200 {
        world.tick(DELTA);
    }
    assert_eq!(world.vehicle_count(), 0);
    assert_eq!(world.stats.completed, 1);
}

#[test]
fn test_follower_keeps_safe_distance() {
    let mut world = quiet_world();
    let leader = place(
        &world,
        1,
        VehicleType::Regular,
        Direction::West,
        LanePosition::Right,
        -100.0,
        2.0,
        Turn::Left,
    );
    let follower = place(
        &world,
        2,
        VehicleType::Regular,
        Direction::West,
        LanePosition::Right,
        -160.0,
        10.0,
        Turn::Left,
    );
    world.admit(leader);
    world.admit(follower);
    for _ in 0..4 {
        world.lights.advance();
    }
    assert!(world.lights.is_green(Direction::West));

    for _ in 0..60 {
        world.tick(DELTA);
        let queue = world.queue(Direction::West, LanePosition::Right);
        let (Some(a), Some(b)) = (queue.get(0), queue.get(1)) else {
            panic!("both vehicles should still be queued");
        };
        assert!(a.position.distance(&b.position) >= world.config.safe_distance - 1e-3);
    }

    // The fast follower caught up and has been held back
    let follower = world.queue(Direction::West, LanePosition::Right).get(1).cloned();
    assert!(follower.map(|v| v.wait_time > 0).unwrap_or(false));
    assert_eq!(world.stats.collisions, 0);
}

fn fill_center_lane(world: &mut SimWorld, count: u32) {
    for i in 0..count {
        let vehicle = place(
            world,
            i + 1,
            VehicleType::Regular,
            Direction::North,
            LanePosition::Center,
            -100.0 - 35.0 * i as f32,
            2.0,
            Turn::Left,
        );
        assert!(world.admit(vehicle));
    }
}

#[test]
fn test_congested_priority_lane_enters_on_red() {
    let mut world = quiet_world();
    fill_center_lane(&mut world, 6);
    assert!(world
        .queue(Direction::North, LanePosition::Center)
        .is_priority_lane_active());
    assert_eq!(world.lights.current_green(), None);

    for _ in 0..5 {
        world.tick(DELTA);
    }

    let front = world
        .queue(Direction::North, LanePosition::Center)
        .peek_front()
        .cloned()
        .expect("front vehicle should still be turning");
    assert!(front.progress > 0.0);
    assert_eq!(front.wait_time, 0);
}

#[test]
fn test_uncongested_priority_lane_waits_on_red() {
    let mut world = quiet_world();
    fill_center_lane(&mut world, 5);
    assert!(!world
        .queue(Direction::North, LanePosition::Center)
        .is_priority_lane_active());

    for _ in 0..5 {
        world.tick(DELTA);
    }

    let front = world
        .queue(Direction::North, LanePosition::Center)
        .peek_front()
        .cloned()
        .expect("front vehicle should be waiting");
    assert_eq!(front.progress, 0.0);
    assert_eq!(front.wait_time, 5);
    assert_eq!(world.vehicle_count(), 5);
}

#[test]
fn test_full_destination_drops_vehicle() {
    let mut world = SimWorld::new(SimConfig {
        spawn_enabled: false,
        queue_capacity: 1,
        ..SimConfig::default()
    });

    // A parked vehicle fills the West right lane, well clear of the merge point
    let parked = place(
        &world,
        1,
        VehicleType::Regular,
        Direction::West,
        LanePosition::Right,
        300.0,
        0.0,
        Turn::Left,
    );
    let turner = place(
        &world,
        2,
        VehicleType::Regular,
        Direction::North,
        LanePosition::Left,
        -100.0,
        5.0,
        Turn::Left,
    );
    assert!(world.admit(parked));
    assert!(world.admit(turner));
    world.lights.advance();

    for _ in 0..30 {
        world.tick(DELTA);
    }

    assert_eq!(world.stats.dropped, 1);
    assert_eq!(world.stats.transferred, 0);
    assert!(world.queue(Direction::North, LanePosition::Left).is_empty());
    let lane = world.queue(Direction::West, LanePosition::Right);
    assert_eq!(lane.len(), 1);
    assert_eq!(lane.peek_front().map(|v| v.id), Some(VehicleId(1)));
}

#[test]
fn test_missing_destination_queue_discards_vehicle() {
    let config = SimConfig::default();
    let geometry = IntersectionGeometry::from_config(&config);
    let stepper = IntersectionStepper::new(geometry.clone(), SafetyChecker::from_config(&config));
    let mut lights = TrafficLightController::default();
    lights.advance();

    // Only the North lanes exist, the West right lane the turn leads to does not
    let mut queues: Vec<LaneQueue> = LanePosition::ALL
        .iter()
        .map(|lane| LaneQueue::new(Direction::North, *lane))
        .collect();
    let mut vehicle = SimVehicle::new(
        VehicleId(1),
        VehicleType::Regular,
        Direction::North,
        LanePosition::Left,
        geometry.lane_point(Direction::North, LanePosition::Left, geometry.stop_line()),
        5.0,
    );
    assign_path(&mut vehicle, &mut Turn::Left);
    assert!(queues[0].enqueue(vehicle));

    let mut discarded = 0;
    let mut transferred = 0;
    for _ in 0..30 {
        let report = stepper.tick(&mut queues, &lights);
        discarded += report.discarded;
        transferred += report.transferred;
    }

    assert_eq!(discarded, 1);
    assert_eq!(transferred, 0);
    assert!(queues.iter().all(LaneQueue::is_empty));
}

#[test]
fn test_crossed_vehicles_do_not_count_as_load() {
    let mut world = quiet_world();
    let mut departing = place(
        &world,
        1,
        VehicleType::Regular,
        Direction::West,
        LanePosition::Right,
        200.0,
        2.0,
        Turn::Left,
    );
    departing.passed_intersection = true;
    let waiting = place(
        &world,
        2,
        VehicleType::Regular,
        Direction::West,
        LanePosition::Left,
        -200.0,
        2.0,
        Turn::Left,
    );
    world.admit(departing);
    world.admit(waiting);

    assert_eq!(world.direction_loads(), [0, 0, 0, 1]);
}

#[test]
fn test_converging_turns_never_overlap() {
    let mut world = quiet_world();
    // Both turn left from West into the South right lane
    let left = place(
        &world,
        1,
        VehicleType::Regular,
        Direction::West,
        LanePosition::Left,
        -100.0,
        3.0,
        Turn::Left,
    );
    let center = place(
        &world,
        2,
        VehicleType::Regular,
        Direction::West,
        LanePosition::Center,
        -100.0,
        3.0,
        Turn::Left,
    );
    assert_eq!(left.end_direction, center.end_direction);
    world.admit(left);
    world.admit(center);
    for _ in 0..4 {
        world.lights.advance();
    }

    for _ in 0..400 {
        world.tick(DELTA);
        assert_eq!(world.count_collisions(), 0);
    }
    assert_eq!(world.stats.completed, 2);
}

#[test]
fn test_emergency_vehicle_waits_for_occupied_box() {
    let mut world = quiet_world();
    let crossing = place(
        &world,
        1,
        VehicleType::Regular,
        Direction::North,
        LanePosition::Right,
        -90.0,
        2.0,
        Turn::Left,
    );
    let ambulance = place(
        &world,
        2,
        VehicleType::Ambulance,
        Direction::East,
        LanePosition::Right,
        -100.0,
        3.0,
        Turn::Left,
    );
    world.admit(crossing);
    world.admit(ambulance);
    world.lights.advance();

    world.tick(DELTA);
    let held = world
        .queue(Direction::East, LanePosition::Right)
        .peek_front()
        .cloned()
        .expect("ambulance should be waiting");
    assert_eq!(longitudinal(&world, &held), world.geometry().stop_line());
    assert_eq!(held.wait_time, 1);

    for _ in 0..300 {
        world.tick(DELTA);
        assert_eq!(world.count_collisions(), 0);
    }
    assert_eq!(world.stats.completed, 2);
}

#[test]
fn test_ingest_discards_unroutable_records() {
    use intersection_sim::simulation::{IngestBatch, VehicleRecord};

    let mut world = quiet_world();
    let good = place(
        &world,
        1,
        VehicleType::Police,
        Direction::East,
        LanePosition::Center,
        -300.0,
        3.0,
        Turn::Right,
    );
    let mut bad = VehicleRecord::from(&good);
    bad.id = 2;
    bad.start_direction = 9;

    let batch = IngestBatch {
        records: vec![VehicleRecord::from(&good), bad],
        malformed: 1,
    };
    assert_eq!(world.ingest(batch), 1);
    assert_eq!(world.stats.ingested, 1);
    assert_eq!(world.stats.discarded, 1);
    assert_eq!(world.stats.malformed, 1);
    assert_eq!(world.queue(Direction::East, LanePosition::Center).len(), 1);
}

#[test]
fn test_seeded_worlds_are_reproducible() {
    let mut a = SimWorld::new_with_seed(SimConfig::default(), 42);
    let mut b = SimWorld::new_with_seed(SimConfig::default(), 42);

    for _ in 0..500 {
        a.tick(0.1);
        b.tick(0.1);
    }
    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(a.stats.spawned, b.stats.spawned);
}

#[test]
fn test_long_run_invariants() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 7);

    for _ in 0..3000 {
        world.tick(0.1);

        let greens = world.lights.signals().iter().filter(|g| **g).count();
        assert!(greens <= 1);
        for queue in &world.queues {
            assert!(queue.len() <= queue.capacity());
            assert!(queue.waiting_time() >= 0.0);
        }
    }

    let stats = &world.stats;
    assert!(stats.spawned > 0);
    assert!(stats.completed > 0);
    assert_eq!(stats.collisions, 0);
    assert_eq!(
        stats.spawned,
        stats.completed + stats.dropped + stats.discarded + world.vehicle_count() as u64
    );

    let frame = world.snapshot();
    assert_eq!(frame.vehicles.len(), world.vehicle_count());
    assert_eq!(frame.lights, world.lights.signals());
}
