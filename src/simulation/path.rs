//! Path assignment: where a vehicle leaves the intersection given its origin lane

use rand::Rng;

use super::types::{LanePosition, Turn};
use super::vehicle::SimVehicle;

/// Source of the left/right decision for Center-lane vehicles
pub trait TurnChooser {
    fn choose_turn(&mut self) -> Turn;
}

/// A fixed turn always answers the same way
impl TurnChooser for Turn {
    fn choose_turn(&mut self) -> Turn {
        *self
    }
}

/// Uniform random choice backed by any `rand` generator
pub struct RandomTurns<'a, R: Rng + ?Sized>(pub &'a mut R);

impl<R: Rng + ?Sized> TurnChooser for RandomTurns<'_, R> {
    fn choose_turn(&mut self) -> Turn {
        if self.0.random_bool(0.5) {
            Turn::Left
        } else {
            Turn::Right
        }
    }
}

/// Set `end_direction`, `end_lane` and `turning` from the vehicle's origin.
///
/// - Left lane turns left into the Right lane of the new heading.
/// - Center lane turns left or right (asked from `turns`) into the Right lane.
/// - Right lane continues straight.
///
/// Must run once, before the vehicle is handed to the stepper.
pub fn assign_path(vehicle: &mut SimVehicle, turns: &mut dyn TurnChooser) {
    let start = vehicle.start_direction;
    let (end_direction, turning) = match vehicle.start_lane {
        LanePosition::Left => (start.rotate_left(), true),
        LanePosition::Center => match turns.choose_turn() {
            Turn::Left => (start.rotate_left(), true),
            Turn::Right => (start.rotate_right(), true),
        },
        LanePosition::Right => (start, false),
    };

    vehicle.end_direction = end_direction;
    vehicle.end_lane = LanePosition::Right;
    vehicle.turning = turning;
    vehicle.progress = 0.0;
    vehicle.turn_angle = 0.0;
}

/// Which way a vehicle turns, `None` when it goes straight
pub fn turn_of(vehicle: &SimVehicle) -> Option<Turn> {
    if vehicle.end_direction == vehicle.start_direction.rotate_left() {
        Some(Turn::Left)
    } else if vehicle.end_direction == vehicle.start_direction.rotate_right() {
        Some(Turn::Right)
    } else {
        None
    }
}

/// Whether two routed vehicles may be inside the intersection box at the same time.
///
/// Only vehicles from the same approach share the box. Within an approach, vehicles
/// of one lane follow each other; vehicles of different lanes must leave towards
/// different headings, and a right turn may not sweep across the straight-through lane.
pub fn paths_compatible(a: &SimVehicle, b: &SimVehicle) -> bool {
    if a.start_direction != b.start_direction {
        return false;
    }
    if a.start_lane == b.start_lane {
        return true;
    }
    if a.end_direction == b.end_direction {
        return false;
    }

    let crosses = |turner: &SimVehicle, other: &SimVehicle| {
        turn_of(turner) == Some(Turn::Right) && turn_of(other).is_none()
    };
    !(crosses(a, b) || crosses(b, a))
}
