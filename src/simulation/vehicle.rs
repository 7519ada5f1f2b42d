//! Vehicle state for the intersection simulation
//!
//! Standalone implementation that doesn't depend on Bevy.

use super::types::{queue_index, Direction, LanePosition, Position, VehicleId, VehicleType};

/// A vehicle travelling through the intersection
#[derive(Debug, Clone, PartialEq)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub vehicle_type: VehicleType,
    pub start_direction: Direction,
    pub start_lane: LanePosition,
    pub end_direction: Direction,
    pub end_lane: LanePosition,
    pub position: Position,
    pub speed: f32,
    /// Signed turn angle in degrees, negative for left turns
    pub turn_angle: f32,
    pub turning: bool,
    /// Progress along the turn arc, only meaningful while `turning`
    pub progress: f32,
    /// Ticks spent waiting
    pub wait_time: u32,
    /// Stamped by the queue the vehicle was last admitted to
    pub is_priority_lane: bool,
    pub passed_intersection: bool,
}

impl SimVehicle {
    /// Create a vehicle heading straight through its lane; call
    /// [`assign_path`](super::path::assign_path) before exposing it to the stepper.
    pub fn new(
        id: VehicleId,
        vehicle_type: VehicleType,
        start_direction: Direction,
        start_lane: LanePosition,
        position: Position,
        speed: f32,
    ) -> Self {
        Self {
            id,
            vehicle_type,
            start_direction,
            start_lane,
            end_direction: start_direction,
            end_lane: start_lane,
            position,
            speed,
            turn_angle: 0.0,
            turning: false,
            progress: 0.0,
            wait_time: 0,
            is_priority_lane: false,
            passed_intersection: false,
        }
    }

    pub fn is_emergency(&self) -> bool {
        self.vehicle_type.is_emergency()
    }

    /// Approach the vehicle is currently travelling on
    pub fn current_approach(&self) -> (Direction, LanePosition) {
        if self.passed_intersection {
            (self.end_direction, self.end_lane)
        } else {
            (self.start_direction, self.start_lane)
        }
    }

    /// Heading used for rendering
    pub fn heading(&self) -> Direction {
        self.current_approach().0
    }

    pub fn origin_queue(&self) -> usize {
        queue_index(self.start_direction, self.start_lane)
    }

    pub fn destination_queue(&self) -> usize {
        queue_index(self.end_direction, self.end_lane)
    }
}
