//! Bounded FIFO of vehicles for one (direction, lane) pair

use std::collections::VecDeque;

use super::types::{Direction, LanePosition};
use super::vehicle::SimVehicle;

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_PRIORITY_THRESHOLD: usize = 5;

const EMERGENCY_WEIGHT: f32 = 2.0;
const CONGESTED_PRIORITY_WEIGHT: f32 = 1.5;
const REGULAR_WEIGHT: f32 = 1.0;

/// A lane queue owns the vehicles currently travelling in its lane.
///
/// Vehicles leave in the order they arrived. `waiting_time` is a congestion signal
/// weighted by vehicle type and priority-lane load; it never drops below zero.
#[derive(Debug, Clone)]
pub struct LaneQueue {
    pub direction: Direction,
    pub lane: LanePosition,
    pub is_priority_lane: bool,
    waiting_time: f32,
    capacity: usize,
    priority_threshold: usize,
    vehicles: VecDeque<SimVehicle>,
}

impl LaneQueue {
    pub fn new(direction: Direction, lane: LanePosition) -> Self {
        Self::with_limits(
            direction,
            lane,
            DEFAULT_QUEUE_CAPACITY,
            DEFAULT_PRIORITY_THRESHOLD,
        )
    }

    pub fn with_limits(
        direction: Direction,
        lane: LanePosition,
        capacity: usize,
        priority_threshold: usize,
    ) -> Self {
        Self {
            direction,
            lane,
            is_priority_lane: lane == LanePosition::Center,
            waiting_time: 0.0,
            capacity,
            priority_threshold,
            vehicles: VecDeque::with_capacity(capacity),
        }
    }

    /// Admit a vehicle at the rear. Returns `false` (and drops nothing on the queue)
    /// when the queue is full; the caller decides what happens to the vehicle.
    pub fn enqueue(&mut self, mut vehicle: SimVehicle) -> bool {
        if self.is_full() {
            return false;
        }

        vehicle.is_priority_lane = self.is_priority_lane;
        let emergency = vehicle.is_emergency();
        self.vehicles.push_back(vehicle);
        self.waiting_time += self.weight(emergency);
        true
    }

    /// Remove and return the front vehicle
    pub fn dequeue(&mut self) -> Option<SimVehicle> {
        let vehicle = self.vehicles.pop_front()?;
        let weight = self.weight(vehicle.is_emergency());
        self.waiting_time = (self.waiting_time - weight).max(0.0);
        Some(vehicle)
    }

    /// Weight applied against the queue's current size
    fn weight(&self, emergency: bool) -> f32 {
        if emergency {
            EMERGENCY_WEIGHT
        } else if self.is_priority_lane_active() {
            CONGESTED_PRIORITY_WEIGHT
        } else {
            REGULAR_WEIGHT
        }
    }

    pub fn peek_front(&self) -> Option<&SimVehicle> {
        self.vehicles.front()
    }

    pub fn peek_back(&self) -> Option<&SimVehicle> {
        self.vehicles.back()
    }

    pub fn get(&self, index: usize) -> Option<&SimVehicle> {
        self.vehicles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SimVehicle> {
        self.vehicles.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimVehicle> {
        self.vehicles.iter()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.vehicles.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn waiting_time(&self) -> f32 {
        self.waiting_time
    }

    /// A congested priority lane lets its vehicles ignore red lights
    pub fn is_priority_lane_active(&self) -> bool {
        self.is_priority_lane && self.vehicles.len() > self.priority_threshold
    }
}
