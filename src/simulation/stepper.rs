//! Per-tick movement of every vehicle in the twelve lane queues
//!
//! Standalone implementation that doesn't depend on Bevy.

use log::{debug, warn};
use ordered_float::OrderedFloat;

use super::geometry::{IntersectionGeometry, LINE_EPSILON};
use super::lane_queue::LaneQueue;
use super::path::{paths_compatible, turn_of};
use super::safety::SafetyChecker;
use super::traffic_light::TrafficLightController;
use super::types::{Direction, LanePosition, Turn};
use super::vehicle::SimVehicle;

/// What happened during one stepper pass
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    pub moved: usize,
    pub waited: usize,
    /// Vehicles handed to their destination queue
    pub transferred: usize,
    /// Vehicles that left the map from their destination queue
    pub completed: usize,
    /// Vehicles lost because the destination queue was full
    pub dropped: usize,
    /// Vehicles routed to a queue that does not exist
    pub discarded: usize,
    /// Smallest distance between a vehicle and the one ahead of it after moving
    pub closest_gap: Option<OrderedFloat<f32>>,
}

impl StepReport {
    fn record_gap(&mut self, gap: f32) {
        let gap = OrderedFloat(gap);
        self.closest_gap = Some(self.closest_gap.map_or(gap, |current| current.min(gap)));
    }
}

/// Moves vehicles, enforces lights and following distance, hands vehicles between queues
#[derive(Debug, Clone)]
pub struct IntersectionStepper {
    pub geometry: IntersectionGeometry,
    pub safety: SafetyChecker,
}

impl IntersectionStepper {
    pub fn new(geometry: IntersectionGeometry, safety: SafetyChecker) -> Self {
        Self { geometry, safety }
    }

    /// Run one tick over all queues.
    ///
    /// Vehicles are visited front to back within each queue. Hand-overs to other queues
    /// are collected and applied at the end so nothing moves twice in one tick.
    pub fn tick(&self, queues: &mut [LaneQueue], lights: &TrafficLightController) -> StepReport {
        let mut report = StepReport::default();
        let mut pending: Vec<(usize, SimVehicle)> = Vec::new();

        for queue_index in 0..queues.len() {
            let priority_active = queues[queue_index].is_priority_lane_active();
            let mut slot = 0;

            while slot < queues[queue_index].len() {
                let Some(vehicle) = queues[queue_index].get(slot) else {
                    break;
                };

                let (stepped, leaving) = self.step_vehicle(
                    vehicle,
                    (queue_index, slot),
                    queues,
                    &pending,
                    lights,
                    priority_active,
                    &mut report,
                );
                if let Some(vehicle) = queues[queue_index].get_mut(slot) {
                    *vehicle = stepped;
                }

                // Only the front vehicle may leave, keeping the lane in arrival order
                if leaving
                    && slot == 0
                    && self.leave_queue(queue_index, queues, &mut pending, &mut report)
                {
                    continue;
                }
                slot += 1;
            }
        }

        for (destination, vehicle) in pending {
            let id = vehicle.id;
            match queues.get_mut(destination) {
                Some(queue) => {
                    if queue.enqueue(vehicle) {
                        report.transferred += 1;
                        debug!("Vehicle {:?} merged into queue {}", id, destination);
                    } else {
                        report.dropped += 1;
                        warn!("Queue {} is full, vehicle {:?} dropped", destination, id);
                    }
                }
                None => {
                    report.discarded += 1;
                    warn!("Vehicle {:?} routed to missing queue {}", id, destination);
                }
            }
        }

        report
    }

    /// Work out where a single vehicle ends up this tick. Returns its new state and
    /// whether it has left its current segment.
    #[allow(clippy::too_many_arguments)]
    fn step_vehicle(
        &self,
        vehicle: &SimVehicle,
        at: (usize, usize),
        queues: &[LaneQueue],
        pending: &[(usize, SimVehicle)],
        lights: &TrafficLightController,
        priority_active: bool,
        report: &mut StepReport,
    ) -> (SimVehicle, bool) {
        let (queue_index, slot) = at;
        let mut stepped = vehicle.clone();

        // Already out, waiting for its turn to leave the queue
        if self.has_left_segment(vehicle, queue_index) {
            stepped.wait_time += 1;
            report.waited += 1;
            return (stepped, true);
        }

        let ahead = match slot {
            0 => None,
            _ => queues[queue_index].get(slot - 1),
        };

        let geometry = &self.geometry;
        let (heading, lane) = vehicle.current_approach();
        let mid_turn = vehicle.turning && vehicle.progress > 0.0;
        let position = if mid_turn {
            vehicle.position
        } else {
            geometry.snap_to_lane(&vehicle.position, heading, lane)
        };

        let s = geometry.longitudinal(&position, heading);
        let inside = vehicle.passed_intersection || mid_turn || geometry.past_stop_line(s);
        let at_boundary_zone = !inside && geometry.in_boundary_zone(s);

        // Anything short of the box needs right-of-way; the box itself is always cleared
        let light_ok = inside || lights.can_vehicle_proceed(vehicle, priority_active);
        let can_move = light_ok && self.safety.is_safe_distance(Some(vehicle), ahead);

        let mut moved = false;
        if can_move {
            let may_enter = inside
                || (at_boundary_zone && self.box_is_clear_for(vehicle, at, queues, pending));

            let mut next = vehicle.clone();
            next.position = position;
            self.advance(&mut next, heading, lane, s, may_enter);

            let progressed =
                next.position != vehicle.position || next.progress != vehicle.progress;

            // Never close in on the vehicle ahead past the safe distance, never overlap anyone
            if progressed
                && self.safety.is_safe_distance(Some(&next), ahead)
                && !self.conflicts(vehicle, &next, at, queues, pending)
            {
                stepped = next;
                moved = true;
            }
        }

        if moved {
            report.moved += 1;
        } else {
            stepped.wait_time += 1;
            report.waited += 1;
        }

        if let Some(ahead) = ahead {
            report.record_gap(stepped.position.distance(&ahead.position));
        }

        let leaving = self.has_left_segment(&stepped, queue_index);
        (stepped, leaving)
    }

    /// True when no vehicle on an incompatible path is inside the intersection box
    fn box_is_clear_for(
        &self,
        vehicle: &SimVehicle,
        at: (usize, usize),
        queues: &[LaneQueue],
        pending: &[(usize, SimVehicle)],
    ) -> bool {
        others(queues, pending, at)
            .filter(|other| self.occupies_box(other))
            .all(|other| paths_compatible(vehicle, other))
    }

    /// Between the stop line and the far side of the box
    fn occupies_box(&self, vehicle: &SimVehicle) -> bool {
        if vehicle.passed_intersection {
            return false;
        }
        let s = self
            .geometry
            .longitudinal(&vehicle.position, vehicle.start_direction);
        (vehicle.turning && vehicle.progress > 0.0) || self.geometry.past_stop_line(s)
    }

    /// Whether moving `current` to `next` would run into another vehicle.
    ///
    /// A pair that already overlaps may separate but never get closer.
    fn conflicts(
        &self,
        current: &SimVehicle,
        next: &SimVehicle,
        at: (usize, usize),
        queues: &[LaneQueue],
        pending: &[(usize, SimVehicle)],
    ) -> bool {
        others(queues, pending, at).any(|other| {
            self.safety.check_collision(Some(next), Some(other))
                && !(self.safety.check_collision(Some(current), Some(other))
                    && next.position.distance(&other.position)
                        >= current.position.distance(&other.position))
        })
    }

    /// Move a vehicle by its speed. `may_enter` allows crossing the stop line.
    fn advance(
        &self,
        vehicle: &mut SimVehicle,
        heading: Direction,
        lane: LanePosition,
        s: f32,
        may_enter: bool,
    ) {
        let geometry = &self.geometry;
        let stop = geometry.stop_line();

        if vehicle.turning {
            if vehicle.progress <= 0.0 && s < stop - LINE_EPSILON {
                let target = (s + vehicle.speed).min(stop);
                vehicle.position = geometry.lane_point(heading, lane, target);
                return;
            }
            if !may_enter {
                return;
            }

            vehicle.progress = (vehicle.progress + vehicle.speed / 100.0).min(1.0);
            vehicle.position = geometry.turn_point(
                vehicle.start_direction,
                vehicle.start_lane,
                vehicle.end_direction,
                vehicle.end_lane,
                vehicle.progress,
            );
            vehicle.turn_angle = match turn_of(vehicle) {
                Some(Turn::Left) => -90.0 * vehicle.progress,
                Some(Turn::Right) => 90.0 * vehicle.progress,
                None => 0.0,
            };

            if vehicle.progress >= 1.0 {
                vehicle.turning = false;
                vehicle.passed_intersection = true;
                vehicle.position = geometry.lane_point(
                    vehicle.end_direction,
                    vehicle.end_lane,
                    geometry.exit_line(),
                );
            }
            return;
        }

        let mut target = s + vehicle.speed;
        if !may_enter {
            target = target.min(stop);
        }
        vehicle.position = geometry.lane_point(heading, lane, target);
        if !vehicle.passed_intersection && target > geometry.exit_line() {
            vehicle.passed_intersection = true;
        }
    }

    /// A vehicle leaves its destination queue at the map edge and any other queue
    /// as soon as it has crossed the intersection.
    fn has_left_segment(&self, vehicle: &SimVehicle, queue_index: usize) -> bool {
        if vehicle.destination_queue() == queue_index {
            self.geometry
                .beyond_map(&vehicle.position, vehicle.current_approach().0)
        } else {
            vehicle.passed_intersection
        }
    }

    /// Take the front vehicle out of its queue. Returns `false` when it has to wait
    /// for room in the destination lane.
    fn leave_queue(
        &self,
        queue_index: usize,
        queues: &mut [LaneQueue],
        pending: &mut Vec<(usize, SimVehicle)>,
        report: &mut StepReport,
    ) -> bool {
        let Some(front) = queues[queue_index].peek_front() else {
            return false;
        };
        let destination = front.destination_queue();

        if destination != queue_index {
            let last_in_lane = pending
                .iter()
                .rev()
                .find(|(index, _)| *index == destination)
                .map(|(_, vehicle)| vehicle)
                .or_else(|| queues.get(destination).and_then(|queue| queue.peek_back()));

            if !self.safety.is_safe_distance(Some(front), last_in_lane) {
                return false;
            }
        }

        let Some(vehicle) = queues[queue_index].dequeue() else {
            return false;
        };

        if destination == queue_index {
            report.completed += 1;
            debug!("Vehicle {:?} left the map after {} waiting ticks", vehicle.id, vehicle.wait_time);
        } else if destination < queues.len() {
            pending.push((destination, vehicle));
        } else {
            report.discarded += 1;
            warn!("Vehicle {:?} routed to missing queue {}", vehicle.id, destination);
        }
        true
    }
}

/// Every vehicle on the map except the one in `skip`, including transfers not yet applied
fn others<'a>(
    queues: &'a [LaneQueue],
    pending: &'a [(usize, SimVehicle)],
    skip: (usize, usize),
) -> impl Iterator<Item = &'a SimVehicle> + 'a {
    queues
        .iter()
        .enumerate()
        .flat_map(move |(queue_index, queue)| {
            queue
                .iter()
                .enumerate()
                .filter(move |(slot, _)| (queue_index, *slot) != skip)
                .map(|(_, vehicle)| vehicle)
        })
        .chain(pending.iter().map(|(_, vehicle)| vehicle))
}
