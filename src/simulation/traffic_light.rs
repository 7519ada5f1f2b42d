//! Traffic light state machine for the intersection
//!
//! One signal per heading. A single active index cycles North, East, South, West and
//! exactly one signal is green once the first phase has started (all red before that).

use log::debug;

use super::config::LightPolicy;
use super::types::{Direction, DIRECTION_COUNT};
use super::vehicle::SimVehicle;

#[derive(Debug, Clone)]
pub struct TrafficLightController {
    signals: [bool; DIRECTION_COUNT],
    current: Option<Direction>,
    /// Time spent in the current phase
    timer: f32,
    /// Dwell the current phase is measured against
    dwell: f32,
    policy: LightPolicy,
    phase_changes: u64,
}

impl Default for TrafficLightController {
    fn default() -> Self {
        Self::new(LightPolicy::default())
    }
}

impl TrafficLightController {
    pub fn new(policy: LightPolicy) -> Self {
        let dwell = match policy {
            LightPolicy::Fixed { dwell } => dwell,
            LightPolicy::Adaptive { base, .. } => base,
        };
        Self {
            signals: [false; DIRECTION_COUNT],
            current: None,
            timer: 0.0,
            dwell,
            policy,
            phase_changes: 0,
        }
    }

    pub fn signals(&self) -> [bool; DIRECTION_COUNT] {
        self.signals
    }

    pub fn is_green(&self, direction: Direction) -> bool {
        self.signals[direction.index()]
    }

    pub fn current_green(&self) -> Option<Direction> {
        self.current
    }

    pub fn dwell(&self) -> f32 {
        self.dwell
    }

    pub fn policy(&self) -> LightPolicy {
        self.policy
    }

    pub fn phase_changes(&self) -> u64 {
        self.phase_changes
    }

    /// Hand green to the next direction in the cycle and return it
    pub fn advance(&mut self) -> Direction {
        let next = match self.current {
            Some(current) => current.rotate_right(),
            None => Direction::North,
        };
        if let Some(current) = self.current {
            self.signals[current.index()] = false;
        }
        self.signals[next.index()] = true;
        self.current = Some(next);
        self.timer = 0.0;
        self.phase_changes += 1;
        debug!("Light phase {}: {:?} is green", self.phase_changes, next);
        next
    }

    /// Advance the dwell timer by `delta_secs`.
    ///
    /// `loads` holds the number of queued vehicles per heading; only the adaptive
    /// policy reads it. Returns `true` when the phase changed.
    pub fn update(&mut self, delta_secs: f32, loads: [usize; DIRECTION_COUNT]) -> bool {
        self.timer += delta_secs;

        if let LightPolicy::Adaptive {
            base,
            min,
            max,
            low_load,
            high_load,
        } = self.policy
        {
            let load = self.current.map(|d| loads[d.index()]);
            self.dwell = match load {
                Some(load) if load < low_load => min,
                Some(load) if load > high_load => max,
                _ => base,
            };
        }

        if self.timer >= self.dwell {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Whether a vehicle waiting at the stop line may enter the intersection.
    ///
    /// Emergency vehicles and vehicles in an active priority lane go regardless of the
    /// light. Following distance is enforced by the stepper, not here.
    pub fn can_vehicle_proceed(&self, vehicle: &SimVehicle, priority_lane_active: bool) -> bool {
        if vehicle.is_emergency() {
            return true;
        }
        if vehicle.is_priority_lane && priority_lane_active {
            return true;
        }
        self.is_green(vehicle.heading())
    }
}
