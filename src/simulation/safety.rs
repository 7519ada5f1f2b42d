//! Pairwise following-distance and overlap checks

use super::config::SimConfig;
use super::vehicle::SimVehicle;

/// Default safe distance, centre to centre
pub const SAFE_DISTANCE: f32 = 30.0;

/// Safe distance multiplier when an emergency vehicle is involved
pub const EMERGENCY_DISTANCE_MULTIPLIER: f32 = 1.5;

#[derive(Debug, Clone, Copy)]
pub struct SafetyChecker {
    pub safe_distance: f32,
    pub emergency_multiplier: f32,
}

impl Default for SafetyChecker {
    fn default() -> Self {
        Self {
            safe_distance: SAFE_DISTANCE,
            emergency_multiplier: EMERGENCY_DISTANCE_MULTIPLIER,
        }
    }
}

impl SafetyChecker {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            safe_distance: config.safe_distance,
            emergency_multiplier: config.emergency_distance_multiplier,
        }
    }

    /// Distance the pair must keep
    pub fn required_distance(&self, v1: &SimVehicle, v2: &SimVehicle) -> f32 {
        if v1.is_emergency() || v2.is_emergency() {
            self.safe_distance * self.emergency_multiplier
        } else {
            self.safe_distance
        }
    }

    /// True when the pair keeps the required distance, or when either is absent
    pub fn is_safe_distance(&self, v1: Option<&SimVehicle>, v2: Option<&SimVehicle>) -> bool {
        match (v1, v2) {
            (Some(a), Some(b)) => a.position.distance(&b.position) >= self.required_distance(a, b),
            _ => true,
        }
    }

    /// True when the axis-aligned boxes around both centres overlap
    pub fn check_collision(&self, v1: Option<&SimVehicle>, v2: Option<&SimVehicle>) -> bool {
        let (Some(a), Some(b)) = (v1, v2) else {
            return false;
        };
        let half = self.safe_distance / 4.0;
        (a.position.x - b.position.x).abs() < half * 2.0
            && (a.position.y - b.position.y).abs() < half * 2.0
    }
}
