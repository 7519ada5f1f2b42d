//! UI components and resources for linking Bevy entities to simulation state

use bevy::prelude::*;
use std::collections::HashMap;

use crate::simulation::{Direction, Position, SimWorld, VehicleId};

/// Screen pixels per world unit
pub const PIXELS_PER_UNIT: f32 = 10.0;

/// Resource wrapper for the simulation world
#[derive(Resource)]
pub struct SimWorldResource(pub SimWorld);

impl Default for SimWorldResource {
    fn default() -> Self {
        Self(SimWorld::default())
    }
}

/// Marker component for ground plane
#[derive(Component)]
pub struct Ground;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Links a Bevy entity to a simulation vehicle
#[derive(Component)]
pub struct VehicleLink(pub VehicleId);

/// Links a signal head to the heading it controls
#[derive(Component)]
pub struct LightLink(pub Direction);

/// Marker for the status line
#[derive(Component)]
pub struct StatusText;

/// Resource to track Bevy entities mapped to simulation vehicles
#[derive(Resource, Default)]
pub struct EntityMappings {
    pub vehicles: HashMap<VehicleId, Entity>,
}

/// Map a screen-space simulation position onto the ground plane, centred on `center`
pub fn to_ground(position: &Position, center: &Position, height: f32) -> Vec3 {
    Vec3::new(
        (position.x - center.x) / PIXELS_PER_UNIT,
        height,
        (position.y - center.y) / PIXELS_PER_UNIT,
    )
}

/// Rotation about the vertical axis that points a vehicle mesh along its heading
pub fn heading_rotation(heading: Direction, turn_angle: f32) -> Quat {
    let base = match heading {
        Direction::North => 0.0,
        Direction::West => std::f32::consts::FRAC_PI_2,
        Direction::South => std::f32::consts::PI,
        Direction::East => -std::f32::consts::FRAC_PI_2,
    };
    // Left turns carry a negative angle, which rotates counter-clockwise seen from above
    Quat::from_rotation_y(base - turn_angle.to_radians())
}
