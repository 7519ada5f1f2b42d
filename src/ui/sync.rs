//! Systems for syncing Bevy entities with simulation state

use std::collections::HashSet;

use bevy::prelude::*;

use super::components::{
    heading_rotation, to_ground, EntityMappings, LightLink, SimWorldResource, StatusText,
    VehicleLink, PIXELS_PER_UNIT,
};
use crate::simulation::{VehicleId, VehicleType};

const GREEN: Color = Color::srgb(0.0, 1.0, 0.0);
const RED: Color = Color::srgb(1.0, 0.0, 0.0);

/// System to run simulation tick
pub fn tick_simulation(time: Res<Time>, mut sim_world: ResMut<SimWorldResource>) {
    sim_world.0.tick(time.delta_secs());
}

fn vehicle_color(vehicle_type: VehicleType) -> Color {
    match vehicle_type {
        VehicleType::Regular => Color::srgb(0.2, 0.4, 0.8),
        VehicleType::Ambulance => Color::srgb(0.95, 0.95, 0.95),
        VehicleType::Police => Color::srgb(0.1, 0.1, 0.5),
        VehicleType::FireTruck => Color::srgb(0.8, 0.1, 0.1),
    }
}

/// System to sync vehicle visuals from the latest render frame
pub fn sync_vehicles(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sim_world: Res<SimWorldResource>,
    mut mappings: ResMut<EntityMappings>,
    mut vehicle_query: Query<(Entity, &VehicleLink, &mut Transform)>,
) {
    let world = &sim_world.0;
    let frame = world.snapshot();
    let center = world.geometry().center;
    let size = world.config.vehicle_size / PIXELS_PER_UNIT;

    let views: std::collections::HashMap<VehicleId, _> =
        frame.vehicles.iter().map(|view| (view.id, view)).collect();
    let mut seen: HashSet<VehicleId> = HashSet::new();

    for (entity, link, mut transform) in vehicle_query.iter_mut() {
        match views.get(&link.0) {
            Some(view) => {
                seen.insert(link.0);
                transform.translation = to_ground(&view.position, &center, 0.5);
                transform.rotation = heading_rotation(view.heading, view.turn_angle);
            }
            None => {
                commands.entity(entity).despawn();
                mappings.vehicles.remove(&link.0);
            }
        }
    }

    for view in &frame.vehicles {
        if seen.contains(&view.id) {
            continue;
        }
        let length = if view.vehicle_type.is_emergency() {
            size * 1.3
        } else {
            size
        };
        let entity = commands
            .spawn((
                VehicleLink(view.id),
                Mesh3d(meshes.add(Cuboid::new(size * 0.6, size * 0.5, length))),
                MeshMaterial3d(materials.add(vehicle_color(view.vehicle_type))),
                Transform::from_translation(to_ground(&view.position, &center, 0.5))
                    .with_rotation(heading_rotation(view.heading, view.turn_angle)),
            ))
            .id();
        mappings.vehicles.insert(view.id, entity);
    }
}

/// System to color signal heads from the controller state
pub fn sync_lights(
    sim_world: Res<SimWorldResource>,
    light_query: Query<(&LightLink, &MeshMaterial3d<StandardMaterial>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (link, material_handle) in light_query.iter() {
        if let Some(material) = materials.get_mut(&material_handle.0) {
            material.base_color = if sim_world.0.lights.is_green(link.0) {
                GREEN
            } else {
                RED
            };
        }
    }
}

/// System to refresh the status line
pub fn update_status_text(
    sim_world: Res<SimWorldResource>,
    mut text_query: Query<&mut Text, With<StatusText>>,
) {
    let world = &sim_world.0;
    for mut text in text_query.iter_mut() {
        **text = format!(
            "t={:.1}s  vehicles={}  completed={}  transfers={}  green={:?}  [Space] next phase  [Esc] quit",
            world.time,
            world.vehicle_count(),
            world.stats.completed,
            world.stats.transferred,
            world.lights.current_green(),
        );
    }
}
