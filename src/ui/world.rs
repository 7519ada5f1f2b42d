//! World setup systems for camera, lighting, roads and signal heads

use bevy::prelude::*;

use super::components::{
    to_ground, Ground, LightLink, MainCamera, StatusText, SimWorldResource, PIXELS_PER_UNIT,
};
use crate::simulation::{Direction, LanePosition};

const ROAD_COLOR: Color = Color::srgb(0.25, 0.25, 0.27);
const STOP_LINE_COLOR: Color = Color::srgb(0.9, 0.9, 0.9);
const RED: Color = Color::srgb(1.0, 0.0, 0.0);

/// System to setup the world environment (ground, lighting, camera)
pub fn setup_world(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sim_world: Res<SimWorldResource>,
) {
    let config = &sim_world.0.config;
    let width = config.window_width / PIXELS_PER_UNIT;
    let depth = config.window_height / PIXELS_PER_UNIT;

    // Top-down view; -Z is north on screen
    commands.spawn((
        MainCamera,
        Camera3d::default(),
        Transform::from_xyz(0.0, width.max(depth) * 0.9, 0.0).looking_at(Vec3::ZERO, -Vec3::Z),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Ground,
        Mesh3d(meshes.add(Plane3d::default().mesh().size(width, depth))),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.5, 0.3))),
    ));

    commands.spawn((
        StatusText,
        Text::new(""),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
    ));
}

/// System to lay out the two crossing roads, stop lines and one signal head per heading
pub fn setup_intersection(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sim_world: Res<SimWorldResource>,
) {
    let world = &sim_world.0;
    let config = &world.config;
    let geometry = world.geometry();
    let road = config.road_width() / PIXELS_PER_UNIT;
    let width = config.window_width / PIXELS_PER_UNIT;
    let depth = config.window_height / PIXELS_PER_UNIT;
    let road_material = materials.add(ROAD_COLOR);

    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(road, 0.05, depth))),
        MeshMaterial3d(road_material.clone()),
        Transform::from_xyz(0.0, 0.01, 0.0),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(width, 0.05, road))),
        MeshMaterial3d(road_material),
        Transform::from_xyz(0.0, 0.01, 0.0),
    ));

    let line_material = materials.add(STOP_LINE_COLOR);
    let lane = config.lane_width / PIXELS_PER_UNIT;

    for direction in Direction::ALL {
        let center = geometry.lane_point(direction, LanePosition::Center, geometry.stop_line());
        let stop = to_ground(&center, &geometry.center, 0.04);
        let along_x = matches!(direction, Direction::North | Direction::South);
        let (sx, sz) = if along_x {
            (lane * 3.0, 0.2)
        } else {
            (0.2, lane * 3.0)
        };

        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(sx, 0.02, sz))),
            MeshMaterial3d(line_material.clone()),
            Transform::from_translation(stop),
        ));

        // Signal head on the kerb at the right of the approach
        let kerb = geometry.lane_point(
            direction,
            LanePosition::Right,
            geometry.stop_line() - config.vehicle_size,
        );
        let mut head = to_ground(&kerb, &geometry.center, 1.0);
        let right = direction.right_hand();
        head.x += right.x * lane;
        head.z += right.y * lane;

        commands.spawn((
            LightLink(direction),
            Mesh3d(meshes.add(Sphere::new(0.8))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: RED,
                unlit: true,
                ..default()
            })),
            Transform::from_translation(head),
        ));
    }
}
