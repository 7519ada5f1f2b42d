//! UI module that visualizes the simulation state using Bevy
//!
//! This module is purely for visualization - all simulation logic is in the `simulation` module.
//! The UI reads a `RenderFrame` from `SimWorld` every frame and mirrors it with 3D meshes.

mod components;
mod input;
mod sync;
mod world;

use bevy::prelude::*;

pub use components::{EntityMappings, SimWorldResource};

use input::handle_input;
use sync::{sync_lights, sync_vehicles, tick_simulation, update_status_text};
use world::{setup_intersection, setup_world};

/// Plugin to register all UI systems
pub struct IntersectionUIPlugin;

impl Plugin for IntersectionUIPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimWorldResource>()
            .init_resource::<EntityMappings>()
            .add_systems(Startup, (setup_world, setup_intersection.after(setup_world)))
            .add_systems(FixedUpdate, tick_simulation)
            .add_systems(
                Update,
                (sync_vehicles, sync_lights, update_status_text, handle_input),
            );
    }
}
