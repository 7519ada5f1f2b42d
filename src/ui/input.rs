//! Input handling systems

use bevy::prelude::*;

use super::components::SimWorldResource;

/// Escape exits, Space forces the next light phase
pub fn handle_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut sim_world: ResMut<SimWorldResource>,
    mut exit: MessageWriter<AppExit>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
    if keyboard.just_pressed(KeyCode::Space) {
        let green = sim_world.0.lights.advance();
        info!("Forced light phase, {:?} is green", green);
    }
}
