//! Bevy wiring: command events and the per-frame generation driver.

use bevy::prelude::*;

use super::{City, CityGenConfig, CityGeneration, GenerationStatus};
use crate::error::GenerationError;
use crate::procgen::modules::ModuleLibrary;

/// Throw away the current city and generate a new one with the current seed.
#[derive(Event)]
pub struct RegenerateCity;

/// Throw away the current city.
#[derive(Event)]
pub struct ClearCity;

/// Pick a new seed, then regenerate.
#[derive(Event)]
pub struct RandomizeCity;

/// The running pass, the last finished city and the last failure.
#[derive(Resource, Default)]
pub struct CityGenerationState {
    pub active: Option<CityGeneration>,
    pub city: Option<City>,
    pub last_error: Option<GenerationError>,
}

impl CityGenerationState {
    pub fn is_generating(&self) -> bool {
        self.active.is_some()
    }
}

pub struct CityGenerationPlugin;

impl Plugin for CityGenerationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CityGenConfig>()
            .init_resource::<ModuleLibrary>()
            .init_resource::<CityGenerationState>()
            .add_event::<RegenerateCity>()
            .add_event::<ClearCity>()
            .add_event::<RandomizeCity>()
            .add_systems(Startup, trigger_initial_generation)
            .add_systems(
                Update,
                (
                    handle_commands,
                    drive_generation.run_if(generation_active),
                )
                    .chain(),
            );
    }
}

fn trigger_initial_generation(mut events: EventWriter<RegenerateCity>) {
    events.send(RegenerateCity);
}

fn generation_active(state: Res<CityGenerationState>) -> bool {
    state.is_generating()
}

fn handle_commands(
    mut regenerate: EventReader<RegenerateCity>,
    mut clear: EventReader<ClearCity>,
    mut randomize: EventReader<RandomizeCity>,
    mut config: ResMut<CityGenConfig>,
    library: Res<ModuleLibrary>,
    mut state: ResMut<CityGenerationState>,
) {
    let cleared = clear.read().count() > 0;
    let randomized = randomize.read().count() > 0;
    let regenerated = regenerate.read().count() > 0;

    if cleared {
        info!("Clearing city");
        state.active = None;
        state.city = None;
        state.last_error = None;
    }

    if randomized {
        config.seed = rand::random();
        info!("Randomized city seed: {}", config.seed);
    }

    if randomized || regenerated {
        if let Some(previous) = state.active.take() {
            previous.cancel_token().cancel();
            debug!("Dropped unfinished generation (seed {})", previous.seed());
        }
        state.city = None;
        state.last_error = None;
        state.active = Some(CityGeneration::new(config.clone(), library.clone()));
    }
}

fn drive_generation(config: Res<CityGenConfig>, mut state: ResMut<CityGenerationState>) {
    let Some(mut generation) = state.active.take() else {
        return;
    };

    for _ in 0..config.steps_per_frame.max(1) {
        match generation.step() {
            Ok(GenerationStatus::InProgress(_)) => continue,
            Ok(GenerationStatus::Complete) => {
                state.city = generation.into_city();
                return;
            }
            Ok(GenerationStatus::Cancelled) => return,
            Err(err) => {
                state.last_error = Some(err);
                return;
            }
        }
    }

    state.active = Some(generation);
}
