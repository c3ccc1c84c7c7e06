//! Headless GridCity demo.
//!
//! Generates one city (optionally with the seed given as the first argument),
//! prints the road grid and a summary, then exits.

use bevy::app::AppExit;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use gridcity::generation::CityGenerationState;
use gridcity::scene::NodeKind;
use gridcity::{CityGenConfig, CityGenerationPlugin};

fn main() {
    let mut config = CityGenConfig::default();
    if let Some(arg) = std::env::args().nth(1) {
        match arg.parse() {
            Ok(seed) => config.seed = seed,
            Err(_) => eprintln!("Ignoring invalid seed {arg:?}, using {}", config.seed),
        }
    }

    App::new()
        .add_plugins(MinimalPlugins)
        .add_plugins(LogPlugin::default())
        .insert_resource(config)
        .add_plugins(CityGenerationPlugin)
        .add_systems(Update, report_and_exit.run_if(generation_settled))
        .run();
}

fn generation_settled(state: Res<CityGenerationState>) -> bool {
    !state.is_generating() && (state.city.is_some() || state.last_error.is_some())
}

fn report_and_exit(state: Res<CityGenerationState>, mut exit: EventWriter<AppExit>) {
    if let Some(err) = &state.last_error {
        error!("Generation failed: {err}");
        exit.send(AppExit::error());
        return;
    }

    if let Some(city) = &state.city {
        println!("{}", city.grid.render_ascii());
        println!("seed:        {}", city.seed);
        println!("road cells:  {}", city.grid.road_count());
        println!("blocks:      {}", city.blocks.len());
        println!("buildings:   {}", city.buildings.len());
        println!("modules:     {}", city.module_count());
        println!("lod proxies: {}", city.scene.count_kind(NodeKind::LodProxy));
        println!("scene nodes: {}", city.scene.len());
    }
    exit.send(AppExit::Success);
}
