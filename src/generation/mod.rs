//! City generation pass: roads, blocks, footprints, then building geometry.
//!
//! [`CityGeneration`] is a resumable task. Each [`CityGeneration::step`] does
//! one unit of work so a frame loop can spread a large city over many frames:
//!
//! 1. Layout: validate, plan the road grid, spawn road tiles.
//! 2. Placement: subdivide blocks, spawn ground tiles, place footprints.
//! 3. Assembly: one floor of one building per step.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bevy::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

pub mod commands;

pub use commands::{
    CityGenerationPlugin, CityGenerationState, ClearCity, RandomizeCity, RegenerateCity,
};

use crate::error::{GenerationError, Result};
use crate::procgen::block_extractor::{subdivide, Block};
use crate::procgen::building_factory::{BuildingPlacer, Footprint, PlacementConfig};
use crate::procgen::buildings::{
    AssemblyConfig, AssemblyStep, Building, BuildingAssembly, ModularBuildingAssembler,
};
use crate::procgen::modules::{ModuleLibrary, PaletteProvider};
use crate::procgen::road_generator::{RoadLayoutConfig, RoadLayoutPlanner};
use crate::scene::{Instantiator, NodeKind, NodeSpec, SceneArena, SceneId};
use crate::world::grid::OccupancyGrid;
use crate::world::WorldConfig;

/// Everything a generation pass needs besides the module library.
#[derive(Resource, Clone, Debug)]
pub struct CityGenConfig {
    pub roads: RoadLayoutConfig,
    pub placement: PlacementConfig,
    pub assembly: AssemblyConfig,
    pub world: WorldConfig,
    pub seed: u64,
    /// Generation steps run per frame by the plugin.
    pub steps_per_frame: u32,
}

impl Default for CityGenConfig {
    fn default() -> Self {
        Self {
            roads: RoadLayoutConfig::default(),
            placement: PlacementConfig::default(),
            assembly: AssemblyConfig::default(),
            world: WorldConfig::default(),
            seed: 42,
            steps_per_frame: 64,
        }
    }
}

impl CityGenConfig {
    pub fn validate(&self) -> Result<()> {
        self.roads.validate()?;
        self.placement.validate()?;
        if !(self.assembly.floor_height > 0.0) {
            return Err(GenerationError::ParameterOutOfRange {
                name: "floor height",
                value: self.assembly.floor_height,
                min: f32::EPSILON,
                max: f32::MAX,
            });
        }
        if !(self.world.tile_size > 0.0) {
            return Err(GenerationError::ParameterOutOfRange {
                name: "tile size",
                value: self.world.tile_size,
                min: f32::EPSILON,
                max: f32::MAX,
            });
        }
        Ok(())
    }
}

/// Shared flag for cancelling a running pass from outside.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationStage {
    Layout,
    Placement,
    Assembly,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub stage: GenerationStage,
    pub buildings_done: usize,
    pub buildings_total: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationStatus {
    InProgress(Progress),
    Complete,
    Cancelled,
}

/// Output of a finished pass.
#[derive(Clone, Debug)]
pub struct City {
    pub grid: OccupancyGrid,
    pub blocks: Vec<Block>,
    pub footprints: Vec<Footprint>,
    pub buildings: Vec<Building>,
    pub scene: SceneArena,
    pub root: SceneId,
    pub seed: u64,
}

impl City {
    pub fn module_count(&self) -> usize {
        self.buildings.iter().map(Building::module_count).sum()
    }
}

/// A resumable generation pass owning its grid, footprints and scene.
pub struct CityGeneration {
    config: CityGenConfig,
    library: ModuleLibrary,
    rng: StdRng,
    cancel: CancelToken,
    stage: GenerationStage,
    failure: Option<GenerationError>,
    cancelled: bool,
    scene: SceneArena,
    root: Option<SceneId>,
    grid: Option<OccupancyGrid>,
    blocks: Vec<Block>,
    block_nodes: Vec<SceneId>,
    footprints: Vec<Footprint>,
    queue: VecDeque<usize>,
    current: Option<BuildingAssembly>,
    buildings: Vec<Building>,
}

impl CityGeneration {
    pub fn new(config: CityGenConfig, library: ModuleLibrary) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            library,
            rng,
            cancel: CancelToken::default(),
            stage: GenerationStage::Layout,
            failure: None,
            cancelled: false,
            scene: SceneArena::new(),
            root: None,
            grid: None,
            blocks: Vec::new(),
            block_nodes: Vec::new(),
            footprints: Vec::new(),
            queue: VecDeque::new(),
            current: None,
            buildings: Vec::new(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn stage(&self) -> GenerationStage {
        self.stage
    }

    pub fn scene(&self) -> &SceneArena {
        &self.scene
    }

    pub fn progress(&self) -> Progress {
        Progress {
            stage: self.stage,
            buildings_done: self.buildings.len(),
            buildings_total: self.footprints.len(),
        }
    }

    /// Perform one unit of work.
    pub fn step(&mut self) -> Result<GenerationStatus> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.cancelled {
            return Ok(GenerationStatus::Cancelled);
        }
        if self.stage != GenerationStage::Finished && self.cancel.is_cancelled() {
            info!("City generation cancelled");
            self.teardown();
            self.cancelled = true;
            return Ok(GenerationStatus::Cancelled);
        }

        let result = match self.stage {
            GenerationStage::Layout => self.plan_layout(),
            GenerationStage::Placement => self.place_buildings(),
            GenerationStage::Assembly => self.assemble_next(),
            GenerationStage::Finished => Ok(()),
        };

        if let Err(err) = result {
            warn!("City generation aborted: {err}");
            self.teardown();
            self.failure = Some(err.clone());
            return Err(err);
        }

        Ok(match self.stage {
            GenerationStage::Finished => GenerationStatus::Complete,
            _ => GenerationStatus::InProgress(self.progress()),
        })
    }

    /// Drive the pass to completion.
    pub fn run(mut self) -> Result<City> {
        loop {
            match self.step()? {
                GenerationStatus::InProgress(_) => continue,
                GenerationStatus::Complete => break,
                GenerationStatus::Cancelled => return Err(GenerationError::Cancelled),
            }
        }
        self.into_city().ok_or(GenerationError::Cancelled)
    }

    /// The finished city, or `None` if the pass has not completed.
    pub fn into_city(self) -> Option<City> {
        if self.stage != GenerationStage::Finished || self.failure.is_some() || self.cancelled {
            return None;
        }
        Some(City {
            grid: self.grid?,
            blocks: self.blocks,
            footprints: self.footprints,
            buildings: self.buildings,
            scene: self.scene,
            root: self.root?,
            seed: self.config.seed,
        })
    }

    fn teardown(&mut self) {
        self.scene.clear();
        self.root = None;
        self.grid = None;
        self.blocks.clear();
        self.block_nodes.clear();
        self.footprints.clear();
        self.queue.clear();
        self.current = None;
        self.buildings.clear();
        self.stage = GenerationStage::Finished;
    }

    fn plan_layout(&mut self) -> Result<()> {
        self.config.validate()?;
        self.library.validate(self.config.placement.module_width)?;

        info!(
            "Generating {}x{} city (seed {})...",
            self.config.roads.rows, self.config.roads.cols, self.config.seed
        );
        let grid = RoadLayoutPlanner::generate(&self.config.roads)?;

        let root = self.scene.spawn(
            NodeSpec::group(
                NodeKind::City,
                "City",
                Transform::from_translation(self.config.world.origin),
            ),
            None,
        );
        let center = grid.center();
        let ground = self.config.world.origin.y;
        for (row, col) in grid.roads() {
            // Tile pivots sit on the min-z edge, centered on x.
            let span = self.config.world.cell_span((row, row), (col, col), center);
            self.scene.instantiate(
                &self.library.road_tile,
                NodeKind::RoadTile,
                Transform::from_xyz(span.center().x, ground, span.min.y),
                root,
            );
        }

        info!("Road layout complete: {} road tiles", grid.road_count());
        self.root = Some(root);
        self.grid = Some(grid);
        self.stage = GenerationStage::Placement;
        Ok(())
    }

    fn place_buildings(&mut self) -> Result<()> {
        let (Some(grid), Some(root)) = (self.grid.as_ref(), self.root) else {
            self.stage = GenerationStage::Layout;
            return Ok(());
        };
        let world = &self.config.world;
        let overlay = &self.config.roads.grid;
        let mut placer = BuildingPlacer::new(&self.config.placement);

        for block in subdivide(grid, overlay.block_spacing, overlay.thickness) {
            let bounds = block.world_bounds(world, grid);
            let node = self.scene.spawn(
                NodeSpec::group(
                    NodeKind::Block,
                    format!("Block_{}", block.index),
                    Transform::from_xyz(bounds.center().x, world.origin.y, bounds.center().y),
                ),
                Some(root),
            );

            let tile = &self.library.ground_tile;
            let ground = Transform::from_xyz(bounds.center().x, world.origin.y, bounds.min.y)
                .with_scale(Vec3::new(
                    bounds.width() / tile.size.x,
                    1.0,
                    bounds.height() / tile.size.z,
                ));
            self.scene.instantiate(tile, NodeKind::GroundTile, ground, node);

            self.footprints.extend(placer.place(&block, bounds, &mut self.rng));
            self.block_nodes.push(node);
            self.blocks.push(block);
        }

        info!(
            "Placed {} buildings across {} blocks ({} skyscraper blocks)",
            self.footprints.len(),
            self.blocks.len(),
            placer.skyscrapers_spawned()
        );
        self.queue = (0..self.footprints.len()).collect();
        self.stage = GenerationStage::Assembly;
        Ok(())
    }

    fn assemble_next(&mut self) -> Result<()> {
        let assembly = match self.current.take() {
            Some(assembly) => assembly,
            None => {
                let Some(index) = self.queue.pop_front() else {
                    info!(
                        "City generation complete: {} buildings, {} scene nodes",
                        self.buildings.len(),
                        self.scene.len()
                    );
                    self.stage = GenerationStage::Finished;
                    return Ok(());
                };
                let footprint = self.footprints[index].clone();
                let palette = self
                    .library
                    .palette(footprint.tier)
                    .ok_or(GenerationError::MissingPalette(footprint.tier))?;
                let Some(parent) = self.block_nodes.get(footprint.block).copied().or(self.root)
                else {
                    return Ok(());
                };
                ModularBuildingAssembler::new(palette, &self.config.assembly).begin(
                    footprint,
                    parent,
                    self.config.world.origin.y,
                    &mut self.scene,
                )
            }
        };

        let tier = assembly.footprint().tier;
        let palette = self
            .library
            .palette(tier)
            .ok_or(GenerationError::MissingPalette(tier))?;
        let assembler = ModularBuildingAssembler::new(palette, &self.config.assembly);

        match assembly.step(&assembler, &mut self.scene, &mut self.rng) {
            AssemblyStep::Pending(next) => self.current = Some(next),
            AssemblyStep::Complete(building) => {
                debug!(
                    "Building {} done: {} floors, {} modules",
                    self.buildings.len(),
                    building.floors.len(),
                    building.module_count()
                );
                self.buildings.push(building);
            }
        }
        Ok(())
    }
}

/// Generate a whole city synchronously.
pub fn generate_city(config: &CityGenConfig, library: &ModuleLibrary) -> Result<City> {
    CityGeneration::new(config.clone(), library.clone()).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::lot_geometry::rect_within;
    use crate::procgen::zoning::DensityTier;
    use std::collections::HashSet;

    fn small_config(seed: u64) -> CityGenConfig {
        let mut config = CityGenConfig {
            seed,
            ..Default::default()
        };
        config.roads.rows = 30;
        config.roads.cols = 30;
        if let Some(core) = config.roads.core.as_mut() {
            core.radius = 5;
        }
        if let Some(streets) = config.roads.main_streets.as_mut() {
            streets.length = 10;
        }
        config
    }

    #[test]
    fn default_city_is_consistent() {
        let city = generate_city(&CityGenConfig::default(), &ModuleLibrary::default()).unwrap();

        assert!(!city.blocks.is_empty());
        assert!(!city.footprints.is_empty());
        assert_eq!(city.buildings.len(), city.footprints.len());
        assert_eq!(city.scene.count_kind(NodeKind::Block), city.blocks.len());
        assert_eq!(city.scene.count_kind(NodeKind::Building), city.buildings.len());
        assert_eq!(city.scene.count_kind(NodeKind::RoadTile), city.grid.road_count());
        assert_eq!(city.scene.count_kind(NodeKind::GroundTile), city.blocks.len());
        assert_eq!(city.scene.count_kind(NodeKind::Roof), city.buildings.len());

        let world = WorldConfig::default();
        for footprint in &city.footprints {
            let block = &city.blocks[footprint.block];
            let bounds = block.world_bounds(&world, &city.grid);
            assert!(rect_within(footprint.bounds(), bounds, 1e-3));
        }

        for footprint in &city.footprints {
            assert_eq!(footprint.tier, city.blocks[footprint.block].tier);
        }
        let core_blocks: HashSet<usize> = city
            .footprints
            .iter()
            .filter(|fp| fp.tier == DensityTier::Core)
            .map(|fp| fp.block)
            .collect();
        for block in core_blocks {
            let count = city.footprints.iter().filter(|fp| fp.block == block).count();
            assert!((1..=2).contains(&count));
        }
    }

    #[test]
    fn road_tiles_cover_their_cells() {
        let city = generate_city(&small_config(2), &ModuleLibrary::default()).unwrap();
        let world = WorldConfig::default();
        let center = city.grid.center();
        let tiles: Vec<SceneId> = city
            .scene
            .iter()
            .filter(|(_, node)| node.kind == NodeKind::RoadTile)
            .map(|(id, _)| id)
            .collect();

        assert_eq!(tiles.len(), city.grid.road_count());
        for (id, (row, col)) in tiles.into_iter().zip(city.grid.roads()) {
            let bounds = city.scene.bounds(id).unwrap();
            let span = world.cell_span((row, row), (col, col), center);
            assert!(
                Vec2::new(bounds.min.x, bounds.min.z).abs_diff_eq(span.min, 1e-3),
                "tile ({row}, {col}) starts at {}, cell at {}",
                bounds.min,
                span.min
            );
            assert!(Vec2::new(bounds.max.x, bounds.max.z).abs_diff_eq(span.max, 1e-3));
        }
    }

    #[test]
    fn cancelling_after_completion_keeps_the_city() {
        let mut generation = CityGeneration::new(small_config(9), ModuleLibrary::default());
        let token = generation.cancel_token();
        while generation.step() != Ok(GenerationStatus::Complete) {}

        token.cancel();
        assert_eq!(generation.step(), Ok(GenerationStatus::Complete));
        assert!(!generation.scene().is_empty());
        assert!(generation.into_city().is_some());
    }

    #[test]
    fn buildings_hang_under_their_blocks() {
        let city = generate_city(&small_config(3), &ModuleLibrary::default()).unwrap();
        let block_ids: Vec<SceneId> = city.scene.children(city.root).collect();

        for building in &city.buildings {
            let parent = city.scene.parent(building.root).unwrap();
            assert_eq!(city.scene.get(parent).unwrap().kind, NodeKind::Block);
            assert!(block_ids.contains(&parent));
        }
    }

    #[test]
    fn same_seed_same_city() {
        let library = ModuleLibrary::default();
        let a = generate_city(&small_config(11), &library).unwrap();
        let b = generate_city(&small_config(11), &library).unwrap();
        let c = generate_city(&small_config(12), &library).unwrap();

        assert_eq!(a.grid, b.grid);
        assert_eq!(a.footprints, b.footprints);
        assert_eq!(a.scene.len(), b.scene.len());
        assert_eq!(a.grid, c.grid);
        assert_ne!(a.footprints, c.footprints);
    }

    #[test]
    fn stepping_reports_progress() {
        let mut generation = CityGeneration::new(small_config(5), ModuleLibrary::default());

        assert_eq!(
            generation.step(),
            Ok(GenerationStatus::InProgress(Progress {
                stage: GenerationStage::Placement,
                buildings_done: 0,
                buildings_total: 0,
            }))
        );
        let Ok(GenerationStatus::InProgress(progress)) = generation.step() else {
            panic!("placement should leave the pass in progress");
        };
        assert_eq!(progress.stage, GenerationStage::Assembly);

        let mut steps = 0;
        while generation.step() != Ok(GenerationStatus::Complete) {
            steps += 1;
            assert!(steps < 100_000);
        }
        let city = generation.into_city().unwrap();
        let floors: u32 = city.footprints.iter().map(|fp| fp.floor_count).sum();
        // One step per floor plus the final empty-queue step.
        assert_eq!(steps, floors as usize);
    }

    #[test]
    fn cancelling_tears_down_the_scene() {
        let mut generation = CityGeneration::new(small_config(7), ModuleLibrary::default());
        let token = generation.cancel_token();

        generation.step().unwrap();
        generation.step().unwrap();
        assert!(!generation.scene().is_empty());

        token.cancel();
        assert_eq!(generation.step(), Ok(GenerationStatus::Cancelled));
        assert!(generation.scene().is_empty());
        assert!(generation.into_city().is_none());
    }

    #[test]
    fn invalid_config_aborts_on_first_step() {
        let mut config = small_config(1);
        config.roads.grid.block_spacing = 1;
        let mut generation = CityGeneration::new(config, ModuleLibrary::default());

        assert!(matches!(
            generation.step(),
            Err(GenerationError::ParameterOutOfRange {
                name: "block spacing",
                ..
            })
        ));
        assert!(generation.scene().is_empty());
        assert!(generation.step().is_err());
    }

    #[test]
    fn missing_palette_aborts() {
        let library = ModuleLibrary {
            core: None,
            ..Default::default()
        };
        assert_eq!(
            generate_city(&small_config(1), &library).unwrap_err(),
            GenerationError::MissingPalette(DensityTier::Core)
        );
    }
}
