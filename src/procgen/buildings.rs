//! Modular building assembly: wall rings stacked floor by floor, capped by a
//! flat roof.
//!
//! A floor ring is four faces. Each face is a run of wall modules ended by a
//! corner module; every following face turns 90° clockwise (seen from above)
//! and starts one `wall depth + corner depth` shift past the previous corner.
//! With uniform wall depth the fourth corner plus that shift lands exactly on
//! the first face's start, so the ring always closes.
//!
//! Assembly is resumable: [`BuildingAssembly::step`] builds one floor and
//! hands back either the continuation or the finished [`Building`].

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use rand::Rng;
use smallvec::SmallVec;

use super::building_factory::Footprint;
use super::lod::{LodGroup, LodThresholds};
use super::modules::{MaterialId, ModuleSet};
use crate::scene::{Bounds, Instantiator, NodeKind, NodeSpec, SceneId};

#[derive(Clone, Debug, PartialEq)]
pub struct AssemblyConfig {
    /// Vertical spacing between floors.
    pub floor_height: f32,
    /// Gap between the top floor and the roof cap.
    pub roof_offset: f32,
    /// Detail levels, or `None` to skip the proxy.
    pub lod: Option<LodThresholds>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            floor_height: 4.0,
            roof_offset: 0.01,
            lod: Some(LodThresholds::default()),
        }
    }
}

/// One placed module.
#[derive(Clone, Debug, PartialEq)]
pub struct ModulePlacement {
    pub node: SceneId,
    pub transform: Transform,
}

/// Wall run plus terminating corner along one side of a floor.
#[derive(Clone, Debug, PartialEq)]
pub struct WallFace {
    pub start: Vec3,
    pub rotation: Quat,
    pub walls: SmallVec<[ModulePlacement; 8]>,
    pub corner: ModulePlacement,
}

impl WallFace {
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

/// The four faces of one floor.
#[derive(Clone, Debug, PartialEq)]
pub struct FloorRing {
    pub level: u32,
    pub node: SceneId,
    pub faces: SmallVec<[WallFace; 4]>,
    /// Offset from a corner to the start of the next face.
    pub shift: f32,
}

impl FloorRing {
    /// Where a fifth face would start: the last corner shifted along the
    /// next direction. Equals the first face's start on a closed ring.
    pub fn closing_point(&self) -> Option<Vec3> {
        let last = self.faces.last()?;
        let next_forward = (last.rotation * quarter_turn()) * Vec3::Z;
        Some(last.corner.transform.translation + next_forward * self.shift)
    }

    pub fn module_count(&self) -> usize {
        self.faces.iter().map(|face| face.walls.len() + 1).sum()
    }
}

/// Flat quad covering the building footprint.
#[derive(Clone, Debug, PartialEq)]
pub struct RoofCap {
    pub node: SceneId,
    /// Ground-level world position of the roof's min corner.
    pub origin: Vec3,
    pub side: f32,
    /// Height of the quad above `origin`.
    pub height: f32,
    pub material: MaterialId,
}

impl RoofCap {
    /// Two counter-clockwise triangles facing +Y.
    pub const INDICES: [u32; 6] = [0, 2, 1, 2, 3, 1];
    pub const UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

    /// Quad corners relative to `origin`.
    pub fn local_vertices(&self) -> [Vec3; 4] {
        let (s, h) = (self.side, self.height);
        [
            Vec3::new(0.0, h, 0.0),
            Vec3::new(s, h, 0.0),
            Vec3::new(0.0, h, s),
            Vec3::new(s, h, s),
        ]
    }

    pub fn world_vertices(&self) -> [Vec3; 4] {
        self.local_vertices().map(|v| v + self.origin)
    }

    fn local_bounds(&self) -> Bounds {
        Bounds {
            min: Vec3::new(0.0, self.height, 0.0),
            max: Vec3::new(self.side, self.height, self.side),
        }
    }

    /// Render mesh in local space; place it with a translation to `origin`.
    pub fn to_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self.local_vertices().iter().map(|v| v.to_array()).collect();
        let normals = vec![[0.0, 1.0, 0.0]; 4];

        Mesh::new(PrimitiveTopology::TriangleList, default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
            .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
            .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, Self::UVS.to_vec())
            .with_inserted_indices(Indices::U32(Self::INDICES.to_vec()))
    }
}

/// Realized geometry of one footprint.
#[derive(Clone, Debug, PartialEq)]
pub struct Building {
    pub footprint: Footprint,
    pub root: SceneId,
    pub floors: Vec<FloorRing>,
    pub roof: RoofCap,
    pub lod: Option<LodGroup>,
}

impl Building {
    pub fn module_count(&self) -> usize {
        self.floors.iter().map(FloorRing::module_count).sum()
    }

    pub fn height(&self) -> f32 {
        self.roof.height
    }
}

fn quarter_turn() -> Quat {
    Quat::from_rotation_y(-FRAC_PI_2)
}

/// Skins footprints with modules from one palette.
pub struct ModularBuildingAssembler<'a> {
    palette: &'a ModuleSet,
    config: &'a AssemblyConfig,
}

impl<'a> ModularBuildingAssembler<'a> {
    pub fn new(palette: &'a ModuleSet, config: &'a AssemblyConfig) -> Self {
        Self { palette, config }
    }

    /// Shift between a corner and the start of the next face.
    pub fn shift(&self) -> f32 {
        self.palette.wall_depth() + self.palette.corner_depth()
    }

    /// Building origin for a footprint: the max-x edge, one wall depth in from
    /// the min-z edge, facing +Z. The first face runs up the max-x side.
    pub fn origin_for(&self, footprint: &Footprint, ground: f32) -> Transform {
        Transform::from_xyz(
            footprint.min.x + footprint.side,
            ground,
            footprint.min.y + self.palette.wall_depth(),
        )
    }

    /// Spawn the building root under `parent` and return the pending assembly.
    pub fn begin(
        &self,
        footprint: Footprint,
        parent: SceneId,
        ground: f32,
        scene: &mut impl Instantiator,
    ) -> BuildingAssembly {
        let origin = self.origin_for(&footprint, ground);
        let root = scene.spawn(
            NodeSpec::group(NodeKind::Building, "Building", origin),
            Some(parent),
        );
        BuildingAssembly {
            floors: Vec::with_capacity(footprint.floor_count as usize),
            footprint,
            root,
            origin,
            next_floor: 0,
            detailed: Vec::new(),
        }
    }

    /// Assemble a whole building in one call.
    pub fn assemble(
        &self,
        footprint: Footprint,
        parent: SceneId,
        ground: f32,
        scene: &mut impl Instantiator,
        rng: &mut impl Rng,
    ) -> Building {
        let mut assembly = self.begin(footprint, parent, ground, scene);
        loop {
            match assembly.step(self, scene, rng) {
                AssemblyStep::Pending(next) => assembly = next,
                AssemblyStep::Complete(building) => return building,
            }
        }
    }

    fn build_floor(
        &self,
        level: u32,
        wall_count: u32,
        origin: Transform,
        building: SceneId,
        scene: &mut impl Instantiator,
        rng: &mut impl Rng,
        detailed: &mut Vec<SceneId>,
    ) -> FloorRing {
        let y = origin.translation.y + level as f32 * self.config.floor_height;
        let floor_origin = Vec3::new(origin.translation.x, y, origin.translation.z);
        let node = scene.spawn(
            NodeSpec::group(
                NodeKind::Floor,
                format!("Floor_{level}"),
                Transform::from_translation(floor_origin).with_rotation(origin.rotation),
            ),
            Some(building),
        );

        let shift = self.shift();
        let mut faces: SmallVec<[WallFace; 4]> = SmallVec::new();

        for _ in 0..4 {
            let (start, rotation) = match faces.last() {
                None => (
                    floor_origin + origin.rotation * Vec3::Z * self.palette.corner_depth(),
                    origin.rotation,
                ),
                Some(previous) => {
                    let rotation = previous.rotation * quarter_turn();
                    let start =
                        previous.corner.transform.translation + rotation * Vec3::Z * shift;
                    (Vec3::new(start.x, y, start.z), rotation)
                }
            };
            let face = self.build_face(start, rotation, wall_count, node, scene, rng, detailed);
            faces.push(face);
        }

        FloorRing {
            level,
            node,
            faces,
            shift,
        }
    }

    fn build_face(
        &self,
        start: Vec3,
        rotation: Quat,
        wall_count: u32,
        parent: SceneId,
        scene: &mut impl Instantiator,
        rng: &mut impl Rng,
        detailed: &mut Vec<SceneId>,
    ) -> WallFace {
        let forward = rotation * Vec3::Z;
        let mut cursor = start;
        let mut walls = SmallVec::new();

        for _ in 0..wall_count {
            let module = self.palette.pick_wall(rng);
            let transform = Transform::from_translation(cursor).with_rotation(rotation);
            let node = scene.instantiate(module, NodeKind::WallModule, transform, parent);
            detailed.push(node);
            walls.push(ModulePlacement { node, transform });
            cursor += forward * module.depth();
        }

        let corner_at = cursor - forward * self.palette.corner_depth();
        let transform = Transform::from_translation(corner_at).with_rotation(rotation);
        let node = scene.instantiate(&self.palette.corner, NodeKind::CornerModule, transform, parent);
        detailed.push(node);

        WallFace {
            start,
            rotation,
            walls,
            corner: ModulePlacement { node, transform },
        }
    }

    fn build_roof(
        &self,
        footprint: &Footprint,
        origin: Transform,
        building: SceneId,
        scene: &mut impl Instantiator,
    ) -> RoofCap {
        let wall_depth = self.palette.wall_depth();
        let side = (footprint.wall_count + 1) as f32 * wall_depth;
        let roof_origin = Vec3::new(
            origin.translation.x - side,
            origin.translation.y,
            origin.translation.z - wall_depth,
        );

        let mut roof = RoofCap {
            node: building,
            origin: roof_origin,
            side,
            height: footprint.floor_count as f32 * self.config.floor_height
                + self.config.roof_offset,
            material: self.palette.material(),
        };
        roof.node = scene.spawn(
            NodeSpec {
                kind: NodeKind::Roof,
                name: "Roof".to_string(),
                transform: Transform::from_translation(roof_origin),
                local_bounds: Some(roof.local_bounds()),
            },
            Some(building),
        );
        roof
    }
}

/// A building part-way through assembly.
#[derive(Clone, Debug)]
pub struct BuildingAssembly {
    footprint: Footprint,
    root: SceneId,
    origin: Transform,
    next_floor: u32,
    floors: Vec<FloorRing>,
    detailed: Vec<SceneId>,
}

/// Result of advancing an assembly by one floor.
#[derive(Debug)]
pub enum AssemblyStep {
    Pending(BuildingAssembly),
    Complete(Building),
}

impl BuildingAssembly {
    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn root(&self) -> SceneId {
        self.root
    }

    /// Index of the floor the next step will build.
    pub fn next_floor(&self) -> u32 {
        self.next_floor
    }

    /// Build one floor; the last floor also gets the roof and detail levels.
    pub fn step(
        mut self,
        assembler: &ModularBuildingAssembler,
        scene: &mut impl Instantiator,
        rng: &mut impl Rng,
    ) -> AssemblyStep {
        if self.next_floor < self.footprint.floor_count {
            let ring = assembler.build_floor(
                self.next_floor,
                self.footprint.wall_count,
                self.origin,
                self.root,
                scene,
                rng,
                &mut self.detailed,
            );
            self.floors.push(ring);
            self.next_floor += 1;

            if self.next_floor < self.footprint.floor_count {
                return AssemblyStep::Pending(self);
            }
        }

        let roof = assembler.build_roof(&self.footprint, self.origin, self.root, scene);
        self.detailed.push(roof.node);
        let lod = assembler
            .config
            .lod
            .and_then(|thresholds| LodGroup::build(scene, self.root, self.detailed, thresholds));

        AssemblyStep::Complete(Building {
            footprint: self.footprint,
            root: self.root,
            floors: self.floors,
            roof,
            lod,
        })
    }
}
