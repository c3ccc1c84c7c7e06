//! Two-level detail grouping for assembled buildings.
//!
//! The detailed level is every module and the roof; the coarse level is one
//! box proxy enclosing them. Selection is by screen coverage.

use bevy::prelude::*;

use crate::scene::{Bounds, Instantiator, NodeKind, NodeSpec, SceneId};

/// Screen-coverage cutoffs, as fractions of the viewport height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodThresholds {
    /// Coverage at or above which the detailed modules are shown.
    pub detailed: f32,
    /// Coverage at or above which the proxy is shown.
    pub proxy: f32,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            detailed: 0.20,
            proxy: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LodSelection {
    Detailed,
    Proxy,
    Hidden,
}

/// Detailed nodes plus their box proxy.
#[derive(Clone, Debug, PartialEq)]
pub struct LodGroup {
    pub detailed: Vec<SceneId>,
    pub proxy: SceneId,
    pub bounds: Bounds,
    pub thresholds: LodThresholds,
}

impl LodGroup {
    /// Enclose `detailed` and spawn a box proxy under `parent`.
    ///
    /// Returns `None` when none of the nodes has geometry.
    pub fn build(
        scene: &mut impl Instantiator,
        parent: SceneId,
        detailed: Vec<SceneId>,
        thresholds: LodThresholds,
    ) -> Option<Self> {
        let mut boxes = detailed.iter().filter_map(|id| scene.bounds(*id));
        let mut bounds = boxes.next()?;
        for b in boxes {
            bounds.encapsulate(b);
        }

        let proxy = scene.spawn(
            NodeSpec {
                kind: NodeKind::LodProxy,
                name: "LOD1".to_string(),
                transform: Transform::from_translation(bounds.center())
                    .with_scale(bounds.size()),
                local_bounds: Some(Bounds {
                    min: Vec3::splat(-0.5),
                    max: Vec3::splat(0.5),
                }),
            },
            Some(parent),
        );

        Some(Self {
            detailed,
            proxy,
            bounds,
            thresholds,
        })
    }

    pub fn select(&self, coverage: f32) -> LodSelection {
        if coverage >= self.thresholds.detailed {
            LodSelection::Detailed
        } else if coverage >= self.thresholds.proxy {
            LodSelection::Proxy
        } else {
            LodSelection::Hidden
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::modules::{MaterialId, ModulePrototype};
    use crate::scene::SceneArena;

    #[test]
    fn proxy_encloses_detailed_nodes() {
        let mut arena = SceneArena::new();
        let root = arena.spawn(
            NodeSpec::group(NodeKind::Building, "Building", Transform::IDENTITY),
            None,
        );
        let panel = ModulePrototype::new("panel", Vec3::new(1.0, 4.0, 4.0), MaterialId(0));
        let a = arena.instantiate(&panel, NodeKind::WallModule, Transform::IDENTITY, root);
        let b = arena.instantiate(
            &panel,
            NodeKind::WallModule,
            Transform::from_xyz(0.0, 4.0, 4.0),
            root,
        );

        let group = LodGroup::build(&mut arena, root, vec![a, b], LodThresholds::default())
            .unwrap();

        assert_eq!(group.bounds.min, Vec3::new(-0.5, 0.0, 0.0));
        assert_eq!(group.bounds.max, Vec3::new(0.5, 8.0, 8.0));
        let proxy = arena.get(group.proxy).unwrap();
        assert_eq!(proxy.kind, NodeKind::LodProxy);
        assert_eq!(proxy.transform.scale, Vec3::new(1.0, 8.0, 8.0));
        assert_eq!(arena.parent(group.proxy), Some(root));
    }

    #[test]
    fn selection_follows_coverage() {
        let mut arena = SceneArena::new();
        let root = arena.spawn(
            NodeSpec::group(NodeKind::Building, "Building", Transform::IDENTITY),
            None,
        );
        let panel = ModulePrototype::new("panel", Vec3::ONE, MaterialId(0));
        let a = arena.instantiate(&panel, NodeKind::WallModule, Transform::IDENTITY, root);
        let group = LodGroup::build(&mut arena, root, vec![a], LodThresholds::default()).unwrap();

        assert_eq!(group.select(0.5), LodSelection::Detailed);
        assert_eq!(group.select(0.2), LodSelection::Detailed);
        assert_eq!(group.select(0.1), LodSelection::Proxy);
        assert_eq!(group.select(0.01), LodSelection::Hidden);
    }

    #[test]
    fn nothing_to_enclose_builds_nothing() {
        let mut arena = SceneArena::new();
        let root = arena.spawn(
            NodeSpec::group(NodeKind::Building, "Building", Transform::IDENTITY),
            None,
        );
        assert!(LodGroup::build(&mut arena, root, vec![root], LodThresholds::default()).is_none());
        assert_eq!(arena.len(), 1);
    }
}
