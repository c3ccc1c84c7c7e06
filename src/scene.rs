//! Arena-backed scene tree owning everything a generation pass spawns.
//!
//! Uses a petgraph directed graph: edges point from parent to child. The whole
//! tree is torn down with a single [`SceneArena::clear`].

use bevy::prelude::*;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

use crate::procgen::modules::ModulePrototype;

/// Handle to a node in a [`SceneArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneId(NodeIndex);

/// Axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow to include `other`.
    pub fn encapsulate(&mut self, other: Bounds) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// World-space box enclosing this local box after `transform`.
    pub fn transformed(&self, transform: &Transform) -> Bounds {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);

        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let world = transform.transform_point(corner);
            min = min.min(world);
            max = max.max(world);
        }

        Bounds { min, max }
    }
}

/// What a scene node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    City,
    RoadTile,
    GroundTile,
    Block,
    Building,
    Floor,
    WallModule,
    CornerModule,
    Roof,
    LodProxy,
}

/// Everything needed to spawn one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub name: String,
    /// World-space transform.
    pub transform: Transform,
    /// Local-space geometry box, if the node carries geometry.
    pub local_bounds: Option<Bounds>,
}

impl NodeSpec {
    /// A grouping node without geometry.
    pub fn group(kind: NodeKind, name: impl Into<String>, transform: Transform) -> Self {
        Self {
            kind,
            name: name.into(),
            transform,
            local_bounds: None,
        }
    }
}

/// Creates placed instances and answers bounds queries about them.
pub trait Instantiator {
    /// Spawn a node under `parent` (or as a root) and return its handle.
    fn spawn(&mut self, spec: NodeSpec, parent: Option<SceneId>) -> SceneId;

    /// World-space bounds of a node's own geometry.
    fn bounds(&self, id: SceneId) -> Option<Bounds>;

    /// Place a copy of `prototype` with a world transform.
    fn instantiate(
        &mut self,
        prototype: &ModulePrototype,
        kind: NodeKind,
        transform: Transform,
        parent: SceneId,
    ) -> SceneId {
        self.spawn(
            NodeSpec {
                kind,
                name: prototype.name.clone(),
                transform,
                local_bounds: Some(prototype.local_bounds()),
            },
            Some(parent),
        )
    }
}

/// Ownership tree of spawned nodes.
#[derive(Clone, Debug, Default)]
pub struct SceneArena {
    graph: DiGraph<NodeSpec, ()>,
}

impl SceneArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.graph.clear();
    }

    pub fn get(&self, id: SceneId) -> Option<&NodeSpec> {
        self.graph.node_weight(id.0)
    }

    pub fn parent(&self, id: SceneId) -> Option<SceneId> {
        self.graph
            .neighbors_directed(id.0, Direction::Incoming)
            .next()
            .map(SceneId)
    }

    /// Direct children of a node.
    pub fn children(&self, id: SceneId) -> impl Iterator<Item = SceneId> + '_ {
        self.graph
            .neighbors_directed(id.0, Direction::Outgoing)
            .map(SceneId)
    }

    /// A node and everything below it, depth first.
    pub fn descendants(&self, id: SceneId) -> Vec<SceneId> {
        let mut out = Vec::new();
        let mut dfs = Dfs::new(&self.graph, id.0);
        while let Some(node) = dfs.next(&self.graph) {
            out.push(SceneId(node));
        }
        out
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.graph
            .node_weights()
            .filter(|node| node.kind == kind)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SceneId, &NodeSpec)> {
        self.graph
            .node_indices()
            .map(|idx| (SceneId(idx), &self.graph[idx]))
    }
}

impl Instantiator for SceneArena {
    fn spawn(&mut self, spec: NodeSpec, parent: Option<SceneId>) -> SceneId {
        let idx = self.graph.add_node(spec);
        if let Some(parent) = parent {
            self.graph.add_edge(parent.0, idx, ());
        }
        SceneId(idx)
    }

    fn bounds(&self, id: SceneId) -> Option<Bounds> {
        let node = self.get(id)?;
        node.local_bounds
            .map(|local| local.transformed(&node.transform))
    }
}
