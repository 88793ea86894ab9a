use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::config;

/// Runtime representation of the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the fixed demo population: an ambient fill light, a
    /// shadow-casting directional light, the spinning cube, and the ground
    /// plane a unit below it.
    pub fn demo() -> Self {
        let mut scene = Scene::new();
        scene.push(SceneNode {
            name: config::scene::AMBIENT.to_string(),
            kind: NodeKind::AmbientLight,
            intensity: config::scene::AMBIENT_INTENSITY,
            ..SceneNode::default()
        });
        scene.push(SceneNode {
            name: config::scene::SUN.to_string(),
            kind: NodeKind::DirectionalLight,
            position: config::scene::SUN_POSITION,
            intensity: config::scene::SUN_INTENSITY,
            cast_shadow: true,
            ..SceneNode::default()
        });
        scene.push(SceneNode {
            name: config::scene::CUBE.to_string(),
            kind: NodeKind::Mesh(MeshShape::Cube {
                size: config::scene::CUBE_SIZE,
            }),
            color: config::scene::CUBE_COLOR,
            cast_shadow: true,
            receive_shadow: true,
            ..SceneNode::default()
        });
        // The plane is authored facing +Z and tipped flat, the way the
        // original demo oriented it.
        scene.push(SceneNode {
            name: config::scene::GROUND.to_string(),
            kind: NodeKind::Mesh(MeshShape::Plane {
                width: config::scene::GROUND_SIZE,
                height: config::scene::GROUND_SIZE,
            }),
            position: Vec3::new(0.0, config::scene::GROUND_HEIGHT, 0.0),
            rotation: Vec3::new(-std::f32::consts::FRAC_PI_2, 0.0, 0.0),
            color: config::scene::GROUND_COLOR,
            receive_shadow: true,
            ..SceneNode::default()
        });
        scene
    }

    pub fn push(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the named node, if present.
    pub fn get(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Applies a mutation to the named node.
    pub fn update<F, R>(&mut self, name: &str, updater: F) -> Option<R>
    where
        F: FnOnce(&mut SceneNode) -> R,
    {
        let node = self.nodes.iter_mut().find(|node| node.name == name)?;
        Some(updater(node))
    }

    /// Iterates over mesh nodes in insertion order.
    pub fn meshes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::Mesh(_)))
    }

    /// Iterates over light nodes in insertion order.
    pub fn lights(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter().filter(|node| {
            matches!(
                node.kind,
                NodeKind::AmbientLight | NodeKind::DirectionalLight
            )
        })
    }

    /// First ambient light, if any.
    pub fn ambient(&self) -> Option<&SceneNode> {
        self.nodes
            .iter()
            .find(|node| node.kind == NodeKind::AmbientLight)
    }

    /// First directional light, if any.
    pub fn directional(&self) -> Option<&SceneNode> {
        self.nodes
            .iter()
            .find(|node| node.kind == NodeKind::DirectionalLight)
    }
}

/// A single node in the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Vec3,
    /// Euler rotation in radians.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default)]
    pub cast_shadow: bool,
    #[serde(default)]
    pub receive_shadow: bool,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: NodeKind::Mesh(MeshShape::Cube { size: 1.0 }),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            color: default_color(),
            intensity: default_intensity(),
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

impl SceneNode {
    /// World transform assembled from the node's position and rotation.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
    }

    /// Mesh shape, if this node is a mesh.
    pub fn shape(&self) -> Option<&MeshShape> {
        match &self.kind {
            NodeKind::Mesh(shape) => Some(shape),
            _ => None,
        }
    }
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_intensity() -> f32 {
    1.0
}

/// What a node contributes to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    AmbientLight,
    DirectionalLight,
    Mesh(MeshShape),
}

/// Parametric shapes the renderer knows how to tessellate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MeshShape {
    Cube { size: f32 },
    Plane { width: f32, height: f32 },
}
