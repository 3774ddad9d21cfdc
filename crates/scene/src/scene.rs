use crate::geometry::MeshData;
use crate::label::Label;
use crate::light::{Light, smoothstep};
use crate::material::{PhongMaterial, TextureHandle};
use glam::{Mat4, Vec3};
use stagecraft_common::{Color, NodeId, Transform};
use std::collections::BTreeMap;

/// Index into the scene's geometry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub usize);

/// Index into the scene's material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

/// What is drawn behind all geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    Color(Color),
    /// Equirectangular panorama sampled by view direction.
    Equirect(TextureHandle),
}

/// Linear fog between `near` and `far` view depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    pub fn new(color: Color, near: f32, far: f32) -> Self {
        Self { color, near, far }
    }

    /// Blend weight of the fog color at a view depth, in `[0, 1]`.
    pub fn factor(&self, depth: f32) -> f32 {
        smoothstep(self.near, self.far, depth)
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    /// `materials[group.material_index]` shades each geometry group; a single
    /// material shades all of them.
    Mesh {
        geometry: GeometryId,
        materials: Vec<MaterialId>,
    },
    Light(Light),
    Label(Label),
}

/// A node in the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            parent: None,
            transform: Transform::default(),
            cast_shadow: false,
            receive_shadow: false,
            kind,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: GeometryId, materials: Vec<MaterialId>) -> Self {
        Self::new(
            name,
            NodeKind::Mesh {
                geometry,
                materials,
            },
        )
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    pub fn label(name: impl Into<String>, label: Label) -> Self {
        let scale = label.sprite_scale();
        let mut node = Self::new(name, NodeKind::Label(label));
        node.transform.scale = Vec3::new(scale.x, scale.y, 1.0);
        node
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn as_light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }
}

/// The scene graph.
///
/// Nodes live in a BTreeMap for deterministic iteration; geometries and
/// materials are append-only tables referenced by index.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    geometries: Vec<MeshData>,
    materials: Vec<PhongMaterial>,
    background: Background,
    pub fog: Option<Fog>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            geometries: Vec::new(),
            materials: Vec::new(),
            background: Background::Color(Color::BLACK),
            fog: None,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// First node with the given name, in id order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name == name)
            .map(|(id, _)| *id)
    }

    /// Add a root node. Returns its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId::new();
        self.insert(id, Node { parent: None, ..node });
        id
    }

    /// Add a node under `parent`. Returns `None` if the parent does not exist.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = NodeId::new();
        self.insert(
            id,
            Node {
                parent: Some(parent),
                ..node
            },
        );
        Some(id)
    }

    fn insert(&mut self, id: NodeId, node: Node) {
        tracing::trace!(id = %id.short(), name = %node.name, "node added");
        self.nodes.insert(id, node);
    }

    /// Remove a node and its descendants. Returns the number of nodes removed.
    pub fn remove(&mut self, id: NodeId) -> usize {
        if !self.nodes.contains_key(&id) {
            return 0;
        }
        let mut doomed = vec![id];
        let mut i = 0;
        while i < doomed.len() {
            let current = doomed[i];
            doomed.extend(self.children(current));
            i += 1;
        }
        for victim in &doomed {
            self.nodes.remove(victim);
        }
        doomed.len()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    /// Compose local transforms from the root down to `id`.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        // parent chains are acyclic: parents always exist before their children
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    pub fn add_geometry(&mut self, geometry: MeshData) -> GeometryId {
        let id = GeometryId(self.geometries.len());
        self.geometries.push(geometry);
        id
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&MeshData> {
        self.geometries.get(id.0)
    }

    pub fn geometries(&self) -> &[MeshData] {
        &self.geometries
    }

    pub fn add_material(&mut self, material: PhongMaterial) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.materials.push(material);
        id
    }

    pub fn material(&self, id: MaterialId) -> Option<&PhongMaterial> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut PhongMaterial> {
        self.materials.get_mut(id.0)
    }

    pub fn materials(&self) -> &[PhongMaterial] {
        &self.materials
    }

    pub fn background(&self) -> Background {
        self.background
    }

    pub fn set_background(&mut self, background: Background) {
        tracing::debug!(?background, "background changed");
        self.background = background;
    }

    pub fn light_mut(&mut self, id: NodeId) -> Option<&mut Light> {
        self.nodes.get_mut(&id).and_then(Node::as_light_mut)
    }

    /// Lights with their world-space positions.
    pub fn lights(&self) -> Vec<(NodeId, Vec3, &Light)> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| {
                let light = node.as_light()?;
                Some((*id, self.world_position(*id)?, light))
            })
            .collect()
    }

    /// Every mesh node with its world matrix.
    pub fn meshes(&self) -> Vec<(NodeId, Mat4, &Node)> {
        self.nodes
            .iter()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Mesh { .. }))
            .filter_map(|(id, node)| Some((*id, self.world_matrix(*id)?, node)))
            .collect()
    }

    /// Every label node with its world position and sprite scale.
    pub fn labels(&self) -> Vec<(NodeId, Vec3, glam::Vec2, &Label)> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| match &node.kind {
                NodeKind::Label(label) => Some((
                    *id,
                    self.world_position(*id)?,
                    node.transform.scale.truncate(),
                    label,
                )),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::box_geometry;

    #[test]
    fn scene_starts_empty() {
        let scene = Scene::new();
        assert_eq!(scene.node_count(), 0);
        assert!(scene.geometries().is_empty());
        assert!(scene.materials().is_empty());
        assert_eq!(scene.background(), Background::Color(Color::BLACK));
        assert!(scene.fog.is_none());
    }

    #[test]
    fn add_and_find() {
        let mut scene = Scene::new();
        let id = scene.add(Node::group("root").at(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(scene.find_by_name("root"), Some(id));
        assert_eq!(scene.world_position(id), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(scene.get(id).map(|n| n.parent), Some(None));
    }

    #[test]
    fn child_world_matrix_composes_parent_scale() {
        let mut scene = Scene::new();
        let root = scene.add(
            Node::group("statue").with_transform(
                Transform::from_position(Vec3::new(0.0, 0.0, -20.0)).with_scale(Vec3::splat(50.0)),
            ),
        );
        let child = scene
            .add_child(root, Node::group("part").at(Vec3::new(0.0, 0.1, 0.0)))
            .unwrap();
        let p = scene.world_position(child).unwrap();
        assert!(p.abs_diff_eq(Vec3::new(0.0, 5.0, -20.0), 1e-4));
    }

    #[test]
    fn add_child_to_missing_parent_fails() {
        let mut scene = Scene::new();
        assert!(scene.add_child(NodeId::new(), Node::group("orphan")).is_none());
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn remove_takes_subtree() {
        let mut scene = Scene::new();
        let root = scene.add(Node::group("root"));
        let mid = scene.add_child(root, Node::group("mid")).unwrap();
        scene.add_child(mid, Node::group("leaf")).unwrap();
        let other = scene.add(Node::group("other"));
        assert_eq!(scene.remove(root), 3);
        assert_eq!(scene.node_count(), 1);
        assert!(scene.get(other).is_some());
        assert_eq!(scene.remove(root), 0);
    }

    #[test]
    fn geometry_and_material_tables() {
        let mut scene = Scene::new();
        let g = scene.add_geometry(box_geometry(2.0, 2.0, 2.0));
        let m = scene.add_material(PhongMaterial::default());
        let id = scene.add(Node::mesh("cube", g, vec![m]).with_shadows(true, true));
        assert_eq!(scene.geometry(g).unwrap().groups.len(), 6);
        assert!(scene.material(m).is_some());
        let meshes = scene.meshes();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].0, id);
        assert!(meshes[0].2.cast_shadow && meshes[0].2.receive_shadow);
    }

    #[test]
    fn lights_report_world_position() {
        let mut scene = Scene::new();
        let id = scene.add(
            Node::light("sun", Light::directional(Color::WHITE, 1.0)).at(Vec3::new(5.0, 18.0, 2.0)),
        );
        *scene.light_mut(id).unwrap().target_mut().unwrap() = Vec3::new(1.0, 0.0, 0.0);
        let lights = scene.lights();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].1, Vec3::new(5.0, 18.0, 2.0));
        assert_eq!(lights[0].2.target(), Some(Vec3::X));
    }

    #[test]
    fn label_node_gets_sprite_scale() {
        let mut scene = Scene::new();
        scene.add(Node::label("tag", Label::new("Bowling", 150.0, 32.0)).at(Vec3::new(9.0, 2.5, 4.0)));
        let labels = scene.labels();
        assert_eq!(labels.len(), 1);
        assert!((labels[0].2.x - 3.08).abs() < 1e-5);
        assert_eq!(labels[0].1, Vec3::new(9.0, 2.5, 4.0));
    }

    #[test]
    fn background_swap_keeps_graph_untouched() {
        let mut scene = Scene::new();
        scene.add(Node::group("root"));
        scene.set_background(Background::Color(Color::WHITE));
        scene.set_background(Background::Equirect(TextureHandle(7)));
        assert_eq!(scene.background(), Background::Equirect(TextureHandle(7)));
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn fog_factor_ramps() {
        let fog = Fog::new(Color::WHITE, 15.0, 40.0);
        assert_eq!(fog.factor(10.0), 0.0);
        assert_eq!(fog.factor(50.0), 1.0);
        assert!((fog.factor(27.5) - 0.5).abs() < 1e-6);
    }
}
