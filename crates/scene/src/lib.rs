//! Scene model: a node graph holding meshes, lights and labels, plus the
//! camera, materials and procedural geometry they reference.
//!
//! # Invariants
//! - Geometries and materials are append-only; ids stay valid for the life of the scene.
//! - Removing a node removes its whole subtree.

pub mod camera;
pub mod geometry;
pub mod label;
pub mod light;
pub mod material;
pub mod scene;

pub use camera::PerspectiveCamera;
pub use geometry::{GeometryGroup, MeshData};
pub use label::{FixedAdvance, Label, LabelCanvas, MeasureText};
pub use light::Light;
pub use material::{PhongMaterial, Side, TextureHandle};
pub use scene::{Background, Fog, GeometryId, MaterialId, Node, NodeKind, Scene};
