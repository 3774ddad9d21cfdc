//! wgpu backend for stagecraft scenes.
//!
//! Draws Blinn-Phong meshes with fog and shadow maps from one directional
//! and one spot light, over a solid or equirectangular background.
//!
//! # Invariants
//! - The renderer never mutates the scene.
//! - Materials whose map has not been uploaded sample a white placeholder.
//! - Geometry groups without a material are skipped.

mod gpu;
mod shaders;
mod textures;
mod uniforms;

pub use gpu::{RenderSettings, WgpuRenderer};
