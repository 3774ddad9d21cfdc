//! Rendering adapter: renderer-agnostic frame data derived from the scene.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - Everything a backend draws comes from a [`FrameData`] extracted from the
//!   scene and camera at the start of the frame.

mod frame;
mod overlay;
mod renderer;

pub use frame::{
    DirectionalLightData, DrawItem, FrameData, LightSet, MAX_DIRECTIONAL_LIGHTS, MAX_SPOT_LIGHTS,
    ShadowSettings, SpotLightData, directional_shadow_matrix, spot_shadow_matrix,
};
pub use overlay::{LabelPlacement, place_labels};
pub use renderer::{DebugTextRenderer, Renderer};
