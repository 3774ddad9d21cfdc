//! The stagecraft demo scene.
//!
//! [`build`] assembles the scene, camera, orbit controls and GUI panel from a
//! [`SceneConfig`] and queues every asset load. The frame loop then feeds
//! completed loads to [`DemoScene::on_load_event`] and calls
//! [`DemoScene::tick`] once per frame.

mod config;
mod demo;

pub use config::{
    AmbientConfig, AssetPaths, CameraConfig, ConfigError, ControlsConfig, DirectionalConfig,
    FogConfig, GroundConfig, SceneConfig, SpotConfig, StatueConfig,
};
pub use demo::{DemoScene, NEAR_FAR_GAP, SPIN_STEP, build, pyramid_positions, resize_to_display_size};
