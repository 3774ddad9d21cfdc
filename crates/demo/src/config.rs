//! Scene constants, overridable from a YAML file.
//!
//! Every section uses `#[serde(default)]`, so a file only needs the values it
//! changes.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use stagecraft_common::Color;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid scene config {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid scene config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 85.0,
            aspect: 2.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(0.0, 10.0, 20.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 5.0, 0.0),
            enable_damping: true,
            damping_factor: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            near: 15.0,
            far: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub size: f32,
    pub color: Color,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 60.0,
            color: Color::from_hex(0x654321),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub color: Color,
    pub intensity: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0x404040),
            intensity: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalConfig {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub cast_shadow: bool,
}

impl Default for DirectionalConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::new(5.0, 18.0, 2.0),
            target: Vec3::ZERO,
            cast_shadow: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotConfig {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    /// Half-angle of the cone, radians.
    pub angle: f32,
    pub penumbra: f32,
    pub decay: f32,
    pub distance: f32,
    pub cast_shadow: bool,
}

impl Default for SpotConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 150.0,
            position: Vec3::new(0.0, 18.0, 0.0),
            angle: std::f32::consts::FRAC_PI_6,
            penumbra: 0.1,
            decay: 2.0,
            distance: 200.0,
            cast_shadow: true,
        }
    }
}

/// Asset paths, relative to the loader's root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub background: PathBuf,
    /// One per cube face, in box group order; also the cube stack textures.
    pub cube_faces: Vec<PathBuf>,
    pub bowling_ball: PathBuf,
    pub bowling_pin: PathBuf,
    pub statue_obj: PathBuf,
    pub statue_mtl: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        let image = |name: &str| PathBuf::from("images").join(name);
        Self {
            background: image("tears_of_steel_bridge_2k.jpg"),
            cube_faces: ["cartoonSky.jpg", "cobbleStone.jpg", "dirt.jpg", "grass.jpg", "sky.jpg", "skyNew.jpg"]
                .into_iter()
                .map(image)
                .collect(),
            bowling_ball: image("bowlingBall.jpg"),
            bowling_pin: image("bowlingPin.jpg"),
            statue_obj: PathBuf::from("obj/LibertStatue.obj"),
            statue_mtl: PathBuf::from("obj/LibertStatue.mtl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatueConfig {
    pub scale: f32,
    pub position: Vec3,
}

impl Default for StatueConfig {
    fn default() -> Self {
        Self {
            scale: 50.0,
            position: Vec3::new(0.0, 0.0, -20.0),
        }
    }
}

/// Everything the demo scene is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub background: Color,
    pub fog: FogConfig,
    pub ground: GroundConfig,
    pub ambient: AmbientConfig,
    pub directional: DirectionalConfig,
    pub spot: SpotConfig,
    pub assets: AssetPaths,
    pub statue: StatueConfig,
    /// Cylinders per pyramid row, bottom row first.
    pub pyramid_rows: Vec<u32>,
}

impl SceneConfig {
    /// Load from a YAML file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|e| match e {
            ConfigError::Yaml { source, .. } => ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::info!(path = %path.display(), "scene config loaded");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|source| ConfigError::Yaml {
            path: PathBuf::new(),
            source,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            return Err(ConfigError::Invalid(format!(
                "camera near {} / far {} must satisfy 0 < near < far",
                self.camera.near, self.camera.far
            )));
        }
        if self.assets.cube_faces.len() != 6 {
            return Err(ConfigError::Invalid(format!(
                "expected 6 cube face textures, got {}",
                self.assets.cube_faces.len()
            )));
        }
        // zero would swallow every orbit input once damping is on
        let damping = self.controls.damping_factor;
        if !(damping > 0.0 && damping <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "damping_factor {damping} must be in (0, 1]"
            )));
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            background: Color::WHITE,
            fog: FogConfig::default(),
            ground: GroundConfig::default(),
            ambient: AmbientConfig::default(),
            directional: DirectionalConfig::default(),
            spot: SpotConfig::default(),
            assets: AssetPaths::default(),
            statue: StatueConfig::default(),
            pyramid_rows: vec![6, 5, 4, 3, 2, 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_demo_constants() {
        let c = SceneConfig::default();
        assert_eq!(c.camera.fov, 85.0);
        assert_eq!(c.camera.position, Vec3::new(0.0, 10.0, 20.0));
        assert_eq!(c.controls.target, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(c.fog.near, 15.0);
        assert_eq!(c.ground.color.to_hex(), 0x654321);
        assert_eq!(c.spot.intensity, 150.0);
        assert_eq!(c.assets.cube_faces.len(), 6);
        assert_eq!(c.pyramid_rows.iter().sum::<u32>(), 21);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "camera:\n  fov: 60\nfog:\n  color: \"#ff0000\"\n";
        let c = SceneConfig::from_yaml(yaml).unwrap();
        assert_eq!(c.camera.fov, 60.0);
        assert_eq!(c.camera.far, 100.0);
        assert_eq!(c.fog.color.to_hex(), 0xff0000);
        assert_eq!(c.fog.far, 40.0);
        assert_eq!(c.spot.position, Vec3::new(0.0, 18.0, 0.0));
    }

    #[test]
    fn yaml_round_trip_preserves_config() {
        let c = SceneConfig::default();
        let back = SceneConfig::from_yaml(&c.to_yaml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn rejects_inverted_clip_planes() {
        let err = SceneConfig::from_yaml("camera:\n  near: 10\n  far: 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_damping() {
        let err = SceneConfig::from_yaml("controls:\n  damping_factor: 0\n").unwrap_err();
        assert!(err.to_string().contains("(0, 1]"));
        assert!(SceneConfig::from_yaml("controls:\n  damping_factor: .nan\n").is_err());
        assert!(SceneConfig::from_yaml("controls:\n  damping_factor: 1.5\n").is_err());
        let c = SceneConfig::from_yaml("controls:\n  damping_factor: 1\n").unwrap();
        assert_eq!(c.controls.damping_factor, 1.0);
    }

    #[test]
    fn rejects_nan_clip_plane() {
        assert!(SceneConfig::from_yaml("camera:\n  near: .nan\n").is_err());
    }

    #[test]
    fn rejects_wrong_face_count() {
        let err = SceneConfig::from_yaml("assets:\n  cube_faces: [a.jpg]\n").unwrap_err();
        assert!(err.to_string().contains("6 cube face"));
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "statue:\n  scale: 10").unwrap();
        let c = SceneConfig::load(Some(file.path())).unwrap();
        assert_eq!(c.statue.scale, 10.0);
        assert_eq!(SceneConfig::load(None).unwrap(), SceneConfig::default());

        let missing = SceneConfig::load(Some(Path::new("/nonexistent/scene.yaml")));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "camera: [not, a, map]").unwrap();
        let err = SceneConfig::load(Some(file.path())).unwrap_err();
        match err {
            ConfigError::Yaml { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
