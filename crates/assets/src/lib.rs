//! Asset loading for the scene demo: image textures and OBJ/MTL models.
//!
//! Decoding runs on a background worker. The renderer and the scene consume
//! assets by handle, never by raw file paths: a handle is allocated the moment
//! a load is requested and the data arrives later as a [`LoadEvent`].

pub mod loader;
pub mod model;
pub mod texture;

pub use loader::{AssetLoader, LoadEvent, ModelHandle};
pub use model::{ModelData, ModelMaterial, ModelMesh, load_model};
pub use texture::{TextureData, load_texture};

use std::path::PathBuf;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error in {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("OBJ/MTL parse error in {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("asset worker stopped")]
    WorkerGone,
}
