use crate::model::{ModelData, load_model};
use crate::texture::{TextureData, load_texture};
use crate::AssetError;
use stagecraft_scene::TextureHandle;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Handle to a model requested from an [`AssetLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelHandle(pub u32);

/// Completion notice for a requested asset.
#[derive(Debug)]
pub enum LoadEvent {
    TextureLoaded {
        handle: TextureHandle,
        path: PathBuf,
        data: TextureData,
    },
    ModelLoaded {
        handle: ModelHandle,
        model: ModelData,
    },
    Failed {
        path: PathBuf,
        error: AssetError,
    },
}

enum Job {
    Texture {
        handle: TextureHandle,
        path: PathBuf,
    },
    Model {
        handle: ModelHandle,
        obj: PathBuf,
        mtl: PathBuf,
    },
}

/// Path-to-handle table shared with the worker, which allocates handles for
/// diffuse maps discovered while parsing MTL files.
#[derive(Default)]
struct TextureRegistry {
    next: AtomicU32,
    by_path: Mutex<HashMap<PathBuf, TextureHandle>>,
}

impl TextureRegistry {
    /// Returns the handle and whether it was newly allocated.
    fn handle_for(&self, path: &Path) -> (TextureHandle, bool) {
        let mut by_path = self.by_path.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = by_path.get(path) {
            return (*handle, false);
        }
        let handle = TextureHandle(self.next.fetch_add(1, Ordering::Relaxed));
        by_path.insert(path.to_path_buf(), handle);
        (handle, true)
    }

    fn len(&self) -> usize {
        self.by_path.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Loads textures and models on a background thread.
///
/// Requests return a handle immediately. Results are delivered in request
/// order through [`AssetLoader::poll`] or [`AssetLoader::recv_timeout`].
pub struct AssetLoader {
    root: PathBuf,
    registry: Arc<TextureRegistry>,
    next_model: u32,
    jobs: Option<Sender<Job>>,
    events: Receiver<LoadEvent>,
    worker: Option<JoinHandle<()>>,
}

impl AssetLoader {
    /// Start a loader resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let registry = Arc::new(TextureRegistry::default());
        let (job_tx, job_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let worker_registry = Arc::clone(&registry);
        let worker = std::thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || run_worker(job_rx, event_tx, worker_registry))
            .map_err(|e| tracing::error!(error = %e, "failed to spawn asset worker"))
            .ok();
        tracing::info!(root = %root.display(), "asset loader started");
        Self {
            root,
            registry,
            next_model: 0,
            jobs: Some(job_tx),
            events: event_rx,
            worker,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Request a texture. The same path always yields the same handle and is decoded once.
    pub fn request_texture(&self, path: impl AsRef<Path>) -> TextureHandle {
        let path = self.resolve(path);
        let (handle, fresh) = self.registry.handle_for(&path);
        if fresh {
            tracing::debug!(handle = handle.0, path = %path.display(), "texture requested");
            self.submit(Job::Texture { handle, path });
        }
        handle
    }

    /// Request an OBJ model with its MTL materials.
    pub fn request_model(&mut self, obj: impl AsRef<Path>, mtl: impl AsRef<Path>) -> ModelHandle {
        let handle = ModelHandle(self.next_model);
        self.next_model += 1;
        let (obj, mtl) = (self.resolve(obj), self.resolve(mtl));
        tracing::debug!(handle = handle.0, obj = %obj.display(), "model requested");
        self.submit(Job::Model { handle, obj, mtl });
        handle
    }

    /// Number of distinct textures requested so far, including model maps.
    pub fn texture_count(&self) -> usize {
        self.registry.len()
    }

    /// Drain completed loads without blocking.
    pub fn poll(&self) -> Vec<LoadEvent> {
        self.events.try_iter().collect()
    }

    /// Wait up to `timeout` for the next completed load.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<LoadEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn submit(&self, job: Job) {
        let sent = self.jobs.as_ref().is_some_and(|tx| tx.send(job).is_ok());
        if !sent {
            tracing::error!(error = %AssetError::WorkerGone, "asset request dropped");
        }
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        // closing the job channel ends the worker loop
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(jobs: Receiver<Job>, events: Sender<LoadEvent>, registry: Arc<TextureRegistry>) {
    for job in jobs {
        let outgoing = match job {
            Job::Texture { handle, path } => vec![texture_event(handle, path)],
            Job::Model { handle, obj, mtl } => model_events(handle, &obj, &mtl, &registry),
        };
        for event in outgoing {
            if events.send(event).is_err() {
                return;
            }
        }
    }
    tracing::debug!("asset worker exiting");
}

fn texture_event(handle: TextureHandle, path: PathBuf) -> LoadEvent {
    match load_texture(&path) {
        Ok(data) => LoadEvent::TextureLoaded { handle, path, data },
        Err(error) => failed(path, error),
    }
}

/// Maps referenced by the MTL are decoded first so the renderer has them
/// before the model that uses them.
fn model_events(
    handle: ModelHandle,
    obj: &Path,
    mtl: &Path,
    registry: &TextureRegistry,
) -> Vec<LoadEvent> {
    let mut fresh_maps = Vec::new();
    let result = load_model(obj, mtl, |map_path| {
        let (map, fresh) = registry.handle_for(map_path);
        if fresh {
            fresh_maps.push((map, map_path.to_path_buf()));
        }
        map
    });
    match result {
        Ok(model) => {
            tracing::info!(
                handle = handle.0,
                meshes = model.meshes.len(),
                triangles = model.triangle_count(),
                "model loaded"
            );
            let mut out: Vec<LoadEvent> = fresh_maps
                .into_iter()
                .map(|(map, path)| texture_event(map, path))
                .collect();
            out.push(LoadEvent::ModelLoaded { handle, model });
            out
        }
        Err(error) => vec![failed(obj.to_path_buf(), error)],
    }
}

fn failed(path: PathBuf, error: AssetError) -> LoadEvent {
    tracing::warn!(path = %path.display(), error = %error, "asset load failed");
    LoadEvent::Failed { path, error }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(10);

    fn write_png(path: &Path, w: u32, h: u32) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn texture_requests_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("sky.png"), 2, 2);
        let loader = AssetLoader::new(dir.path());
        let a = loader.request_texture("sky.png");
        let b = loader.request_texture("sky.png");
        let c = loader.request_texture(dir.path().join("sky.png"));
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(loader.texture_count(), 1);

        match loader.recv_timeout(WAIT) {
            Some(LoadEvent::TextureLoaded { handle, data, .. }) => {
                assert_eq!(handle, a);
                assert_eq!((data.width, data.height), (2, 2));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(loader.recv_timeout(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn missing_texture_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path());
        loader.request_texture("missing.jpg");
        match loader.recv_timeout(WAIT) {
            Some(LoadEvent::Failed { path, error }) => {
                assert!(path.ends_with("missing.jpg"));
                assert!(matches!(error, AssetError::Io { .. }));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn model_maps_arrive_before_model() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("maps/skin.png"), 1, 1);
        std::fs::write(
            dir.path().join("statue.mtl"),
            "newmtl skin\nKd 1 1 1\nmap_Kd maps/skin.png\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("statue.obj"),
            "mtllib statue.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl skin\nf 1 2 3\n",
        )
        .unwrap();

        let mut loader = AssetLoader::new(dir.path());
        let model_handle = loader.request_model("statue.obj", "statue.mtl");

        let first = loader.recv_timeout(WAIT);
        let map = match first {
            Some(LoadEvent::TextureLoaded { handle, path, .. }) => {
                assert!(path.ends_with("maps/skin.png"));
                handle
            }
            other => panic!("unexpected event: {other:?}"),
        };
        match loader.recv_timeout(WAIT) {
            Some(LoadEvent::ModelLoaded { handle, model }) => {
                assert_eq!(handle, model_handle);
                assert_eq!(model.materials[0].map, Some(map));
                assert_eq!(model.meshes[0].material, Some(0));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        // the map now resolves to the same handle when requested directly
        assert_eq!(loader.request_texture("maps/skin.png"), map);
    }

    #[test]
    fn poll_is_non_blocking() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path());
        assert!(loader.poll().is_empty());
    }
}
