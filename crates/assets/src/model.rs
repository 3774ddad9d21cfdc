//! OBJ/MTL model import through `tobj`.

use crate::AssetError;
use stagecraft_common::Color;
use stagecraft_scene::{MeshData, TextureHandle};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A material read from an MTL file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMaterial {
    pub name: String,
    pub diffuse: Color,
    /// Resolved diffuse map path, relative paths joined onto the MTL's directory.
    pub map_path: Option<PathBuf>,
    pub map: Option<TextureHandle>,
}

/// One OBJ object or group.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMesh {
    pub name: String,
    pub mesh: MeshData,
    /// Index into [`ModelData::materials`].
    pub material: Option<usize>,
}

/// A loaded OBJ model with its MTL materials.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelData {
    pub name: String,
    pub meshes: Vec<ModelMesh>,
    pub materials: Vec<ModelMaterial>,
}

impl ModelData {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.triangle_count()).sum()
    }

    /// Every diffuse map handle referenced by the materials.
    pub fn texture_handles(&self) -> Vec<TextureHandle> {
        self.materials.iter().filter_map(|m| m.map).collect()
    }
}

/// Load the MTL, then the OBJ using those materials.
///
/// `resolve_map` is called once per material with a diffuse map and returns
/// the handle the material should reference.
pub fn load_model(
    obj_path: &Path,
    mtl_path: &Path,
    mut resolve_map: impl FnMut(&Path) -> TextureHandle,
) -> Result<ModelData, AssetError> {
    let (mtl_materials, mtl_index) =
        tobj::load_mtl(mtl_path).map_err(|source| AssetError::Obj {
            path: mtl_path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %mtl_path.display(), count = mtl_materials.len(), "materials parsed");

    let file = File::open(obj_path).map_err(|source| AssetError::Io {
        path: obj_path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    // the preloaded MTL wins over whatever `mtllib` the OBJ names
    let (models, _) = tobj::load_obj_buf(&mut reader, &options, |_| {
        Ok((mtl_materials.clone(), mtl_index.clone()))
    })
    .map_err(|source| AssetError::Obj {
        path: obj_path.to_path_buf(),
        source,
    })?;

    let mtl_dir = mtl_path.parent().unwrap_or_else(|| Path::new(""));
    let materials = mtl_materials
        .iter()
        .map(|m| {
            let map_path = m.diffuse_texture.as_ref().map(|t| mtl_dir.join(t));
            let map = map_path.as_deref().map(&mut resolve_map);
            let diffuse = m
                .diffuse
                .map(|[r, g, b]| Color::rgb(r, g, b))
                .unwrap_or(Color::WHITE);
            ModelMaterial {
                name: m.name.clone(),
                diffuse,
                map_path,
                map,
            }
        })
        .collect();

    let meshes = models
        .into_iter()
        .map(|model| ModelMesh {
            material: model.mesh.material_id.filter(|i| *i < mtl_materials.len()),
            mesh: convert_mesh(&model.mesh),
            name: model.name,
        })
        .collect();

    let name = obj_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".into());
    Ok(ModelData {
        name,
        meshes,
        materials,
    })
}

fn convert_mesh(mesh: &tobj::Mesh) -> MeshData {
    let vertex_count = mesh.positions.len() / 3;
    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let uvs = (0..vertex_count)
        .map(|i| {
            [
                mesh.texcoords.get(i * 2).copied().unwrap_or(0.0),
                mesh.texcoords.get(i * 2 + 1).copied().unwrap_or(0.0),
            ]
        })
        .collect();
    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    } else {
        smooth_normals(&positions, &mesh.indices)
    };
    MeshData {
        positions,
        normals,
        uvs,
        indices: mesh.indices.clone(),
        groups: Vec::new(),
    }
}

/// Area-weighted vertex normals for meshes exported without them.
fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![[0.0f32; 3]; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let (pa, pb, pc) = (positions[a], positions[b], positions[c]);
        let e1 = [pb[0] - pa[0], pb[1] - pa[1], pb[2] - pa[2]];
        let e2 = [pc[0] - pa[0], pc[1] - pa[1], pc[2] - pa[2]];
        let n = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];
        for v in [a, b, c] {
            for k in 0..3 {
                acc[v][k] += n[k];
            }
        }
    }
    acc.into_iter()
        .map(|n| {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            if len > 0.0 {
                [n[0] / len, n[1] / len, n[2] / len]
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}
