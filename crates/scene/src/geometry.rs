//! Procedural primitive geometry.
//!
//! Vertex layout, winding and UV conventions follow the common WebGL
//! conventions: counter-clockwise front faces, `v` pointing up. Multi-material
//! primitives split their index buffer into [`GeometryGroup`]s.

use std::f32::consts::PI;

/// A contiguous index range drawn with one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryGroup {
    pub start: u32,
    pub count: u32,
    pub material_index: usize,
}

/// Indexed triangle mesh with per-vertex normals and UVs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub groups: Vec<GeometryGroup>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Groups to draw. A mesh without explicit groups is one group using slot 0.
    pub fn draw_groups(&self) -> Vec<GeometryGroup> {
        if self.groups.is_empty() {
            vec![GeometryGroup {
                start: 0,
                count: self.indices.len() as u32,
                material_index: 0,
            }]
        } else {
            self.groups.clone()
        }
    }

    /// Axis-aligned bounds as (min, max), or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(mut lo, mut hi), p| {
            for i in 0..3 {
                lo[i] = lo[i].min(p[i]);
                hi[i] = hi[i].max(p[i]);
            }
            (lo, hi)
        }))
    }

    fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> u32 {
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        self.positions.len() as u32 - 1
    }

    fn add_group(&mut self, start: usize, material_index: usize) {
        self.groups.push(GeometryGroup {
            start: start as u32,
            count: (self.indices.len() - start) as u32,
            material_index,
        });
    }
}

/// Axis-aligned box centered at the origin.
///
/// Six groups, one per face, in the order +X, -X, +Y, -Y, +Z, -Z.
pub fn box_geometry(width: f32, height: f32, depth: f32) -> MeshData {
    let mut data = MeshData::default();
    // (u axis, v axis, w axis, u dir, v dir, plane width, plane height, plane depth)
    let faces: [(usize, usize, usize, f32, f32, f32, f32, f32); 6] = [
        (2, 1, 0, -1.0, -1.0, depth, height, width),
        (2, 1, 0, 1.0, -1.0, depth, height, -width),
        (0, 2, 1, 1.0, 1.0, width, depth, height),
        (0, 2, 1, 1.0, -1.0, width, depth, -height),
        (0, 1, 2, 1.0, -1.0, width, height, depth),
        (0, 1, 2, -1.0, -1.0, width, height, -depth),
    ];

    for (material_index, (u, v, w, udir, vdir, pw, ph, pd)) in faces.into_iter().enumerate() {
        let start = data.indices.len();
        let base = data.positions.len() as u32;
        for iy in 0..2 {
            let y = iy as f32 * ph - ph * 0.5;
            for ix in 0..2 {
                let x = ix as f32 * pw - pw * 0.5;
                let mut position = [0.0; 3];
                position[u] = x * udir;
                position[v] = y * vdir;
                position[w] = pd * 0.5;
                let mut normal = [0.0; 3];
                normal[w] = if pd > 0.0 { 1.0 } else { -1.0 };
                data.push_vertex(position, normal, [ix as f32, 1.0 - iy as f32]);
            }
        }
        let (a, b, c, d) = (base, base + 2, base + 3, base + 1);
        data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        data.add_group(start, material_index);
    }
    data
}

/// UV sphere centered at the origin.
pub fn sphere_geometry(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let mut data = MeshData::default();
    let mut grid = Vec::with_capacity(hs as usize + 1);

    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        // pole vertices sit halfway between the segment columns
        let u_offset = if iy == 0 {
            0.5 / ws as f32
        } else if iy == hs {
            -0.5 / ws as f32
        } else {
            0.0
        };
        let mut row = Vec::with_capacity(ws as usize + 1);
        for ix in 0..=ws {
            let u = ix as f32 / ws as f32;
            let x = -radius * (u * 2.0 * PI).cos() * (v * PI).sin();
            let y = radius * (v * PI).cos();
            let z = radius * (u * 2.0 * PI).sin() * (v * PI).sin();
            let len = (x * x + y * y + z * z).sqrt().max(f32::EPSILON);
            row.push(data.push_vertex(
                [x, y, z],
                [x / len, y / len, z / len],
                [u + u_offset, 1.0 - v],
            ));
        }
        grid.push(row);
    }

    for iy in 0..hs as usize {
        for ix in 0..ws as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs as usize - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    data
}

/// Closed cylinder along the Y axis, centered at the origin.
///
/// Three groups: side, top cap, bottom cap. A cap with zero radius is omitted.
pub fn cylinder_geometry(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
) -> MeshData {
    let segs = radial_segments.max(3);
    let half = height * 0.5;
    let slope = (radius_bottom - radius_top) / height;
    let mut data = MeshData::default();

    let start = data.indices.len();
    let mut rows = Vec::with_capacity(2);
    for iy in 0..=1u32 {
        let v = iy as f32;
        let radius = v * (radius_bottom - radius_top) + radius_top;
        let mut row = Vec::with_capacity(segs as usize + 1);
        for ix in 0..=segs {
            let u = ix as f32 / segs as f32;
            let (sin, cos) = (u * 2.0 * PI).sin_cos();
            let n = glam_normalize([sin, slope, cos]);
            row.push(data.push_vertex(
                [radius * sin, -v * height + half, radius * cos],
                n,
                [u, 1.0 - v],
            ));
        }
        rows.push(row);
    }
    for ix in 0..segs as usize {
        let a = rows[0][ix];
        let b = rows[1][ix];
        let c = rows[1][ix + 1];
        let d = rows[0][ix + 1];
        data.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }
    data.add_group(start, 0);

    if radius_top > 0.0 {
        cylinder_cap(&mut data, radius_top, half, segs, true, 1);
    }
    if radius_bottom > 0.0 {
        cylinder_cap(&mut data, radius_bottom, half, segs, false, 2);
    }
    data
}

fn cylinder_cap(
    data: &mut MeshData,
    radius: f32,
    half: f32,
    segs: u32,
    top: bool,
    material_index: usize,
) {
    let sign = if top { 1.0 } else { -1.0 };
    let start = data.indices.len();
    let center_start = data.positions.len() as u32;
    for _ in 0..segs {
        data.push_vertex([0.0, half * sign, 0.0], [0.0, sign, 0.0], [0.5, 0.5]);
    }
    let rim_start = data.positions.len() as u32;
    for ix in 0..=segs {
        let u = ix as f32 / segs as f32;
        let (sin, cos) = (u * 2.0 * PI).sin_cos();
        data.push_vertex(
            [radius * sin, half * sign, radius * cos],
            [0.0, sign, 0.0],
            [cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5],
        );
    }
    for ix in 0..segs {
        let c = center_start + ix;
        let i = rim_start + ix;
        if top {
            data.indices.extend_from_slice(&[i, i + 1, c]);
        } else {
            data.indices.extend_from_slice(&[i + 1, i, c]);
        }
    }
    data.add_group(start, material_index);
}

/// Plane in the XY plane facing +Z, centered at the origin.
pub fn plane_geometry(width: f32, height: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let gx = width_segments.max(1);
    let gy = height_segments.max(1);
    let mut data = MeshData::default();

    for iy in 0..=gy {
        let y = iy as f32 * height / gy as f32 - height * 0.5;
        for ix in 0..=gx {
            let x = ix as f32 * width / gx as f32 - width * 0.5;
            data.push_vertex(
                [x, -y, 0.0],
                [0.0, 0.0, 1.0],
                [ix as f32 / gx as f32, 1.0 - iy as f32 / gy as f32],
            );
        }
    }
    for iy in 0..gy {
        for ix in 0..gx {
            let a = ix + (gx + 1) * iy;
            let b = ix + (gx + 1) * (iy + 1);
            let c = ix + 1 + (gx + 1) * (iy + 1);
            let d = ix + 1 + (gx + 1) * iy;
            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    data
}

fn glam_normalize(v: [f32; 3]) -> [f32; 3] {
    glam::Vec3::from_array(v).normalize_or_zero().to_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn face_normal(data: &MeshData, tri: usize) -> Vec3 {
        let i = &data.indices[tri * 3..tri * 3 + 3];
        let p = |k: usize| Vec3::from_array(data.positions[i[k] as usize]);
        (p(1) - p(0)).cross(p(2) - p(0)).normalize()
    }

    #[test]
    fn box_has_six_groups_in_face_order() {
        let cube = box_geometry(2.0, 2.0, 2.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.groups.len(), 6);
        let expected = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
        for (g, n) in cube.groups.iter().zip(expected) {
            assert_eq!(g.count, 6);
            let tri = g.start as usize / 3;
            assert!(face_normal(&cube, tri).abs_diff_eq(n, 1e-5), "group {g:?}");
            let vn = Vec3::from_array(cube.normals[cube.indices[g.start as usize] as usize]);
            assert!(vn.abs_diff_eq(n, 1e-5));
        }
        assert_eq!(cube.bounds(), Some(([-1.0; 3], [1.0; 3])));
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let sphere = sphere_geometry(1.0, 32, 32);
        assert_eq!(sphere.vertex_count(), 33 * 33);
        // poles contribute one triangle per segment instead of two
        assert_eq!(sphere.triangle_count(), 32 * 32 * 2 - 2 * 32);
        for p in &sphere.positions {
            assert!((Vec3::from_array(*p).length() - 1.0).abs() < 1e-5);
        }
        assert!(sphere.groups.is_empty());
        assert_eq!(sphere.draw_groups().len(), 1);
    }

    #[test]
    fn cylinder_groups_side_top_bottom() {
        let cyl = cylinder_geometry(0.75, 0.75, 2.0, 32);
        assert_eq!(cyl.groups.len(), 3);
        assert_eq!(cyl.groups[0].material_index, 0);
        assert_eq!(cyl.groups[0].count, 32 * 6);
        assert_eq!(cyl.groups[1].material_index, 1);
        assert_eq!(cyl.groups[2].material_index, 2);
        assert_eq!(cyl.groups[1].count, 32 * 3);
        let top = face_normal(&cyl, cyl.groups[1].start as usize / 3);
        let bottom = face_normal(&cyl, cyl.groups[2].start as usize / 3);
        assert!(top.abs_diff_eq(Vec3::Y, 1e-5));
        assert!(bottom.abs_diff_eq(-Vec3::Y, 1e-5));
        let (lo, hi) = cyl.bounds().unwrap();
        assert!((lo[1] + 1.0).abs() < 1e-6 && (hi[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cone_omits_top_cap() {
        let cone = cylinder_geometry(0.0, 1.0, 1.0, 8);
        assert_eq!(cone.groups.len(), 2);
        assert_eq!(cone.groups[1].material_index, 2);
    }

    #[test]
    fn plane_faces_positive_z() {
        let plane = plane_geometry(60.0, 60.0, 1, 1);
        assert_eq!(plane.vertex_count(), 4);
        assert_eq!(plane.triangle_count(), 2);
        assert!(face_normal(&plane, 0).abs_diff_eq(Vec3::Z, 1e-5));
        assert!(face_normal(&plane, 1).abs_diff_eq(Vec3::Z, 1e-5));
        let segmented = plane_geometry(2.0, 2.0, 2, 2);
        assert_eq!(segmented.vertex_count(), 9);
        assert_eq!(segmented.indices.len(), 24);
    }
}
