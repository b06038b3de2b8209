//! Derived connectivity and per-rendered-vertex expansion for surface meshes.
//!
//! Polygons are fan-triangulated: face `[v0, v1, ..., vn-1]` becomes triangles
//! `[v0, vj+1, vj+2]`. Every triangle contributes three rendered vertices, so rendered
//! vertex `r` belongs to triangle `r / 3`, and all per-element data is expanded to that
//! flat layout before upload.
//!
//! Halfedges and corners share one enumeration in face order: corner `i` of face `f`
//! sits at vertex `face[i]`, and halfedge `i` of face `f` runs from `face[i]` to
//! `face[i + 1]`. Both have global index `face_start[f] + i`.

use std::ops::Range;

use glam::{Vec2, Vec3};
use scalarscope_core::{AttachmentKind, Result, ScalarscopeError};

/// Marks a triangle edge created by triangulation rather than present in the polygon.
const INTERNAL_EDGE: usize = usize::MAX;

/// Topology and derived data of a polygon mesh.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    vertices: Vec<Vec3>,
    faces: Vec<Vec<u32>>,
    /// First halfedge/corner index of each face, plus a final entry with the total.
    face_start: Vec<usize>,
    triangulation: Vec<[u32; 3]>,
    face_to_tri_range: Vec<Range<usize>>,
    /// Global corner index at each corner of each triangle.
    tri_corners: Vec<[usize; 3]>,
    /// Global halfedge index along each triangle edge, or `INTERNAL_EDGE`.
    /// Edge `k` runs from triangle corner `k` to corner `k + 1`.
    tri_halfedges: Vec<[usize; 3]>,
    /// Sorted unique vertex pairs.
    edges: Vec<(u32, u32)>,
    halfedge_edge: Vec<usize>,
    face_normals: Vec<Vec3>,
    vertex_normals: Vec<Vec3>,
}

impl MeshGeometry {
    /// Validates the faces against the vertex count and computes all derived data.
    pub fn new(vertices: Vec<Vec3>, faces: Vec<Vec<u32>>) -> Result<Self> {
        for (f, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(ScalarscopeError::InvalidTopology(format!(
                    "face {f} has {} vertices, at least 3 are required",
                    face.len()
                )));
            }
            if let Some(&bad) = face.iter().find(|&&v| v as usize >= vertices.len()) {
                return Err(ScalarscopeError::InvalidTopology(format!(
                    "face {f} refers to vertex {bad}, but the mesh has {} vertices",
                    vertices.len()
                )));
            }
        }

        let mut geometry = Self {
            vertices,
            faces,
            face_start: Vec::new(),
            triangulation: Vec::new(),
            face_to_tri_range: Vec::new(),
            tri_corners: Vec::new(),
            tri_halfedges: Vec::new(),
            edges: Vec::new(),
            halfedge_edge: Vec::new(),
            face_normals: Vec::new(),
            vertex_normals: Vec::new(),
        };
        geometry.compute_triangulation();
        geometry.compute_edges();
        geometry.compute_normals();
        Ok(geometry)
    }

    fn compute_triangulation(&mut self) {
        let mut start = 0;
        for face in &self.faces {
            self.face_start.push(start);
            let n = face.len();
            let first_tri = self.triangulation.len();
            for j in 0..n - 2 {
                self.triangulation.push([face[0], face[j + 1], face[j + 2]]);
                self.tri_corners.push([start, start + j + 1, start + j + 2]);

                // Fan edge 0 is real only for the first triangle, edge 2 only for the last
                let edge0 = if j == 0 { start } else { INTERNAL_EDGE };
                let edge1 = start + j + 1;
                let edge2 = if j == n - 3 { start + n - 1 } else { INTERNAL_EDGE };
                self.tri_halfedges.push([edge0, edge1, edge2]);
            }
            self.face_to_tri_range
                .push(first_tri..self.triangulation.len());
            start += n;
        }
        self.face_start.push(start);
    }

    fn compute_edges(&mut self) {
        let sorted = |a: u32, b: u32| if a < b { (a, b) } else { (b, a) };

        let mut edges: Vec<(u32, u32)> = Vec::with_capacity(self.num_halfedges());
        for face in &self.faces {
            let n = face.len();
            for i in 0..n {
                edges.push(sorted(face[i], face[(i + 1) % n]));
            }
        }
        edges.sort_unstable();
        edges.dedup();

        let mut halfedge_edge = Vec::with_capacity(self.num_halfedges());
        for face in &self.faces {
            let n = face.len();
            for i in 0..n {
                let key = sorted(face[i], face[(i + 1) % n]);
                // Every halfedge key was inserted above
                let idx = edges.binary_search(&key).unwrap_or_default();
                halfedge_edge.push(idx);
            }
        }

        self.edges = edges;
        self.halfedge_edge = halfedge_edge;
    }

    /// Recomputes face and area-weighted vertex normals from the current positions.
    fn compute_normals(&mut self) {
        self.face_normals.clear();
        self.vertex_normals.clear();
        self.vertex_normals.resize(self.vertices.len(), Vec3::ZERO);

        for face in &self.faces {
            let v0 = self.vertices[face[0] as usize];
            let mut area_normal = Vec3::ZERO;
            for j in 1..face.len() - 1 {
                let v1 = self.vertices[face[j] as usize];
                let v2 = self.vertices[face[j + 1] as usize];
                area_normal += (v1 - v0).cross(v2 - v0) * 0.5;
            }
            for &v in face {
                self.vertex_normals[v as usize] += area_normal;
            }
            self.face_normals.push(area_normal.normalize_or_zero());
        }

        for normal in &mut self.vertex_normals {
            *normal = normal.normalize_or_zero();
        }
    }

    /// Replaces vertex positions, keeping connectivity.
    pub(crate) fn set_vertices(&mut self, vertices: Vec<Vec3>) {
        self.vertices = vertices;
        self.compute_normals();
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Vec<u32>] {
        &self.faces
    }

    pub fn triangulation(&self) -> &[[u32; 3]] {
        &self.triangulation
    }

    /// Triangles generated from face `f`.
    pub fn face_triangles(&self, f: usize) -> Option<Range<usize>> {
        self.face_to_tri_range.get(f).cloned()
    }

    /// Unique edges as sorted vertex pairs, in ascending order.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Edge index of a halfedge.
    pub fn halfedge_edge(&self, halfedge: usize) -> Option<usize> {
        self.halfedge_edge.get(halfedge).copied()
    }

    /// `(tail, tip)` vertices of a halfedge.
    pub fn halfedge_vertices(&self, halfedge: usize) -> Option<(u32, u32)> {
        let f = self.face_of_corner(halfedge)?;
        let face = &self.faces[f];
        let i = halfedge - self.face_start[f];
        Some((face[i], face[(i + 1) % face.len()]))
    }

    /// Vertex a corner sits at.
    pub fn corner_vertex(&self, corner: usize) -> Option<u32> {
        let f = self.face_of_corner(corner)?;
        Some(self.faces[f][corner - self.face_start[f]])
    }

    fn face_of_corner(&self, corner: usize) -> Option<usize> {
        if corner >= self.num_corners() {
            return None;
        }
        // face_start is ascending; find the last face starting at or before `corner`
        Some(self.face_start.partition_point(|&s| s <= corner) - 1)
    }

    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }

    pub fn vertex_normals(&self) -> &[Vec3] {
        &self.vertex_normals
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_halfedges(&self) -> usize {
        self.face_start.last().copied().unwrap_or(0)
    }

    pub fn num_corners(&self) -> usize {
        self.num_halfedges()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangulation.len()
    }

    /// Number of rendered vertices, three per triangle.
    pub fn num_rendered_vertices(&self) -> usize {
        self.triangulation.len() * 3
    }

    /// Element count for an attachment kind. Texture data has no mesh element count.
    pub fn element_count(&self, kind: AttachmentKind) -> Option<usize> {
        match kind {
            AttachmentKind::Vertex => Some(self.num_vertices()),
            AttachmentKind::Face => Some(self.num_faces()),
            AttachmentKind::Edge => Some(self.num_edges()),
            AttachmentKind::Halfedge => Some(self.num_halfedges()),
            AttachmentKind::Corner => Some(self.num_corners()),
            AttachmentKind::Texture => None,
        }
    }

    // === Per-rendered-vertex expansion ===

    /// Vertex positions, `vec4` per rendered vertex.
    pub fn expand_positions(&self) -> Vec<f32> {
        self.expand_vec3(|_, v| self.vertices[v as usize])
    }

    /// Smooth vertex normals, `vec4` per rendered vertex.
    pub fn expand_normals(&self) -> Vec<f32> {
        self.expand_vec3(|_, v| self.vertex_normals[v as usize])
    }

    fn expand_vec3(&self, value: impl Fn(usize, u32) -> Vec3) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.num_rendered_vertices() * 4);
        for (t, tri) in self.triangulation.iter().enumerate() {
            for &v in tri {
                out.extend_from_slice(&value(t, v).extend(0.0).to_array());
            }
        }
        out
    }

    /// Barycentric coordinates of each triangle corner, `vec4` per rendered vertex.
    pub fn expand_barycentrics(&self) -> Vec<f32> {
        const CORNERS: [[f32; 4]; 3] = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ];
        let mut out = Vec::with_capacity(self.num_rendered_vertices() * 4);
        for _ in 0..self.num_triangles() {
            for corner in CORNERS {
                out.extend_from_slice(&corner);
            }
        }
        out
    }

    /// Which triangle edges are polygon edges (1) or triangulation diagonals (0),
    /// repeated at all three corners, `vec4` per rendered vertex.
    pub fn expand_edge_is_real(&self) -> Vec<f32> {
        let real = |h: usize| if h == INTERNAL_EDGE { 0.0 } else { 1.0 };
        self.expand_triangle_triples(|t| {
            let [h0, h1, h2] = self.tri_halfedges[t];
            [real(h0), real(h1), real(h2)]
        })
    }

    /// One float per rendered vertex: the value of the vertex it sits at.
    pub fn expand_vertex_values(&self, values: &[f32]) -> Vec<f32> {
        self.triangulation
            .iter()
            .flat_map(|tri| tri.iter().map(|&v| values[v as usize]))
            .collect()
    }

    /// One float per rendered vertex: the value of the face its triangle came from.
    pub fn expand_face_values(&self, values: &[f32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.num_rendered_vertices());
        for (f, range) in self.face_to_tri_range.iter().enumerate() {
            for _ in range.clone() {
                out.extend_from_slice(&[values[f]; 3]);
            }
        }
        out
    }

    /// The triangle's three corner values, repeated at each of its rendered vertices.
    pub fn expand_corner_values(&self, values: &[f32]) -> Vec<f32> {
        self.expand_triangle_triples(|t| self.tri_corners[t].map(|c| values[c]))
    }

    /// The triangle's three halfedge values, repeated at each of its rendered vertices.
    /// Triangulation diagonals carry zero.
    pub fn expand_halfedge_values(&self, values: &[f32]) -> Vec<f32> {
        self.expand_triangle_triples(|t| {
            self.tri_halfedges[t].map(|h| if h == INTERNAL_EDGE { 0.0 } else { values[h] })
        })
    }

    /// The triangle's three edge values, repeated at each of its rendered vertices.
    /// Triangulation diagonals carry zero.
    pub fn expand_edge_values(&self, values: &[f32]) -> Vec<f32> {
        self.expand_triangle_triples(|t| {
            self.tri_halfedges[t].map(|h| {
                if h == INTERNAL_EDGE {
                    0.0
                } else {
                    values[self.halfedge_edge[h]]
                }
            })
        })
    }

    fn expand_triangle_triples(&self, triple: impl Fn(usize) -> [f32; 3]) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.num_rendered_vertices() * 4);
        for t in 0..self.num_triangles() {
            let [a, b, c] = triple(t);
            for _ in 0..3 {
                out.extend_from_slice(&[a, b, c, 0.0]);
            }
        }
        out
    }

    /// Per-vertex UVs as one `vec2` per rendered vertex.
    pub fn expand_vertex_uvs(&self, uvs: &[Vec2]) -> Vec<f32> {
        self.triangulation
            .iter()
            .flat_map(|tri| tri.iter().flat_map(|&v| uvs[v as usize].to_array()))
            .collect()
    }

    /// Per-corner UVs as one `vec2` per rendered vertex.
    pub fn expand_corner_uvs(&self, uvs: &[Vec2]) -> Vec<f32> {
        self.tri_corners
            .iter()
            .flat_map(|corners| corners.iter().flat_map(|&c| uvs[c].to_array()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A unit quad (one polygon) next to a triangle sharing edge 1-2.
    fn quad_and_triangle() -> MeshGeometry {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, 0.5, 0.0),
        ];
        MeshGeometry::new(vertices, vec![vec![0, 1, 2, 3], vec![1, 4, 2]]).unwrap()
    }

    #[test]
    fn test_counts() {
        let g = quad_and_triangle();
        assert_eq!(g.num_vertices(), 5);
        assert_eq!(g.num_faces(), 2);
        assert_eq!(g.num_triangles(), 3);
        assert_eq!(g.num_halfedges(), 7);
        assert_eq!(g.num_corners(), 7);
        // 4 quad edges + 2 new triangle edges, edge 1-2 shared
        assert_eq!(g.num_edges(), 6);
        assert_eq!(g.element_count(AttachmentKind::Texture), None);
    }

    #[test]
    fn test_invalid_faces_rejected() {
        let vertices = vec![Vec3::ZERO; 3];
        assert!(matches!(
            MeshGeometry::new(vertices.clone(), vec![vec![0, 1, 5]]),
            Err(ScalarscopeError::InvalidTopology(_))
        ));
        assert!(matches!(
            MeshGeometry::new(vertices, vec![vec![0, 1]]),
            Err(ScalarscopeError::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_edges_sorted_and_halfedges_mapped() {
        let g = quad_and_triangle();
        assert_eq!(
            g.edges(),
            &[(0, 1), (0, 3), (1, 2), (1, 4), (2, 3), (2, 4)]
        );
        // Halfedge 1 of the quad runs 1 -> 2; halfedge 2 of the triangle runs 2 -> 1
        assert_eq!(g.halfedge_vertices(1), Some((1, 2)));
        assert_eq!(g.halfedge_vertices(6), Some((2, 1)));
        assert_eq!(g.halfedge_edge(1), Some(2));
        assert_eq!(g.halfedge_edge(6), Some(2));
        assert_eq!(g.corner_vertex(4), Some(1));
        assert_eq!(g.corner_vertex(7), None);
    }

    #[test]
    fn test_face_values_repeat_per_triangle() {
        let g = quad_and_triangle();
        let expanded = g.expand_face_values(&[10.0, 20.0]);
        assert_eq!(expanded, vec![10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0]);
    }

    #[test]
    fn test_vertex_values_follow_triangulation() {
        let g = quad_and_triangle();
        let expanded = g.expand_vertex_values(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(expanded, vec![0.0, 1.0, 2.0, 0.0, 2.0, 3.0, 1.0, 4.0, 2.0]);
    }

    #[test]
    fn test_corner_values_follow_face_order() {
        let g = quad_and_triangle();
        let values: Vec<f32> = (0..7).map(|c| c as f32).collect();
        let expanded = g.expand_corner_values(&values);
        assert_eq!(expanded.len(), 9 * 4);
        // Second fan triangle of the quad uses corners 0, 2, 3
        assert_eq!(&expanded[12..16], &[0.0, 2.0, 3.0, 0.0]);
        // The triangle face uses corners 4, 5, 6
        assert_eq!(&expanded[24..28], &[4.0, 5.0, 6.0, 0.0]);
    }

    #[test]
    fn test_halfedge_values_skip_diagonals() {
        let g = quad_and_triangle();
        let values: Vec<f32> = (1..=7).map(|h| h as f32).collect();
        let expanded = g.expand_halfedge_values(&values);
        // First quad triangle: halfedges 0 (0->1), 1 (1->2), diagonal
        assert_eq!(&expanded[0..4], &[1.0, 2.0, 0.0, 0.0]);
        // Second quad triangle: diagonal, halfedge 2 (2->3), halfedge 3 (3->0)
        assert_eq!(&expanded[12..16], &[0.0, 3.0, 4.0, 0.0]);

        let real = g.expand_edge_is_real();
        assert_eq!(&real[0..4], &[1.0, 1.0, 0.0, 0.0]);
        assert_eq!(&real[12..16], &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(&real[24..28], &[1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_edge_values_use_sorted_edge_order() {
        let g = quad_and_triangle();
        let values: Vec<f32> = (0..6).map(|e| e as f32 * 10.0).collect();
        let expanded = g.expand_edge_values(&values);
        // Triangle face halfedges: 1->4 (edge 3), 4->2 (edge 5), 2->1 (edge 2)
        assert_eq!(&expanded[24..28], &[30.0, 50.0, 20.0, 0.0]);
    }

    #[test]
    fn test_normals_and_positions() {
        let g = quad_and_triangle();
        assert!((g.face_normals()[0] - Vec3::Z).length() < 1e-6);
        assert!((g.vertex_normals()[4] - Vec3::Z).length() < 1e-6);
        let positions = g.expand_positions();
        assert_eq!(positions.len(), 9 * 4);
        assert_eq!(&positions[4..8], &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_uv_expansion() {
        let g = quad_and_triangle();
        let vertex_uvs: Vec<Vec2> = (0..5).map(|v| Vec2::splat(v as f32)).collect();
        let expanded = g.expand_vertex_uvs(&vertex_uvs);
        assert_eq!(expanded.len(), 9 * 2);
        assert_eq!(&expanded[0..6], &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);

        let corner_uvs: Vec<Vec2> = (0..7).map(|c| Vec2::new(c as f32, 0.0)).collect();
        let expanded = g.expand_corner_uvs(&corner_uvs);
        assert_eq!(&expanded[12..18], &[4.0, 0.0, 5.0, 0.0, 6.0, 0.0]);
    }

    fn polygon(n: u32) -> MeshGeometry {
        let vertices = (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * std::f32::consts::TAU;
                Vec3::new(a.cos(), a.sin(), 0.0)
            })
            .collect();
        MeshGeometry::new(vertices, vec![(0..n).collect()]).unwrap()
    }

    proptest::proptest! {
        #[test]
        fn prop_polygon_fan_keeps_every_boundary_edge(n in 3u32..16) {
            let g = polygon(n);
            let n = n as usize;
            proptest::prop_assert_eq!(g.num_triangles(), n - 2);
            proptest::prop_assert_eq!(g.num_halfedges(), n);
            proptest::prop_assert_eq!(g.num_edges(), n);

            // One entry per triangle: every boundary edge is real exactly once
            let flags = g.expand_edge_is_real();
            let real: f32 = flags.chunks_exact(12).map(|t| t[0] + t[1] + t[2]).sum();
            proptest::prop_assert_eq!(real as usize, n);

            // Each halfedge value shows up in exactly one real slot
            let values: Vec<f32> = (1..=n).map(|h| h as f32).collect();
            let mut seen: Vec<f32> = g
                .expand_halfedge_values(&values)
                .chunks_exact(12)
                .flat_map(|t| t[0..3].to_vec())
                .filter(|&v| v != 0.0)
                .collect();
            seen.sort_by(f32::total_cmp);
            proptest::prop_assert_eq!(seen, values);
        }
    }
}
