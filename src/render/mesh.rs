use bytemuck::{Pod, Zeroable};

use crate::scene::MeshShape;

/// Vertex layout shared by every pipeline: position and normal.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// CPU-side triangle mesh ready for upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Tessellates one of the parametric shapes the scene graph can hold.
    pub fn from_shape(shape: &MeshShape) -> Self {
        match *shape {
            MeshShape::Cube { size } => Self::cube(size),
            MeshShape::Plane { width, height } => Self::plane(width, height),
        }
    }

    /// Axis-aligned cube centered on the origin, one quad per face so each
    /// face keeps a flat normal.
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        // (normal, four corners in counter-clockwise order seen from outside)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            (
                [0.0, 0.0, 1.0],
                [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
            ),
            (
                [0.0, 0.0, -1.0],
                [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]],
            ),
            (
                [1.0, 0.0, 0.0],
                [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]],
            ),
            (
                [-1.0, 0.0, 0.0],
                [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]],
            ),
            (
                [0.0, 1.0, 0.0],
                [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]],
            ),
            (
                [0.0, -1.0, 0.0],
                [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]],
            ),
        ];

        let mut mesh = MeshData::default();
        for (normal, corners) in faces {
            mesh.push_quad(normal, corners);
        }
        mesh
    }

    /// Rectangle in the XY plane facing +Z, matching how the demo authors its
    /// ground before tipping it flat with a node rotation.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let mut mesh = MeshData::default();
        mesh.push_quad(
            [0.0, 0.0, 1.0],
            [[-hw, -hh, 0.0], [hw, -hh, 0.0], [hw, hh, 0.0], [-hw, hh, 0.0]],
        );
        mesh
    }

    fn push_quad(&mut self, normal: [f32; 3], corners: [[f32; 3]; 4]) {
        let base = self.vertices.len() as u32;
        for position in corners {
            self.vertices.push(Vertex { position, normal });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_one_quad_per_face() {
        let cube = MeshData::cube(1.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);

        for vertex in &cube.vertices {
            for coord in vertex.position {
                assert!((coord.abs() - 0.5).abs() < 1e-6);
            }
            let len: f32 = vertex.normal.iter().map(|n| n * n).sum::<f32>().sqrt();
            assert!((len - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn cube_scales_with_size() {
        let cube = MeshData::cube(2.0);
        let max = cube
            .vertices
            .iter()
            .flat_map(|v| v.position)
            .fold(f32::MIN, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn plane_faces_positive_z() {
        let plane = MeshData::plane(10.0, 10.0);
        assert_eq!(plane.vertices.len(), 4);
        assert_eq!(plane.index_count(), 6);
        for vertex in &plane.vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
            assert_eq!(vertex.position[2], 0.0);
            assert!((vertex.position[0].abs() - 5.0).abs() < 1e-6);
            assert!((vertex.position[1].abs() - 5.0).abs() < 1e-6);
        }
    }

    #[test]
    fn from_shape_dispatches_on_kind() {
        let cube = MeshData::from_shape(&MeshShape::Cube { size: 1.0 });
        assert_eq!(cube, MeshData::cube(1.0));
        let plane = MeshData::from_shape(&MeshShape::Plane {
            width: 4.0,
            height: 2.0,
        });
        assert_eq!(plane, MeshData::plane(4.0, 2.0));
    }

    #[test]
    fn indices_stay_in_bounds() {
        for mesh in [MeshData::cube(1.0), MeshData::plane(3.0, 3.0)] {
            let count = mesh.vertices.len() as u32;
            assert!(mesh.indices.iter().all(|&index| index < count));
            assert_eq!(mesh.indices.len() % 3, 0);
        }
    }
}
