/// Geometry primitives and parametric tessellation
use nalgebra::{Point3, Vector2, Vector3};
use std::f32::consts::{PI, TAU};

/// A 3D vertex with position, normal and texture coordinate
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, uv: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// A triangle face defined by three vertices, counter-clockwise from outside
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }
}

/// Floats per vertex in [`Mesh::interleaved`]: position, normal, uv.
pub const INTERLEAVED_STRIDE: usize = 8;

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }

    /// Flatten into `[px, py, pz, nx, ny, nz, u, v]` per vertex for GPU upload.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertex_count() * INTERLEAVED_STRIDE);
        for triangle in &self.triangles {
            for v in &triangle.vertices {
                out.extend_from_slice(&[
                    v.position.x,
                    v.position.y,
                    v.position.z,
                    v.normal.x,
                    v.normal.y,
                    v.normal.z,
                    v.uv.x,
                    v.uv.y,
                ]);
            }
        }
        out
    }

    /// Build a mesh from a `(rows + 1) x (cols + 1)` vertex grid, two
    /// triangles per cell. `skip` may drop degenerate cell halves.
    fn from_grid(
        grid: &[Vertex],
        rows: usize,
        cols: usize,
        skip: impl Fn(usize, usize, bool) -> bool,
    ) -> Self {
        let at = |row: usize, col: usize| grid[row * (cols + 1) + col];
        let mut mesh = Self::with_capacity(rows * cols * 2);
        for row in 0..rows {
            for col in 0..cols {
                let a = at(row, col + 1);
                let b = at(row, col);
                let c = at(row + 1, col);
                let d = at(row + 1, col + 1);
                if !skip(row, col, false) {
                    mesh.add_triangle(Triangle::new(a, b, d));
                }
                if !skip(row, col, true) {
                    mesh.add_triangle(Triangle::new(b, c, d));
                }
            }
        }
        mesh
    }

    /// Ring torus in the XY plane around the Z axis.
    ///
    /// `radius` is the distance from the centre to the middle of the tube.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial = radial_segments.max(2) as usize;
        let tubular = tubular_segments.max(3) as usize;

        let mut grid = Vec::with_capacity((radial + 1) * (tubular + 1));
        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let ring = radius + tube * v.cos();
                let position = Point3::new(ring * u.cos(), ring * u.sin(), tube * v.sin());
                let centre = Point3::new(radius * u.cos(), radius * u.sin(), 0.0);
                grid.push(Vertex::new(
                    position,
                    (position - centre).normalize(),
                    Vector2::new(i as f32 / tubular as f32, j as f32 / radial as f32),
                ));
            }
        }

        // Grid rows run along the tube cross-section, so the cell winding
        // is flipped relative to the sphere to keep faces pointing outward.
        let at = |row: usize, col: usize| grid[row * (tubular + 1) + col];
        let mut mesh = Self::with_capacity(radial * tubular * 2);
        for j in 1..=radial {
            for i in 1..=tubular {
                let a = at(j, i - 1);
                let b = at(j - 1, i - 1);
                let c = at(j - 1, i);
                let d = at(j, i);
                mesh.add_triangle(Triangle::new(a, b, d));
                mesh.add_triangle(Triangle::new(b, c, d));
            }
        }
        mesh
    }

    /// UV sphere with poles on the Y axis.
    pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let cols = width_segments.max(3) as usize;
        let rows = height_segments.max(2) as usize;

        let mut grid = Vec::with_capacity((rows + 1) * (cols + 1));
        for iy in 0..=rows {
            let v = iy as f32 / rows as f32;
            for ix in 0..=cols {
                let u = ix as f32 / cols as f32;
                let position = Point3::new(
                    -radius * (u * TAU).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * TAU).sin() * (v * PI).sin(),
                );
                grid.push(Vertex::new(
                    position,
                    position.coords.normalize(),
                    Vector2::new(u, 1.0 - v),
                ));
            }
        }

        // The first and last rows collapse to a pole; drop the sliver halves.
        Self::from_grid(&grid, rows, cols, |row, _, lower| {
            (!lower && row == 0) || (lower && row == rows - 1)
        })
    }

    /// Axis-aligned box centred on the origin, one full texture per face.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vector3::new(width, height, depth) / 2.0;
        // (normal, u axis, v axis) with u x v == normal
        let faces = [
            (Vector3::x(), -Vector3::z(), Vector3::y()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
            (Vector3::y(), Vector3::x(), -Vector3::z()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), -Vector3::x(), Vector3::y()),
        ];

        let mut mesh = Self::with_capacity(12);
        for (normal, u_axis, v_axis) in faces {
            let corner = |su: f32, sv: f32| {
                let offset = (normal + u_axis * su + v_axis * sv).component_mul(&half);
                Vertex::new(
                    Point3::from(offset),
                    normal,
                    Vector2::new((su + 1.0) / 2.0, (sv + 1.0) / 2.0),
                )
            };
            let (v0, v1, v2, v3) = (
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            );
            mesh.add_triangle(Triangle::new(v0, v1, v2));
            mesh.add_triangle(Triangle::new(v0, v2, v3));
        }
        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward(mesh: &Mesh) {
        for triangle in &mesh.triangles {
            let face = triangle.calculate_normal();
            if !face.iter().all(|c| c.is_finite()) {
                continue;
            }
            let vertex_normal: Vector3<f32> =
                triangle.vertices.iter().map(|v| v.normal).sum::<Vector3<f32>>();
            assert!(
                face.dot(&vertex_normal) > 0.0,
                "face normal {face:?} points against vertex normals {vertex_normal:?}"
            );
        }
    }

    #[test]
    fn cuboid_has_twelve_outward_triangles() {
        let mesh = Mesh::cuboid(3.0, 3.0, 3.0);
        assert_eq!(mesh.triangles.len(), 12);
        assert_outward(&mesh);
        for triangle in &mesh.triangles {
            for v in &triangle.vertices {
                assert!((v.position.x.abs() - 1.5).abs() < 1e-6);
                assert!((v.position.y.abs() - 1.5).abs() < 1e-6);
                assert!((v.position.z.abs() - 1.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn torus_triangle_count_and_extent() {
        let mesh = Mesh::torus(14.155, 1.485, 30, 96);
        assert_eq!(mesh.triangles.len(), 2 * 30 * 96);
        assert_outward(&mesh);
        for triangle in &mesh.triangles {
            for v in &triangle.vertices {
                let ring = (v.position.x.powi(2) + v.position.y.powi(2)).sqrt();
                assert!(ring >= 14.155 - 1.485 - 1e-3 && ring <= 14.155 + 1.485 + 1e-3);
                assert!(v.position.z.abs() <= 1.485 + 1e-4);
            }
        }
    }

    #[test]
    fn sphere_skips_pole_slivers() {
        let mesh = Mesh::uv_sphere(3.0, 32, 32);
        assert_eq!(mesh.triangles.len(), 2 * 32 * 31);
        assert_outward(&mesh);
        for triangle in &mesh.triangles {
            for v in &triangle.vertices {
                assert!((v.position.coords.norm() - 3.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn interleaved_layout() {
        let mesh = Mesh::cuboid(2.0, 2.0, 2.0);
        let data = mesh.interleaved();
        assert_eq!(data.len(), 36 * INTERLEAVED_STRIDE);
        let first = &mesh.triangles[0].vertices[0];
        assert_eq!(data[0], first.position.x);
        assert_eq!(data[3], first.normal.x);
        assert_eq!(data[6], first.uv.x);
        assert_eq!(data[7], first.uv.y);
    }
}
