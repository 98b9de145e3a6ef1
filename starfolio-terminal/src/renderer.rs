/// ASCII rasterizer for terminal rendering
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crossterm::{
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use starfolio_core::{
    Camera, ImageData, Light, Mesh, Renderable, Rgb, Scene, SceneRenderer, ScreenPoint, Shape,
    TextureId, Transform, Triangle,
};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Ramp character used for unlit surfaces
const UNLIT_CHAR: char = '#';

/// Background images are dimmed so geometry stays readable on top
const BACKGROUND_DIM: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: Rgb,
}

const EMPTY: Cell = Cell {
    character: ' ',
    color: Rgb::WHITE,
};

/// A projected vertex with attributes divided by depth for
/// perspective-correct interpolation
#[derive(Clone, Copy)]
struct Projected {
    screen: ScreenPoint,
    inv_depth: f32,
    u_over_z: f32,
    v_over_z: f32,
}

/// Per-triangle shading inputs resolved before rasterization
struct Surface<'a> {
    character: char,
    light: Rgb,
    base: Rgb,
    map: Option<&'a ImageData>,
}

/// ASCII renderer that converts the scene to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    background: Vec<Option<Rgb>>,
    textures: HashMap<TextureId, Rc<ImageData>>,
    meshes: Vec<(Shape, Rc<Mesh>)>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![EMPTY; size],
            background: vec![None; size],
            textures: HashMap::new(),
            meshes: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Make decoded pixels available for a loaded texture slot
    pub fn insert_texture(&mut self, id: TextureId, image: ImageData) {
        self.textures.insert(id, Rc::new(image));
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(EMPTY);
        self.background.fill(None);
    }

    fn mesh_for(&mut self, shape: &Shape) -> Rc<Mesh> {
        if let Some((_, mesh)) = self.meshes.iter().find(|(s, _)| s == shape) {
            return Rc::clone(mesh);
        }
        let mesh = Rc::new(shape.tessellate());
        self.meshes.push((*shape, Rc::clone(&mesh)));
        mesh
    }

    fn fill_background(&mut self, scene: &Scene) {
        let Some(image) = scene
            .active_background()
            .and_then(|id| self.textures.get(&id))
        else {
            return;
        };
        for y in 0..self.height {
            let v = 1.0 - (y as f32 + 0.5) / self.height as f32;
            for x in 0..self.width {
                let u = (x as f32 + 0.5) / self.width as f32;
                self.background[y * self.width + x] = Some(image.sample(u, v).scale(BACKGROUND_DIM));
            }
        }
    }

    pub fn render_object(&mut self, scene: &Scene, object: &Renderable, camera: &Camera) {
        let model = object.model_matrix();
        let mvp = Transform::mvp_matrix(&model, &camera.view_matrix(), &camera.projection_matrix());

        // Whole object behind the camera: nothing to do
        let centre = model.transform_point(&Point3::origin());
        if (centre - camera.position).dot(&camera.forward()) < -bounding_radius(&object.shape) {
            return;
        }

        let mesh = self.mesh_for(&object.shape);
        let material = &object.material;
        let map = scene
            .active_map(material)
            .and_then(|id| self.textures.get(&id))
            .map(Rc::clone);

        for triangle in &mesh.triangles {
            let surface = shade(triangle, &model, material.lit, &scene.lights);
            let surface = Surface {
                base: material.color,
                map: map.as_deref(),
                ..surface
            };
            self.render_triangle(triangle, &mvp, camera, &surface);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        mvp: &Matrix4<f32>,
        camera: &Camera,
        surface: &Surface<'_>,
    ) {
        // Project vertices to screen space
        let mut projected = [None; 3];
        for (slot, vertex) in projected.iter_mut().zip(&triangle.vertices) {
            let screen =
                camera.project_with(mvp, &vertex.position, self.width as u32, self.height as u32);
            *slot = screen.map(|screen| {
                let inv_depth = 1.0 / screen.depth;
                Projected {
                    screen,
                    inv_depth,
                    u_over_z: vertex.uv.x * inv_depth,
                    v_over_z: vertex.uv.y * inv_depth,
                }
            });
        }
        let [Some(p0), Some(p1), Some(p2)] = projected else {
            return; // Triangle is clipped
        };

        self.rasterize_triangle([p0, p1, p2], surface);
    }

    fn rasterize_triangle(&mut self, coords: [Projected; 3], surface: &Surface<'_>) {
        let [v0, v1, v2] = coords.map(|p| p.screen);

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let inv_depth = w0 * coords[0].inv_depth
                    + w1 * coords[1].inv_depth
                    + w2 * coords[2].inv_depth;
                let depth = 1.0 / inv_depth;

                let idx = y as usize * self.width + x as usize;
                if depth >= self.depth_buffer[idx] {
                    continue;
                }
                self.depth_buffer[idx] = depth;

                let base = match surface.map {
                    Some(image) => {
                        let u = (w0 * coords[0].u_over_z
                            + w1 * coords[1].u_over_z
                            + w2 * coords[2].u_over_z)
                            * depth;
                        let v = (w0 * coords[0].v_over_z
                            + w1 * coords[1].v_over_z
                            + w2 * coords[2].v_over_z)
                            * depth;
                        image.sample(u, v).modulate(surface.base)
                    }
                    None => surface.base,
                };
                self.cells[idx] = Cell {
                    character: surface.character,
                    color: base.modulate(surface.light),
                };
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut last: Option<(Rgb, Option<Rgb>)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let cell = self.cells[idx];
                let background = self.background[idx];

                if last != Some((cell.color, background)) {
                    writer.queue(SetForegroundColor(to_color(cell.color)))?;
                    match background {
                        Some(bg) => writer.queue(SetBackgroundColor(to_color(bg)))?,
                        None => writer.queue(SetBackgroundColor(Color::Reset))?,
                    };
                    last = Some((cell.color, background));
                }
                writer.queue(Print(cell.character))?;
            }
            writer.queue(ResetColor)?;
            last = None;
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    #[cfg(test)]
    fn char_at(&self, x: usize, y: usize) -> char {
        self.cells[y * self.width + x].character
    }
}

impl SceneRenderer for AsciiRenderer {
    fn render(&mut self, scene: &Scene, camera: &Camera) {
        self.clear();
        self.fill_background(scene);
        for object in scene.objects() {
            self.render_object(scene, object, camera);
        }
    }
}

/// Flat shading: one ramp character and light colour per triangle
fn shade<'a>(triangle: &Triangle, model: &Matrix4<f32>, lit: bool, lights: &[Light]) -> Surface<'a> {
    if !lit {
        return Surface {
            character: UNLIT_CHAR,
            light: Rgb::WHITE,
            base: Rgb::WHITE,
            map: None,
        };
    }

    let normal = model.transform_vector(&triangle.calculate_normal());
    let normal = if normal.norm() > 0.0 {
        normal.normalize()
    } else {
        Vector3::z()
    };
    let centre = triangle
        .vertices
        .iter()
        .map(|v| model.transform_point(&v.position).coords)
        .sum::<Vector3<f32>>()
        / 3.0;

    let mut light = Rgb::new(0.0, 0.0, 0.0);
    let mut diffuse_total = 0.0;
    for source in lights {
        match *source {
            Light::Ambient { color, intensity } => {
                light = add(light, color.scale(intensity));
            }
            Light::Point {
                color,
                intensity,
                position,
            } => {
                let to_light = position - centre;
                let diffuse = if to_light.norm() > 0.0 {
                    normal.dot(&to_light.normalize()).max(0.0) * intensity
                } else {
                    0.0
                };
                diffuse_total += diffuse;
                light = add(light, color.scale(diffuse));
            }
        }
    }

    // Ambient light floods colour, so the character carries the diffuse term
    let brightness = (0.3 + 0.7 * diffuse_total).clamp(0.0, 1.0);
    let char_index = ((brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize)
        .clamp(1, LUMINOSITY_RAMP.len() - 1);

    Surface {
        character: LUMINOSITY_RAMP[char_index],
        light,
        base: Rgb::WHITE,
        map: None,
    }
}

fn add(a: Rgb, b: Rgb) -> Rgb {
    Rgb::new(a.r + b.r, a.g + b.g, a.b + b.b)
}

fn to_color(rgb: Rgb) -> Color {
    let (r, g, b) = rgb.to_rgb8();
    Color::Rgb { r, g, b }
}

fn bounding_radius(shape: &Shape) -> f32 {
    match *shape {
        Shape::Torus { radius, tube, .. } => radius + tube,
        Shape::Sphere { radius, .. } => radius,
        Shape::Cuboid {
            width,
            height,
            depth,
        } => Vector3::new(width, height, depth).norm() / 2.0,
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use starfolio_core::{Material, Rgb};

    fn camera_at_z(z: f32) -> Camera {
        let mut camera = Camera::new(40, 20);
        camera.position = Point3::new(0.0, 0.0, z);
        camera
    }

    #[test]
    fn barycentric_weights_sum_to_one() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)).is_none());
    }

    #[test]
    fn empty_scene_renders_blank() {
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render(&Scene::new(), &camera_at_z(10.0));
        assert!(renderer.cells.iter().all(|c| c.character == ' '));
    }

    #[test]
    fn cube_in_front_of_camera_covers_centre() {
        let mut scene = Scene::new();
        scene.add(
            Shape::Cuboid {
                width: 3.0,
                height: 3.0,
                depth: 3.0,
            },
            Material::standard(Rgb::WHITE),
            Vector3::zeros(),
        );
        scene.add_light(Light::Ambient {
            color: Rgb::WHITE,
            intensity: 1.0,
        });

        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render(&scene, &camera_at_z(10.0));
        assert_ne!(renderer.char_at(20, 10), ' ');
        assert_eq!(renderer.char_at(0, 0), ' ');
    }

    #[test]
    fn object_behind_camera_is_skipped() {
        let mut scene = Scene::new();
        scene.add(
            Shape::Sphere {
                radius: 1.0,
                width_segments: 8,
                height_segments: 8,
            },
            Material::standard(Rgb::WHITE),
            Vector3::new(0.0, 0.0, 20.0),
        );
        let mut renderer = AsciiRenderer::new(40, 20);
        renderer.render(&scene, &camera_at_z(10.0));
        assert!(renderer.cells.iter().all(|c| c.character == ' '));
    }

    #[test]
    fn loaded_background_tints_every_cell() {
        let mut scene = Scene::new();
        let id = scene.textures.request("space.jpg");
        scene.background = Some(id);
        scene.resolve_texture(id, Ok((1, 1)));

        let mut renderer = AsciiRenderer::new(8, 4);
        renderer.insert_texture(id, ImageData::solid_color(1, 1, [255, 255, 255, 255]));
        renderer.render(&scene, &camera_at_z(10.0));
        assert!(renderer
            .background
            .iter()
            .all(|bg| *bg == Some(Rgb::WHITE.scale(BACKGROUND_DIM))));
    }

    #[test]
    fn tessellation_is_cached_per_shape() {
        let mut renderer = AsciiRenderer::new(4, 4);
        let star = Shape::Sphere {
            radius: 0.25,
            width_segments: 24,
            height_segments: 24,
        };
        let a = renderer.mesh_for(&star);
        let b = renderer.mesh_for(&star);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(renderer.meshes.len(), 1);
    }
}
