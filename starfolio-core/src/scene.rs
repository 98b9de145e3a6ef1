//! Scene graph and the one-shot builder that populates it.

use log::{debug, info};
use nalgebra::{Matrix4, Vector3};
use rand::Rng;

use crate::config::{AssetsConfig, StarfolioConfig, StarsConfig};
use crate::error::TextureError;
use crate::geometry::Mesh;
use crate::texture::{TextureId, TextureState, TextureTable};
use crate::transform::{RotationState, Transform};

/// Linear RGB colour with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        )
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.r * k, self.g * k, self.b * k)
    }

    pub fn modulate(self, other: Rgb) -> Self {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (q(self.r), q(self.g), q(self.b))
    }
}

/// Stable handle to a renderable; never reused for the life of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

/// Parametric shape of a renderable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Cuboid {
        width: f32,
        height: f32,
        depth: f32,
    },
}

impl Shape {
    pub fn tessellate(&self) -> Mesh {
        match *self {
            Shape::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => Mesh::torus(radius, tube, radial_segments, tubular_segments),
            Shape::Sphere {
                radius,
                width_segments,
                height_segments,
            } => Mesh::uv_sphere(radius, width_segments, height_segments),
            Shape::Cuboid {
                width,
                height,
                depth,
            } => Mesh::cuboid(width, height, depth),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Rgb,
    /// Unlit materials ignore the scene lights
    pub lit: bool,
    pub map: Option<TextureId>,
    pub normal_map: Option<TextureId>,
}

impl Material {
    pub fn standard(color: Rgb) -> Self {
        Self {
            color,
            lit: true,
            map: None,
            normal_map: None,
        }
    }

    pub fn basic(map: TextureId) -> Self {
        Self {
            color: Rgb::WHITE,
            lit: false,
            map: Some(map),
            normal_map: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderable {
    pub id: ObjectId,
    pub shape: Shape,
    pub material: Material,
    pub position: Vector3<f32>,
    pub rotation: RotationState,
}

impl Renderable {
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::model_matrix(&self.position, &self.rotation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Point {
        color: Rgb,
        intensity: f32,
        position: Vector3<f32>,
    },
    Ambient {
        color: Rgb,
        intensity: f32,
    },
}

/// Everything that gets drawn, plus the lights and background slot
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<Renderable>,
    pub lights: Vec<Light>,
    pub background: Option<TextureId>,
    pub textures: TextureTable,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, shape: Shape, material: Material, position: Vector3<f32>) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(Renderable {
            id,
            shape,
            material,
            position,
            rotation: RotationState::zero(),
        });
        id
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn objects(&self) -> &[Renderable] {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&Renderable> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Renderable> {
        self.objects.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Report that a texture load finished, successfully or not
    pub fn resolve_texture(
        &mut self,
        id: TextureId,
        outcome: Result<(u32, u32), TextureError>,
    ) -> Option<&TextureState> {
        self.textures.resolve(id, outcome)
    }

    /// Colour map to apply to a material, if one has actually arrived
    pub fn active_map(&self, material: &Material) -> Option<TextureId> {
        material.map.filter(|&id| self.textures.is_loaded(id))
    }

    pub fn active_normal_map(&self, material: &Material) -> Option<TextureId> {
        material.normal_map.filter(|&id| self.textures.is_loaded(id))
    }

    pub fn active_background(&self) -> Option<TextureId> {
        self.background.filter(|&id| self.textures.is_loaded(id))
    }
}

/// Handles to the objects the driver animates
#[derive(Debug, Clone)]
pub struct SceneHandles {
    pub torus: ObjectId,
    pub avatar: ObjectId,
    pub earth: ObjectId,
    pub stars: Vec<ObjectId>,
}

const TORUS_COLOR: u32 = 0xdeb887;
const STAR_COLOR: u32 = 0xfafad2;

/// Populates a [`Scene`] with the torus, starfield, avatar and earth
pub struct SceneBuilder<'a> {
    config: &'a StarfolioConfig,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(config: &'a StarfolioConfig) -> Self {
        Self { config }
    }

    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> (Scene, SceneHandles) {
        let mut scene = Scene::new();
        let assets = &self.config.assets;

        let torus = scene.add(
            Shape::Torus {
                radius: 14.155,
                tube: 1.485,
                radial_segments: 30,
                tubular_segments: 96,
            },
            Material::standard(Rgb::from_hex(TORUS_COLOR)),
            Vector3::zeros(),
        );

        scene.add_light(Light::Point {
            color: Rgb::WHITE,
            intensity: 1.0,
            position: Vector3::new(5.0, 5.0, 5.0),
        });
        scene.add_light(Light::Ambient {
            color: Rgb::WHITE,
            intensity: 1.0,
        });

        let stars = (0..self.config.stars.count)
            .map(|_| add_star(&mut scene, &self.config.stars, rng))
            .collect();

        scene.background = Some(scene.textures.request(&assets.background));
        let (avatar, earth) = add_feature_meshes(&mut scene, assets);

        info!(
            "scene built: {} objects, {} lights, {} textures requested",
            scene.len(),
            scene.lights.len(),
            scene.textures.len()
        );

        (
            scene,
            SceneHandles {
                torus,
                avatar,
                earth,
                stars,
            },
        )
    }
}

/// Add one star at a uniformly random position inside the configured cube
pub fn add_star<R: Rng + ?Sized>(scene: &mut Scene, stars: &StarsConfig, rng: &mut R) -> ObjectId {
    let half = stars.spread / 2.0;
    let mut component = || {
        if half > 0.0 {
            rng.gen_range(-half..=half)
        } else {
            0.0
        }
    };
    let position = Vector3::new(component(), component(), component());
    debug!("star at {:?}", position);
    scene.add(
        Shape::Sphere {
            radius: 0.25,
            width_segments: 24,
            height_segments: 24,
        },
        Material::standard(Rgb::from_hex(STAR_COLOR)),
        position,
    )
}

fn add_feature_meshes(scene: &mut Scene, assets: &AssetsConfig) -> (ObjectId, ObjectId) {
    let avatar_map = scene.textures.request(&assets.avatar);
    let avatar = scene.add(
        Shape::Cuboid {
            width: 3.0,
            height: 3.0,
            depth: 3.0,
        },
        Material::basic(avatar_map),
        Vector3::new(2.0, 0.0, -5.0),
    );

    let earth_map = scene.textures.request(&assets.earth);
    let earth_normal = scene.textures.request(&assets.earth_normal);
    let earth = scene.add(
        Shape::Sphere {
            radius: 3.0,
            width_segments: 32,
            height_segments: 32,
        },
        Material {
            color: Rgb::WHITE,
            lit: true,
            map: Some(earth_map),
            normal_map: Some(earth_normal),
        },
        Vector3::new(10.0, 10.0, 15.0),
    );

    (avatar, earth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn build_default() -> (Scene, SceneHandles) {
        let config = StarfolioConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        SceneBuilder::new(&config).build(&mut rng)
    }

    #[test]
    fn two_hundred_stars_are_distinct_and_in_range() {
        let mut scene = Scene::new();
        let stars = StarsConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let ids: Vec<_> = (0..200).map(|_| add_star(&mut scene, &stars, &mut rng)).collect();

        assert_eq!(scene.len(), 200);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 200);
        for obj in scene.objects() {
            for c in obj.position.iter() {
                assert!((-50.0..=50.0).contains(c), "component {c} out of range");
            }
        }
        // Independent sampling: not every star shares a component value
        let xs: HashSet<_> = scene.objects().iter().map(|o| o.position.x.to_bits()).collect();
        assert!(xs.len() > 190);
    }

    #[test]
    fn builder_populates_fixed_objects() {
        let (scene, handles) = build_default();
        assert_eq!(scene.len(), 1 + 200 + 2);
        assert_eq!(handles.stars.len(), 200);
        assert_eq!(scene.lights.len(), 2);

        let torus = scene.get(handles.torus).unwrap();
        assert_eq!(torus.material.color, Rgb::from_hex(0xdeb887));
        assert!(torus.material.lit);

        let avatar = scene.get(handles.avatar).unwrap();
        assert_eq!(avatar.position, Vector3::new(2.0, 0.0, -5.0));
        assert!(!avatar.material.lit);
        assert!(avatar.material.map.is_some());

        let earth = scene.get(handles.earth).unwrap();
        assert_eq!(earth.position, Vector3::new(10.0, 10.0, 15.0));
        assert!(earth.material.normal_map.is_some());
    }

    #[test]
    fn textures_are_requested_but_inactive_until_loaded() {
        let (mut scene, handles) = build_default();
        assert_eq!(scene.textures.len(), 4);
        assert_eq!(scene.textures.pending().count(), 4);
        assert!(scene.active_background().is_none());

        let earth = scene.get(handles.earth).unwrap().material.clone();
        assert!(scene.active_map(&earth).is_none());

        let map = earth.map.unwrap();
        scene.resolve_texture(map, Ok((512, 256)));
        assert_eq!(scene.active_map(&earth), Some(map));
        assert!(scene.active_normal_map(&earth).is_none());
    }

    #[test]
    fn object_ids_are_stable_indices() {
        let mut scene = Scene::new();
        let a = scene.add(
            Shape::Cuboid { width: 1.0, height: 1.0, depth: 1.0 },
            Material::standard(Rgb::WHITE),
            Vector3::zeros(),
        );
        let b = scene.add(
            Shape::Cuboid { width: 1.0, height: 1.0, depth: 1.0 },
            Material::standard(Rgb::WHITE),
            Vector3::x(),
        );
        scene.get_mut(a).unwrap().rotation.rotate(1.0, 0.0, 0.0);
        assert_eq!(scene.get(a).unwrap().id, a);
        assert_eq!(scene.get(b).unwrap().position, Vector3::x());
    }

    #[test]
    fn hex_colors() {
        assert_eq!(Rgb::from_hex(0xffffff), Rgb::WHITE);
        assert_eq!(Rgb::from_hex(0xff0000).to_rgb8(), (255, 0, 0));
    }
}
