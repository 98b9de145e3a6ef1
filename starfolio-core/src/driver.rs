//! Per-frame and per-scroll scene updates.
//!
//! Neither function creates objects; they only move existing ones and ask
//! the host to redraw.

use std::time::Duration;

use rand::Rng;

use crate::config::{FrameConfig, MotionMode, ScrollConfig, StarfolioConfig};
use crate::projection::Camera;
use crate::scene::{ObjectId, Scene, SceneBuilder, SceneHandles};

/// Something that can draw the scene from a camera
pub trait SceneRenderer {
    fn render(&mut self, scene: &Scene, camera: &Camera);
}

/// Everything the scroll and frame callbacks touch
#[derive(Debug, Clone)]
pub struct AppState {
    pub scene: Scene,
    pub camera: Camera,
    pub handles: SceneHandles,
    pub scroll: ScrollConfig,
    pub frame: FrameConfig,
}

impl AppState {
    pub fn new<R: Rng + ?Sized>(config: &StarfolioConfig, width: u32, height: u32, rng: &mut R) -> Self {
        let (scene, handles) = SceneBuilder::new(config).build(rng);
        Self {
            scene,
            camera: Camera::perspective(&config.camera, width, height),
            handles,
            scroll: config.scroll.clone(),
            frame: config.frame.clone(),
        }
    }

    fn spin(&mut self, id: ObjectId, delta: [f32; 3], scale: f32) {
        if let Some(object) = self.scene.get_mut(id) {
            object.rotation.rotate_scaled(delta, scale);
        }
    }
}

/// Re-pose the camera for a scroll offset and nudge the earth and avatar.
///
/// `offset` is the page body's top edge relative to the viewport: zero at
/// the top, negative once scrolled down. The camera pose depends on nothing
/// but the offset; the spins accumulate on every call.
pub fn on_scroll(state: &mut AppState, offset: f32) {
    let scroll = state.scroll.clone();
    state.spin(state.handles.earth, scroll.earth_spin, 1.0);
    state.spin(state.handles.avatar, scroll.avatar_spin, 1.0);

    state.camera.position.z = offset * scroll.z_per_offset;
    state.camera.position.x = offset * scroll.x_per_offset;
    state.camera.rotation.y = offset * scroll.yaw_per_offset;
}

/// Advance the idle animation by one display refresh and redraw.
pub fn on_frame<R: SceneRenderer + ?Sized>(state: &mut AppState, elapsed: Duration, renderer: &mut R) {
    let scale = frame_scale(state.frame.mode, elapsed);
    let frame = state.frame.clone();
    state.spin(state.handles.torus, frame.torus_spin, scale);
    state.spin(state.handles.earth, frame.earth_spin, scale);

    renderer.render(&state.scene, &state.camera);
}

fn frame_scale(mode: MotionMode, elapsed: Duration) -> f32 {
    match mode {
        MotionMode::PerCallback => 1.0,
        MotionMode::TimeScaled { reference_hz } => elapsed.as_secs_f32() * reference_hz,
    }
}
