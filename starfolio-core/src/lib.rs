//! Starfolio Core Library - scene model and animation shared by all front ends
//!
//! This library builds the decorative scene (torus, starfield, avatar cube,
//! earth), drives it from scroll and refresh callbacks, and implements the
//! clipboard copy flow. Rendering and host scheduling live in the front-end
//! crates.

pub mod clipboard;
pub mod config;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod projection;
pub mod scene;
pub mod texture;
pub mod transform;

// Re-export commonly used types
pub use clipboard::{copy_to_clipboard, Clipboard, CopyMessages, Notifier};
pub use config::{MotionMode, StarfolioConfig};
pub use driver::{on_frame, on_scroll, AppState, SceneRenderer};
pub use error::{ClipboardError, ConfigError, TextureError};
pub use geometry::{Mesh, Triangle, Vertex};
pub use projection::{Camera, ScreenPoint};
pub use scene::{Light, Material, ObjectId, Renderable, Rgb, Scene, SceneHandles, Shape};
pub use texture::{ImageData, TextureId, TextureState};
pub use transform::{RotationState, Transform};
