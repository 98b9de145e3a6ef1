//! Texture slots and their load lifecycle.
//!
//! The scene only records which image each surface wants and whether it has
//! arrived. Pixels live with the front end that decoded them (a GPU texture
//! on the web, an [`ImageData`] in the terminal).

use std::path::Path;

use log::{debug, info, warn};

use crate::error::TextureError;
use crate::scene::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq)]
pub enum TextureState {
    Pending,
    Loaded { width: u32, height: u32 },
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TextureEntry {
    pub path: String,
    pub state: TextureState,
}

/// Every image the scene has asked for, in request order
#[derive(Debug, Clone, Default)]
pub struct TextureTable {
    entries: Vec<TextureEntry>,
}

impl TextureTable {
    pub fn request(&mut self, path: impl Into<String>) -> TextureId {
        let path = path.into();
        debug!("texture requested: {path}");
        self.entries.push(TextureEntry {
            path,
            state: TextureState::Pending,
        });
        TextureId(self.entries.len() - 1)
    }

    pub fn get(&self, id: TextureId) -> Option<&TextureEntry> {
        self.entries.get(id.0)
    }

    pub fn is_loaded(&self, id: TextureId) -> bool {
        matches!(
            self.get(id).map(|e| &e.state),
            Some(TextureState::Loaded { .. })
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &TextureEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (TextureId(i), e))
    }

    pub fn pending(&self) -> impl Iterator<Item = (TextureId, &TextureEntry)> {
        self.iter()
            .filter(|(_, e)| e.state == TextureState::Pending)
    }

    /// Record the outcome of a load.
    ///
    /// Only the first outcome for a slot counts; loads are never retried, so
    /// a late duplicate is ignored. Failures leave the surface untextured.
    pub fn resolve(
        &mut self,
        id: TextureId,
        outcome: Result<(u32, u32), TextureError>,
    ) -> Option<&TextureState> {
        let entry = self.entries.get_mut(id.0)?;
        if entry.state != TextureState::Pending {
            debug!("ignoring repeated load result for {}", entry.path);
            return Some(&entry.state);
        }
        entry.state = match outcome {
            Ok((width, height)) => {
                info!("texture {} loaded ({width}x{height})", entry.path);
                TextureState::Loaded { width, height }
            }
            Err(e) => {
                warn!("texture {} unavailable, rendering untextured: {e}", entry.path);
                TextureState::Failed(e.to_string())
            }
        };
        Some(&entry.state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decoded RGBA8 pixels
#[derive(Debug, Clone)]
pub struct ImageData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImageData {
    pub fn from_file(path: &Path) -> Result<Self, TextureError> {
        debug!("Loading image from: {:?}", path);
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&path.display().to_string(), &bytes)
    }

    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes).map_err(|e| TextureError::Decode {
            path: name.to_string(),
            reason: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let data = color
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            data,
            width,
            height,
        }
    }

    /// Nearest-neighbour lookup with repeat wrapping; `v = 0` is the bottom row
    pub fn sample(&self, u: f32, v: f32) -> Rgb {
        if self.width == 0 || self.height == 0 {
            return Rgb::WHITE;
        }
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = (((1.0 - v) * self.height as f32) as u32).min(self.height - 1);
        let i = ((y * self.width + x) * 4) as usize;
        Rgb::new(
            self.data[i] as f32 / 255.0,
            self.data[i + 1] as f32 / 255.0,
            self.data[i + 2] as f32 / 255.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_start_pending() {
        let mut table = TextureTable::default();
        let a = table.request("space.jpg");
        let b = table.request("earth.png");
        assert_ne!(a, b);
        assert_eq!(table.pending().count(), 2);
        assert!(!table.is_loaded(a));
    }

    #[test]
    fn resolve_success_then_ignore_late_failure() {
        let mut table = TextureTable::default();
        let id = table.request("earth.png");
        table.resolve(id, Ok((64, 32)));
        assert!(table.is_loaded(id));

        let state = table
            .resolve(
                id,
                Err(TextureError::Decode {
                    path: "earth.png".into(),
                    reason: "late".into(),
                }),
            )
            .cloned();
        assert_eq!(state, Some(TextureState::Loaded { width: 64, height: 32 }));
        assert_eq!(table.pending().count(), 0);
    }

    #[test]
    fn failed_load_is_recorded_with_reason() {
        let mut table = TextureTable::default();
        let id = table.request("missing.png");
        table.resolve(
            id,
            Err(TextureError::Decode {
                path: "missing.png".into(),
                reason: "404".into(),
            }),
        );
        match &table.get(id).unwrap().state {
            TextureState::Failed(reason) => assert!(reason.contains("404")),
            other => panic!("unexpected state {other:?}"),
        }
        assert!(!table.is_loaded(id));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = ImageData::from_bytes("junk.png", b"not an image").unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ImageData::from_file(Path::new("/nonexistent/space.jpg")).unwrap_err();
        assert!(matches!(err, TextureError::Io { .. }));
    }

    #[test]
    fn sample_wraps_and_flips_rows() {
        // 1x2 image: top row red, bottom row blue
        let img = ImageData {
            data: vec![255, 0, 0, 255, 0, 0, 255, 255],
            width: 1,
            height: 2,
        };
        assert_eq!(img.sample(0.5, 0.9), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(img.sample(0.5, 0.1), Rgb::new(0.0, 0.0, 1.0));
        assert_eq!(img.sample(1.5, 1.1), Rgb::new(0.0, 0.0, 1.0));
    }
}
