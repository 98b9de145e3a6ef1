/// Background texture decoding for the terminal front end
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use log::debug;
use starfolio_core::{ImageData, Scene, TextureError, TextureId};

pub type LoadResult = (TextureId, Result<ImageData, TextureError>);

/// Decode every pending texture on a helper thread.
///
/// Results arrive on the returned channel in request order; the render loop
/// drains it with [`apply_loaded`] between frames.
pub fn spawn_loader(scene: &Scene, assets_dir: &Path) -> Receiver<LoadResult> {
    let jobs: Vec<(TextureId, PathBuf)> = scene
        .textures
        .pending()
        .map(|(id, entry)| (id, assets_dir.join(entry.path.trim_start_matches("./").trim_start_matches('/'))))
        .collect();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for (id, path) in jobs {
            debug!("decoding {}", path.display());
            let result = ImageData::from_file(&path);
            if tx.send((id, result)).is_err() {
                // Render loop has exited
                return;
            }
        }
    });
    rx
}

/// Record a finished load on the scene, returning the pixels to keep if it succeeded
pub fn apply_loaded(scene: &mut Scene, (id, result): LoadResult) -> Option<(TextureId, ImageData)> {
    match result {
        Ok(image) => {
            scene.resolve_texture(id, Ok((image.width, image.height)));
            Some((id, image))
        }
        Err(e) => {
            scene.resolve_texture(id, Err(e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starfolio_core::TextureState;

    #[test]
    fn missing_assets_resolve_as_failed() {
        let mut scene = Scene::new();
        let id = scene.textures.request("/space.jpg");
        let rx = spawn_loader(&scene, Path::new("/nonexistent-assets"));

        let loaded = rx.recv().unwrap();
        assert_eq!(loaded.0, id);
        assert!(apply_loaded(&mut scene, loaded).is_none());
        assert!(matches!(
            scene.textures.get(id).unwrap().state,
            TextureState::Failed(_)
        ));
        assert!(rx.recv().is_err(), "loader stops after the last job");
    }

    #[test]
    fn decoded_image_marks_slot_loaded() {
        let mut scene = Scene::new();
        let id = scene.textures.request("earth.png");
        let image = ImageData::solid_color(4, 2, [0, 0, 255, 255]);
        let kept = apply_loaded(&mut scene, (id, Ok(image)));
        assert_eq!(kept.map(|(kept_id, img)| (kept_id, img.width)), Some((id, 4)));
        assert_eq!(
            scene.textures.get(id).unwrap().state,
            TextureState::Loaded { width: 4, height: 2 }
        );
    }
}
