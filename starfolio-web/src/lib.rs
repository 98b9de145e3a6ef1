//! Starfolio Web - WebGL2 front end compiled to WebAssembly
//!
//! Builds the scene into the page's background canvas, couples the camera to
//! page scroll, animates on `requestAnimationFrame`, and wires the copy
//! button to the clipboard.

#![cfg(target_arch = "wasm32")]

mod dom;
mod gl;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use starfolio_core::{
    copy_to_clipboard, on_frame, on_scroll, AppState, CopyMessages, StarfolioConfig,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

use crate::dom::{AlertNotifier, BrowserClipboard};
use crate::gl::GlRenderer;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    info!("starfolio-web starting");

    let config = StarfolioConfig::default();
    let window = dom::window()?;
    let document = dom::document()?;

    let canvas: HtmlCanvasElement = document
        .get_element_by_id(&config.web.canvas_id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{}", config.web.canvas_id)))?
        .dyn_into()?;

    let css_width = window.inner_width()?.as_f64().unwrap_or(800.0);
    let css_height = window.inner_height()?.as_f64().unwrap_or(600.0);
    let ratio = window.device_pixel_ratio();
    let (width, height) = ((css_width * ratio) as u32, (css_height * ratio) as u32);
    canvas.set_width(width);
    canvas.set_height(height);

    let context: WebGl2RenderingContext = canvas
        .get_context("webgl2")?
        .ok_or("WebGL2 not supported")?
        .dyn_into()?;

    let mut rng = StdRng::from_entropy();
    let state = AppState::new(&config, css_width as u32, css_height as u32, &mut rng);

    let mut renderer = GlRenderer::new(context)?;
    renderer.resize(width as i32, height as i32);
    renderer.prepare(&state.scene)?;

    let state = Rc::new(RefCell::new(state));
    let renderer = Rc::new(RefCell::new(renderer));

    start_texture_loads(&state, &renderer)?;
    install_scroll_handler(&window, &state)?;
    on_scroll(&mut state.borrow_mut(), dom::scroll_offset(&document));
    start_render_loop(&window, &state, &renderer)?;
    install_copy_button(&config)?;

    Ok(())
}

fn start_texture_loads(
    state: &Rc<RefCell<AppState>>,
    renderer: &Rc<RefCell<GlRenderer>>,
) -> Result<(), JsValue> {
    let requests: Vec<_> = state
        .borrow()
        .scene
        .textures
        .pending()
        .map(|(id, entry)| (id, entry.path.clone()))
        .collect();

    for (id, path) in requests {
        let state = state.clone();
        let renderer = renderer.clone();
        dom::load_image(&path, move |result| {
            let outcome = result.and_then(|image| {
                renderer
                    .borrow_mut()
                    .upload_texture(id, &image)
                    .map_err(|e| starfolio_core::TextureError::Decode {
                        path: path.clone(),
                        reason: dom::describe(&e),
                    })
            });
            state.borrow_mut().scene.resolve_texture(id, outcome);
        })?;
    }
    Ok(())
}

fn install_scroll_handler(
    window: &web_sys::Window,
    state: &Rc<RefCell<AppState>>,
) -> Result<(), JsValue> {
    let state = state.clone();
    let on_scroll_event = Closure::wrap(Box::new(move || match dom::document() {
        Ok(document) => on_scroll(&mut state.borrow_mut(), dom::scroll_offset(&document)),
        Err(e) => error!("scroll handler: {}", dom::describe(&e)),
    }) as Box<dyn FnMut()>);
    window.add_event_listener_with_callback("scroll", on_scroll_event.as_ref().unchecked_ref())?;
    on_scroll_event.forget();
    Ok(())
}

fn start_render_loop(
    window: &web_sys::Window,
    state: &Rc<RefCell<AppState>>,
    renderer: &Rc<RefCell<GlRenderer>>,
) -> Result<(), JsValue> {
    // `f` holds the frame closure so it can re-request itself
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    let state = state.clone();
    let renderer = renderer.clone();
    let loop_window = window.clone();
    let mut last: Option<f64> = None;

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
        let elapsed = last.map_or(0.0, |prev| (now - prev).max(0.0));
        last = Some(now);

        on_frame(
            &mut state.borrow_mut(),
            Duration::from_secs_f64(elapsed / 1000.0),
            &mut *renderer.borrow_mut(),
        );

        if let Some(frame) = f.borrow().as_ref() {
            if let Err(e) = loop_window.request_animation_frame(frame.as_ref().unchecked_ref()) {
                error!("requestAnimationFrame failed: {}", dom::describe(&e));
            }
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(frame) = g.borrow().as_ref() {
        window.request_animation_frame(frame.as_ref().unchecked_ref())?;
    }
    Ok(())
}

fn install_copy_button(config: &StarfolioConfig) -> Result<(), JsValue> {
    let document = dom::document()?;
    let button = document
        .get_element_by_id(&config.web.copy_trigger_id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{}", config.web.copy_trigger_id)))?;

    let source_id = config.web.copy_source_id.clone();
    let messages = CopyMessages::from(&config.clipboard);
    let on_click = Closure::wrap(Box::new(move || {
        let source_id = source_id.clone();
        let messages = messages.clone();
        spawn_local(async move {
            if let Err(e) = copy_from_page(&source_id, &messages).await {
                error!("copy button: {}", dom::describe(&e));
            }
        });
    }) as Box<dyn FnMut()>);
    button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

async fn copy_from_page(source_id: &str, messages: &CopyMessages) -> Result<(), JsValue> {
    let window = dom::window()?;
    let text = dom::element_text(&dom::document()?, source_id)?;
    let mut clipboard = BrowserClipboard::new(&window);
    let mut notifier = AlertNotifier::new(window);
    if let Err(e) = copy_to_clipboard(&text, &mut clipboard, &mut notifier, messages).await {
        debug!("copy failed, reported by alert: {e}");
    }
    Ok(())
}
