//! Browser glue: page queries, clipboard, alerts and image loading.

use async_trait::async_trait;
use log::{debug, warn};
use starfolio_core::{Clipboard, ClipboardError, Notifier, TextureError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlElement, HtmlImageElement, Navigator, Window};

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

/// Body's top edge relative to the viewport: 0 at the top, negative below
pub fn scroll_offset(document: &Document) -> f32 {
    document
        .body()
        .map(|body| body.get_bounding_client_rect().top() as f32)
        .unwrap_or(0.0)
}

/// Full rendered text of the element with `id`
pub fn element_text(document: &Document, id: &str) -> Result<String, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?;
    let element: HtmlElement = element.dyn_into()?;
    Ok(element.inner_text())
}

/// Same text a template literal would produce for a thrown value
pub fn describe(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.to_string());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// `navigator.clipboard`, which only exists in secure contexts
pub struct BrowserClipboard {
    navigator: Navigator,
}

impl BrowserClipboard {
    pub fn new(window: &Window) -> Self {
        Self {
            navigator: window.navigator(),
        }
    }
}

#[async_trait(?Send)]
impl Clipboard for BrowserClipboard {
    async fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let present = js_sys::Reflect::get(&self.navigator, &JsValue::from_str("clipboard"))
            .map(|value| !value.is_undefined())
            .unwrap_or(false);
        if !present {
            return Err(ClipboardError::Unavailable(
                "navigator.clipboard is not available on this page".into(),
            ));
        }

        let promise = self.navigator.clipboard().write_text(text);
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| ClipboardError::Rejected(describe(&e)))
    }
}

/// Blocking `window.alert` notices
pub struct AlertNotifier {
    window: Window,
}

impl AlertNotifier {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Notifier for AlertNotifier {
    fn notify(&mut self, message: &str) {
        if let Err(e) = self.window.alert_with_message(message) {
            warn!("alert failed: {}", describe(&e));
        }
    }
}

/// Start loading `src` and call `on_done` exactly once with the outcome.
///
/// The element and its handlers are kept alive by the browser until one of
/// the two events fires.
pub fn load_image<F>(src: &str, on_done: F) -> Result<(), JsValue>
where
    F: FnOnce(Result<HtmlImageElement, TextureError>) + 'static,
{
    let image = HtmlImageElement::new()?;
    let on_done = std::rc::Rc::new(std::cell::RefCell::new(Some(on_done)));

    let onload = {
        let image = image.clone();
        let on_done = on_done.clone();
        Closure::once(move || {
            if let Some(done) = on_done.borrow_mut().take() {
                done(Ok(image));
            }
        })
    };
    let onerror = {
        let path = src.to_string();
        Closure::once(move || {
            if let Some(done) = on_done.borrow_mut().take() {
                done(Err(TextureError::Decode {
                    path,
                    reason: "image could not be fetched or decoded".into(),
                }));
            }
        })
    };

    image.set_onload(Some(onload.as_ref().unchecked_ref()));
    image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onload.forget();
    onerror.forget();

    debug!("fetching {src}");
    image.set_src(src);
    Ok(())
}
