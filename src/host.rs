//! Page integration: mount lookup, canvas ownership, theme signal and
//! viewport measurement. Native builds only get the measurement fallback.

/// Width used to size the node field. The browser viewport on the web,
/// the window's logical width otherwise.
pub fn viewport_width(logical_fallback: f32) -> f32 {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some((width, _)) = web::inner_size() {
            return width as f32;
        }
    }
    logical_fallback
}

/// A mount that has not been laid out yet reports 0; the viewport extent
/// stands in for it.
pub fn fallback_extent(measured: f64, viewport: f64) -> f64 {
    if measured > 0.0 { measured } else { viewport }
}

/// CSS value for one canvas axis: fill the mount when it has an extent,
/// otherwise pin to the viewport extent in px.
pub fn canvas_extent_style(measured: f64, viewport: f64) -> String {
    if measured > 0.0 {
        "100%".to_string()
    } else {
        format!("{}px", fallback_extent(measured, viewport))
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement};

    use super::canvas_extent_style;
    use crate::config::{BackdropConfig, CONFIG_ATTRIBUTE};
    use crate::theme::{self, Palette};

    pub fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    pub(super) fn inner_size() -> Option<(f64, f64)> {
        let window = web_sys::window()?;
        let width = window.inner_width().ok()?.as_f64()?;
        let height = window.inner_height().ok()?.as_f64()?;
        Some((width, height))
    }

    pub fn find_mount(id: &str) -> Option<Element> {
        document()?.get_element_by_id(id)
    }

    /// Reads the optional JSON config from the mount element. Bad JSON is
    /// logged and replaced by the defaults.
    pub fn read_config(mount: &Element) -> BackdropConfig {
        let Some(json) = mount.get_attribute(CONFIG_ATTRIBUTE) else {
            return BackdropConfig::default();
        };
        BackdropConfig::from_json(&json).unwrap_or_else(|err| {
            log::warn!("Ignoring invalid {}: {:#}", CONFIG_ATTRIBUTE, err);
            BackdropConfig::default()
        })
    }

    /// Samples `<body>`, then the root element, once for the dark theme marker.
    pub fn detect_palette(dark_class: &str) -> Palette {
        let Some(document) = document() else {
            return Palette::Light;
        };
        let markers: Vec<(String, Option<String>)> = document
            .body()
            .map(Element::from)
            .into_iter()
            .chain(document.document_element())
            .map(|element| (element.class_name(), element.get_attribute("data-theme")))
            .collect();
        let dark = theme::page_is_dark(
            markers
                .iter()
                .map(|(class_list, data_theme)| (class_list.as_str(), data_theme.as_deref())),
            dark_class,
        );
        Palette::from_dark_flag(dark)
    }

    /// Creates the backdrop canvas, layers it under the mount's content and
    /// appends it. The mount itself stops taking pointer input and clips.
    pub fn create_canvas(mount: &Element) -> Result<HtmlCanvasElement, JsValue> {
        let document = document().ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        canvas.set_attribute("aria-hidden", "true")?;

        if let Some(mount) = mount.dyn_ref::<HtmlElement>() {
            let style = mount.style();
            style.set_property("pointer-events", "none")?;
            style.set_property("overflow", "hidden")?;
        }

        let style = canvas.style();
        style.set_property("display", "block")?;
        style.set_property("position", "absolute")?;
        style.set_property("left", "0")?;
        style.set_property("top", "0")?;
        style.set_property("z-index", "0")?;
        style.set_property("pointer-events", "none")?;

        mount.append_child(&canvas)?;
        fit_canvas(mount, &canvas)?;
        Ok(canvas)
    }

    /// Sizes the canvas to the mount, or to the viewport along any axis the
    /// mount has no extent in.
    pub fn fit_canvas(mount: &Element, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
        let (inner_width, inner_height) = inner_size().unwrap_or((0.0, 0.0));
        let style = canvas.style();
        style.set_property(
            "width",
            &canvas_extent_style(mount.client_width() as f64, inner_width),
        )?;
        style.set_property(
            "height",
            &canvas_extent_style(mount.client_height() as f64, inner_height),
        )?;
        Ok(())
    }

    /// Calls `on_resize` on every window `resize` event until the returned
    /// closure is passed to [`unwatch_viewport`].
    pub fn watch_viewport(on_resize: impl FnMut() + 'static) -> Result<Closure<dyn FnMut()>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let closure = Closure::<dyn FnMut()>::new(on_resize);
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        Ok(closure)
    }

    pub fn unwatch_viewport(closure: &Closure<dyn FnMut()>) {
        if let Some(window) = web_sys::window() {
            let _ = window
                .remove_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        }
    }

    pub fn remove_canvas(canvas: &HtmlCanvasElement) {
        canvas.remove();
    }
}
