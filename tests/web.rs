#![cfg(target_arch = "wasm32")]

use backdrop::{host, BackdropConfig, Palette, MOUNT_ID};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn missing_mount_is_a_silent_no_op() {
    let document = host::document().expect("document");
    assert_eq!(MOUNT_ID, "vertexBg");
    assert!(document.get_element_by_id(MOUNT_ID).is_none());

    let canvases_before = document.get_elements_by_tag_name("canvas").length();
    assert!(backdrop::run_web().is_ok());
    assert_eq!(document.get_elements_by_tag_name("canvas").length(), canvases_before);
    assert!(backdrop::get_wasm_api().is_err());
}

#[wasm_bindgen_test]
fn palette_follows_body_theme_dark_class() {
    let body = host::document().and_then(|doc| doc.body()).expect("body");
    let original = body.class_name();
    let dark_class = BackdropConfig::default().dark_class;

    body.set_class_name("layout");
    assert_eq!(host::detect_palette(&dark_class), Palette::Light);

    body.set_class_name("layout theme-dark");
    assert_eq!(host::detect_palette(&dark_class), Palette::Dark);

    body.set_class_name(&original);
}

#[wasm_bindgen_test]
fn palette_falls_back_to_root_element() {
    let root = host::document()
        .and_then(|doc| doc.document_element())
        .expect("root element");
    let original = root.class_name();

    root.set_class_name("page night");
    assert_eq!(host::detect_palette("night"), Palette::Dark);
    root.set_class_name("page");
    assert_eq!(host::detect_palette("night"), Palette::Light);

    root.set_class_name(&original);
}

#[wasm_bindgen_test]
fn canvas_is_layered_inside_mount() {
    let document = host::document().expect("document");
    let mount = document.create_element("div").expect("div");
    document.body().expect("body").append_child(&mount).expect("append");

    let canvas = host::create_canvas(&mount).expect("canvas");
    assert_eq!(mount.child_element_count(), 1);

    let style = canvas.style();
    assert_eq!(style.get_property_value("position").unwrap(), "absolute");
    assert_eq!(style.get_property_value("left").unwrap(), "0px");
    assert_eq!(style.get_property_value("top").unwrap(), "0px");
    assert_eq!(style.get_property_value("z-index").unwrap(), "0");
    assert_eq!(style.get_property_value("pointer-events").unwrap(), "none");

    let mount_style = mount.dyn_ref::<HtmlElement>().expect("html element").style();
    assert_eq!(mount_style.get_property_value("pointer-events").unwrap(), "none");
    assert_eq!(mount_style.get_property_value("overflow").unwrap(), "hidden");

    host::remove_canvas(&canvas);
    assert_eq!(mount.child_element_count(), 0);
    mount.remove();
}

#[wasm_bindgen_test]
fn collapsed_mount_sizes_canvas_to_viewport() {
    let document = host::document().expect("document");
    let window = web_sys::window().expect("window");
    let mount = document.create_element("div").expect("div");
    document.body().expect("body").append_child(&mount).expect("append");
    assert_eq!(mount.client_height(), 0);

    let canvas = host::create_canvas(&mount).expect("canvas");
    let inner_height = window.inner_height().unwrap().as_f64().unwrap();
    assert_eq!(
        canvas.style().get_property_value("height").unwrap(),
        format!("{}px", inner_height)
    );
    assert_eq!(canvas.style().get_property_value("width").unwrap(), "100%");

    host::remove_canvas(&canvas);
    mount.remove();
}
