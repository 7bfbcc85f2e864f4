use sako_core::tile::{BOARD_SIZE, Point};
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, MouseEvent};

use crate::state::State;

/// Keep the canvas backing store at CSS size times the device pixel ratio
/// and derive the board scale from it.
pub fn sync_canvas_size(state: &mut State) {
    let dpr = state.window.device_pixel_ratio();
    let (css_w, css_h) = match state.canvas.dyn_ref::<web_sys::Element>() {
        Some(el) => {
            let rect = el.get_bounding_client_rect();
            (rect.width().max(1.0), rect.height().max(1.0))
        }
        None => (
            state.canvas.client_width() as f64,
            state.canvas.client_height() as f64,
        ),
    };
    let target_w = (css_w * dpr).round().clamp(1.0, 10000.0) as u32;
    let target_h = (css_h * dpr).round().clamp(1.0, 10000.0) as u32;
    if state.canvas.width() != target_w {
        state.canvas.set_width(target_w);
    }
    if state.canvas.height() != target_h {
        state.canvas.set_height(target_h);
    }
    state.scale = (target_w.min(target_h) as f64 / BOARD_SIZE).max(0.01);
}

/// Pointer position in board pixels, accounting for CSS scaling of the
/// canvas element.
pub fn event_board_point(e: &MouseEvent, cv: &HtmlCanvasElement, scale: f64) -> Point {
    let (x, y) = match cv.dyn_ref::<web_sys::Element>() {
        Some(el) => {
            let rect = el.get_bounding_client_rect();
            (
                (e.client_x() as f64 - rect.left()) * (cv.width() as f64) / rect.width().max(1.0),
                (e.client_y() as f64 - rect.top()) * (cv.height() as f64) / rect.height().max(1.0),
            )
        }
        None => (e.offset_x() as f64, e.offset_y() as f64),
    };
    Point::new(x / scale, y / scale)
}
