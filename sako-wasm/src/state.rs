use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use sako_core::BoardSession;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, Window};

/// Page state shared across the event callbacks behind an `Rc<RefCell<_>>`.
pub struct State {
    pub window: Window,
    pub document: Document,
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub session: BoardSession,
    /// Canvas pixels per board pixel.
    pub scale: f64,
    /// Whether an animation frame is already requested.
    pub animating: bool,
    /// Receives `(message_type, json)` for the rules engine.
    pub engine_port: Option<Function>,
    /// Receives serialized messages for the sync server.
    pub server_socket: Option<Function>,
}

thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}

/// Runs `f` against the page state, if the module has been started.
pub fn with_state<R>(f: impl FnOnce(&Rc<RefCell<State>>) -> R) -> Option<R> {
    STATE.with(|st| st.borrow().as_ref().map(f))
}
