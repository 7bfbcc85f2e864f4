use std::cell::RefCell;
use std::rc::Rc;

use sako_core::protocol::ClientMessage;
use sako_core::smart_tool::ToolEvent;
use sako_core::tile::{Point, tile_of_coordinate};
use sako_core::{Action, BoardSession, Color, Config, PieceType, Tile};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent,
};

mod canvas;
mod constants;
mod ports;
mod state;
mod utils;

pub use ports::{
    receive_engine_message, receive_server_message, request_ai_move, set_engine_port,
    set_server_socket,
};

use canvas::{BoardLayer, draw_board, draw_piece};
use state::{STATE, State};
use utils::{event_board_point, sync_canvas_size};

type RafClosure = Closure<dyn FnMut(f64)>;

thread_local! {
    static FRAME: RefCell<Option<RafClosure>> = const { RefCell::new(None) };
}

fn draw(state: &mut State) {
    sync_canvas_size(state);
    let width = state.canvas.width() as f64;
    let height = state.canvas.height() as f64;
    let ctx = &state.ctx;
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.clear_rect(0.0, 0.0, width, height);
    let _ = ctx.scale(state.scale, state.scale);

    let session = &state.session;
    let legal_targets: Vec<Tile> = session
        .legal_actions()
        .map(|legal| {
            legal
                .legal_actions
                .iter()
                .filter_map(|a| match a {
                    Action::Place(tile) => Some(*tile),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let tool = session.tool();
    draw_board(
        ctx,
        &BoardLayer {
            rotation: session.config().rotation,
            highlight: tool.highlight,
            hover: tool.hover,
            legal_targets: &legal_targets,
        },
    );
    for piece in session.scene() {
        draw_piece(ctx, &piece);
    }
}

/// Sends what an update produced and redraws, starting the frame loop if
/// the board has something to animate.
pub(crate) fn after_update(state: &Rc<RefCell<State>>, outbound: Option<ClientMessage>) {
    if let Some(message) = outbound {
        // Collected first: the host callbacks may call back into the board.
        let (socket, port, request) = {
            let s = state.borrow();
            (
                s.server_socket.clone(),
                s.engine_port.clone(),
                s.session.legal_actions_request(),
            )
        };
        ports::send_to_server(socket.as_ref(), &message);
        if let Some(request) = request {
            ports::send_to_engine(port.as_ref(), &request);
        }
    }
    let mut s = state.borrow_mut();
    draw(&mut s);
    if s.session.is_running() && !s.animating {
        s.animating = true;
        request_frame();
    }
}

fn handle_tool_event(state: &Rc<RefCell<State>>, event: ToolEvent) {
    let outbound = state.borrow_mut().session.handle_tool_event(event);
    after_update(state, outbound);
}

fn pointer_event(state: &State, e: &MouseEvent) -> (Option<Tile>, Point) {
    let pixel = event_board_point(e, &state.canvas, state.scale);
    (tile_of_coordinate(pixel, state.session.config().rotation), pixel)
}

fn attach_ui(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();

    // Palette buttons: #add-white-q, #add-black-n, ...
    for color in [Color::White, Color::Black] {
        for piece_type in PieceType::ALL {
            let side = match color {
                Color::White => "white",
                Color::Black => "black",
            };
            let id = format!("add-{side}-{}", piece_type.letter());
            let Some(btn) = doc.get_element_by_id(&id) else {
                continue;
            };
            let btn: HtmlElement = btn.dyn_into()?;
            let st = state.clone();
            let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
                handle_tool_event(&st, ToolEvent::AddPiece { piece_type, color });
            }));
            btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
            onclick.forget();
        }
    }

    // Promotion buttons: #promote-q, #promote-r, ...
    for piece_type in PieceType::ALL.into_iter().filter(|t| t.can_promote_to()) {
        let Some(btn) = doc.get_element_by_id(&format!("promote-{}", piece_type.letter())) else {
            continue;
        };
        let btn: HtmlElement = btn.dyn_into()?;
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let outbound = st.borrow_mut().session.promote(piece_type);
            after_update(&st, outbound);
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    if let Some(btn) = doc.get_element_by_id("aiMove") {
        let btn: HtmlElement = btn.dyn_into()?;
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let _ = request_ai_move();
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    // Mouse events
    {
        let st = state.clone();
        let mousedown = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let (tile, pixel) = pointer_event(&st.borrow(), &e);
            handle_tool_event(&st, ToolEvent::MouseDown { tile, pixel });
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }
    {
        let st = state.clone();
        let mousemove = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let (tile, pixel) = pointer_event(&st.borrow(), &e);
            handle_tool_event(&st, ToolEvent::MouseMove { tile, pixel });
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())?;
        mousemove.forget();
    }
    {
        // On the window so a drag released off the board still ends.
        let st = state.clone();
        let mouseup = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let (tile, pixel) = pointer_event(&st.borrow(), &e);
            handle_tool_event(&st, ToolEvent::MouseUp { tile, pixel });
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }

    // Keyboard
    {
        let st = state.clone();
        let keydown = Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(move |e: KeyboardEvent| {
            let event = match e.key().as_str() {
                "Delete" | "Backspace" => ToolEvent::KeyDelete,
                "Escape" => ToolEvent::Reset,
                _ => return,
            };
            e.prevent_default();
            handle_tool_event(&st, event);
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }
    {
        let st = state.clone();
        let onresize = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            draw(&mut st.borrow_mut());
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }
    Ok(())
}

fn init_canvas(
    document: &Document,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue> {
    let cv = document
        .get_element_by_id("cv")
        .ok_or_else(|| JsValue::from_str("canvas #cv not found"))?
        .dyn_into::<HtmlCanvasElement>()?;
    let ctx = cv
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2D context not available"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    Ok((cv, ctx))
}

/// Installs the frame callback. Frames are only requested while the
/// session has animation pending.
fn install_frame_callback(state: Rc<RefCell<State>>) {
    let closure = Closure::wrap(Box::new(move |ts: f64| {
        let again = {
            let mut s = state.borrow_mut();
            s.session.tick(ts);
            draw(&mut s);
            s.animating = s.session.is_running();
            s.animating
        };
        if again {
            request_frame();
        }
    }) as Box<dyn FnMut(f64)>);
    FRAME.with(|f| f.replace(Some(closure)));
}

fn request_frame() {
    FRAME.with(|f| {
        if let Some(cb) = f.borrow().as_ref()
            && let Some(window) = web_sys::window()
            && let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref())
        {
            log::warn!("requestAnimationFrame failed: {e:?}");
        }
    });
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);

    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    if document.get_element_by_id("cv").is_none() {
        log::warn!("no #cv canvas on this page, board not started");
        return Ok(());
    }
    let (canvas, ctx) = init_canvas(&document)?;

    let search = window.location().search().unwrap_or_default();
    let config = Config::from_query_or_default(&search);
    log::info!("starting board with {config:?}");

    let state = Rc::new(RefCell::new(State {
        window,
        document,
        canvas,
        ctx,
        session: BoardSession::new(config),
        scale: 1.0,
        animating: false,
        engine_port: None,
        server_socket: None,
    }));

    STATE.with(|st| st.replace(Some(state.clone())));
    attach_ui(state.clone())?;
    install_frame_callback(state.clone());
    draw(&mut state.borrow_mut());
    Ok(())
}
