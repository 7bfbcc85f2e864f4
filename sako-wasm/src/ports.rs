//! Message ports to the rules engine and the sync server.
//!
//! The host page owns the worker and the websocket. It registers one
//! callback for each with [`set_engine_port`] and [`set_server_socket`] and
//! forwards their replies to [`receive_engine_message`] and
//! [`receive_server_message`].

use js_sys::Function;
use sako_core::ProtocolError;
use sako_core::protocol::{ClientMessage, EngineMessage, EngineRequest, ServerMessage};
use wasm_bindgen::prelude::*;

use crate::state::with_state;

fn to_js(e: ProtocolError) -> JsValue {
    log::warn!("{e}");
    JsValue::from_str(&e.to_string())
}

fn not_started() -> JsValue {
    JsValue::from_str("board not started")
}

/// Hands a request to the engine callback. Callers must not hold a borrow
/// of the page state, the host may answer synchronously.
pub fn send_to_engine(port: Option<&Function>, request: &EngineRequest) {
    let Some(port) = port else {
        return;
    };
    match request.encode() {
        Ok((message_type, data)) => {
            let message_type_js = JsValue::from_str(message_type);
            let data_js = JsValue::from_str(&data);
            if let Err(e) = port.call2(&JsValue::NULL, &message_type_js, &data_js) {
                log::warn!("engine port rejected {message_type}: {e:?}");
            }
        }
        Err(e) => log::warn!("cannot encode engine request: {e}"),
    }
}

pub fn send_to_server(socket: Option<&Function>, message: &ClientMessage) {
    let Some(socket) = socket else {
        return;
    };
    match message.encode() {
        Ok(text) => {
            if let Err(e) = socket.call1(&JsValue::NULL, &JsValue::from_str(&text)) {
                log::warn!("server socket rejected a message: {e:?}");
            }
        }
        Err(e) => log::warn!("cannot encode server message: {e}"),
    }
}

#[wasm_bindgen]
pub fn set_engine_port(port: Function) -> Result<(), JsValue> {
    with_state(|st| {
        let request = {
            let mut s = st.borrow_mut();
            s.engine_port = Some(port.clone());
            s.session.legal_actions_request()
        };
        if let Some(request) = request {
            send_to_engine(Some(&port), &request);
        }
    })
    .ok_or_else(not_started)
}

#[wasm_bindgen]
pub fn set_server_socket(socket: Function) -> Result<(), JsValue> {
    with_state(|st| {
        let subscribe = {
            let mut s = st.borrow_mut();
            s.server_socket = Some(socket.clone());
            s.session.subscribe_message()
        };
        if let Some(subscribe) = subscribe {
            send_to_server(Some(&socket), &subscribe);
        }
    })
    .ok_or_else(not_started)
}

#[wasm_bindgen]
pub fn receive_engine_message(message_type: &str, data: &str) -> Result<(), JsValue> {
    let message = EngineMessage::decode(message_type, data).map_err(to_js)?;
    with_state(|st| {
        let outbound = st.borrow_mut().session.handle_engine_message(message);
        crate::after_update(st, outbound);
    })
    .ok_or_else(not_started)
}

#[wasm_bindgen]
pub fn receive_server_message(text: &str) -> Result<(), JsValue> {
    let message = ServerMessage::decode(text).map_err(to_js)?;
    with_state(|st| {
        let applied = st.borrow_mut().session.handle_server_message(message);
        crate::after_update(st, None);
        applied.map_err(to_js)
    })
    .ok_or_else(not_started)?
}

/// Asks the engine to play for the side to move.
#[wasm_bindgen]
pub fn request_ai_move() -> Result<(), JsValue> {
    with_state(|st| {
        let (port, request) = {
            let s = st.borrow();
            (s.engine_port.clone(), s.session.ai_move_request())
        };
        match request {
            Some(request) => send_to_engine(port.as_ref(), &request),
            None => log::info!("board was edited, the engine cannot move from here"),
        }
    })
    .ok_or_else(not_started)
}
