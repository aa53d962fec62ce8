use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, WebSocket};

use crate::api::ws_url;
use crate::models::{Artifact, WsChatRequest, WsEvent};

/// Callbacks for one streamed turn.
pub struct TurnCallbacks<S, C, A, E, F> {
    pub on_start: S,
    pub on_chunk: C,
    pub on_artifact: A,
    pub on_end: E,
    pub on_error: F,
}

/// Opens a WebSocket connection, sends the turn request, and invokes callbacks
/// for each streaming event. The socket is closed once the turn ends.
pub fn start_turn<S, C, A, E, F>(request: WsChatRequest, callbacks: TurnCallbacks<S, C, A, E, F>)
where
    S: Fn() + 'static,
    C: Fn(String) + 'static,
    A: Fn(usize, Artifact) + 'static,
    E: Fn(String) + 'static,
    F: Fn(String) + 'static,
{
    let TurnCallbacks {
        on_start,
        on_chunk,
        on_artifact,
        on_end,
        on_error,
    } = callbacks;

    let ws = match WebSocket::new(&ws_url()) {
        Ok(ws) => ws,
        Err(e) => {
            on_error(format!("Failed to connect: {e:?}"));
            return;
        }
    };
    ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

    let on_error = Rc::new(on_error);
    let finished = Rc::new(Cell::new(false));

    // --- onopen: send the turn request ---
    let ws_clone = ws.clone();
    let onopen = Closure::<dyn Fn()>::new(move || {
        if let Ok(json) = serde_json::to_string(&request) {
            let _ = ws_clone.send_with_str(&json);
        }
    });
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
    onopen.forget();

    // --- onmessage: dispatch WsEvent ---
    let ws_clone = ws.clone();
    let (report_error, done) = (on_error.clone(), finished.clone());
    let onmessage = Closure::<dyn Fn(MessageEvent)>::new(move |ev: MessageEvent| {
        let Some(text) = ev.data().as_string() else {
            return;
        };
        match serde_json::from_str::<WsEvent>(&text) {
            Ok(WsEvent::StreamStart { chat_id }) => {
                log::debug!("Turn started for chat {chat_id}");
                on_start();
            }
            Ok(WsEvent::StreamChunk { content }) => on_chunk(content),
            Ok(WsEvent::Artifact { index, artifact }) => on_artifact(index, artifact),
            Ok(WsEvent::StreamEnd { full_content, .. }) => {
                done.set(true);
                on_end(full_content);
                let _ = ws_clone.close();
            }
            Ok(WsEvent::Error { message }) => {
                done.set(true);
                report_error(message);
                let _ = ws_clone.close();
            }
            Err(e) => log::warn!("Ignoring unparseable event: {e}"),
        }
    });
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    // --- onerror ---
    let onerror = Closure::<dyn Fn()>::new(move || {
        log::error!("WebSocket connection error");
    });
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    // --- onclose: a socket that drops mid-turn still ends the turn ---
    let onclose = Closure::<dyn Fn()>::new(move || {
        if !finished.replace(true) {
            on_error("Connection closed before the reply finished".to_string());
        }
    });
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
    onclose.forget();
}
