use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, ErrorEvent, Event, MessageEvent, WebSocket};

use esukepu_core::RealtimeEvent;

#[allow(dead_code)]
pub(crate) struct WsHandlers {
    onopen: Closure<dyn FnMut(Event)>,
    onmessage: Closure<dyn FnMut(MessageEvent)>,
    onerror: Closure<dyn FnMut(ErrorEvent)>,
    onclose: Closure<dyn FnMut(Event)>,
}

/// Thin adapter around the browser WebSocket for the venue events channel.
/// Frames are JSON text; anything that does not parse is dropped silently.
#[derive(Clone)]
pub(crate) struct RealtimeSocketAdapter {
    ws: Rc<RefCell<Option<WebSocket>>>,
    handlers: Rc<RefCell<Option<WsHandlers>>>,
    closing: Rc<Cell<bool>>,
}

impl RealtimeSocketAdapter {
    pub(crate) fn new() -> Self {
        Self {
            ws: Rc::new(RefCell::new(None)),
            handlers: Rc::new(RefCell::new(None)),
            closing: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn connect(
        &mut self,
        url: &str,
        on_event: Rc<dyn Fn(RealtimeEvent)>,
        on_fail: Rc<dyn Fn()>,
    ) {
        self.disconnect();
        let closing = Rc::new(Cell::new(false));
        self.closing = closing.clone();

        let url = url.trim();
        if url.is_empty() {
            return;
        }

        let ws = match WebSocket::new(url) {
            Ok(ws) => ws,
            Err(_) => {
                gloo::console::warn!("failed to open venue events socket", url);
                // deferred: the caller may hold a borrow when this runs
                Timeout::new(0, move || on_fail()).forget();
                return;
            }
        };
        *self.ws.borrow_mut() = Some(ws.clone());

        let opened = Rc::new(Cell::new(false));
        let onopen = {
            let opened = opened.clone();
            let url = url.to_string();
            Closure::wrap(Box::new(move |_event: Event| {
                opened.set(true);
                gloo::console::log!("venue events socket connected", url.clone());
            }) as Box<dyn FnMut(Event)>)
        };
        let onmessage = {
            let on_event = on_event.clone();
            Closure::wrap(Box::new(move |event: MessageEvent| {
                let Some(text) = event.data().as_string() else {
                    return;
                };
                if let Some(frame) = RealtimeEvent::parse(&text) {
                    on_event(frame);
                }
            }) as Box<dyn FnMut(MessageEvent)>)
        };
        let onerror = {
            let url = url.to_string();
            Closure::wrap(Box::new(move |_event: ErrorEvent| {
                gloo::console::warn!("venue events socket error", url.clone());
            }) as Box<dyn FnMut(ErrorEvent)>)
        };
        let onclose = {
            let ws_ref = self.ws.clone();
            let handlers_ref = self.handlers.clone();
            let opened = opened.clone();
            let url = url.to_string();
            let on_fail = on_fail.clone();
            let closing = closing.clone();
            Closure::wrap(Box::new(move |event: Event| {
                ws_ref.borrow_mut().take();
                handlers_ref.borrow_mut().take();
                if closing.get() {
                    return;
                }
                if !opened.get() {
                    gloo::console::warn!("venue events socket failed to connect", url.clone());
                    on_fail();
                    return;
                }
                if let Some(close) = event.dyn_ref::<CloseEvent>() {
                    let reason = close.reason();
                    if reason.is_empty() {
                        gloo::console::log!("venue events socket closed", url.clone(), close.code());
                    } else {
                        gloo::console::log!(
                            "venue events socket closed",
                            url.clone(),
                            close.code(),
                            reason
                        );
                    }
                } else {
                    gloo::console::log!("venue events socket closed", url.clone());
                }
                on_fail();
            }) as Box<dyn FnMut(Event)>)
        };

        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        *self.handlers.borrow_mut() = Some(WsHandlers {
            onopen,
            onmessage,
            onerror,
            onclose,
        });
    }

    pub(crate) fn disconnect(&mut self) {
        self.closing.set(true);
        self.handlers.borrow_mut().take();
        if let Some(ws) = self.ws.borrow_mut().take() {
            let _ = ws.close();
        }
    }
}

impl Default for RealtimeSocketAdapter {
    fn default() -> Self {
        Self::new()
    }
}
