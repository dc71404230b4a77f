//! Bridging host requests to futures.
//!
//! Host requests report completion through `success` and `error` events.
//! [`RequestHandlers`] funnels both into one `Result` callback and keeps the
//! event closures alive until it is dropped. Replies travel to the awaiting
//! future over a `futures-channel` oneshot.

use std::cell::RefCell;
use std::rc::Rc;

use futures_channel::oneshot;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, Event, IdbRequest};

use crate::error::{Result, StoreError};

/// Shared sending half of a reply channel. The first reply wins.
pub(crate) type Reply<T> = Rc<RefCell<Option<oneshot::Sender<Result<T>>>>>;

pub(crate) fn reply_channel<T>() -> (Reply<T>, oneshot::Receiver<Result<T>>) {
    let (sender, receiver) = oneshot::channel();
    (Rc::new(RefCell::new(Some(sender))), receiver)
}

pub(crate) fn send<T>(reply: &Reply<T>, result: Result<T>) {
    let sender = reply.borrow_mut().take();
    if let Some(sender) = sender {
        let _ = sender.send(result);
    }
}

pub(crate) async fn receive<T>(receiver: oneshot::Receiver<Result<T>>) -> Result<T> {
    receiver
        .await
        .map_err(|_| StoreError::InvalidState("request was abandoned".into()))?
}

/// Success and error handlers installed on one request.
pub(crate) struct RequestHandlers {
    request: IdbRequest,
    _on_success: Closure<dyn FnMut(Event)>,
    _on_error: Closure<dyn FnMut(Event)>,
}

impl RequestHandlers {
    /// Install handlers that call `on_done` once with the request's outcome.
    pub(crate) fn new<F>(request: &IdbRequest, on_done: F) -> Self
    where
        F: FnOnce(Result<JsValue>) + 'static,
    {
        let slot = Rc::new(RefCell::new(Some(on_done)));

        let on_success = {
            let slot = Rc::clone(&slot);
            let request = request.clone();
            Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                let done = slot.borrow_mut().take();
                if let Some(done) = done {
                    done(request.result().map_err(host_error));
                }
            })
        };

        let on_error = {
            let request = request.clone();
            Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                let done = slot.borrow_mut().take();
                if let Some(done) = done {
                    let error = match request.error() {
                        Ok(Some(ex)) => dom_error(&ex),
                        Ok(None) => StoreError::Host {
                            name: "UnknownError".into(),
                            message: "request failed without an error".into(),
                        },
                        Err(e) => host_error(e),
                    };
                    done(Err(error));
                }
            })
        };

        request.set_onsuccess(Some(on_success.as_ref().unchecked_ref()));
        request.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Self {
            request: request.clone(),
            _on_success: on_success,
            _on_error: on_error,
        }
    }
}

impl Drop for RequestHandlers {
    fn drop(&mut self) {
        self.request.set_onsuccess(None);
        self.request.set_onerror(None);
    }
}

/// Wait for a request to succeed or fail.
pub(crate) async fn await_request(request: &IdbRequest) -> Result<JsValue> {
    let (reply, receiver) = reply_channel();
    let _handlers = {
        let reply = Rc::clone(&reply);
        RequestHandlers::new(request, move |result| send(&reply, result))
    };
    receive(receiver).await
}

/// Convert a thrown host value into a [`StoreError`], keeping its name and message.
pub(crate) fn host_error(value: JsValue) -> StoreError {
    if let Some(ex) = value.dyn_ref::<DomException>() {
        return dom_error(ex);
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return StoreError::Host {
            name: String::from(err.name()),
            message: String::from(err.message()),
        };
    }
    StoreError::Host {
        name: "Error".into(),
        message: format!("{value:?}"),
    }
}

pub(crate) fn dom_error(ex: &DomException) -> StoreError {
    match ex.name().as_str() {
        "InvalidStateError" => StoreError::InvalidState(ex.message()),
        name => StoreError::Host {
            name: name.to_string(),
            message: ex.message(),
        },
    }
}
