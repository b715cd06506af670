//! JavaScript-backed collaborators: the realtime leaderboard table and the
//! credential service. The host page supplies objects with these shapes:
//!
//! ```js
//! table = {
//!   updateIfGreater(key, score) -> Promise<boolean>, // transactional
//!   subscribe(callback)          // callback({ key: score, ... }) per change
//! }
//! credentials = {
//!   signIn(identityLabel, secretOrNull) -> Promise<string>, // rejects with { code }
//! }
//! ```
//!
//! A method that throws synchronously (or is missing) surfaces as an error
//! value, never as an unwinding JS exception.

use futures::channel::mpsc;
use futures::future::{self, LocalBoxFuture};
use futures::stream::{self, LocalBoxStream, StreamExt};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::{AuthError, RemoteError};
use crate::identity::{Authenticator, Identity, Session};
use crate::remote::{RemoteTable, ScoreTable};

#[wasm_bindgen]
extern "C" {
    pub type JsLeaderboardTable;

    #[wasm_bindgen(method, catch, js_name = updateIfGreater)]
    fn update_if_greater(this: &JsLeaderboardTable, key: &str, score: f64) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn subscribe(this: &JsLeaderboardTable, callback: &js_sys::Function) -> Result<(), JsValue>;

    pub type JsCredentialService;

    #[wasm_bindgen(method, catch, js_name = signIn)]
    fn sign_in(
        this: &JsCredentialService,
        identity: &str,
        secret: Option<String>,
    ) -> Result<js_sys::Promise, JsValue>;
}

fn describe(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    js_sys::Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{err:?}"))
}

/// Decode a `{ key: number }` object into a table. Non-numeric and negative
/// values are skipped.
pub fn table_from_js(value: &JsValue) -> ScoreTable {
    if value.is_null() || value.is_undefined() {
        return ScoreTable::new();
    }
    let text = match js_sys::JSON::stringify(value) {
        Ok(t) => String::from(t),
        Err(err) => {
            log::warn!("remote snapshot not serializable: {}", describe(&err));
            return ScoreTable::new();
        }
    };
    table_from_json(&text)
}

fn table_from_json(text: &str) -> ScoreTable {
    match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(text) {
        Ok(map) => map
            .into_iter()
            .filter_map(|(k, v)| {
                let score = v
                    .as_u64()
                    .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))?;
                Some((k, score))
            })
            .collect(),
        Err(err) => {
            log::warn!("remote snapshot malformed: {err}");
            ScoreTable::new()
        }
    }
}

pub struct JsRemote {
    table: JsLeaderboardTable,
}

impl JsRemote {
    pub fn new(table: JsValue) -> Self {
        Self { table: table.unchecked_into() }
    }
}

impl RemoteTable for JsRemote {
    fn update_if_greater(&self, key: &str, score: u64) -> LocalBoxFuture<'static, Result<bool, RemoteError>> {
        let promise = match self.table.update_if_greater(key, score as f64) {
            Ok(promise) => promise,
            Err(err) => return Box::pin(future::ready(Err(RemoteError::Js(describe(&err))))),
        };
        Box::pin(async move {
            let committed = JsFuture::from(promise)
                .await
                .map_err(|err| RemoteError::Js(describe(&err)))?;
            Ok(committed.as_bool().unwrap_or(false))
        })
    }

    fn subscribe(&self) -> LocalBoxStream<'static, ScoreTable> {
        let (tx, rx) = mpsc::unbounded();
        let callback = Closure::wrap(Box::new(move |value: JsValue| {
            let _ = tx.unbounded_send(table_from_js(&value));
        }) as Box<dyn FnMut(JsValue)>);
        if let Err(err) = self.table.subscribe(callback.as_ref().unchecked_ref()) {
            log::warn!("remote subscribe failed: {}", describe(&err));
            return stream::empty().boxed_local();
        }
        // The table keeps the listener for the page lifetime.
        callback.forget();
        rx.boxed_local()
    }
}

pub struct JsAuthenticator {
    service: JsCredentialService,
}

impl JsAuthenticator {
    pub fn new(service: JsValue) -> Self {
        Self { service: service.unchecked_into() }
    }
}

impl Authenticator for JsAuthenticator {
    fn sign_in(
        &self,
        identity: Identity,
        secret: Option<String>,
    ) -> LocalBoxFuture<'static, Result<Session, AuthError>> {
        let promise = match self.service.sign_in(identity.label(), secret) {
            Ok(promise) => promise,
            Err(err) => {
                log::error!("credential service failed: {}", describe(&err));
                return Box::pin(future::ready(Err(AuthError::Unavailable)));
            }
        };
        Box::pin(async move {
            match JsFuture::from(promise).await {
                Ok(marker) => Ok(Session { identity, marker: marker.as_string().unwrap_or_default() }),
                Err(err) => {
                    let code = js_sys::Reflect::get(&err, &JsValue::from_str("code"))
                        .ok()
                        .and_then(|c| c.as_string())
                        .unwrap_or_default();
                    log::error!("sign-in rejected: {}", describe(&err));
                    Err(AuthError::from_code(&code))
                }
            }
        })
    }
}
