// Browser tests for the localStorage / sessionStorage backend and the
// host-object bridges.
// Run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use futures::StreamExt;
use js_sys::{Function, Object, Reflect};
use valentine_meter::bridge::{JsAuthenticator, JsRemote};
use valentine_meter::error::{AuthError, RemoteError};
use valentine_meter::identity::{Authenticator, Identity};
use valentine_meter::remote::RemoteTable;
use valentine_meter::storage::{read_count, BrowserStorage, KeyValueStore, KEY_LOVE_COUNT};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_round_trips_counts() {
    let store = BrowserStorage::local().expect("localStorage available");
    store.remove(KEY_LOVE_COUNT).unwrap();
    assert_eq!(read_count(&store, KEY_LOVE_COUNT), 0);
    store.set(KEY_LOVE_COUNT, "42").unwrap();
    assert_eq!(read_count(&store, KEY_LOVE_COUNT), 42);
    store.remove(KEY_LOVE_COUNT).unwrap();
}

#[wasm_bindgen_test]
fn session_storage_is_separate_from_local() {
    let local = BrowserStorage::local().unwrap();
    let session = BrowserStorage::session().unwrap();
    local.remove("authenticated").unwrap();
    session.set("authenticated", "true").unwrap();
    assert!(local.get("authenticated").is_none());
    session.remove("authenticated").unwrap();
}

fn host_object(method: &str, body: &str) -> JsValue {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str(method), &Function::new_no_args(body)).unwrap();
    obj.into()
}

#[wasm_bindgen_test]
async fn throwing_table_write_is_a_remote_error() {
    let remote = JsRemote::new(host_object("updateIfGreater", "throw new Error('boom')"));
    match remote.update_if_greater("Other", 3).await {
        Err(RemoteError::Js(message)) => assert!(message.contains("boom")),
        other => panic!("unexpected result: {other:?}"),
    }
    // The same handle keeps working after the throw.
    assert!(remote.update_if_greater("Other", 4).await.is_err());
}

#[wasm_bindgen_test]
async fn committed_table_write_resolves_true() {
    let remote = JsRemote::new(host_object("updateIfGreater", "return Promise.resolve(true)"));
    assert_eq!(remote.update_if_greater("Other", 3).await, Ok(true));
}

#[wasm_bindgen_test]
async fn table_without_subscribe_yields_no_snapshots() {
    let remote = JsRemote::new(Object::new().into());
    assert!(remote.subscribe().next().await.is_none());
}

#[wasm_bindgen_test]
async fn subscribe_forwards_snapshots() {
    let remote = JsRemote::new(host_object("subscribe", "arguments[0]({ Other: 5 })"));
    let first = remote.subscribe().next().await.expect("snapshot");
    assert_eq!(first.get("Other"), Some(&5));
}

#[wasm_bindgen_test]
async fn throwing_sign_in_is_unavailable() {
    let auth = JsAuthenticator::new(host_object("signIn", "throw new Error('offline')"));
    let result = auth.sign_in(Identity::Girlfriend, Some("pw".into())).await;
    assert_eq!(result.map(|s| s.identity), Err(AuthError::Unavailable));
}

#[wasm_bindgen_test]
async fn rejected_sign_in_maps_its_code() {
    let auth = JsAuthenticator::new(host_object(
        "signIn",
        "return Promise.reject({ code: 'auth/wrong-password' })",
    ));
    let result = auth.sign_in(Identity::Boyfriend, Some("nope".into())).await;
    assert_eq!(result.map(|s| s.identity), Err(AuthError::WrongSecret));
}

#[wasm_bindgen_test]
async fn accepted_sign_in_keeps_the_marker() {
    let auth = JsAuthenticator::new(host_object("signIn", "return Promise.resolve('uid-1')"));
    let session = auth.sign_in(Identity::Other, None).await.unwrap();
    assert_eq!(session.identity, Identity::Other);
    assert_eq!(session.marker, "uid-1");
}
