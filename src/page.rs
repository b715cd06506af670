//! DOM glue for the valentine page: element lookup, button wiring, the image
//! cycling interval, floating otters and the login overlay. All decisions are
//! made by `InteractionController`; this module only renders its outcomes.
//!
//! Expected markup ids: `yesButton`, `noButton`, `replayButton`, `shareButton`,
//! `valentineImage`, `loveCount`, `message`, `submessage`, `leaderboardList`,
//! and for the login overlay `loginOverlay`, `loginOptions` (buttons carrying
//! `data-identity`), `loginPasswordContainer`, `loginPasswordPrompt`,
//! `loginPasswordInput`, `loginSubmitBtn`, `loginBackBtn`, `loginError`.

use std::cell::RefCell;
use std::rc::Rc;

use futures::StreamExt;
use futures::future::LocalBoxFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, HtmlImageElement, HtmlInputElement, window};

use crate::bridge::{JsAuthenticator, JsRemote};
use crate::config::{
    AppConfig, DEFAULT_IMAGE_FALLBACK, IMAGE_CYCLE_INTERVAL_MS, INITIAL_MESSAGE, OTTER_LIFETIME_MS,
    SUCCESS_IMAGE, SUCCESS_IMAGE_FALLBACK,
};
use crate::controller::InteractionController;
use crate::identity::{self, Authenticator, BrowserPrompt, Identity, IdentityResolver};
use crate::leaderboard::{LeaderboardRow, LeaderboardStore, Spawner};
use crate::state::{ButtonSize, PersistedState};
use crate::storage::{self, BrowserStorage, MemoryStore, SharedStore};

struct Page {
    controller: InteractionController,
    auth: Option<Rc<dyn Authenticator>>,
    login_choice: Option<Identity>,
    cycle_handle: Option<i32>,
    cycle_callback: Option<Closure<dyn FnMut()>>,
}

thread_local! {
    static PAGE: RefCell<Option<Page>> = const { RefCell::new(None) };
}

fn with_page<R>(f: impl FnOnce(&mut Page) -> R) -> Option<R> {
    PAGE.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn document() -> Option<Document> {
    window().and_then(|w| w.document())
}

fn html_element(id: &str) -> Option<HtmlElement> {
    document()?.get_element_by_id(id)?.dyn_into().ok()
}

fn set_text(id: &str, text: &str) {
    if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
        el.set_text_content(Some(text));
    }
}

fn set_display(id: &str, display: &str) {
    if let Some(el) = html_element(id) {
        let _ = el.style().set_property("display", display);
    }
}

fn random_unit() -> f64 {
    #[cfg(feature = "rng")]
    {
        let mut buf = [0u8; 4];
        if getrandom::getrandom(&mut buf).is_ok() {
            return f64::from(u32::from_le_bytes(buf)) / (f64::from(u32::MAX) + 1.0);
        }
    }
    js_sys::Math::random()
}

/// Entry called from `start_valentine`. `remote` and `credentials` may be
/// null/undefined to run local-only / without the login overlay.
pub fn start(config: AppConfig, remote: JsValue, credentials: JsValue) -> Result<(), JsValue> {
    let doc = document().ok_or_else(|| JsValue::from_str("no document"))?;

    let local = storage::local_or_memory();
    let session: SharedStore = match BrowserStorage::session() {
        Ok(s) => Rc::new(s),
        Err(_) => Rc::new(MemoryStore::new()),
    };

    let state = PersistedState::load(local.clone(), config.growth);
    let resolver = IdentityResolver::new(local.clone(), session);
    let mut leaderboard = LeaderboardStore::load(local, resolver, Box::new(BrowserPrompt));
    if config.remote_enabled && !(remote.is_null() || remote.is_undefined()) {
        let spawn: Spawner = Rc::new(|task: LocalBoxFuture<'static, ()>| wasm_bindgen_futures::spawn_local(task));
        leaderboard.attach_remote(Rc::new(JsRemote::new(remote)), spawn);
        log::info!("remote leaderboard attached");
    }
    let auth: Option<Rc<dyn Authenticator>> = if credentials.is_null() || credentials.is_undefined() {
        None
    } else {
        Some(Rc::new(JsAuthenticator::new(credentials)))
    };

    let mut controller = InteractionController::new(state, leaderboard, &config);
    let love = controller.state().love_count();
    let button = controller.state().button();
    let first_image = controller.start_images((random_unit() * 1_000_000.0) as usize);

    PAGE.with(|cell| {
        cell.replace(Some(Page { controller, auth, login_choice: None, cycle_handle: None, cycle_callback: None }))
    });

    set_text("loveCount", &love.to_string());
    set_text("message", INITIAL_MESSAGE);
    render_button(&button);
    swap_image(first_image, DEFAULT_IMAGE_FALLBACK);
    start_image_cycling()?;
    render_leaderboard();

    on_click(&doc, "yesButton", handle_yes)?;
    on_click(&doc, "noButton", handle_no)?;
    on_click(&doc, "replayButton", handle_replay)?;
    on_click(&doc, "shareButton", handle_share)?;

    listen_remote();
    init_login(&doc)?;
    log::info!("valentine page ready (love count {love})");
    Ok(())
}

fn on_click(doc: &Document, id: &str, handler: fn()) -> Result<(), JsValue> {
    let Some(el) = doc.get_element_by_id(id) else {
        log::debug!("no #{id} on this page");
        return Ok(());
    };
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| handler()) as Box<dyn FnMut(_)>);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// --- Handlers ---------------------------------------------------------------

fn handle_yes() {
    let Some(outcome) = with_page(|p| {
        p.stop_cycling();
        p.controller.on_yes()
    }) else {
        return;
    };
    set_text("loveCount", &outcome.love_count.to_string());
    set_text("message", outcome.message);
    set_text("submessage", "");
    swap_image(SUCCESS_IMAGE, SUCCESS_IMAGE_FALLBACK);
    if let Some(body) = document().and_then(|d| d.body()) {
        body.set_class_name(outcome.tier.css_class());
    }
    release_otters(outcome.tier.otter_burst());
    if outcome.new_high {
        render_leaderboard();
    }
}

fn handle_no() {
    let Some(outcome) = with_page(|p| p.controller.on_no()) else {
        return;
    };
    render_button(&outcome.button);
    set_text("submessage", outcome.message);
}

fn handle_replay() {
    let confirmed = window()
        .and_then(|w| w.confirm_with_message("Replay the intro? Your love count and high score stay.").ok())
        .unwrap_or(false);
    if !confirmed {
        return;
    }
    let Some(button) = with_page(|p| p.controller.replay()) else {
        return;
    };
    render_button(&button);
    set_text("message", INITIAL_MESSAGE);
    set_text("submessage", "");
    if let Some(body) = document().and_then(|d| d.body()) {
        body.set_class_name("");
    }
    if let Some(first) = with_page(|p| p.controller.next_image()) {
        swap_image(first, DEFAULT_IMAGE_FALLBACK);
    }
    if let Err(err) = start_image_cycling() {
        log::warn!("image cycling not restarted: {err:?}");
    }
}

fn handle_share() {
    let Some(text) = with_page(|p| p.controller.share_text()) else {
        return;
    };
    if let Some(w) = window() {
        let _ = w.prompt_with_message_and_default("Copy and share:", &text);
    }
}

// --- Rendering --------------------------------------------------------------

fn render_button(button: &ButtonSize) {
    let Some(yes) = html_element("yesButton") else {
        return;
    };
    let style = yes.style();
    let _ = style.set_property("padding", &button.css_padding());
    let _ = style.set_property("font-size", &format!("{}px", button.font_size));
    let _ = yes.set_attribute("data-max-size", if button.at_max { "true" } else { "false" });
}

fn swap_image(src: &str, fallback: &'static str) {
    let Some(img) = document()
        .and_then(|d| d.get_element_by_id("valentineImage"))
        .and_then(|el| el.dyn_into::<HtmlImageElement>().ok())
    else {
        return;
    };
    let img_err = img.clone();
    let on_error = Closure::once_into_js(move || {
        img_err.set_onerror(None);
        img_err.set_src(fallback);
    });
    img.set_onerror(Some(on_error.unchecked_ref()));
    img.set_src(src);
}

fn release_otters(count: u32) {
    let (Some(doc), Some(win)) = (document(), window()) else {
        return;
    };
    let (Some(body), Some(yes)) = (doc.body(), doc.get_element_by_id("yesButton")) else {
        return;
    };
    let rect = yes.get_bounding_client_rect();
    for _ in 0..count {
        let Ok(otter) = doc.create_element("div") else {
            continue;
        };
        otter.set_class_name("floating-otter");
        otter.set_text_content(Some("🦦"));
        let offset = (random_unit() - 0.5) * (rect.width() + 100.0);
        let x = rect.left() + rect.width() / 2.0 + offset;
        let _ = otter.set_attribute("style", &format!("left:{x}px; top:{}px;", rect.top()));
        if body.append_child(&otter).is_err() {
            continue;
        }
        let remove = Closure::once_into_js(move || otter.remove());
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(remove.unchecked_ref(), OTTER_LIFETIME_MS);
    }
}

fn leaderboard_html(rows: &[LeaderboardRow]) -> String {
    rows.iter()
        .enumerate()
        .map(|(rank, row)| {
            let current = if row.is_current { "current-user" } else { "" };
            format!(
                "<div class=\"leaderboard-entry\"><span class=\"leaderboard-name {current}\"><span class=\"leaderboard-medal\">{}</span>{}</span><span class=\"leaderboard-score\">{} 💕</span></div>",
                LeaderboardRow::medal(rank),
                row.identity.label(),
                row.score
            )
        })
        .collect()
}

fn render_leaderboard() {
    let Some(rows) = with_page(|p| p.controller.leaderboard().snapshot()) else {
        return;
    };
    if let Some(el) = document().and_then(|d| d.get_element_by_id("leaderboardList")) {
        el.set_inner_html(&leaderboard_html(&rows));
    }
}

// --- Image cycling ----------------------------------------------------------

impl Page {
    fn stop_cycling(&mut self) {
        if let Some(handle) = self.cycle_handle.take() {
            if let Some(w) = window() {
                w.clear_interval_with_handle(handle);
            }
        }
        self.cycle_callback = None;
    }
}

fn start_image_cycling() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let callback = Closure::wrap(Box::new(move || {
        if let Some(next) = with_page(|p| p.controller.next_image()) {
            swap_image(next, DEFAULT_IMAGE_FALLBACK);
        }
    }) as Box<dyn FnMut()>);
    let handle = win.set_interval_with_callback_and_timeout_and_arguments_0(
        callback.as_ref().unchecked_ref(),
        IMAGE_CYCLE_INTERVAL_MS,
    )?;
    with_page(|p| {
        p.stop_cycling();
        p.cycle_handle = Some(handle);
        p.cycle_callback = Some(callback);
    });
    Ok(())
}

// --- Remote leaderboard -----------------------------------------------------

fn listen_remote() {
    let Some(mut updates) = with_page(|p| p.controller.leaderboard().remote_updates()).flatten() else {
        return;
    };
    wasm_bindgen_futures::spawn_local(async move {
        while let Some(table) = updates.next().await {
            let applied = with_page(|p| p.controller.leaderboard().apply_remote(&table)).unwrap_or(false);
            if !applied {
                break;
            }
            render_leaderboard();
        }
        log::info!("remote leaderboard subscription ended");
    });
}

// --- Login overlay ----------------------------------------------------------

fn init_login(doc: &Document) -> Result<(), JsValue> {
    let needs_login = with_page(|p| {
        p.auth.is_some() && !p.controller.leaderboard().identity_resolver().session_authenticated()
    })
    .unwrap_or(false);
    if !needs_login {
        set_display("loginOverlay", "none");
        return Ok(());
    }
    set_display("loginOverlay", "flex");

    if let Some(options) = doc.get_element_by_id("loginOptions") {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            let tag = evt
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                .and_then(|el| el.closest("[data-identity]").ok().flatten())
                .and_then(|el| el.get_attribute("data-identity"));
            if let Some(identity) = tag.as_deref().and_then(Identity::from_button_tag) {
                choose_identity(identity);
            }
        }) as Box<dyn FnMut(_)>);
        options.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    on_click(doc, "loginSubmitBtn", submit_secret)?;
    on_click(doc, "loginBackBtn", back_to_identities)?;
    if let Some(input) = doc.get_element_by_id("loginPasswordInput") {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if evt.key() == "Enter" {
                submit_secret();
            }
        }) as Box<dyn FnMut(_)>);
        input.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

fn choose_identity(identity: Identity) {
    with_page(|p| p.login_choice = Some(identity));
    set_text("loginError", "");
    if !identity.needs_secret() {
        attempt_login(identity, None);
        return;
    }
    set_display("loginOptions", "none");
    set_display("loginPasswordContainer", "block");
    set_text("loginPasswordPrompt", &format!("Enter password for {}:", identity.label()));
    if let Some(input) = password_input() {
        input.set_value("");
        let _ = input.focus();
    }
}

fn back_to_identities() {
    with_page(|p| p.login_choice = None);
    set_display("loginOptions", "flex");
    set_display("loginPasswordContainer", "none");
    set_text("loginError", "");
}

fn password_input() -> Option<HtmlInputElement> {
    document()?.get_element_by_id("loginPasswordInput")?.dyn_into().ok()
}

fn submit_secret() {
    let Some(identity) = with_page(|p| p.login_choice).flatten() else {
        return;
    };
    let secret = password_input().map(|i| i.value()).unwrap_or_default();
    attempt_login(identity, Some(secret));
}

fn set_login_busy(busy: bool) {
    if let Some(btn) = html_element("loginSubmitBtn") {
        btn.set_text_content(Some(if busy { "Authenticating..." } else { "Enter →" }));
        let _ = if busy { btn.set_attribute("disabled", "") } else { btn.remove_attribute("disabled") };
    }
    if let Some(input) = password_input() {
        input.set_disabled(busy);
    }
}

fn attempt_login(identity: Identity, secret: Option<String>) {
    let Some(auth) = with_page(|p| p.auth.clone()).flatten() else {
        return;
    };
    set_login_busy(true);
    wasm_bindgen_futures::spawn_local(async move {
        let result = identity::sign_in(auth.as_ref(), identity, secret.as_deref()).await;
        set_login_busy(false);
        match result {
            Ok(session) => {
                with_page(|p| p.controller.leaderboard().identity_resolver().complete_login(&session));
                set_display("loginOverlay", "none");
                render_leaderboard();
            }
            Err(err) => set_text("loginError", &format!("❌ {err}")),
        }
    });
}
