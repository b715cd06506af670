//! Valentine meter core crate.
//!
//! A Yes/No valentine page: the Yes button grows with every No, Yes clicks
//! feed a persisted love meter, and the best love count per identity lands on
//! a leaderboard that can be mirrored to a shared realtime table. The
//! behavioral core (`state`, `tier`, `leaderboard`, `controller`) is plain Rust
//! and runs natively; `page` and `bridge` hold the browser glue.

use wasm_bindgen::prelude::*;

pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod leaderboard;
pub mod logging;
mod page;
pub mod remote;
pub mod state;
pub mod storage;
pub mod tier;

pub use config::{AppConfig, ESCALATING_MESSAGES, PLEADING_MESSAGES};
pub use controller::{InteractionController, NoOutcome, YesOutcome};
pub use identity::Identity;
pub use leaderboard::{LeaderboardRow, LeaderboardStore};
pub use state::{ButtonSize, PersistedState};
pub use tier::Tier;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(log::LevelFilter::Info);
}

// -----------------------------------------------------------------------------
// Unified entrypoint
// -----------------------------------------------------------------------------

/// Wire up the page. `config_json` may override growth / tier settings and
/// enable the remote table; `remote` and `credentials` are the optional JS
/// collaborators described in `bridge`.
#[wasm_bindgen]
pub fn start_valentine(config_json: Option<String>, remote: JsValue, credentials: JsValue) -> Result<(), JsValue> {
    let config = AppConfig::from_json(config_json.as_deref());
    page::start(config, remote, credentials)
}
