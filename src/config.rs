//! Static tables for the valentine page plus the small runtime override that the
//! host page may pass in as JSON.

use serde::Deserialize;

// -----------------------------------------------------------------------------
// Images
// -----------------------------------------------------------------------------

pub const DEFAULT_IMAGES: &[&str] = &[
    "./assets/images/custom/DSCN0188_Original.JPG",
    "./assets/images/custom/DSCN0614.jpg",
    "./assets/images/custom/IMG_0320.JPG",
    "./assets/images/custom/IMG_1580.JPG",
    "./assets/images/custom/IMG_3042.JPG",
    "./assets/images/custom/IMG_4328.jpg",
    "./assets/images/custom/IMG_4411.JPG",
    "./assets/images/custom/IMG_4836.jpg",
    "./assets/images/custom/IMG_4846.jpg",
    "./assets/images/custom/IMG_5144.jpg",
    "./assets/images/custom/IMG_5453.JPG",
    "./assets/images/custom/IMG_5454.JPG",
    "./assets/images/custom/IMG_5823.JPG",
    "./assets/images/custom/IMG_5858.JPG",
    "./assets/images/custom/IMG_7287.JPG",
    "./assets/images/custom/IMG_7571.JPG",
    "./assets/images/custom/IMG_8303.JPG",
    "./assets/images/custom/IMG_8305.JPG",
];

pub const DEFAULT_IMAGE_FALLBACK: &str =
    "https://via.placeholder.com/400x300/FF69B4/ffffff?text=Be+My+Valentine";
pub const SUCCESS_IMAGE: &str = "./assets/images/custom/valentine-success.jpg";
pub const SUCCESS_IMAGE_FALLBACK: &str =
    "https://via.placeholder.com/400x300/FF1493/ffffff?text=Thank+You!+%E2%9D%A4%EF%B8%8F";

/// Milliseconds between default image swaps while no Yes has been recorded.
pub const IMAGE_CYCLE_INTERVAL_MS: i32 = 3000;

/// Lifetime of a single floating otter before it is removed from the page.
pub const OTTER_LIFETIME_MS: i32 = 3000;

// -----------------------------------------------------------------------------
// Messages
// -----------------------------------------------------------------------------

pub const INITIAL_MESSAGE: &str = "Will you be my valentine this year?";
pub const SUCCESS_MESSAGE: &str = "Yay! I knew you would say yes! ❤️";

/// Shown on No clicks, advancing cyclically.
pub const PLEADING_MESSAGES: &[&str] = &[
    "Are you sure you don't want to be my valentine? Please be my valentine.",
    "But... but... I really want you to say yes! 🥺",
    "Please reconsider! It would make me so happy! 💕",
    "Come on, just click yes! You know you want to! 😊",
    "I'll be so sad if you say no... Pretty please? 🙏",
    "The Yes button is getting bigger for a reason! 💝",
];

/// Shown on Yes clicks, indexed by love count and clamped to the last entry.
pub const ESCALATING_MESSAGES: &[&str] = &[
    "Yay! I knew you would say yes! ❤️",
    "Twice?! You really mean it! 💕",
    "Okay, now I'm blushing... 😊",
    "You keep saying yes and my heart keeps melting 🫠",
    "Is this a love meter or a love marathon? 🏃‍♀️💘",
    "My heart can't take much more of this! 💓",
    "Best. Valentine. Ever. 💖",
    "Somebody stop them, they're too cute! 🦦",
    "The otters are throwing a party for us 🎉🦦",
    "Double digits incoming! 💞",
    "Okay you are officially obsessed with me 😍",
    "Every yes makes me fall for you all over again 💗",
    "I'm keeping count, you know. Forever. 💝",
    "Infinite love unlocked ♾️❤️",
];

// -----------------------------------------------------------------------------
// Button growth & tiers
// -----------------------------------------------------------------------------

/// Yes-button growth parameters. Sizes are in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrowthConfig {
    pub initial_padding: u32,
    pub initial_font_size: u32,
    pub padding_increment: u32,
    pub font_size_increment: u32,
    pub max_padding: u32,
    pub max_font_size: u32,
}

pub const BUTTON_GROWTH: GrowthConfig = GrowthConfig {
    initial_padding: 12,
    initial_font_size: 16,
    padding_increment: 5,
    font_size_increment: 2,
    max_padding: 60,
    max_font_size: 36,
};

impl Default for GrowthConfig {
    fn default() -> Self {
        BUTTON_GROWTH
    }
}

/// Love-count thresholds separating the animation tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub tier1: u64,
    pub tier2: u64,
}

pub const TIER_THRESHOLDS: TierThresholds = TierThresholds { tier1: 10, tier2: 50 };

impl Default for TierThresholds {
    fn default() -> Self {
        TIER_THRESHOLDS
    }
}

// -----------------------------------------------------------------------------
// Runtime override
// -----------------------------------------------------------------------------

/// Settings the host page can override when starting the app. Every field is
/// optional in the JSON; missing ones take the static defaults above.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub growth: GrowthConfig,
    pub tiers: TierThresholds,
    /// Mirror leaderboard scores to the shared remote table.
    pub remote_enabled: bool,
}

impl AppConfig {
    /// Parse the optional JSON blob handed over by the page. Malformed input is
    /// logged and replaced by the defaults so the page still starts.
    pub fn from_json(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str(raw) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("ignoring malformed app config: {err}");
                Self::default()
            }
        }
    }
}
