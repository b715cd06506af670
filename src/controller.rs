//! Yes / No / replay / share handling. Each handler mutates the page state and
//! returns a plain value describing what the page should show.

use crate::config::{
    AppConfig, DEFAULT_IMAGES, ESCALATING_MESSAGES, PLEADING_MESSAGES, SUCCESS_MESSAGE, TierThresholds,
};
use crate::leaderboard::LeaderboardStore;
use crate::state::{ButtonSize, PersistedState};
use crate::tier::{self, Tier};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YesOutcome {
    pub love_count: u64,
    pub tier: Tier,
    pub message_index: usize,
    pub message: &'static str,
    /// The leaderboard score for this identity went up.
    pub new_high: bool,
    /// First Yes since load or replay: image cycling should stop.
    pub first_of_session: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoOutcome {
    pub button: ButtonSize,
    pub message_index: usize,
    pub message: &'static str,
}

pub struct InteractionController {
    state: PersistedState,
    leaderboard: LeaderboardStore,
    tiers: TierThresholds,
}

impl InteractionController {
    pub fn new(state: PersistedState, leaderboard: LeaderboardStore, config: &AppConfig) -> Self {
        Self { state, leaderboard, tiers: config.tiers }
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn leaderboard(&mut self) -> &mut LeaderboardStore {
        &mut self.leaderboard
    }

    /// Tier for the current love count.
    pub fn tier(&self) -> Tier {
        Tier::for_love_count(self.state.love_count(), &self.tiers)
    }

    pub fn on_yes(&mut self) -> YesOutcome {
        let love_count = self.state.increment_love();
        let new_high = match self.leaderboard.update_score(love_count) {
            Ok(raised) => raised,
            Err(err) => {
                log::error!("leaderboard not updated: {err}");
                false
            }
        };
        let message_index = tier::success_message_index(love_count, ESCALATING_MESSAGES.len()).unwrap_or(0);
        let message = ESCALATING_MESSAGES.get(message_index).copied().unwrap_or(SUCCESS_MESSAGE);
        YesOutcome {
            love_count,
            tier: self.tier(),
            message_index,
            message,
            new_high,
            first_of_session: self.state.honeymoon_count() == 1,
        }
    }

    pub fn on_no(&mut self) -> NoOutcome {
        let button = self.state.grow_button();
        let message_index = self.state.next_message_index(PLEADING_MESSAGES.len());
        NoOutcome { button, message_index, message: PLEADING_MESSAGES[message_index] }
    }

    /// Replay the intro. Love count and leaderboard are left alone; the next Yes
    /// continues from the real love count.
    pub fn replay(&mut self) -> ButtonSize {
        self.state.replay();
        log::info!("intro replayed at love count {}", self.state.love_count());
        self.state.button()
    }

    /// Shareable summary of the current score.
    pub fn share_text(&mut self) -> String {
        let who = self.leaderboard.identity_resolver().known().map(|id| id.label()).unwrap_or("Someone");
        let count = self.state.love_count();
        let times = if count == 1 { "time" } else { "times" };
        format!("I've said yes {count} {times}! 💕 — {who}")
    }

    /// Choose the first image from `seed`.
    pub fn start_images(&mut self, seed: usize) -> &'static str {
        self.state.set_image_index(seed, DEFAULT_IMAGES.len());
        DEFAULT_IMAGES[self.state.image_index()]
    }

    pub fn next_image(&mut self) -> &'static str {
        DEFAULT_IMAGES[self.state.next_image_index(DEFAULT_IMAGES.len())]
    }
}
