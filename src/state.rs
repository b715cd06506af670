//! Persisted page counters: love count, No-click count and the derived Yes-button
//! size, plus the per-session message / image cursors.

use crate::config::GrowthConfig;
use crate::storage::{self, KEY_LOVE_COUNT, KEY_NO_CLICK_COUNT, SharedStore};

/// Yes-button dimensions derived from the No-click count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonSize {
    pub padding: u32,
    pub font_size: u32,
    /// Both dimensions have reached their cap.
    pub at_max: bool,
}

impl ButtonSize {
    /// `initial + no_clicks * increment`, capped, for each dimension independently.
    pub fn for_no_clicks(growth: &GrowthConfig, no_clicks: u64) -> Self {
        let grow = |initial: u32, inc: u32, max: u32| -> u32 {
            let clicks = u32::try_from(no_clicks).unwrap_or(u32::MAX);
            initial.saturating_add(clicks.saturating_mul(inc)).min(max)
        };
        let padding = grow(growth.initial_padding, growth.padding_increment, growth.max_padding);
        let font_size = grow(
            growth.initial_font_size,
            growth.font_size_increment,
            growth.max_font_size,
        );
        Self {
            padding,
            font_size,
            at_max: padding >= growth.max_padding && font_size >= growth.max_font_size,
        }
    }

    /// CSS padding shorthand, horizontal padding 2.5x the vertical one.
    pub fn css_padding(&self) -> String {
        format!("{}px {}px", self.padding, f64::from(self.padding) * 2.5)
    }
}

pub struct PersistedState {
    store: SharedStore,
    growth: GrowthConfig,
    love_count: u64,
    no_click_count: u64,
    honeymoon_count: u64,
    message_cursor: usize,
    image_cursor: usize,
}

impl PersistedState {
    /// Read prior counters from `store`. Button size is always recomputed from
    /// the No-click count, never read back.
    pub fn load(store: SharedStore, growth: GrowthConfig) -> Self {
        let love_count = storage::read_count(store.as_ref(), KEY_LOVE_COUNT);
        let no_click_count = storage::read_count(store.as_ref(), KEY_NO_CLICK_COUNT);
        log::debug!("loaded love={love_count} no_clicks={no_click_count}");
        Self {
            store,
            growth,
            love_count,
            no_click_count,
            honeymoon_count: 0,
            message_cursor: 0,
            image_cursor: 0,
        }
    }

    pub fn love_count(&self) -> u64 {
        self.love_count
    }

    pub fn no_click_count(&self) -> u64 {
        self.no_click_count
    }

    /// Yes clicks since page load or the last replay.
    pub fn honeymoon_count(&self) -> u64 {
        self.honeymoon_count
    }

    pub fn button(&self) -> ButtonSize {
        ButtonSize::for_no_clicks(&self.growth, self.no_click_count)
    }

    pub fn increment_love(&mut self) -> u64 {
        self.love_count = self.love_count.saturating_add(1);
        self.honeymoon_count = self.honeymoon_count.saturating_add(1);
        storage::write_count(self.store.as_ref(), KEY_LOVE_COUNT, self.love_count);
        self.love_count
    }

    pub fn grow_button(&mut self) -> ButtonSize {
        self.no_click_count = self.no_click_count.saturating_add(1);
        storage::write_count(self.store.as_ref(), KEY_NO_CLICK_COUNT, self.no_click_count);
        self.button()
    }

    /// Index of the pleading message to show now; the cursor then moves on,
    /// wrapping after the last entry.
    pub fn next_message_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let current = self.message_cursor % len;
        self.message_cursor = (current + 1) % len;
        current
    }

    /// Advance the image cursor and return the new position.
    pub fn next_image_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.image_cursor = (self.image_cursor + 1) % len;
        self.image_cursor
    }

    pub fn image_index(&self) -> usize {
        self.image_cursor
    }

    pub fn set_image_index(&mut self, idx: usize, len: usize) {
        self.image_cursor = if len == 0 { 0 } else { idx % len };
    }

    /// Replay the intro: No clicks, button size, message cursor and honeymoon
    /// count go back to their initial values. Love count is kept.
    pub fn replay(&mut self) {
        self.no_click_count = 0;
        self.message_cursor = 0;
        self.honeymoon_count = 0;
        storage::write_count(self.store.as_ref(), KEY_NO_CLICK_COUNT, 0);
    }

    /// Forget everything including the love count.
    pub fn reset_all(&mut self) {
        self.love_count = 0;
        self.no_click_count = 0;
        self.honeymoon_count = 0;
        self.message_cursor = 0;
        self.image_cursor = 0;
        for key in [KEY_LOVE_COUNT, KEY_NO_CLICK_COUNT] {
            if let Err(err) = self.store.remove(key) {
                log::error!("could not clear '{key}': {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BUTTON_GROWTH;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::rc::Rc;

    fn fresh() -> (MemoryStore, PersistedState) {
        let store = MemoryStore::new();
        let state = PersistedState::load(Rc::new(store.clone()), BUTTON_GROWTH);
        (store, state)
    }

    #[test]
    fn size_follows_no_clicks_and_caps() {
        let g = BUTTON_GROWTH;
        for m in 0..40u64 {
            let size = ButtonSize::for_no_clicks(&g, m);
            let expect_pad = (g.initial_padding as u64 + m * g.padding_increment as u64).min(g.max_padding as u64);
            let expect_font =
                (g.initial_font_size as u64 + m * g.font_size_increment as u64).min(g.max_font_size as u64);
            assert_eq!(size.padding as u64, expect_pad, "padding after {m} clicks");
            assert_eq!(size.font_size as u64, expect_font, "font after {m} clicks");
        }
        assert!(ButtonSize::for_no_clicks(&g, u64::MAX).at_max);
        assert!(!ButtonSize::for_no_clicks(&g, 0).at_max);
    }

    #[test]
    fn at_max_needs_both_dimensions() {
        let g = BUTTON_GROWTH;
        // padding caps after 10 clicks (12 + 10*5 >= 60), font after 10 (16 + 10*2 = 36)
        assert!(!ButtonSize::for_no_clicks(&g, 9).at_max);
        assert!(ButtonSize::for_no_clicks(&g, 10).at_max);
    }

    #[test]
    fn love_count_persists_across_reload() {
        let (store, mut state) = fresh();
        for n in 1..=5 {
            assert_eq!(state.increment_love(), n);
        }
        let reloaded = PersistedState::load(Rc::new(store.clone()), BUTTON_GROWTH);
        assert_eq!(reloaded.love_count(), 5);
        assert_eq!(reloaded.honeymoon_count(), 0);
    }

    #[test]
    fn size_is_recomputed_on_load() {
        let (store, mut state) = fresh();
        state.grow_button();
        let grown = state.grow_button();
        let reloaded = PersistedState::load(Rc::new(store.clone()), BUTTON_GROWTH);
        assert_eq!(reloaded.button(), grown);
    }

    #[test]
    fn cursors_wrap() {
        let (_store, mut state) = fresh();
        let seen: Vec<usize> = (0..5).map(|_| state.next_message_index(3)).collect();
        assert_eq!(seen, vec![0, 1, 2, 0, 1]);
        let imgs: Vec<usize> = (0..4).map(|_| state.next_image_index(3)).collect();
        assert_eq!(imgs, vec![1, 2, 0, 1]);
        assert_eq!(state.next_message_index(0), 0);
    }

    #[test]
    fn replay_keeps_love_count() {
        let (store, mut state) = fresh();
        state.increment_love();
        state.increment_love();
        state.grow_button();
        state.next_message_index(6);
        state.replay();
        assert_eq!(state.love_count(), 2);
        assert_eq!(state.no_click_count(), 0);
        assert_eq!(state.honeymoon_count(), 0);
        assert_eq!(state.button(), ButtonSize::for_no_clicks(&BUTTON_GROWTH, 0));
        assert_eq!(state.next_message_index(6), 0);
        assert_eq!(store.get(KEY_NO_CLICK_COUNT).as_deref(), Some("0"));
        assert_eq!(store.get(KEY_LOVE_COUNT).as_deref(), Some("2"));
    }

    #[test]
    fn reset_all_clears_keys() {
        let (store, mut state) = fresh();
        state.increment_love();
        state.grow_button();
        state.reset_all();
        assert_eq!(state.love_count(), 0);
        assert!(store.get(KEY_LOVE_COUNT).is_none());
        assert!(store.get(KEY_NO_CLICK_COUNT).is_none());
    }
}
