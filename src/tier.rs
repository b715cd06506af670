//! Escalation tiers selected from the love count.

use crate::config::TierThresholds;

/// Animation / message intensity, a pure function of the love count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Idle,      // no Yes yet
    Basic,     // (0, tier1)
    Escalated, // [tier1, tier2)
    Maximum,   // [tier2, ..)
}

impl Tier {
    pub fn for_love_count(love_count: u64, thresholds: &TierThresholds) -> Self {
        if love_count == 0 {
            Tier::Idle
        } else if love_count < thresholds.tier1 {
            Tier::Basic
        } else if love_count < thresholds.tier2 {
            Tier::Escalated
        } else {
            Tier::Maximum
        }
    }

    /// Number of floating otters released per Yes click.
    pub fn otter_burst(self) -> u32 {
        match self {
            Tier::Idle => 0,
            Tier::Basic => 1,
            Tier::Escalated => 3,
            Tier::Maximum => 6,
        }
    }

    /// CSS class name used by the page for this tier.
    pub fn css_class(self) -> &'static str {
        match self {
            Tier::Idle => "tier-idle",
            Tier::Basic => "tier-basic",
            Tier::Escalated => "tier-escalated",
            Tier::Maximum => "tier-maximum",
        }
    }
}

/// Index into the escalating message list after `love_count` Yes clicks.
/// Clamps to the last entry once the list is exhausted. `None` when there is
/// nothing to show (no Yes yet, or an empty list).
pub fn success_message_index(love_count: u64, message_count: usize) -> Option<usize> {
    if love_count == 0 || message_count == 0 {
        return None;
    }
    let idx = usize::try_from(love_count - 1).unwrap_or(usize::MAX);
    Some(idx.min(message_count - 1))
}
