//! Effect application rules.
use crate::data::Effect;
use crate::state::PlayerState;

/// What a processed effect asks the caller to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    /// State mutated in place; continue with the current action.
    Applied,
    /// The effect demands a full session restart; all sibling fields
    /// were ignored and state is untouched.
    Reset,
}

/// Apply an effect to the player state.
///
/// Sanity deltas are unclamped in both directions. Item grants are
/// idempotent on membership. Stat deltas add onto the default base of an
/// unset attribute. A `reset` effect short-circuits everything else.
pub fn apply_effect(effect: Option<&Effect>, state: &mut PlayerState) -> EffectOutcome {
    let Some(effect) = effect else {
        return EffectOutcome::Applied;
    };
    if effect.reset {
        return EffectOutcome::Reset;
    }
    state.sanity += effect.sanity;
    if let Some(items) = &effect.add_item {
        for item in items.iter() {
            state.grant_item(item);
        }
    }
    for (stat, delta) in &effect.update_stats {
        state.adjust_attribute(stat, *delta);
    }
    EffectOutcome::Applied
}
