//! Choice visibility and presented-index remapping.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::conditions::condition_passes;
use crate::data::{Choice, Node};
use crate::state::PlayerState;

/// Remap table from presented index to underlying choice position,
/// stored inline for typical node sizes.
pub type ChoiceMap = SmallVec<[usize; 8]>;

/// One entry of the choice list shown to the player. `index` is dense
/// over the visible subset, not the underlying array position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleChoice {
    pub text: String,
    pub index: usize,
}

/// Underlying positions of the currently visible choices, in order.
/// Recomputed from live state on every call; visibility is state
/// dependent and must never be cached across requests.
#[must_use]
pub fn visible_positions(node: &Node, state: &PlayerState) -> ChoiceMap {
    node.choices
        .iter()
        .enumerate()
        .filter(|(_, choice)| condition_passes(choice.condition.as_ref(), state))
        .map(|(position, _)| position)
        .collect()
}

/// The choice list as presented to the player.
#[must_use]
pub fn visible_choices(node: &Node, state: &PlayerState) -> Vec<VisibleChoice> {
    visible_positions(node, state)
        .iter()
        .enumerate()
        .map(|(presented, &underlying)| VisibleChoice {
            text: node.choices[underlying].text.clone(),
            index: presented,
        })
        .collect()
}

/// Resolve a presented index back to the underlying choice.
///
/// The remap is re-derived against the *current* state, so a stale index
/// can never reach a choice whose condition no longer holds. Returns
/// `None` for anything outside the visible range.
#[must_use]
pub fn select_choice<'a>(
    node: &'a Node,
    state: &PlayerState,
    presented_index: usize,
) -> Option<&'a Choice> {
    let map = visible_positions(node, state);
    map.get(presented_index)
        .map(|&underlying| &node.choices[underlying])
}
