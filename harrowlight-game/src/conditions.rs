//! Choice visibility conditions.
use crate::data::Condition;
use crate::state::PlayerState;

/// Evaluate a visibility condition against the current player state.
///
/// Absent conditions always pass; present clauses are ANDed. A `has_item`
/// list requires every listed item. Total over all inputs: there is no
/// error path.
#[must_use]
pub fn condition_passes(condition: Option<&Condition>, state: &PlayerState) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    if let Some(required) = &condition.has_item
        && !required.iter().all(|item| state.has_item(item))
    {
        return false;
    }
    if let Some(min) = condition.min_sanity
        && state.sanity < min
    {
        return false;
    }
    if let Some(max) = condition.max_sanity
        && state.sanity > max
    {
        return false;
    }
    true
}
