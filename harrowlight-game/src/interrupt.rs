//! Random event interruption between a choice and its destination.
use rand::Rng;

use crate::data::{Choice, EventPool, Node, StoryEvent, StringOrList};

/// Probability that a same-chapter transition detours through an event.
pub const INTERRUPT_CHANCE: f32 = 0.15;

/// Display text on the synthetic resume choice.
pub const RESUME_TEXT: &str = "Press on";

/// Decide whether an event interrupts this transition.
///
/// The trial is only taken from normal play: the session never calls
/// this while an interrupt is already active, and a chapter-crossing
/// choice is never interrupted. Returns the event to detour through.
pub fn maybe_interrupt<R: Rng + ?Sized>(
    pool: &EventPool,
    crosses_chapter: bool,
    rng: &mut R,
) -> Option<StoryEvent> {
    if crosses_chapter || pool.events.is_empty() {
        return None;
    }
    if rng.r#gen::<f32>() >= INTERRUPT_CHANCE {
        return None;
    }
    let picked = rng.gen_range(0..pool.events.len());
    Some(pool.events[picked].clone())
}

/// Build the transient one-choice node shown while an event is active.
///
/// The single choice carries the event's own effect so it flows through
/// the normal effect path on resume. It encodes no destination; the real
/// one is held as the pending position in the player state.
#[must_use]
pub fn event_node(event: &StoryEvent) -> Node {
    Node {
        text: StringOrList::One(event.text.clone()),
        visual: event.visual.clone(),
        choices: vec![Choice {
            text: RESUME_TEXT.to_string(),
            condition: None,
            effect: event.effect.clone(),
            roll: None,
            next_chapter: None,
            next_node: None,
        }],
    }
}
