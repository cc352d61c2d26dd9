//! Per-player session orchestration.
//!
//! One session owns one [`PlayerState`] and processes one action at a
//! time, start to finish: visibility check, effect, roll, transition or
//! interrupt, render. Sessions share nothing with each other beyond the
//! read-only content store.
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::choices::{VisibleChoice, select_choice, visible_choices};
use crate::data::{Node, StoryEvent};
use crate::effects::{EffectOutcome, apply_effect};
use crate::interrupt::{event_node, maybe_interrupt};
use crate::live::{GeneratedNode, LiveConfig, LiveSource};
use crate::rolls::resolve_roll;
use crate::state::{PlayerState, Position};
use crate::store::StoryStore;
use crate::transition::{Arrival, Destination, TransitionError, resolve_resume, resolve_transition};

/// Errors surfaced to the caller of a session action.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No active session; recoverable by starting one.
    #[error("story not started")]
    NotStarted,
    /// Presented index outside the currently visible range; the input is
    /// rejected and no state changes.
    #[error("choice index {index} is not currently selectable")]
    InvalidChoice { index: usize },
    /// Content-graph defect reported by the transition resolver.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Player stats block included with every rendered node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsView {
    pub sanity: i32,
    pub inventory: Vec<String>,
    pub attributes: HashMap<String, i32>,
}

/// Rendered node payload returned for every action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub text: String,
    pub visual: String,
    pub choices: Vec<VisibleChoice>,
    pub stats: StatsView,
    /// Present only when the prior action involved a dice check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<String>,
}

enum Mode {
    Scripted,
    Live {
        source: LiveSource,
        node: Option<Node>,
    },
}

/// One player's running story.
pub struct StorySession {
    store: Arc<StoryStore>,
    state: Option<PlayerState>,
    rng: ChaCha20Rng,
    mode: Mode,
}

impl StorySession {
    #[must_use]
    pub fn new(store: Arc<StoryStore>, seed: u64) -> Self {
        Self {
            store,
            state: None,
            rng: ChaCha20Rng::seed_from_u64(seed),
            mode: Mode::Scripted,
        }
    }

    /// Begin (or restart) the story at the canonical first chapter,
    /// discarding any previous state.
    ///
    /// # Errors
    ///
    /// Fails with a transition error when the first chapter or its start
    /// node is missing from the store.
    pub fn start(&mut self) -> Result<NodeView, SessionError> {
        self.mode = Mode::Scripted;
        let first = self.store.first_chapter().to_string();
        let arrival = resolve_transition(
            &self.store,
            &first,
            Destination {
                chapter: Some(&first),
                node: None,
            },
            &mut self.rng,
        )?;
        self.state = Some(PlayerState::from_initial(
            &arrival.chapter_id,
            &arrival.node_id,
            arrival.chapter.initial_state.as_ref(),
        ));
        self.commit(arrival, None)
    }

    /// Process one player action: the presented index of a visible
    /// choice on the current node.
    ///
    /// # Errors
    ///
    /// `NotStarted` without an active session, `InvalidChoice` for an
    /// index outside the recomputed visible range, or a transition error
    /// for content-graph defects.
    pub fn choose(&mut self, index: usize) -> Result<NodeView, SessionError> {
        if matches!(self.mode, Mode::Live { .. }) {
            return self.choose_live(index);
        }
        let position = match &self.state {
            Some(state) => state.position.clone(),
            None => return Err(SessionError::NotStarted),
        };
        match position {
            Position::Positioned { chapter, node } => self.advance(&chapter, &node, index),
            Position::Interrupted {
                event,
                pending_chapter,
                pending_node,
            } => self.resume(&event, &pending_chapter, &pending_node, index),
        }
    }

    /// Switch the session into generative mode and return its first
    /// turn. Stats carry over from the running session, or start from
    /// the canonical initial state when none is active.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other actions
    /// so callers can treat all three uniformly.
    pub fn live_setup(&mut self, config: LiveConfig) -> Result<NodeView, SessionError> {
        if self.state.is_none() {
            let first = self.store.first_chapter().to_string();
            let initial = self
                .store
                .chapter(&first)
                .and_then(|chapter| chapter.initial_state.clone());
            self.state = Some(PlayerState::from_initial(&first, "", initial.as_ref()));
        }
        let source = LiveSource::new(config);
        let generated = {
            let state = self.state.as_ref().ok_or(SessionError::NotStarted)?;
            source.generate("begin", state)
        };
        self.mode = Mode::Live { source, node: None };
        self.apply_generated(generated)
    }

    /// Borrow the player state, if a session is active.
    #[must_use]
    pub fn state(&self) -> Option<&PlayerState> {
        self.state.as_ref()
    }

    /// Mutably borrow the player state, if a session is active.
    pub fn state_mut(&mut self) -> Option<&mut PlayerState> {
        self.state.as_mut()
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self.mode, Mode::Live { .. })
    }

    /// Deterministically reseed the session's random source.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha20Rng::seed_from_u64(seed);
    }

    fn advance(
        &mut self,
        chapter_id: &str,
        node_id: &str,
        index: usize,
    ) -> Result<NodeView, SessionError> {
        let chapter =
            self.store
                .chapter(chapter_id)
                .ok_or_else(|| TransitionError::ChapterNotFound {
                    chapter: chapter_id.to_string(),
                })?;
        let node = chapter
            .nodes
            .get(node_id)
            .ok_or_else(|| TransitionError::NodeNotFound {
                chapter: chapter_id.to_string(),
                node: node_id.to_string(),
            })?;

        let state = self.state.as_ref().ok_or(SessionError::NotStarted)?;
        let choice = select_choice(node, state, index)
            .cloned()
            .ok_or(SessionError::InvalidChoice { index })?;

        let state = self.state.as_mut().ok_or(SessionError::NotStarted)?;
        if apply_effect(choice.effect.as_ref(), state) == EffectOutcome::Reset {
            return self.start();
        }

        let mut roll_summary = None;
        let destination = match &choice.roll {
            Some(roll) => {
                let state = self.state.as_ref().ok_or(SessionError::NotStarted)?;
                let outcome = resolve_roll(roll, state, &mut self.rng);
                roll_summary = Some(outcome.summary);
                Destination {
                    chapter: None,
                    node: Some(outcome.destination),
                }
            }
            None => Destination {
                chapter: choice.next_chapter.as_deref(),
                node: choice.next_node.as_ref(),
            },
        };

        let arrival = resolve_transition(&self.store, chapter_id, destination, &mut self.rng)?;

        let crosses_chapter = choice.next_chapter.is_some();
        let events = self.store.events();
        if let Some(event) = maybe_interrupt(&events, crosses_chapter, &mut self.rng) {
            let node = event_node(&event);
            let Some(state) = self.state.as_mut() else {
                return Err(SessionError::NotStarted);
            };
            state.position = Position::Interrupted {
                event,
                pending_chapter: arrival.chapter_id,
                pending_node: arrival.node_id,
            };
            return Ok(render_node(&node, state, &mut self.rng, roll_summary));
        }

        self.commit(arrival, roll_summary)
    }

    fn resume(
        &mut self,
        event: &StoryEvent,
        pending_chapter: &str,
        pending_node: &str,
        index: usize,
    ) -> Result<NodeView, SessionError> {
        let node = event_node(event);
        let state = self.state.as_ref().ok_or(SessionError::NotStarted)?;
        let choice = select_choice(&node, state, index)
            .cloned()
            .ok_or(SessionError::InvalidChoice { index })?;

        let state = self.state.as_mut().ok_or(SessionError::NotStarted)?;
        if apply_effect(choice.effect.as_ref(), state) == EffectOutcome::Reset {
            return self.start();
        }

        let arrival = resolve_resume(&self.store, pending_chapter, pending_node, &mut self.rng)?;
        self.commit(arrival, None)
    }

    fn choose_live(&mut self, index: usize) -> Result<NodeView, SessionError> {
        let generated = {
            let Mode::Live { source, node } = &self.mode else {
                return Err(SessionError::NotStarted);
            };
            let current = node.as_ref().ok_or(SessionError::NotStarted)?;
            let action = current
                .choices
                .get(index)
                .ok_or(SessionError::InvalidChoice { index })?
                .text
                .clone();
            let state = self.state.as_ref().ok_or(SessionError::NotStarted)?;
            source.generate(&action, state)
        };
        self.apply_generated(generated)
    }

    fn apply_generated(&mut self, generated: GeneratedNode) -> Result<NodeView, SessionError> {
        let Some(state) = self.state.as_mut() else {
            return Err(SessionError::NotStarted);
        };
        apply_effect(generated.effect.as_ref(), state);
        let view = render_node(&generated.node, state, &mut self.rng, None);
        if let Mode::Live { node, .. } = &mut self.mode {
            *node = Some(generated.node);
        }
        Ok(view)
    }

    /// Commit a resolved arrival as the new stable position and render
    /// its node.
    fn commit(&mut self, arrival: Arrival, roll: Option<String>) -> Result<NodeView, SessionError> {
        let node = arrival
            .chapter
            .nodes
            .get(&arrival.node_id)
            .ok_or_else(|| TransitionError::NodeNotFound {
                chapter: arrival.chapter_id.clone(),
                node: arrival.node_id.clone(),
            })?;
        let Some(state) = self.state.as_mut() else {
            return Err(SessionError::NotStarted);
        };
        state.position = Position::positioned(&arrival.chapter_id, &arrival.node_id);
        Ok(render_node(node, state, &mut self.rng, roll))
    }
}

fn render_node(
    node: &Node,
    state: &PlayerState,
    rng: &mut ChaCha20Rng,
    roll: Option<String>,
) -> NodeView {
    NodeView {
        text: node.text.pick(rng).to_string(),
        visual: node.visual.clone().unwrap_or_default(),
        choices: visible_choices(node, state),
        stats: StatsView {
            sanity: state.sanity,
            inventory: state.inventory.clone(),
            attributes: state.attributes.clone(),
        },
        roll,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Chapter;

    fn two_node_store() -> Arc<StoryStore> {
        let store = StoryStore::new();
        store.insert_chapter(
            "chapter01_arrival",
            Chapter::from_json(
                r#"{
                    "start_node": "shore",
                    "initial_state": { "sanity": 100 },
                    "nodes": {
                        "shore": {
                            "text": "Salt wind.",
                            "choices": [ { "text": "Walk inland", "next_node": "gate" } ]
                        },
                        "gate": { "text": "A rusted gate.", "choices": [] }
                    }
                }"#,
            )
            .unwrap(),
        );
        Arc::new(store)
    }

    #[test]
    fn actions_without_a_session_fail_with_not_started() {
        let mut session = StorySession::new(two_node_store(), 1);
        assert!(matches!(session.choose(0), Err(SessionError::NotStarted)));
    }

    #[test]
    fn invalid_index_is_rejected_without_state_change() {
        let mut session = StorySession::new(two_node_store(), 1);
        session.start().unwrap();
        let before = session.state().unwrap().clone();
        let err = session.choose(7).unwrap_err();
        assert!(matches!(err, SessionError::InvalidChoice { index: 7 }));
        assert_eq!(session.state().unwrap(), &before);
    }

    #[test]
    fn start_against_an_empty_store_reports_the_missing_chapter() {
        let mut session = StorySession::new(Arc::new(StoryStore::new()), 1);
        let err = session.start().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transition(TransitionError::ChapterNotFound { .. })
        ));
    }

    #[test]
    fn reseeded_sessions_replay_identically() {
        let store = two_node_store();
        let mut first = StorySession::new(store.clone(), 42);
        let mut second = StorySession::new(store, 7);
        second.reseed(42);
        assert_eq!(first.start().unwrap(), second.start().unwrap());
        assert_eq!(first.choose(0).unwrap(), second.choose(0).unwrap());
    }
}
