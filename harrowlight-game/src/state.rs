//! Per-session player state.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::data::{DEFAULT_SANITY, InitialState, StoryEvent};

/// Base value of any attribute that has never been set.
pub const DEFAULT_ATTRIBUTE: i32 = 10;

/// Where the session currently sits in the story. The interrupt detour is
/// a distinct variant so an active event can never nest another one, and
/// the pending destination only exists while an event is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Position {
    Positioned {
        chapter: String,
        node: String,
    },
    Interrupted {
        event: StoryEvent,
        pending_chapter: String,
        pending_node: String,
    },
}

impl Position {
    #[must_use]
    pub fn positioned(chapter: impl Into<String>, node: impl Into<String>) -> Self {
        Self::Positioned {
            chapter: chapter.into(),
            node: node.into(),
        }
    }

    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

/// The whole of a player's mutable state for one play session. Created at
/// session start, threaded explicitly through every operation, discarded
/// on reset or session end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Position,
    pub sanity: i32,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, i32>,
}

impl PlayerState {
    /// Build the canonical starting state for a session beginning at the
    /// given position, seeded from the chapter's initial state if any.
    #[must_use]
    pub fn from_initial(chapter: &str, node: &str, initial: Option<&InitialState>) -> Self {
        let initial = initial.cloned().unwrap_or_default();
        Self {
            position: Position::positioned(chapter, node),
            sanity: initial.sanity,
            inventory: initial.inventory,
            attributes: initial.stats,
        }
    }

    /// Current value of a named attribute, defaulting when unset.
    #[must_use]
    pub fn attribute(&self, name: &str) -> i32 {
        self.attributes
            .get(name)
            .copied()
            .unwrap_or(DEFAULT_ATTRIBUTE)
    }

    /// Add a delta to a named attribute on top of the default base.
    pub fn adjust_attribute(&mut self, name: &str, delta: i32) {
        let value = self
            .attributes
            .entry(name.to_string())
            .or_insert(DEFAULT_ATTRIBUTE);
        *value += delta;
    }

    #[must_use]
    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|held| held == item)
    }

    /// Append an item unless already held. Display order is insertion
    /// order.
    pub fn grant_item(&mut self, item: &str) {
        if !self.has_item(item) {
            self.inventory.push(item.to_string());
        }
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            position: Position::positioned("", ""),
            sanity: DEFAULT_SANITY,
            inventory: Vec::new(),
            attributes: HashMap::new(),
        }
    }
}
