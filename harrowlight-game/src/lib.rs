//! Harrowlight Story Engine
//!
//! Platform-agnostic core logic for the Harrowlight interactive horror
//! story. This crate provides the content model, player-state machine,
//! choice visibility, effects, dice rolls, chapter transitions, random
//! event interrupts, and the live-generation adapter, without any
//! transport or presentation dependencies.

pub mod choices;
pub mod conditions;
pub mod data;
pub mod effects;
pub mod interrupt;
pub mod live;
pub mod rolls;
pub mod session;
pub mod state;
pub mod store;
pub mod transition;
pub mod validate;

// Re-export commonly used types
pub use choices::{ChoiceMap, VisibleChoice, select_choice, visible_choices, visible_positions};
pub use conditions::condition_passes;
pub use data::{
    Chapter, Choice, Condition, DEFAULT_SANITY, DiceSpec, Effect, EventPool, InitialState, Node,
    Roll, RollTarget, StoryEvent, StringOrList,
};
pub use effects::{EffectOutcome, apply_effect};
pub use interrupt::{INTERRUPT_CHANCE, RESUME_TEXT, event_node, maybe_interrupt};
pub use live::{GeneratedNode, LiveConfig, LiveSource};
pub use rolls::{
    DEFAULT_DIE_SIDES, RollComparison, RollOutcome, dice_sides, resolve_roll, resolve_with_raw,
};
pub use session::{NodeView, SessionError, StatsView, StorySession};
pub use state::{DEFAULT_ATTRIBUTE, PlayerState, Position};
pub use store::{DEFAULT_FIRST_CHAPTER, StoryStore};
pub use transition::{
    Arrival, Destination, TransitionError, resolve_resume, resolve_transition,
};
pub use validate::{DeadLink, GraphReport, build_adjacency, check_reachability};

use std::path::Path;
use std::sync::Arc;

/// Engine facade binding one shared content store to per-player play
/// sessions. The store is read-mostly and shared; each session owns its
/// state and random source.
pub struct StoryEngine {
    store: Arc<StoryStore>,
}

impl StoryEngine {
    /// Wrap an already-populated store.
    #[must_use]
    pub fn new(store: StoryStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Load content from a data directory and wrap it.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be read or parsed.
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(StoryStore::load_dir(dir)?))
    }

    /// The shared content store.
    #[must_use]
    pub fn store(&self) -> &Arc<StoryStore> {
        &self.store
    }

    /// Construct a fresh play session with the given seed.
    #[must_use]
    pub fn new_session(&self, seed: u64) -> StorySession {
        StorySession::new(self.store.clone(), seed)
    }
}
