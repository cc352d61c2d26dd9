//! Story content shapes loaded from chapter and event documents.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default sanity granted when a chapter's initial state omits it.
pub const DEFAULT_SANITY: i32 = 100;

fn default_sanity() -> i32 {
    DEFAULT_SANITY
}

/// A single value or a pool of candidates, one of which is drawn uniformly
/// at random wherever the content is consumed. Used for node text variants,
/// start nodes, destination node ids, and item grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    /// Draw one candidate uniformly at random. An empty pool yields the
    /// empty string rather than panicking.
    pub fn pick<'a, R: Rng + ?Sized>(&'a self, rng: &mut R) -> &'a str {
        match self {
            Self::One(value) => value,
            Self::Many(values) if values.is_empty() => "",
            Self::Many(values) => &values[rng.gen_range(0..values.len())],
        }
    }

    /// Iterate over every candidate.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            Self::One(value) => std::slice::from_ref(value).iter(),
            Self::Many(values) => values.iter(),
        }
        .map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.iter().any(|candidate| candidate == value)
    }
}

impl From<&str> for StringOrList {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

/// One independently loaded collection of story nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub start_node: StringOrList,
    #[serde(default)]
    pub initial_state: Option<InitialState>,
    #[serde(default)]
    pub nodes: HashMap<String, Node>,
}

impl Chapter {
    /// Parse a chapter document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a valid chapter.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Player state seeded when a play session begins in a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialState {
    #[serde(default = "default_sanity")]
    pub sanity: i32,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub stats: HashMap<String, i32>,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            sanity: DEFAULT_SANITY,
            inventory: Vec::new(),
            stats: HashMap::new(),
        }
    }
}

/// One narrative beat: text (possibly variable), an optional visual tag,
/// and an ordered choice list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub text: StringOrList,
    #[serde(default)]
    pub visual: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A player-selectable option. Destination is either the explicit
/// `(next_chapter, next_node)` pair or, when a roll is present, the roll's
/// own success/failure nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub effect: Option<Effect>,
    #[serde(default)]
    pub roll: Option<Roll>,
    #[serde(default)]
    pub next_chapter: Option<String>,
    #[serde(default)]
    pub next_node: Option<StringOrList>,
}

/// Visibility gate on a choice. All present clauses must hold; unknown
/// clause keys are dropped at parse time, which keeps evaluation total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Condition {
    #[serde(default)]
    pub has_item: Option<StringOrList>,
    #[serde(default)]
    pub min_sanity: Option<i32>,
    #[serde(default)]
    pub max_sanity: Option<i32>,
}

/// State mutation attached to a choice or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Effect {
    #[serde(default)]
    pub sanity: i32,
    #[serde(default)]
    pub add_item: Option<StringOrList>,
    #[serde(default)]
    pub update_stats: HashMap<String, i32>,
    #[serde(default)]
    pub reset: bool,
}

/// Dice specification: a bare side count or an `"NdS"` expression.
/// Only one die is ever thrown; the count part is decorative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiceSpec {
    Sides(i32),
    Expr(String),
}

/// Roll target: a literal number or the name of a player attribute
/// resolved at roll time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RollTarget {
    Value(i32),
    Stat(String),
}

/// A randomized success/failure check branching to one of two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roll {
    #[serde(default)]
    pub dice: Option<DiceSpec>,
    #[serde(default)]
    pub bonus_stat: Option<String>,
    pub target: RollTarget,
    #[serde(default)]
    pub condition: Option<String>,
    pub success_node: StringOrList,
    pub failure_node: StringOrList,
}

/// A transient narrative detour injected between a choice and its real
/// destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryEvent {
    pub text: String,
    #[serde(default)]
    pub visual: Option<String>,
    #[serde(default)]
    pub effect: Option<Effect>,
}

/// The loaded random-event document: a flat list of interrupt events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EventPool {
    pub events: Vec<StoryEvent>,
}

impl EventPool {
    /// Create an empty pool (useful for tests and event-free stories).
    #[must_use]
    pub fn empty() -> Self {
        Self { events: Vec::new() }
    }

    /// Parse the event document, a flat JSON array of events.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into an event list.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let events: Vec<StoryEvent> = serde_json::from_str(json)?;
        Ok(Self { events })
    }
}
