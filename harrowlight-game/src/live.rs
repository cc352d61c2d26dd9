//! Generative node source for live mode.
//!
//! Normalizes replies from an OpenAI-style chat completions endpoint
//! into the ordinary [`Node`] shape. Every failure mode degrades to a
//! deterministic placeholder node; nothing here ever reaches the player
//! as an error.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::data::{Choice, Effect, Node, StringOrList};
use crate::state::PlayerState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f32 = 0.7;

const PLACEHOLDER_TEXT: &str = "The mist refuses to part. No generation backend is reachable, \
so the story cannot continue past the written chapters for now.";
const PLACEHOLDER_CHOICE: &str = "Wait in the dark";

/// Connection settings for the generation backend. An empty endpoint
/// means unconfigured: every turn yields the placeholder node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LiveConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub world_prompt: String,
}

/// A node produced by the generator, plus the stat changes the turn
/// carries. The node conforms to the ordinary content contract; its
/// choices are plain display strings with no conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNode {
    pub node: Node,
    pub effect: Option<Effect>,
}

#[derive(Debug, Error)]
enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation reply was not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("generation reply had no content")]
    EmptyReply,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

/// Shape the model is instructed to reply with.
#[derive(Debug, Deserialize)]
struct GeneratedReply {
    text: String,
    #[serde(default)]
    visual: Option<String>,
    #[serde(default)]
    choices: Vec<String>,
    #[serde(default)]
    update_stats: HashMap<String, i32>,
}

pub struct LiveSource {
    config: Option<LiveConfig>,
    client: reqwest::blocking::Client,
}

impl LiveSource {
    /// Build a source from connection settings. An empty endpoint
    /// produces an unconfigured source.
    #[must_use]
    pub fn new(config: LiveConfig) -> Self {
        let config = if config.endpoint.trim().is_empty() {
            None
        } else {
            Some(config)
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// A source with no backend; every turn is the placeholder node.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::new(LiveConfig::default())
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Produce the next node for the player's action. Total: any backend
    /// problem degrades to the placeholder node.
    #[must_use]
    pub fn generate(&self, action: &str, state: &PlayerState) -> GeneratedNode {
        let Some(config) = &self.config else {
            return placeholder_node();
        };
        match self.request(config, action, state) {
            Ok(generated) => generated,
            Err(err) => {
                log::warn!("live generation degraded to placeholder: {err}");
                placeholder_node()
            }
        }
    }

    fn request(
        &self,
        config: &LiveConfig,
        action: &str,
        state: &PlayerState,
    ) -> Result<GeneratedNode, GenerationError> {
        let request = ChatRequest {
            model: &config.model,
            temperature: TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(config),
                },
                ChatMessage {
                    role: "user",
                    content: turn_prompt(action, state),
                },
            ],
        };
        let response: ChatResponse = self
            .client
            .post(&config.endpoint)
            .bearer_auth(&config.api_key)
            .json(&request)
            .send()?
            .json()?;
        let content = response
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or(GenerationError::EmptyReply)?;
        let reply: GeneratedReply = serde_json::from_str(strip_fences(content))?;
        Ok(normalize(reply))
    }
}

fn system_prompt(config: &LiveConfig) -> String {
    format!(
        "{}\n\nYou narrate one scene per turn. Reply with a single JSON object and \
nothing else: {{\"text\": scene narration, \"visual\": one-word scene tag, \
\"choices\": [2-4 short player options], \"update_stats\": {{attribute: integer delta}}}}.",
        config.world_prompt
    )
}

fn turn_prompt(action: &str, state: &PlayerState) -> String {
    format!(
        "Player action: {action}\nSanity: {}\nInventory: {}\nAttributes: {}",
        state.sanity,
        state.inventory.join(", "),
        state
            .attributes
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

/// Strip incidental markdown code fences around a JSON reply.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim().strip_suffix("```").unwrap_or(rest).trim()
}

fn normalize(reply: GeneratedReply) -> GeneratedNode {
    let choices = if reply.choices.is_empty() {
        vec!["Continue".to_string()]
    } else {
        reply.choices
    };
    let effect = if reply.update_stats.is_empty() {
        None
    } else {
        Some(Effect {
            update_stats: reply.update_stats,
            ..Effect::default()
        })
    };
    GeneratedNode {
        node: Node {
            text: StringOrList::One(reply.text),
            visual: reply.visual,
            choices: choices.into_iter().map(plain_choice).collect(),
        },
        effect,
    }
}

fn plain_choice(text: String) -> Choice {
    Choice {
        text,
        condition: None,
        effect: None,
        roll: None,
        next_chapter: None,
        next_node: None,
    }
}

fn placeholder_node() -> GeneratedNode {
    GeneratedNode {
        node: Node {
            text: StringOrList::One(PLACEHOLDER_TEXT.to_string()),
            visual: None,
            choices: vec![plain_choice(PLACEHOLDER_CHOICE.to_string())],
        },
        effect: None,
    }
}
