//! Chapter and node transition resolution.
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;

use crate::data::{Chapter, StringOrList};
use crate::store::StoryStore;

/// Provisional destination produced by a choice or a resolved roll.
/// An absent chapter means "stay in the current one"; an absent node
/// means "the target chapter's start node".
#[derive(Debug, Clone, Copy, Default)]
pub struct Destination<'a> {
    pub chapter: Option<&'a str>,
    pub node: Option<&'a StringOrList>,
}

/// Content-graph integrity failures. These are authoring defects, never
/// player mistakes, and are surfaced with the ids needed to fix the
/// content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("chapter '{chapter}' not found")]
    ChapterNotFound { chapter: String },
    #[error("node '{node}' not found in chapter '{chapter}'")]
    NodeNotFound { chapter: String, node: String },
}

/// A validated landing point: the resolved ids plus the chapter snapshot
/// they were resolved against, so the caller renders from the same
/// content the resolver checked.
#[derive(Debug, Clone)]
pub struct Arrival {
    pub chapter_id: String,
    pub node_id: String,
    pub chapter: Arc<Chapter>,
}

/// Resolve a provisional destination to a concrete `(chapter, node)`.
///
/// Chapter resolution happens first, so "start node of the newly entered
/// chapter" and "random destination within the current chapter" share
/// the single candidate draw below.
///
/// # Errors
///
/// `ChapterNotFound` when the target chapter is not loaded;
/// `NodeNotFound` when the resolved node id is missing from it. Nothing
/// is committed on error.
pub fn resolve_transition<R: Rng + ?Sized>(
    store: &StoryStore,
    current_chapter: &str,
    destination: Destination<'_>,
    rng: &mut R,
) -> Result<Arrival, TransitionError> {
    let chapter_id = destination.chapter.unwrap_or(current_chapter);
    let chapter = store
        .chapter(chapter_id)
        .ok_or_else(|| TransitionError::ChapterNotFound {
            chapter: chapter_id.to_string(),
        })?;

    let node_spec = destination.node.unwrap_or(&chapter.start_node);
    let node_id = node_spec.pick(rng).to_string();

    if !chapter.nodes.contains_key(&node_id) {
        return Err(TransitionError::NodeNotFound {
            chapter: chapter_id.to_string(),
            node: node_id,
        });
    }
    log::debug!("transition resolved to {chapter_id}:{node_id}");
    Ok(Arrival {
        chapter_id: chapter_id.to_string(),
        node_id,
        chapter,
    })
}

/// Resolve the stored pending destination after an interrupt. Unlike the
/// normal path, a dead pending node degrades to the chapter's start node
/// so an interrupt can never strand the session.
///
/// # Errors
///
/// `ChapterNotFound` when the pending chapter has vanished entirely;
/// `NodeNotFound` when even the fallback start node is missing.
pub fn resolve_resume<R: Rng + ?Sized>(
    store: &StoryStore,
    pending_chapter: &str,
    pending_node: &str,
    rng: &mut R,
) -> Result<Arrival, TransitionError> {
    let chapter = store
        .chapter(pending_chapter)
        .ok_or_else(|| TransitionError::ChapterNotFound {
            chapter: pending_chapter.to_string(),
        })?;

    if chapter.nodes.contains_key(pending_node) {
        return Ok(Arrival {
            chapter_id: pending_chapter.to_string(),
            node_id: pending_node.to_string(),
            chapter,
        });
    }

    log::warn!(
        "pending node '{pending_node}' missing from chapter '{pending_chapter}', resuming at chapter start"
    );
    resolve_transition(
        store,
        pending_chapter,
        Destination {
            chapter: Some(pending_chapter),
            node: None,
        },
        rng,
    )
}
