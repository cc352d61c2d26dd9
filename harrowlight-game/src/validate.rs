//! Offline story-graph traversal.
//!
//! Walks the loaded content with the same adjacency rules the transition
//! resolver applies at play time: roll choices branch to their success
//! and failure candidates within the current chapter, everything else
//! follows the explicit destination, and an absent node id on a chapter
//! link expands to that chapter's start-node candidates.
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::data::{Chapter, Choice};
use crate::store::StoryStore;

/// `(chapter_id, node_id)` pair addressing one node globally.
pub type NodeRef = (String, String);

/// An edge whose target node does not exist in its target chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadLink {
    pub from_chapter: String,
    pub from_node: String,
    pub to_chapter: String,
    pub to_node: String,
}

/// An edge into a chapter that is not loaded at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingChapter {
    pub from_chapter: String,
    pub from_node: String,
    pub chapter: String,
}

/// Outcome of a reachability walk.
#[derive(Debug, Default, Serialize)]
pub struct GraphReport {
    pub visited: HashSet<NodeRef>,
    pub dead_links: Vec<DeadLink>,
    pub missing_chapters: Vec<MissingChapter>,
}

impl GraphReport {
    /// True when the walk crossed no broken edges.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dead_links.is_empty() && self.missing_chapters.is_empty()
    }

    /// Whether the walk reached a specific node.
    #[must_use]
    pub fn reaches(&self, chapter: &str, node: &str) -> bool {
        self.visited
            .contains(&(chapter.to_string(), node.to_string()))
    }
}

/// Raw targets named by one choice before chapter defaults and start-node
/// expansion: `(chapter override, node id)`.
fn choice_targets(choice: &Choice) -> Vec<(Option<String>, Option<String>)> {
    if let Some(roll) = &choice.roll {
        // Roll destinations stay in the current chapter; the explicit
        // next_node on a roll choice is a placeholder and is ignored,
        // exactly as at play time.
        return roll
            .success_node
            .iter()
            .chain(roll.failure_node.iter())
            .map(|node| (None, Some(node.to_string())))
            .collect();
    }
    match &choice.next_node {
        Some(nodes) => nodes
            .iter()
            .map(|node| (choice.next_chapter.clone(), Some(node.to_string())))
            .collect(),
        None => vec![(choice.next_chapter.clone(), None)],
    }
}

/// Expand one choice's targets into concrete node references, recording
/// missing chapters along the way.
fn expand_edges(
    store: &StoryStore,
    from: &NodeRef,
    choice: &Choice,
    missing: &mut Vec<MissingChapter>,
) -> Vec<NodeRef> {
    let mut edges = Vec::new();
    for (chapter_override, node) in choice_targets(choice) {
        let chapter_id = chapter_override.unwrap_or_else(|| from.0.clone());
        let Some(chapter) = store.chapter(&chapter_id) else {
            missing.push(MissingChapter {
                from_chapter: from.0.clone(),
                from_node: from.1.clone(),
                chapter: chapter_id,
            });
            continue;
        };
        match node {
            Some(node) => edges.push((chapter_id, node)),
            None => {
                // Start-node link: one edge per candidate.
                for start in chapter.start_node.iter() {
                    edges.push((chapter_id.clone(), start.to_string()));
                }
            }
        }
    }
    edges
}

/// Full adjacency over every loaded node, broken edges included.
#[must_use]
pub fn build_adjacency(store: &StoryStore) -> HashMap<NodeRef, Vec<NodeRef>> {
    let mut adjacency = HashMap::new();
    for chapter_id in store.chapter_ids() {
        let Some(chapter) = store.chapter(&chapter_id) else {
            continue;
        };
        for (node_id, node) in &chapter.nodes {
            let from = (chapter_id.clone(), node_id.clone());
            let mut missing = Vec::new();
            let mut edges = Vec::new();
            for choice in &node.choices {
                edges.extend(expand_edges(store, &from, choice, &mut missing));
            }
            adjacency.insert(from, edges);
        }
    }
    adjacency
}

/// Breadth-first walk from the start chapter's start-node candidates.
///
/// Broken edges are recorded and not followed; only defects actually
/// reachable in play are reported, matching what a player could hit.
#[must_use]
pub fn check_reachability(store: &StoryStore, start_chapter: &str) -> GraphReport {
    let mut report = GraphReport::default();
    let Some(start) = store.chapter(start_chapter) else {
        report.missing_chapters.push(MissingChapter {
            from_chapter: String::new(),
            from_node: String::new(),
            chapter: start_chapter.to_string(),
        });
        return report;
    };

    let mut queue: VecDeque<NodeRef> = VecDeque::new();
    for node in start.start_node.iter() {
        let node_ref = (start_chapter.to_string(), node.to_string());
        if seed_start(&start, &mut report, &node_ref) {
            queue.push_back(node_ref);
        }
    }

    while let Some(current) = queue.pop_front() {
        let Some(chapter) = store.chapter(&current.0) else {
            continue;
        };
        let Some(node) = chapter.nodes.get(&current.1) else {
            continue;
        };
        for choice in &node.choices {
            for edge in expand_edges(store, &current, choice, &mut report.missing_chapters) {
                let Some(target_chapter) = store.chapter(&edge.0) else {
                    continue;
                };
                if !target_chapter.nodes.contains_key(&edge.1) {
                    report.dead_links.push(DeadLink {
                        from_chapter: current.0.clone(),
                        from_node: current.1.clone(),
                        to_chapter: edge.0,
                        to_node: edge.1,
                    });
                    continue;
                }
                if report.visited.insert(edge.clone()) {
                    queue.push_back(edge);
                }
            }
        }
    }
    report
}

/// Record a start-node candidate, flagging a dead start as a dead link.
fn seed_start(chapter: &Chapter, report: &mut GraphReport, node_ref: &NodeRef) -> bool {
    if !chapter.nodes.contains_key(&node_ref.1) {
        report.dead_links.push(DeadLink {
            from_chapter: node_ref.0.clone(),
            from_node: String::new(),
            to_chapter: node_ref.0.clone(),
            to_node: node_ref.1.clone(),
        });
        return false;
    }
    report.visited.insert(node_ref.clone())
}
