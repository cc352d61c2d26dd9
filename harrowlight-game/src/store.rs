//! Process-wide read-mostly content store.
//!
//! Chapters and the event pool are parsed once and handed out as `Arc`
//! snapshots, so an in-flight action keeps one consistent view of a
//! chapter even while another thread swaps in reloaded content. Reload
//! granularity is a whole chapter; parsed chapters are never mutated in
//! place.
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::data::{Chapter, EventPool};

/// Chapter every fresh or reset session begins in.
pub const DEFAULT_FIRST_CHAPTER: &str = "chapter01_arrival";

/// Subdirectory of the data root holding one JSON document per chapter.
pub const CHAPTERS_DIR: &str = "chapters";

/// Event document file name under the data root.
pub const EVENTS_FILE: &str = "random_events.json";

pub struct StoryStore {
    chapters: RwLock<HashMap<String, Arc<Chapter>>>,
    events: RwLock<Arc<EventPool>>,
    first_chapter: String,
}

impl StoryStore {
    /// Create an empty store with the default first chapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chapters: RwLock::new(HashMap::new()),
            events: RwLock::new(Arc::new(EventPool::empty())),
            first_chapter: DEFAULT_FIRST_CHAPTER.to_string(),
        }
    }

    /// Override the chapter sessions start and reset into.
    #[must_use]
    pub fn with_first_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.first_chapter = chapter.into();
        self
    }

    /// Load all chapters and the event pool from a data directory laid
    /// out as `<dir>/chapters/*.json` plus an optional
    /// `<dir>/random_events.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the chapter directory cannot be read or any
    /// document fails to parse.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let store = Self::new();
        let chapters_dir = dir.join(CHAPTERS_DIR);
        let entries = std::fs::read_dir(&chapters_dir)
            .with_context(|| format!("reading chapter directory {}", chapters_dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("listing {}", chapters_dir.display()))?
                .path();
            if path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_none_or(|ext| ext != "json")
            {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let chapter = Chapter::from_json(&json)
                .with_context(|| format!("parsing chapter {}", path.display()))?;
            store.insert_chapter(id, chapter);
        }

        let events_path = dir.join(EVENTS_FILE);
        if events_path.exists() {
            let json = std::fs::read_to_string(&events_path)
                .with_context(|| format!("reading {}", events_path.display()))?;
            let pool = EventPool::from_json(&json)
                .with_context(|| format!("parsing events {}", events_path.display()))?;
            store.set_events(pool);
        }
        Ok(store)
    }

    /// Insert or replace a chapter. The swap is atomic: readers keep
    /// whatever snapshot they already hold.
    pub fn insert_chapter(&self, id: impl Into<String>, chapter: Chapter) {
        let mut chapters = self
            .chapters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        chapters.insert(id.into(), Arc::new(chapter));
    }

    /// Re-parse one chapter document and swap it in, returning the
    /// chapter id.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed; the stored
    /// chapter is left untouched in that case.
    pub fn reload_chapter_file(&self, path: &Path) -> Result<String> {
        let id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .with_context(|| format!("chapter file {} has no usable name", path.display()))?
            .to_string();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let chapter =
            Chapter::from_json(&json).with_context(|| format!("parsing {}", path.display()))?;
        self.insert_chapter(id.clone(), chapter);
        Ok(id)
    }

    /// Snapshot of one chapter, if loaded.
    #[must_use]
    pub fn chapter(&self, id: &str) -> Option<Arc<Chapter>> {
        self.chapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// All loaded chapter ids, sorted for stable reporting.
    #[must_use]
    pub fn chapter_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .chapters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Replace the random event pool.
    pub fn set_events(&self, pool: EventPool) {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        *events = Arc::new(pool);
    }

    /// Snapshot of the random event pool.
    #[must_use]
    pub fn events(&self) -> Arc<EventPool> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn first_chapter(&self) -> &str {
        &self.first_chapter
    }
}

impl Default for StoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StringOrList;

    fn tiny_chapter(start: &str) -> Chapter {
        Chapter::from_json(&format!(
            r#"{{ "start_node": "{start}", "nodes": {{ "{start}": {{ "text": "...", "choices": [] }} }} }}"#
        ))
        .unwrap()
    }

    #[test]
    fn chapter_swap_preserves_existing_snapshots() {
        let store = StoryStore::new();
        store.insert_chapter("intro", tiny_chapter("old"));
        let snapshot = store.chapter("intro").unwrap();

        store.insert_chapter("intro", tiny_chapter("new"));
        assert_eq!(snapshot.start_node, StringOrList::from("old"));
        assert_eq!(
            store.chapter("intro").unwrap().start_node,
            StringOrList::from("new")
        );
    }

    #[test]
    fn chapter_ids_are_sorted() {
        let store = StoryStore::new();
        store.insert_chapter("zeta", tiny_chapter("a"));
        store.insert_chapter("alpha", tiny_chapter("a"));
        assert_eq!(store.chapter_ids(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn events_default_to_empty() {
        let store = StoryStore::new();
        assert!(store.events().events.is_empty());
    }

    #[test]
    fn reload_swaps_a_whole_chapter_from_disk() {
        let root = std::env::temp_dir().join(format!(
            "harrowlight-reload-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&root).unwrap();
        let path = root.join("intro.json");
        std::fs::write(
            &path,
            r#"{ "start_node": "old", "nodes": { "old": { "text": "...", "choices": [] } } }"#,
        )
        .unwrap();

        let store = StoryStore::new();
        let id = store.reload_chapter_file(&path).unwrap();
        assert_eq!(id, "intro");
        assert_eq!(
            store.chapter("intro").unwrap().start_node,
            StringOrList::from("old")
        );

        std::fs::write(&path, r#"{ "start_node": "new", "nodes": {} }"#).unwrap();
        store.reload_chapter_file(&path).unwrap();
        assert_eq!(
            store.chapter("intro").unwrap().start_node,
            StringOrList::from("new")
        );

        // A broken document leaves the stored chapter untouched.
        std::fs::write(&path, "{ not json").unwrap();
        assert!(store.reload_chapter_file(&path).is_err());
        assert_eq!(
            store.chapter("intro").unwrap().start_node,
            StringOrList::from("new")
        );

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn load_dir_reads_chapters_and_events() {
        let root = std::env::temp_dir().join(format!(
            "harrowlight-store-test-{}",
            std::process::id()
        ));
        let chapters = root.join(CHAPTERS_DIR);
        std::fs::create_dir_all(&chapters).unwrap();
        std::fs::write(
            chapters.join("chapter01_arrival.json"),
            r#"{ "start_node": "shore", "nodes": { "shore": { "text": "Salt wind.", "choices": [] } } }"#,
        )
        .unwrap();
        std::fs::write(
            root.join(EVENTS_FILE),
            r#"[ { "text": "A bell tolls underwater." } ]"#,
        )
        .unwrap();

        let store = StoryStore::load_dir(&root).unwrap();
        assert_eq!(store.chapter_ids(), vec!["chapter01_arrival"]);
        assert_eq!(store.events().events.len(), 1);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
