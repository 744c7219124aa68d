//! Tag vocabulary, colours and suggestions
//!
//! The registry keeps two persisted lists:
//! - `globalTags`: every tag ever attached to a note
//! - `recentTags`: the 8 most recently used tags, most recent first
//!
//! `recentTags` is always a subset of `globalTags`, and both lists are
//! written together in a single storage update.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::models::Note;
use crate::storage::buckets;
use crate::storage::{SharedStorage, StorageResult};

/// Maximum length of the recent tags list
pub const MAX_RECENT_TAGS: usize = 8;

/// Maximum number of suggestions returned by [`suggest`]
pub const MAX_SUGGESTIONS: usize = 4;

/// An HSL colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Background and foreground colour for a tag chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagColors {
    pub background: Hsl,
    pub text: Hsl,
}

/// Derive the display colours of a tag from its name alone
///
/// The hue comes from a 31-multiplier string hash over UTF-16 code units
/// with 32-bit wraparound. Background is light, text is dark, same hue.
pub fn color_for(tag: &str) -> TagColors {
    let hash = tag.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });
    let hue = hash.rem_euclid(360) as u16;

    TagColors {
        background: Hsl {
            hue,
            saturation: 70,
            lightness: 90,
        },
        text: Hsl {
            hue,
            saturation: 70,
            lightness: 30,
        },
    }
}

/// Keyword to tags table for technical topics
const TOPIC_TAGS: &[(&str, &[&str])] = &[
    ("react", &["react", "frontend"]),
    ("javascript", &["javascript", "programming"]),
    ("python", &["python", "programming"]),
    ("css", &["css", "styling"]),
    ("html", &["html", "frontend"]),
    ("api", &["api", "backend"]),
    ("database", &["database", "data"]),
    ("machine learning", &["ml", "ai"]),
    ("docker", &["docker", "devops"]),
    ("kubernetes", &["k8s", "devops"]),
];

/// Suggest up to four tags for a note
///
/// Rule-based: content-type triggers first (tutorial, question,
/// key-concept, action-item, quote), then the technical topic table.
/// Suggestions are advisory and recomputed on every call.
pub fn suggest(text: &str, video_title: Option<&str>) -> Vec<String> {
    let text = text.to_lowercase();
    let title = video_title.unwrap_or_default().to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    let mut suggestions: Vec<&str> = Vec::new();

    if has(&["example", "demo"]) || title.contains("tutorial") {
        suggestions.push("tutorial");
    }
    if has(&["question", "?", "doubt"]) {
        suggestions.push("question");
    }
    if has(&["important", "key", "remember"]) {
        suggestions.push("key-concept");
    }
    if has(&["todo", "try", "practice"]) {
        suggestions.push("action-item");
    }
    if has(&["quote", "\"", "'"]) {
        suggestions.push("quote");
    }

    for (keyword, tags) in TOPIC_TAGS {
        if text.contains(keyword) || title.contains(keyword) {
            suggestions.extend(tags.iter());
        }
    }

    let mut out: Vec<String> = Vec::new();
    for tag in suggestions {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
        if out.len() == MAX_SUGGESTIONS {
            break;
        }
    }
    out
}

/// Count how many notes carry each tag, most used first
pub fn tag_counts(notes: &[Note]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in notes.iter().flat_map(|n| n.tags.iter()) {
        *counts.entry(tag.as_str()).or_default() += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(tag, count)| (tag.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Persisted tag vocabulary with a most-recently-used list
pub struct TagRegistry {
    storage: SharedStorage,
    global: Vec<String>,
    recent: Vec<String>,
}

impl TagRegistry {
    /// Load both tag lists from storage
    pub fn load(storage: SharedStorage) -> StorageResult<Self> {
        let mut registry = Self {
            storage,
            global: Vec::new(),
            recent: Vec::new(),
        };
        registry.reload()?;
        Ok(registry)
    }

    /// Re-read both lists, discarding cached state
    pub fn reload(&mut self) -> StorageResult<()> {
        let (global, recent) = buckets::load_tag_lists(self.storage.as_ref())?;
        self.global = global;
        self.recent = recent;
        Ok(())
    }

    /// Every registered tag, in registration order
    pub fn global_tags(&self) -> &[String] {
        &self.global
    }

    /// Recently used tags, most recent first
    pub fn recent_tags(&self) -> &[String] {
        &self.recent
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.global.iter().any(|t| t == tag)
    }

    /// Register a tag and mark it most recently used
    pub fn register(&mut self, tag: &str) -> StorageResult<()> {
        self.register_all(&[tag.to_string()])
    }

    /// Register several tags in order with a single write
    ///
    /// Leaves the lists exactly as sequential [`register`](Self::register)
    /// calls would: the last tag ends up at the front of `recentTags`.
    pub fn register_all(&mut self, tags: &[String]) -> StorageResult<()> {
        let tags: Vec<&str> = tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if tags.is_empty() {
            return Ok(());
        }

        self.reload()?;
        for tag in tags {
            if !self.contains(tag) {
                self.global.push(tag.to_string());
            }
            self.recent.retain(|t| t != tag);
            self.recent.insert(0, tag.to_string());
        }
        self.recent.truncate(MAX_RECENT_TAGS);

        debug!(recent = ?self.recent, "registered tags");
        self.persist()
    }

    /// Add tags to the vocabulary without touching the recent list
    ///
    /// Returns true when something was added. Writes only on change.
    pub fn ensure_registered<'a, I>(&mut self, tags: I) -> StorageResult<bool>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let missing: Vec<String> = tags
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect();
        if missing.iter().all(|t| self.contains(t)) {
            return Ok(false);
        }

        self.reload()?;
        let mut changed = false;
        for tag in missing {
            if !self.contains(&tag) {
                self.global.push(tag);
                changed = true;
            }
        }

        if changed {
            self.persist()?;
        }
        Ok(changed)
    }

    fn persist(&self) -> StorageResult<()> {
        buckets::save_tag_lists(self.storage.as_ref(), &self.global, &self.recent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoInfo;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn registry() -> (SharedStorage, TagRegistry) {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let registry = TagRegistry::load(storage.clone()).unwrap();
        (storage, registry)
    }

    #[test]
    fn test_color_for_is_deterministic() {
        let a = color_for("rust");
        let b = color_for("rust");
        assert_eq!(a, b);
        assert_eq!(a.background.hue, a.text.hue);
        assert_eq!(a.background.lightness, 90);
        assert_eq!(a.text.lightness, 30);
        assert!(a.background.hue < 360);
    }

    #[test]
    fn test_color_for_known_values() {
        // "a" hashes to 97; "ab" to 97 * 31 + 98 = 3105
        assert_eq!(color_for("a").background.hue, 97);
        assert_eq!(color_for("ab").background.hue, 3105 % 360);
        assert_eq!(color_for("").background.hue, 0);
    }

    #[test]
    fn test_color_for_handles_overflow() {
        let long = "a-very-long-tag-name-that-overflows-thirty-two-bits".repeat(4);
        let colors = color_for(&long);
        assert!(colors.background.hue < 360);
        assert_eq!(colors, color_for(&long));
    }

    #[test]
    fn test_hsl_display() {
        let colors = color_for("a");
        assert_eq!(colors.background.to_string(), "hsl(97, 70%, 90%)");
        assert_eq!(colors.text.to_string(), "hsl(97, 70%, 30%)");
    }

    #[test]
    fn test_suggest_content_triggers() {
        assert_eq!(suggest("Is this right?", None), vec!["question"]);
        assert_eq!(suggest("This is IMPORTANT", None), vec!["key-concept"]);
        assert_eq!(suggest("todo: rewrite", None), vec!["action-item"]);
        assert_eq!(suggest("see the demo", None), vec!["tutorial"]);
        assert_eq!(suggest("he said \"ship it\"", None), vec!["quote"]);
        assert!(suggest("plain words", None).is_empty());
    }

    #[test]
    fn test_suggest_uses_title() {
        assert_eq!(suggest("hello", Some("Rust Tutorial")), vec!["tutorial"]);
        assert_eq!(
            suggest("hello", Some("Docker in 100 seconds")),
            vec!["docker", "devops"]
        );
    }

    #[test]
    fn test_suggest_dedupes_and_limits() {
        let tags = suggest("react vs javascript vs python question", None);
        assert_eq!(tags, vec!["question", "react", "frontend", "javascript"]);

        let tags = suggest("python and javascript", None);
        assert_eq!(tags, vec!["javascript", "programming", "python"]);
    }

    #[test]
    fn test_register_twice_keeps_one_occurrence() {
        let (_, mut registry) = registry();
        registry.register("rust").unwrap();
        registry.register("cli").unwrap();
        registry.register("rust").unwrap();

        assert_eq!(registry.global_tags(), &["rust", "cli"]);
        assert_eq!(registry.recent_tags()[0], "rust");
        assert_eq!(registry.recent_tags().len(), 2);
    }

    #[test]
    fn test_recent_tags_bounded() {
        let (_, mut registry) = registry();
        for i in 0..20 {
            registry.register(&format!("tag{}", i)).unwrap();
            assert!(registry.recent_tags().len() <= MAX_RECENT_TAGS);
        }
        assert_eq!(registry.global_tags().len(), 20);
        assert_eq!(registry.recent_tags()[0], "tag19");
        assert!(registry
            .recent_tags()
            .iter()
            .all(|t| registry.global_tags().contains(t)));
    }

    #[test]
    fn test_register_persists_both_lists() {
        let (storage, mut registry) = registry();
        registry
            .register_all(&["a".to_string(), "b".to_string()])
            .unwrap();

        let reloaded = TagRegistry::load(storage).unwrap();
        assert_eq!(reloaded.global_tags(), &["a", "b"]);
        assert_eq!(reloaded.recent_tags(), &["b", "a"]);
    }

    #[test]
    fn test_register_ignores_blank() {
        let (_, mut registry) = registry();
        registry.register("  ").unwrap();
        assert!(registry.global_tags().is_empty());
    }

    #[test]
    fn test_ensure_registered_leaves_recent_alone() {
        let (_, mut registry) = registry();
        registry.register("first").unwrap();

        let tags = vec!["first".to_string(), "second".to_string()];
        assert!(registry.ensure_registered(&tags).unwrap());
        assert!(!registry.ensure_registered(&tags).unwrap());

        assert_eq!(registry.global_tags(), &["first", "second"]);
        assert_eq!(registry.recent_tags(), &["first"]);
    }

    fn assert_recent_within_global(storage: &SharedStorage) {
        let (global, recent) = buckets::load_tag_lists(storage.as_ref()).unwrap();
        assert!(recent.len() <= MAX_RECENT_TAGS);
        assert!(
            recent.iter().all(|t| global.contains(t)),
            "recent {:?} not within global {:?}",
            recent,
            global
        );
    }

    #[test]
    fn test_register_after_clear_drops_old_recent_tags() {
        let (storage, mut registry) = registry();
        registry.register("old").unwrap();

        buckets::clear_all_data(storage.as_ref()).unwrap();
        assert_recent_within_global(&storage);

        registry.register("new").unwrap();
        assert_eq!(registry.global_tags(), &["new"]);
        assert_eq!(registry.recent_tags(), &["new"]);
        assert_recent_within_global(&storage);
    }

    #[test]
    fn test_ensure_registered_then_register_after_clear() {
        let (storage, mut registry) = registry();
        registry
            .register_all(&["old".to_string(), "older".to_string()])
            .unwrap();
        buckets::clear_all_data(storage.as_ref()).unwrap();

        assert!(registry.ensure_registered(&["kept".to_string()]).unwrap());
        assert_recent_within_global(&storage);

        registry.register("new").unwrap();
        let (global, recent) = buckets::load_tag_lists(storage.as_ref()).unwrap();
        assert_eq!(global, vec!["kept", "new"]);
        assert_eq!(recent, vec!["new"]);
        assert_recent_within_global(&storage);
    }

    #[test]
    fn test_tag_counts() {
        let video = VideoInfo::new("v");
        let notes = vec![
            Note::new("1", &video, "a", 0.0).with_tags(["rust", "cli"]),
            Note::new("2", &video, "b", 0.0).with_tags(["rust"]),
            Note::new("3", &video, "c", 0.0),
        ];

        let counts = tag_counts(&notes);
        assert_eq!(
            counts,
            vec![("rust".to_string(), 2), ("cli".to_string(), 1)]
        );
    }
}
