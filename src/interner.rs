//! String interning pool.
//!
//! All text in the store (file paths, identifiers, type names) is interned
//! once and referenced by [`StringId`] everywhere else. Ids are dense,
//! zero-based, and append-only: two equal byte sequences always map to the
//! same id, and an id never stops resolving while the pool lives.
//!
//! Each entry keeps its hash alongside the text so the validator can
//! recompute and compare them when checking pool integrity.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::types::StringId;

/// Hash used for interned entries. Stored at intern time, recomputed by
/// [`StringPool::verify_hashes`].
pub fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone)]
struct PoolEntry {
    text: Arc<str>,
    hash: u64,
}

/// Deduplicating, append-only string pool.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    entries: Vec<PoolEntry>,
    lookup: HashMap<Arc<str>, StringId>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool expecting roughly `capacity` distinct strings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
        }
    }

    /// Intern `text`, returning the existing id if it was seen before.
    pub fn intern(&mut self, text: &str) -> StringId {
        if let Some(&id) = self.lookup.get(text) {
            return id;
        }

        let text: Arc<str> = Arc::from(text);
        let id = StringId::new(self.entries.len() as u32);
        self.entries.push(PoolEntry {
            text: Arc::clone(&text),
            hash: hash_text(&text),
        });
        self.lookup.insert(text, id);
        id
    }

    /// Resolve an id back to its text. `None` when out of bounds.
    pub fn get(&self, id: StringId) -> Option<&str> {
        self.entries.get(id.value() as usize).map(|e| &*e.text)
    }

    /// Look up the id of already-interned text without interning it.
    pub fn find(&self, text: &str) -> Option<StringId> {
        self.lookup.get(text).copied()
    }

    /// Hash recorded for `id` at intern time.
    pub fn hash_of(&self, id: StringId) -> Option<u64> {
        self.entries.get(id.value() as usize).map(|e| e.hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that an id resolves, used by the validator on every
    /// cross-reference dereference.
    pub fn contains(&self, id: StringId) -> bool {
        (id.value() as usize) < self.entries.len()
    }

    /// Recompute every stored hash and compare with the recorded one.
    /// Returns the first mismatching id, if any.
    pub fn verify_hashes(&self) -> Option<StringId> {
        self.entries.iter().enumerate().find_map(|(index, entry)| {
            if hash_text(&entry.text) != entry.hash {
                Some(StringId::new(index as u32))
            } else {
                None
            }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (StringId, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (StringId::new(index as u32), &*entry.text))
    }
}
