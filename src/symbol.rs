//! Symbol table mapping interned names to the file that declares them.
//!
//! Lookups are last-writer-wins: when two symbols share a name id, `find`
//! returns the most recently registered location. This mirrors the
//! behavior analyzers have depended on historically; see DESIGN.md before
//! changing it to a multimap.

use std::collections::HashMap;

use crate::error::SymbolTableError;
use crate::types::{FileId, StringId};

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<StringId, FileId>,
    /// Hard ceiling on distinct names; `None` means unbounded.
    limit: Option<usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            limit: None,
        }
    }

    /// Table that refuses registrations past `limit` distinct names.
    /// Registration failure is the store's one soft error path.
    pub fn with_limit(capacity: usize, limit: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(limit)),
            limit: Some(limit),
        }
    }

    /// Register `symbol` as declared in `file`. Re-registering an existing
    /// name overwrites the previous location.
    pub fn add(&mut self, symbol: StringId, file: FileId) -> Result<(), SymbolTableError> {
        if let Some(limit) = self.limit {
            if self.entries.len() >= limit && !self.entries.contains_key(&symbol) {
                return Err(SymbolTableError::LimitExceeded { limit });
            }
        }
        self.entries.insert(symbol, file);
        Ok(())
    }

    /// File that most recently declared `symbol`.
    pub fn find(&self, symbol: StringId) -> Option<FileId> {
        self.entries.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StringId, FileId)> + '_ {
        self.entries.iter().map(|(&name, &file)| (name, file))
    }
}
