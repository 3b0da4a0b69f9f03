//! Entity records and the generic arena that stores them.
//!
//! Files, functions, classes, and variables are fixed-shape records living
//! in per-kind [`EntityArena`]s. Records reference interned strings and
//! each other exclusively through typed indices, which keeps the whole
//! model relocation-safe and trivially serializable.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use crate::types::{ClassId, FileId, FunctionId, Language, StringId};

/// Typed index into an [`EntityArena`].
pub trait ArenaIndex: Copy {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

/// Contiguous range `[start, start + count)` into an entity arena,
/// recording which entities a file declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityRange {
    pub start: u32,
    pub count: u32,
}

impl EntityRange {
    pub fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }

    /// One past the last index. Widened to `u64` so `start + count`
    /// near `u32::MAX` cannot wrap.
    pub fn end(self) -> u64 {
        self.start as u64 + self.count as u64
    }

    pub fn is_empty(self) -> bool {
        self.count == 0
    }

    /// Whether the whole range lies within an arena of `len` entries.
    pub fn fits(self, len: usize) -> bool {
        self.is_empty() || self.end() <= len as u64
    }
}

/// A named measurement attached to a file, e.g. `loc = 412.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: StringId,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: StringId,
    pub language: Language,
    /// Declared-entity ranges into the function/class/variable arenas.
    pub functions: EntityRange,
    pub classes: EntityRange,
    pub variables: EntityRange,
    pub metrics: Vec<Metric>,
}

impl SourceFile {
    pub fn new(path: StringId, language: Language) -> Self {
        Self {
            path,
            language,
            functions: EntityRange::default(),
            classes: EntityRange::default(),
            variables: EntityRange::default(),
            metrics: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: StringId,
    pub signature: StringId,
    pub file: FileId,
    /// Owning class when this function is a method.
    pub class: Option<ClassId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: StringId,
    pub file: FileId,
    /// Indices of this class's methods. Owned by the record and
    /// deep-copied on insert; never shared with the caller's buffer.
    pub methods: Vec<FunctionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: StringId,
    pub type_name: StringId,
    pub file: FileId,
    /// Enclosing function for locals; `None` for file-scope variables.
    pub scope: Option<FunctionId>,
}

/// Growable, index-addressed entity collection. Indices are dense, equal
/// to insertion order, and never recycled.
#[derive(Debug, Clone)]
pub struct EntityArena<I, T> {
    items: Vec<T>,
    _marker: PhantomData<I>,
}

impl<I: ArenaIndex, T> EntityArena<I, T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// Append `item`, returning its permanent index.
    pub fn push(&mut self, item: T) -> I {
        let index = I::from_index(self.items.len());
        self.items.push(item);
        index
    }

    pub fn get(&self, index: I) -> Option<&T> {
        self.items.get(index.index())
    }

    pub fn get_mut(&mut self, index: I) -> Option<&mut T> {
        self.items.get_mut(index.index())
    }

    pub fn contains(&self, index: I) -> bool {
        index.index() < self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| (I::from_index(index), item))
    }
}

impl<I: ArenaIndex, T> Default for EntityArena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}
