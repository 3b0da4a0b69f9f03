//! Core identifier types for the source model.
//!
//! Every cross-reference in the store is a typed index into a specific
//! arena, never a pointer. Entity ids are dense and zero-based, equal to
//! insertion order, and are stable for the lifetime of the owning
//! [`Project`](crate::Project).

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

use crate::model::ArenaIndex;

/// Id of an interned string in the [`StringPool`](crate::StringPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringId(u32);

/// Index of a file entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(u32);

/// Index of a function entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionId(u32);

/// Index of a class entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassId(u32);

/// Index of a variable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableId(u32);

/// Id of a node in the [`HierarchyTree`](crate::graph::HierarchyTree).
///
/// Non-zero so that `Option<NodeId>` costs nothing; "no parent" replaces
/// the reserved-zero sentinel of older tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(NonZeroU32);

macro_rules! dense_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: u32) -> Self {
                Self(value)
            }

            pub fn value(self) -> u32 {
                self.0
            }
        }

        impl ArenaIndex for $name {
            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

dense_id!(StringId);
dense_id!(FileId);
dense_id!(FunctionId);
dense_id!(ClassId);
dense_id!(VariableId);

impl NodeId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(self) -> u32 {
        self.0.get()
    }

    /// Arena slot backing this id.
    pub(crate) fn slot(self) -> usize {
        (self.0.get() - 1) as usize
    }

    pub(crate) fn from_slot(slot: usize) -> Self {
        Self(NonZeroU32::new(slot as u32 + 1).expect("slot + 1 is non-zero"))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.get())
    }
}

/// Source language of a file, stored in snapshots as a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Language {
    Unknown = 0,
    C = 1,
    Cpp = 2,
    Java = 3,
    Python = 4,
    Rust = 5,
}

impl Language {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::C),
            2 => Some(Self::Cpp),
            3 => Some(Self::Java),
            4 => Some(Self::Python),
            5 => Some(Self::Rust),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Java => "java",
            Self::Python => "python",
            Self::Rust => "rust",
        }
    }
}

/// Which dependency list a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    Include,
    FunctionCall,
    Type,
}

impl DependencyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::FunctionCall => "function-call",
            Self::Type => "type",
        }
    }
}

/// Lifecycle phase of a [`Project`](crate::Project).
///
/// Writes are only legal while `Building`. A successful validation seals
/// the project; a failed one poisons it. Neither transition reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Building,
    Sealed,
    Corrupt,
}
