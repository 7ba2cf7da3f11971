//! Local entity keys.
//!
//! Entities created on the client exist locally before the server assigns
//! them an identifier. Until then they are addressed by a [`TempId`]; a
//! [`Key`] names an entity either way.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-minted placeholder identifier. Never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TempId(u64);

impl TempId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}", self.0)
    }
}

/// Source of temporary identifiers, unique for the lifetime of the allocator.
#[derive(Debug, Clone, Default)]
pub struct TempIds {
    next: u64,
}

impl TempIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self) -> TempId {
        self.next += 1;
        TempId(self.next)
    }
}

/// Local handle of an entity: speculative (`Temp`) or server-assigned (`Real`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key<I> {
    Temp(TempId),
    Real(I),
}

impl<I: Copy> Key<I> {
    pub fn is_temp(&self) -> bool {
        matches!(self, Key::Temp(_))
    }

    pub fn real(&self) -> Option<I> {
        match self {
            Key::Real(id) => Some(*id),
            Key::Temp(_) => None,
        }
    }

    pub fn temp(&self) -> Option<TempId> {
        match self {
            Key::Temp(temp) => Some(*temp),
            Key::Real(_) => None,
        }
    }
}

impl<I> From<I> for Key<I> {
    fn from(id: I) -> Self {
        Key::Real(id)
    }
}

impl<I: fmt::Display> fmt::Display for Key<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Temp(temp) => write!(f, "{}", temp),
            Key::Real(id) => write!(f, "{}", id),
        }
    }
}
