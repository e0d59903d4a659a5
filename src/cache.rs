use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::replace::Policy;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("invalid cache size {size} with line size {line_size}")]
    InvalidSize { size: usize, line_size: usize },
    #[error("no such replacement policy: {0}")]
    InvalidPolicy(u64),
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    #[serde(alias = "direct_mapped")]
    Direct,
    #[serde(alias = "set", alias = "associative")]
    SetAssociative,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Direct => write!(f, "direct-mapped"),
            CacheKind::SetAssociative => write!(f, "set-associative"),
        }
    }
}

/// Validated sizing shared by every cache kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    size: usize,
    line_size: usize,
    capacity: usize,
}

impl Geometry {
    pub fn new(size: usize, line_size: usize) -> Result<Self> {
        // is_power_of_two() is false for zero
        if !size.is_power_of_two() || !line_size.is_power_of_two() || line_size >= size {
            return Err(CacheError::InvalidSize { size, line_size });
        }
        Ok(Geometry {
            size,
            line_size,
            capacity: size / line_size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn line_size(&self) -> usize {
        self.line_size
    }

    /// Number of line slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    hits: u64,
    misses: u64,
}

impl Counters {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Hit => self.hit(),
            Outcome::Miss => self.miss(),
        }
    }

    pub fn reset(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit,
    Miss,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Hit => write!(f, "hit"),
            Outcome::Miss => write!(f, "miss"),
        }
    }
}

/// What a single access did to the cache.
///
/// `id` is the line index for a direct-mapped cache and the set index for a
/// set-associative one. `previous` is the occupant the access found in (or
/// pushed out of) that line or set, `None` when the slot was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub address: u64,
    pub outcome: Outcome,
    pub id: usize,
    pub previous: Option<u64>,
    pub current: u64,
}

pub trait IsCache {
    fn kind(&self) -> CacheKind;
    fn geometry(&self) -> &Geometry;
    fn counters(&self) -> &Counters;
    fn access(&mut self, address: u64) -> Access;
    fn clear(&mut self);
    /// Replaces the geometry and empties the cache. On error the cache is left as it was.
    fn resize(&mut self, size: usize, line_size: usize) -> Result<()>;

    fn set_count(&self) -> Option<usize> {
        None
    }

    /// Replacement policy, for kinds that make eviction decisions.
    fn policy(&self) -> Option<Policy> {
        None
    }

    fn size(&self) -> usize {
        self.geometry().size()
    }

    fn line_size(&self) -> usize {
        self.geometry().line_size()
    }

    fn capacity(&self) -> usize {
        self.geometry().capacity()
    }

    fn hit_count(&self) -> u64 {
        self.counters().hits()
    }

    fn miss_count(&self) -> u64 {
        self.counters().misses()
    }
}
