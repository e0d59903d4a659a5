pub mod lru;
pub mod mru;

use std::{collections::VecDeque, fmt};

use serde::{Deserialize, Serialize};

use crate::cache::CacheError;

/// Eviction decision for a full set.
///
/// Sets are kept in least-to-most recent order, front to back.
pub trait Replace {
    const POLICY: Policy;

    /// Makes room for `address` in a full `set` and returns the entry that left it.
    fn replace(set: &mut VecDeque<u64>, address: u64) -> Option<u64>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    #[default]
    Lru,
    Mru,
}

impl TryFrom<u64> for Policy {
    type Error = CacheError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Policy::Lru),
            1 => Ok(Policy::Mru),
            _ => Err(CacheError::InvalidPolicy(value)),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Lru => write!(f, "LRU"),
            Policy::Mru => write!(f, "MRU"),
        }
    }
}
