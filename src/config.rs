use std::{fs, io, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    assoc::SetAssocCache,
    cache::{CacheError, CacheKind, IsCache},
    direct::DirectCache,
    replace::{lru::Lru, mru::Mru, Policy},
};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config record: {0}")]
    Record(String),
    #[error("invalid cache type in config record: {0}")]
    InvalidKind(u64),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub size: usize,
    pub kind: CacheKind,
    pub line_size: usize,
    #[serde(default)]
    pub repl: Policy,
}

impl CacheConfig {
    /// Parses the plain-text record: `size kind line_size policy`, whitespace separated.
    pub fn from_record(record: &str) -> Result<Self, LoadError> {
        let fields = record
            .split_whitespace()
            .map(|f| f.parse::<u64>().map_err(|_| not_a_number(f)))
            .collect::<Result<Vec<_>, _>>()?;
        let &[size, kind, line_size, policy] = fields.as_slice() else {
            return Err(LoadError::Record(format!(
                "expected 4 fields (size, kind, line size, policy), found {}",
                fields.len()
            )));
        };
        let kind = match kind {
            0 => CacheKind::Direct,
            1 => CacheKind::SetAssociative,
            other => return Err(LoadError::InvalidKind(other)),
        };
        Ok(CacheConfig {
            name: None,
            size: to_usize(size)?,
            kind,
            line_size: to_usize(line_size)?,
            repl: Policy::try_from(policy)?,
        })
    }

    pub fn build(&self) -> Result<Box<dyn IsCache>, CacheError> {
        let (size, line_size) = (self.size, self.line_size);
        let cache: Box<dyn IsCache> = match (self.kind, self.repl) {
            (CacheKind::Direct, _) => Box::new(DirectCache::new(size, line_size)?),
            (CacheKind::SetAssociative, Policy::Lru) => {
                Box::new(SetAssocCache::<Lru>::new(size, line_size)?)
            }
            (CacheKind::SetAssociative, Policy::Mru) => {
                Box::new(SetAssocCache::<Mru>::new(size, line_size)?)
            }
        };
        Ok(cache)
    }
}

fn not_a_number(field: &str) -> LoadError {
    LoadError::Record(format!("`{field}` is not an unsigned integer"))
}

fn to_usize(value: u64) -> Result<usize, LoadError> {
    usize::try_from(value)
        .map_err(|_| LoadError::Record(format!("{value} does not fit in usize")))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub caches: Vec<CacheConfig>,
}

/// A configured cache and the name it is reported under.
pub struct Instance {
    pub name: String,
    pub cache: Box<dyn IsCache>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Config::parse(&fs::read_to_string(path)?)
    }

    /// JSON when the text starts with `{`, a single text record otherwise.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        if text.trim_start().starts_with('{') {
            Ok(serde_json::from_str(text)?)
        } else {
            Ok(Config {
                caches: vec![CacheConfig::from_record(text)?],
            })
        }
    }

    pub fn to_caches(self) -> Result<Vec<Instance>, LoadError> {
        if self.caches.is_empty() {
            return Err(LoadError::Record("no caches configured".to_string()));
        }
        self.caches
            .into_iter()
            .enumerate()
            .map(|(i, cc)| -> Result<Instance, LoadError> {
                let cache = cc.build()?;
                let name = cc.name.unwrap_or_else(|| format!("cache{i}"));
                log::info!(
                    "built {name}: {} {}/{} ({} lines)",
                    cache.kind(),
                    cache.size(),
                    cache.line_size(),
                    cache.capacity()
                );
                Ok(Instance { name, cache })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_err(record: &str) -> LoadError {
        CacheConfig::from_record(record).unwrap_err()
    }

    #[test]
    fn test_record() {
        let cc = CacheConfig::from_record("16\n1\n4\n1\n").unwrap();
        assert_eq!(
            cc,
            CacheConfig {
                name: None,
                size: 16,
                kind: CacheKind::SetAssociative,
                line_size: 4,
                repl: Policy::Mru,
            }
        );
        let cc = CacheConfig::from_record("  1024 0 8 0").unwrap();
        assert_eq!((cc.kind, cc.repl), (CacheKind::Direct, Policy::Lru));
    }

    #[test]
    fn test_record_errors() {
        assert!(matches!(record_err("16 1 4"), LoadError::Record(_)));
        assert!(matches!(record_err("16 1 4 0 9"), LoadError::Record(_)));
        assert!(matches!(record_err("16 x 4 0"), LoadError::Record(_)));
        assert!(matches!(record_err("16 -1 4 0"), LoadError::Record(_)));
        assert!(matches!(record_err("16 2 4 0"), LoadError::InvalidKind(2)));
        assert!(matches!(
            record_err("16 1 4 7"),
            LoadError::Cache(CacheError::InvalidPolicy(7))
        ));
    }

    #[test]
    fn test_json() {
        let config = Config::parse(
            r#"{
                "caches": [
                    { "name": "l1d", "size": 1024, "kind": "direct", "line_size": 16 },
                    { "size": 4096, "kind": "set_associative", "line_size": 32, "repl": "mru" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.caches.len(), 2);
        assert_eq!(config.caches[0].name.as_deref(), Some("l1d"));
        assert_eq!(config.caches[0].repl, Policy::Lru);
        assert_eq!(config.caches[1].repl, Policy::Mru);

        let caches = config.to_caches().unwrap();
        assert_eq!(caches[0].name, "l1d");
        assert_eq!(caches[1].name, "cache1");
        assert_eq!(caches[0].cache.kind(), CacheKind::Direct);
        assert_eq!(caches[0].cache.policy(), None);
        assert_eq!(caches[1].cache.kind(), CacheKind::SetAssociative);
        assert_eq!(caches[1].cache.policy(), Some(Policy::Mru));
        assert_eq!(caches[1].cache.capacity(), 128);
        assert_eq!(caches[1].cache.set_count(), Some(6));
    }

    #[test]
    fn test_json_errors() {
        let text = r#"{"caches": [{"size": 16, "kind": "direct", "line_size": 4, "repl": "x"}]}"#;
        assert!(matches!(Config::parse(text), Err(LoadError::Json(_))));
        let text = r#"{"caches": [{"size": 16, "kind": "full", "line_size": 4}]}"#;
        assert!(matches!(Config::parse(text), Err(LoadError::Json(_))));
        let empty = Config::parse(r#"{"caches": []}"#).unwrap();
        assert!(matches!(empty.to_caches(), Err(LoadError::Record(_))));
    }

    #[test]
    fn test_invalid_size_rejected_at_build() {
        let config = Config::parse("16 0 16 0").unwrap();
        let err = config.to_caches().err();
        assert!(matches!(err, Some(LoadError::Cache(CacheError::InvalidSize { size: 16, .. }))));
    }
}
