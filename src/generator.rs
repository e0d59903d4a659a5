//! Random configurations and address streams for exercising the simulator.

use std::io::{self, Write};

use crate::{cache::CacheKind, config::CacheConfig, replace::Policy};

// Cache size is 2^(POW_MIN+1) ..= 2^POW_MAX, line size is always strictly smaller.
const POW_MIN: u32 = 0;
const POW_MAX: u32 = 16;

const LEN_MIN: usize = 16;
const LEN_MAX: usize = 4096;
const ADDR_MAX: u64 = 0xFFFF;

pub struct Generator {
    rng: fastrand::Rng,
}

impl Generator {
    pub fn new() -> Self {
        Generator {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Generator {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn config(&mut self) -> CacheConfig {
        let pow_size = self.rng.u32(POW_MIN + 1..=POW_MAX);
        let pow_line = self.rng.u32(POW_MIN..pow_size);
        CacheConfig {
            name: None,
            size: 1 << pow_size,
            kind: if self.rng.bool() {
                CacheKind::SetAssociative
            } else {
                CacheKind::Direct
            },
            line_size: 1 << pow_line,
            repl: if self.rng.bool() {
                Policy::Mru
            } else {
                Policy::Lru
            },
        }
    }

    pub fn addresses(&mut self) -> Vec<u64> {
        let len = self.rng.usize(LEN_MIN..=LEN_MAX);
        std::iter::repeat_with(|| self.rng.u64(0..=ADDR_MAX))
            .take(len)
            .collect()
    }

    /// Writes `config` in the four-line text record format.
    pub fn write_config(config: &CacheConfig, mut out: impl Write) -> io::Result<()> {
        let kind = match config.kind {
            CacheKind::Direct => 0,
            CacheKind::SetAssociative => 1,
        };
        let policy = match config.repl {
            Policy::Lru => 0,
            Policy::Mru => 1,
        };
        let (size, line_size) = (config.size, config.line_size);
        writeln!(out, "{size}\n{kind}\n{line_size}\n{policy}")
    }

    pub fn write_addresses(addrs: &[u64], mut out: impl Write) -> io::Result<()> {
        for addr in addrs {
            writeln!(out, "{addr}")?;
        }
        Ok(())
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}
