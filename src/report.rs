use std::io::{self, Write};

use serde::Serialize;

use crate::{
    cache::{Access, CacheKind, IsCache},
    replace::Policy,
};

const WIDTH: usize = 105;

/// `100 * hits / (hits + misses)`, or zero before the first access.
pub fn hit_percentage(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        100.0 * hits as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    name: String,
    kind: CacheKind,
    policy: Option<Policy>,
    size: usize,
    line_size: usize,
    capacity: usize,
    sets: Option<usize>,
    hits: u64,
    misses: u64,
    hit_rate: f64,
    miss_rate: f64,
}

impl CacheStats {
    pub fn collect(name: &str, cache: &dyn IsCache) -> Self {
        let (hits, misses) = (cache.hit_count(), cache.miss_count());
        let hit_rate = hit_percentage(hits, misses);
        let miss_rate = if cache.counters().total() == 0 {
            0.0
        } else {
            100.0 - hit_rate
        };
        CacheStats {
            name: name.to_string(),
            kind: cache.kind(),
            policy: cache.policy(),
            size: cache.size(),
            line_size: cache.line_size(),
            capacity: cache.capacity(),
            sets: cache.set_count(),
            hits,
            misses,
            hit_rate,
            miss_rate,
        }
    }
}

/// Renders access events as a fixed-width table.
pub struct Reporter<W: Write> {
    out: W,
    hex: bool,
    quiet: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Reporter {
            out,
            hex: false,
            quiet: false,
        }
    }

    /// Print addresses as `0x…`.
    pub fn hex(mut self, hex: bool) -> Self {
        self.hex = hex;
        self
    }

    /// Skip per-access rows.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn addr(&self, addr: u64) -> String {
        if self.hex {
            format!("{addr:#x}")
        } else {
            addr.to_string()
        }
    }

    pub fn header(&mut self, name: &str, cache: &dyn IsCache) -> io::Result<()> {
        writeln!(self.out, "{:-^WIDTH$}", format!(" {name} "))?;
        write!(self.out, "{}", cache.kind())?;
        if let Some(policy) = cache.policy() {
            write!(self.out, " {policy}")?;
        }
        write!(
            self.out,
            ", size {}, line size {}, {} lines",
            cache.size(),
            cache.line_size(),
            cache.capacity()
        )?;
        if let Some(sets) = cache.set_count() {
            let ways = cache.capacity() / sets;
            write!(self.out, ", {sets} sets x {ways} ways")?;
        }
        writeln!(self.out)?;
        if !self.quiet {
            self.row(["address", "hit/miss", "id", "previous", "current"])?;
        }
        Ok(())
    }

    pub fn access(&mut self, access: &Access) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let previous = match access.previous {
            Some(addr) => self.addr(addr),
            None => "-1".to_string(),
        };
        let address = self.addr(access.address);
        let outcome = access.outcome.to_string();
        let id = access.id.to_string();
        let current = self.addr(access.current);
        self.row([&address, &outcome, &id, &previous, &current])
    }

    fn row(&mut self, cells: [&str; 5]) -> io::Result<()> {
        let [address, outcome, id, previous, current] = cells;
        writeln!(
            self.out,
            "{address:>25}{outcome:>20}{id:>10}{previous:>25}{current:>25}"
        )
    }

    pub fn footer(&mut self, cache: &dyn IsCache) -> io::Result<()> {
        let (hits, misses) = (cache.hit_count(), cache.miss_count());
        writeln!(
            self.out,
            "hits: {hits}, misses: {misses}, hit rate: {:.2}%",
            hit_percentage(hits, misses)
        )?;
        writeln!(self.out, "{:-<WIDTH$}", "")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
