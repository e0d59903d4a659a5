use std::{collections::VecDeque, marker::PhantomData};

use crate::{
    cache::{Access, CacheKind, Counters, Geometry, IsCache, Outcome, Result},
    replace::{Policy, Replace},
};

/// Number of sets for a cache with `capacity` lines.
///
/// The set count tracks log2 of the capacity rounded down to an even number,
/// which keeps sets and ways roughly balanced. It is never zero.
pub fn derive_set_count(capacity: usize) -> usize {
    if capacity <= 1 {
        return 1;
    }
    let k = capacity.ilog2() as usize;
    let sets = if k % 2 == 0 { k } else { k - 1 };
    sets.max(1)
}

#[derive(Debug)]
pub struct SetAssocCache<R: Replace> {
    geometry: Geometry,
    counters: Counters,
    set_count: usize,
    ways: usize,
    sets: Vec<VecDeque<u64>>,
    _repl: PhantomData<R>,
}

impl<R: Replace> SetAssocCache<R> {
    pub fn new(size: usize, line_size: usize) -> Result<Self> {
        let geometry = Geometry::new(size, line_size)?;
        let set_count = derive_set_count(geometry.capacity());
        let ways = geometry.capacity() / set_count;
        Ok(SetAssocCache {
            geometry,
            counters: Counters::default(),
            set_count,
            ways,
            sets: Self::empty_sets(set_count, ways),
            _repl: PhantomData,
        })
    }

    fn empty_sets(set_count: usize, ways: usize) -> Vec<VecDeque<u64>> {
        std::iter::repeat_with(|| VecDeque::with_capacity(ways))
            .take(set_count)
            .collect()
    }

    pub fn index(&self, address: u64) -> usize {
        (address % self.set_count as u64) as usize
    }

    pub fn ways(&self) -> usize {
        self.ways
    }

    /// Contents of set `id`, oldest first.
    pub fn set(&self, id: usize) -> &VecDeque<u64> {
        &self.sets[id]
    }
}

impl<R: Replace> IsCache for SetAssocCache<R> {
    fn kind(&self) -> CacheKind {
        CacheKind::SetAssociative
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn counters(&self) -> &Counters {
        &self.counters
    }

    fn set_count(&self) -> Option<usize> {
        Some(self.set_count)
    }

    fn policy(&self) -> Option<Policy> {
        Some(R::POLICY)
    }

    fn access(&mut self, address: u64) -> Access {
        let id = self.index(address);
        let ways = self.ways;
        let set = &mut self.sets[id];

        let (outcome, previous) = if let Some(pos) = set.iter().position(|&a| a == address) {
            set.remove(pos);
            set.push_back(address);
            (Outcome::Hit, Some(address))
        } else if set.len() < ways {
            set.push_back(address);
            (Outcome::Miss, None)
        } else {
            let victim = R::replace(set, address);
            if let Some(victim) = victim {
                log::trace!("set {id}: {} evicted {victim} for {address}", R::POLICY);
            }
            (Outcome::Miss, victim)
        };

        self.counters.record(outcome);
        Access {
            address,
            outcome,
            id,
            previous,
            current: address,
        }
    }

    fn clear(&mut self) {
        self.sets.iter_mut().for_each(VecDeque::clear);
        self.counters.reset();
        log::debug!("cleared set-associative cache");
    }

    fn resize(&mut self, size: usize, line_size: usize) -> Result<()> {
        let geometry = Geometry::new(size, line_size)?;
        let set_count = derive_set_count(geometry.capacity());
        let ways = geometry.capacity() / set_count;
        self.geometry = geometry;
        self.set_count = set_count;
        self.ways = ways;
        self.sets = Self::empty_sets(set_count, ways);
        self.counters.reset();
        log::debug!("resized set-associative cache to {set_count} sets x {ways} ways");
        Ok(())
    }
}
