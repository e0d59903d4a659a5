use crate::cache::{Access, CacheKind, Counters, Geometry, IsCache, Outcome, Result};

/// One slot per index; a miss always overwrites the colliding slot.
#[derive(Debug)]
pub struct DirectCache {
    geometry: Geometry,
    counters: Counters,
    slots: Vec<Option<u64>>,
}

impl DirectCache {
    pub fn new(size: usize, line_size: usize) -> Result<Self> {
        let geometry = Geometry::new(size, line_size)?;
        Ok(DirectCache {
            slots: vec![None; geometry.capacity()],
            geometry,
            counters: Counters::default(),
        })
    }

    pub fn index(&self, address: u64) -> usize {
        (address % self.geometry.capacity() as u64) as usize
    }

    pub fn slots(&self) -> &[Option<u64>] {
        &self.slots
    }
}

impl IsCache for DirectCache {
    fn kind(&self) -> CacheKind {
        CacheKind::Direct
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn counters(&self) -> &Counters {
        &self.counters
    }

    fn access(&mut self, address: u64) -> Access {
        let id = self.index(address);
        let slot = &mut self.slots[id];
        let previous = *slot;
        let outcome = if previous == Some(address) {
            Outcome::Hit
        } else {
            if let Some(victim) = previous {
                log::trace!("line {id}: {victim} replaced by {address}");
            }
            *slot = Some(address);
            Outcome::Miss
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
        self.slots.fill(None);
        self.counters.reset();
        log::debug!("cleared direct-mapped cache");
    }

    fn resize(&mut self, size: usize, line_size: usize) -> Result<()> {
        let geometry = Geometry::new(size, line_size)?;
        self.slots = vec![None; geometry.capacity()];
        self.geometry = geometry;
        self.counters.reset();
        log::debug!("resized direct-mapped cache to {size}/{line_size}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;

    #[test]
    fn test_repeat_access_hits() {
        let mut c = DirectCache::new(64, 4).unwrap();
        for addr in [0, 7, 123, 16, 1 << 40] {
            assert_eq!(c.access(addr).outcome, Outcome::Miss);
            let second = c.access(addr);
            assert_eq!(second.outcome, Outcome::Hit);
            assert_eq!(second.previous, Some(addr));
        }
        assert_eq!(c.hit_count() + c.miss_count(), 10);
    }

    #[test]
    fn test_scenario_colliding_addresses() {
        let mut c = DirectCache::new(16, 4).unwrap();
        assert_eq!(c.capacity(), 4);
        let events: Vec<_> = [0, 4, 8, 12, 0].into_iter().map(|a| c.access(a)).collect();
        assert!(events.iter().all(|e| e.outcome == Outcome::Miss));
        assert!(events.iter().all(|e| e.id == 0));
        assert_eq!(events[0].previous, None);
        assert_eq!(events[1].previous, Some(0));
        assert_eq!(events[4].previous, Some(12));
        assert_eq!((c.hit_count(), c.miss_count()), (0, 5));
        assert_eq!(c.slots(), &[Some(0), None, None, None]);
    }

    #[test]
    fn test_clear() {
        let mut c = DirectCache::new(16, 4).unwrap();
        for addr in 0..10 {
            c.access(addr);
        }
        c.clear();
        assert!(c.slots().iter().all(Option::is_none));
        assert_eq!((c.hit_count(), c.miss_count()), (0, 0));
        assert_eq!(c.capacity(), 4);
    }

    #[test]
    fn test_resize() {
        let mut c = DirectCache::new(16, 4).unwrap();
        c.access(1);
        c.resize(64, 8).unwrap();
        assert_eq!((c.size(), c.line_size(), c.capacity()), (64, 8, 8));
        assert_eq!(c.slots().len(), 8);
        assert_eq!(c.miss_count(), 0);
    }

    #[test]
    fn test_failed_resize_keeps_state() {
        let mut c = DirectCache::new(16, 4).unwrap();
        c.access(1);
        c.access(1);
        let slots = c.slots().to_vec();
        let (size, line_size) = (16, 16);
        assert_eq!(
            c.resize(size, line_size),
            Err(CacheError::InvalidSize { size, line_size })
        );
        assert_eq!((c.size(), c.line_size(), c.capacity()), (16, 4, 4));
        assert_eq!(c.slots(), &slots[..]);
        assert_eq!((c.hit_count(), c.miss_count()), (1, 1));
    }

    #[test]
    fn test_invalid_construction() {
        assert!(DirectCache::new(15, 4).is_err());
        assert!(DirectCache::new(16, 0).is_err());
    }
}
