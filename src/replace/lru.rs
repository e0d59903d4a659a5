use std::collections::VecDeque;

use super::{Policy, Replace};

#[derive(Debug)]
pub struct Lru;

impl Replace for Lru {
    const POLICY: Policy = Policy::Lru;

    fn replace(set: &mut VecDeque<u64>, address: u64) -> Option<u64> {
        // Oldest entry sits at the front
        let victim = set.pop_front();
        set.push_back(address);
        victim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let mut set = VecDeque::from([1, 2, 3, 4]);
        assert_eq!(Lru::replace(&mut set, 5), Some(1));
        assert_eq!(set, [2, 3, 4, 5]);
    }
}
