use std::{collections::VecDeque, mem};

use super::{Policy, Replace};

#[derive(Debug)]
pub struct Mru;

impl Replace for Mru {
    const POLICY: Policy = Policy::Mru;

    fn replace(set: &mut VecDeque<u64>, address: u64) -> Option<u64> {
        match set.back_mut() {
            Some(newest) => Some(mem::replace(newest, address)),
            None => {
                set.push_back(address);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrites_newest() {
        let mut set = VecDeque::from([1, 2, 3, 4]);
        assert_eq!(Mru::replace(&mut set, 5), Some(4));
        assert_eq!(set, [1, 2, 3, 5]);
    }
}
