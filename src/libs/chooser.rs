use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform choices used to break ties.
pub trait Chooser {
    /// Returns an index in `0..len`. `len` is never zero.
    fn choose_index(&mut self, len: usize) -> usize;

    /// Picks one element of a non-empty slice
    fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T
    where
        Self: Sized,
    {
        &items[self.choose_index(items.len())]
    }
}

/// Seeded pseudo-random chooser, reproducible across runs with the same seed.
pub struct SeededChooser {
    rng: StdRng,
}

impl SeededChooser {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Chooser for SeededChooser {
    fn choose_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_in_range() {
        let mut chooser = SeededChooser::new(0);
        for len in 1..50 {
            assert!(chooser.choose_index(len) < len);
        }
        assert_eq!(chooser.choose_index(1), 0);
    }

    #[test]
    fn test_seeded_reproducible() {
        let mut a = SeededChooser::new(11);
        let mut b = SeededChooser::new(11);
        let xs: Vec<usize> = (0..20).map(|_| a.choose_index(1000)).collect();
        let ys: Vec<usize> = (0..20).map(|_| b.choose_index(1000)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_choose() {
        let mut chooser = SeededChooser::new(3);
        let items = ["a", "b", "c"];
        assert!(items.contains(chooser.choose(&items)));
    }
}
