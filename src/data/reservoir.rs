// ============================================================
// Layer 4 — Reservoir Sampler
// ============================================================
// A fixed-capacity bag that approximates "what has been seen
// recently" in an unbounded stream.
//
//   add(item)       append while filling; once full, overwrite
//                   one uniformly chosen slot
//   get_n_items(k)  up to k items, without replacement by slot
//   pop()           remove one uniformly chosen item
//
// Memory is O(capacity) no matter how long the stream runs.
// Random replacement favours recent insertions, so the sample
// is not uniform over the whole stream.
//
// The random source is passed into each call rather than
// owned, so the caller decides whether runs are seeded.
//
// Reference: Vitter (1985) Random Sampling with a Reservoir
//            rand crate documentation (seq::index::sample)

use rand::{seq::index, Rng};

use crate::domain::error::{PipelineError, Result};

pub const DEFAULT_CAPACITY: usize = 65_536;

#[derive(Debug, Clone)]
pub struct ReservoirSampler<T> {
    items:    Vec<T>,
    capacity: usize,
}

impl<T> ReservoirSampler<T> {
    /// Create an empty reservoir. A zero capacity is rejected.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PipelineError::config("reservoir_capacity must be > 0"));
        }
        Ok(Self {
            items: Vec::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        })
    }

    /// Insert `item`, evicting a random slot when full.
    pub fn add<R: Rng + ?Sized>(&mut self, item: T, rng: &mut R) {
        if self.items.len() < self.capacity {
            self.items.push(item);
        } else {
            let slot = rng.gen_range(0..self.items.len());
            self.items[slot] = item;
        }
    }

    /// Remove and return one uniformly chosen item.
    pub fn pop<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let slot = rng.gen_range(0..self.items.len());
        Some(self.items.swap_remove(slot))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once the reservoir holds more than `capacity - margin` items.
    pub fn is_nearly_full(&self, margin: usize) -> bool {
        self.items.len() > self.capacity.saturating_sub(margin)
    }
}

impl<T: Clone> ReservoirSampler<T> {
    /// Up to `k` items drawn without replacement. Returns every
    /// item (in random order) when `k >= len()`.
    pub fn get_n_items<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Vec<T> {
        let amount = k.min(self.items.len());
        index::sample(rng, self.items.len(), amount)
            .into_iter()
            .map(|slot| self.items[slot].clone())
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(ReservoirSampler::<u32>::new(0).is_err());
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut rs  = ReservoirSampler::new(10).unwrap();

        for i in 0..25u32 {
            rs.add(i, &mut rng);
            assert!(rs.len() <= 10);
        }
        assert_eq!(rs.len(), 10);
    }

    #[test]
    fn test_overflow_keeps_recent_items() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut rs  = ReservoirSampler::new(3).unwrap();
        for i in 0..3u32 {
            rs.add(i, &mut rng);
        }
        rs.add(99, &mut rng);

        // The newest item always replaces some slot
        let all = rs.get_n_items(3, &mut rng);
        assert!(all.contains(&99));
        assert_eq!(rs.len(), 3);
    }

    #[test]
    fn test_get_more_than_size_returns_everything_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut rs  = ReservoirSampler::new(100).unwrap();
        for i in 0..5u32 {
            rs.add(i, &mut rng);
        }

        let got = rs.get_n_items(50, &mut rng);
        assert_eq!(got.len(), 5);
        let unique: HashSet<_> = got.into_iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_get_from_empty_is_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        let rs      = ReservoirSampler::<String>::new(4).unwrap();
        assert!(rs.get_n_items(2, &mut rng).is_empty());
    }

    #[test]
    fn test_duplicate_values_occupy_separate_slots() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut rs  = ReservoirSampler::new(4).unwrap();
        rs.add("extra", &mut rng);
        rs.add("extra", &mut rng);
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.get_n_items(2, &mut rng), vec!["extra", "extra"]);
    }

    #[test]
    fn test_pop_drains_then_reports_empty() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut rs  = ReservoirSampler::new(4).unwrap();
        rs.add(1u32, &mut rng);
        rs.add(2u32, &mut rng);

        let mut popped = vec![rs.pop(&mut rng).unwrap(), rs.pop(&mut rng).unwrap()];
        popped.sort();
        assert_eq!(popped, vec![1, 2]);
        assert_eq!(rs.pop(&mut rng), None);
    }

    #[test]
    fn test_nearly_full_margin() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut rs  = ReservoirSampler::new(5).unwrap();
        assert!(!rs.is_nearly_full(2));
        for i in 0..4u32 {
            rs.add(i, &mut rng);
        }
        // 4 > 5 - 2
        assert!(rs.is_nearly_full(2));
        // margin larger than capacity: any item counts
        let mut small = ReservoirSampler::new(2).unwrap();
        small.add(0u32, &mut rng);
        assert!(small.is_nearly_full(100));
    }
}
