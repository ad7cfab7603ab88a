use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Source of the random tie-breaks used by the placement passes
pub trait SlotRng {
    /// Index in `0..len`; `len` is never zero
    fn pick(&mut self, len: usize) -> usize;

    fn shuffle<T>(&mut self, items: &mut [T]);

    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.pick(items.len()))
        }
    }
}

/// `StdRng` that remembers its seed so a run can be reproduced
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: u64,
    rng: StdRng,
}

impl SeededRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::thread_rng().gen())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl SlotRng for SeededRng {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Deterministic source: never reorders, always picks the first option
#[derive(Debug, Clone, Copy, Default)]
pub struct InOrder;

impl SlotRng for InOrder {
    fn pick(&mut self, _len: usize) -> usize {
        0
    }

    fn shuffle<T>(&mut self, _items: &mut [T]) {}
}
