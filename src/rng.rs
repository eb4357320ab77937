//! Seeded randomness for game setup.
//!
//! Everything random in a game (map layout, booster pool, tile positions) is
//! drawn from one [`Rng`] seeded from the `init` move, so replaying the same
//! move log always rebuilds the same game.

#![allow(clippy::cast_possible_truncation)]

/// Deterministic PRNG using xorshift64.
#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        // xorshift is stuck at zero
        let state = if seed == 0 { 0x5555_5555_5555_5555 } else { seed };
        Self { state }
    }

    /// Create an RNG from a textual seed such as `seed42`.
    #[must_use]
    pub fn from_seed_str(seed: &str) -> Self {
        Self::new(hash_seed(seed))
    }

    /// Generate next random u64.
    pub const fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random index in `[0, max)`.
    pub fn below(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % max as u64) as usize
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }

    /// Return a shuffled copy of `items`.
    #[must_use]
    pub fn shuffled<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        self.shuffle(&mut out);
        out
    }
}

/// Fold a seed string into a 64-bit seed.
///
/// Each byte goes through the splitmix finalizer so that seeds differing in a
/// single character land far apart.
#[must_use]
pub fn hash_seed(seed: &str) -> u64 {
    seed.bytes()
        .enumerate()
        .fold(0x9e37_79b9_7f4a_7c15, |acc, (i, b)| {
            mix(acc ^ u64::from(b), i as u64)
        })
}

fn mix(seed: u64, index: u64) -> u64 {
    let mut x = seed.wrapping_add(index);
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = Rng::from_seed_str("seed42");
        let mut rng2 = Rng::from_seed_str("seed42");

        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        assert_ne!(hash_seed("seed42"), hash_seed("seed43"));
        let mut rng1 = Rng::from_seed_str("a");
        let mut rng2 = Rng::from_seed_str("b");
        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_zero_seed_is_not_stuck() {
        let mut rng = Rng::new(0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = Rng::new(7);
        let mut items: Vec<u32> = (0..20).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_below_in_range() {
        let mut rng = Rng::new(99);
        for _ in 0..1000 {
            assert!(rng.below(6) < 6);
        }
        assert_eq!(rng.below(0), 0);
    }
}
