#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        (out as f64 / 4_294_967_296.0) as f32
    }

    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        (min + (self.next_f32() * span).floor() as i32).min(max)
    }

    pub fn bool(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    /// Uniform draw in `[0, 100)`.
    pub fn percent(&mut self) -> f32 {
        (self.next_f32() * 100.0).min(99.999)
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }

    /// Picks an index with probability proportional to its weight.
    /// Returns `None` when every weight is zero.
    pub fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|w| *w as u64).sum();
        if total == 0 {
            return None;
        }
        let mut target = (self.next_f32() as f64 * total as f64).floor() as u64;
        target = target.min(total - 1);
        for (idx, weight) in weights.iter().enumerate() {
            let weight = *weight as u64;
            if target < weight {
                return Some(idx);
            }
            target -= weight;
        }
        weights.iter().rposition(|w| *w > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_replays_the_same_stream() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
        }
    }

    #[test]
    fn int_stays_inside_inclusive_range() {
        let mut rng = Rng::new(7);
        for _ in 0..2_000 {
            let value = rng.int(-1, 1);
            assert!((-1..=1).contains(&value));
        }
        assert_eq!(rng.int(5, 5), 5);
        assert_eq!(rng.int(5, 2), 5);
    }

    #[test]
    fn percent_is_below_one_hundred() {
        let mut rng = Rng::new(9);
        for _ in 0..5_000 {
            let roll = rng.percent();
            assert!((0.0..100.0).contains(&roll));
        }
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let mut rng = Rng::new(11);
        for _ in 0..2_000 {
            let idx = rng.weighted_index(&[0, 5, 0, 3]).expect("non-zero total");
            assert!(idx == 1 || idx == 3);
        }
        assert_eq!(rng.weighted_index(&[0, 0]), None);
        assert_eq!(rng.weighted_index(&[]), None);
    }
}
