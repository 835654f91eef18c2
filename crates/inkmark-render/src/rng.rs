//! Seeded randomness for textured pen styles.

/// Xorshift32 generator. Same seed, same sequence.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Random float in range [0, 1].
    pub fn next_unit(&mut self) -> f64 {
        self.next_u32() as f64 / u32::MAX as f64
    }

    /// Random float in range [-1, 1].
    pub fn next_f64(&mut self) -> f64 {
        self.next_unit() * 2.0 - 1.0
    }

    /// Random offset scaled by amount.
    pub fn offset(&mut self, amount: f64) -> f64 {
        self.next_f64() * amount
    }

    /// Random angle in radians.
    pub fn angle(&mut self) -> f64 {
        self.next_unit() * std::f64::consts::TAU
    }
}
