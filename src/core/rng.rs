//! Deterministic pseudo-random generator for test-controlled randomness (wallet addresses,
//! scenario data). Never consulted by validation.
//!
//! The generator is mulberry32: a pure step function `(state) -> (next_state, value)` wrapped in
//! an owned value. The output stream is fully determined by the seed and the number of draws,
//! so capturing `state()` and later calling `set_state()` resumes the exact same stream.

use rand::RngCore;

/// Default seed used when none is configured.
pub const DEFAULT_SEED: u32 = 0;

const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;

/// One mulberry32 step. Returns the next state and the drawn value.
pub fn mulberry32_step(state: u32) -> (u32, u32) {
    let next = state.wrapping_add(MULBERRY_INCREMENT);
    let mut t = next;
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    (next, t ^ (t >> 14))
}

/// Owned mulberry32 generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorRng {
    state: u32,
}

impl EmulatorRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Current continuation point. Feeding it to `set_state` replays the same future draws.
    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn set_state(&mut self, state: u32) {
        self.state = state;
    }

    pub fn next_draw(&mut self) -> u32 {
        let (next, value) = mulberry32_step(self.state);
        self.state = next;
        value
    }

    /// Draw scaled into `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        f64::from(self.next_draw()) / 4_294_967_296.0
    }
}

impl Default for EmulatorRng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for EmulatorRng {
    fn next_u32(&mut self) -> u32 {
        self.next_draw()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_draw());
        let lo = u64::from(self.next_draw());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_draw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
