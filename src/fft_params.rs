use rhdl::prelude::*;

use crate::error::{FftError, Result};

/// Largest supported transform (N < 2^16).
pub const FFT_MAX_LOG2N: u32 = 15;
pub const FFT_MAX_N: usize = 1 << FFT_MAX_LOG2N;

/// RAM addresses and k/j counters (0..=N).
pub type Addr = Bits<U16>;
/// Stage counter s (1..=log2(N)+1).
pub type Stage = Bits<U5>;

#[inline(always)]
pub fn addr(x: u32) -> Addr {
    bits(x as u128)
}

#[inline(always)]
pub fn stage(x: u32) -> Stage {
    bits(x as u128)
}

/// Validated transform size.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FftSize {
    n: u32,
    log2n: u32,
}

impl FftSize {
    pub fn new(n: usize) -> Result<Self> {
        if n < 2 || n > FFT_MAX_N {
            return Err(FftError::SizeOutOfRange(n));
        }
        if !n.is_power_of_two() {
            return Err(FftError::SizeNotPowerOfTwo(n));
        }
        Ok(Self {
            n: n as u32,
            log2n: n.trailing_zeros(),
        })
    }

    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n as usize
    }

    #[inline(always)]
    pub fn log2n(&self) -> u32 {
        self.log2n
    }

    /// N-1 as an address.
    #[inline(always)]
    pub fn last_index(&self) -> Addr {
        addr(self.n - 1)
    }

    /// N as a counter value (used as an "all done" bound).
    #[inline(always)]
    pub fn n_bits(&self) -> Addr {
        addr(self.n)
    }

    /// Butterflies per stage times number of stages.
    pub fn butterfly_count(&self) -> usize {
        (self.n as usize / 2) * self.log2n as usize
    }
}
