// (s, k, j) iteration sequencer shared by every stream of the engine.
//
// Nested-loop order, j innermost:
//   for s in 1..=log2(N) { m = 2^s
//     for k in (0..N).step_by(m) {
//       for j in 0..m/2 { t = k + j + m/2 ; u = k + j } } }

use rhdl::prelude::*;

use crate::fft_params::{addr, stage, Addr, FftSize, Stage};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FftIters {
    pub s: Stage,
    pub k: Addr,
    pub j: Addr,
}

impl Default for FftIters {
    fn default() -> Self {
        Self::init()
    }
}

impl FftIters {
    /// First iteration of the first stage: {s=1, k=0, j=0}.
    #[inline(always)]
    pub fn init() -> Self {
        Self { s: stage(1), k: addr(0), j: addr(0) }
    }

    #[inline(always)]
    fn s_raw(&self) -> u32 {
        self.s.raw() as u32
    }

    /// m = 2^s
    #[inline(always)]
    pub fn m(&self) -> Addr {
        addr(1 << self.s_raw())
    }

    /// m/2
    #[inline(always)]
    pub fn m_1_2(&self) -> Addr {
        addr(1 << (self.s_raw() - 1))
    }

    /// (t_index, u_index) = (k + j + m/2, k + j)
    #[inline(always)]
    pub fn addresses(&self) -> (Addr, Addr) {
        let u_index = self.k + self.j;
        (u_index + self.m_1_2(), u_index)
    }

    /// j on its last value (m/2 - 1).
    #[inline(always)]
    pub fn j_last(&self) -> bool {
        self.j == self.m_1_2() - addr(1)
    }

    /// k on its last value (k + m >= N).
    #[inline(always)]
    pub fn k_last(&self, size: FftSize) -> bool {
        self.k + self.m() >= size.n_bits()
    }

    /// s on its last value (log2(N)).
    #[inline(always)]
    pub fn s_last(&self, size: FftSize) -> bool {
        self.s_raw() == size.log2n()
    }

    /// Next advance increments s.
    #[inline(always)]
    pub fn is_stage_boundary(&self, size: FftSize) -> bool {
        self.k_last(size) & self.j_last()
    }

    /// Very last butterfly of the transform.
    #[inline(always)]
    pub fn is_last(&self, size: FftSize) -> bool {
        self.s_last(size) & self.is_stage_boundary(size)
    }

    /// Advance one iteration. Past the last one this yields s = log2(N)+1.
    pub fn advance(&self, size: FftSize) -> Self {
        let mut ns = *self;
        if !self.j_last() {
            ns.j = self.j + addr(1);
        } else {
            ns.j = addr(0);
            if !self.k_last(size) {
                ns.k = self.k + self.m();
            } else {
                ns.k = addr(0);
                ns.s = self.s + stage(1);
            }
        }
        ns
    }
}
