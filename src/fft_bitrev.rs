use rhdl::prelude::*;

use crate::fft_params::{addr, Addr};

/// Reflect the low `width` bits of `i`.
#[inline(always)]
pub fn reverse(i: Addr, width: u32) -> Addr {
    if width == 0 {
        return addr(0);
    }
    addr((i.raw() as u32).reverse_bits() >> (32 - width))
}
