// Numeric profiles, complex samples and the 2-point butterfly with its
// omega LUT. The scheduler never looks inside any of this; it only moves
// `Sample<P>` values and the (s, j) tags around.

use core::fmt::Debug;
use std::f64::consts::PI;

use rhdl::prelude::*;

use crate::fft_params::{Addr, FftSize, Stage};

/// 16-bit fixed-point data word.
pub type Fixed = SignedBits<U16>;
/// Wide intermediate for products.
pub type FixedWide = SignedBits<U32>;

/// Twiddles are Q1.15 in the fixed-point profile.
pub const TWIDDLE_FRAC_BITS: usize = 15;
pub const TWIDDLE_ONE: i32 = (1 << TWIDDLE_FRAC_BITS) - 1;

#[inline(always)]
pub fn s16(x: i32) -> Fixed {
    signed::<U16>(x.clamp(i16::MIN as i32, i16::MAX as i32) as i128)
}
#[inline(always)]
pub fn s32(x: i64) -> FixedWide {
    signed::<U32>(x as i128)
}

/// Selects the data word of a sample and the arithmetic the butterfly
/// uses on it.
pub trait NumericProfile: Copy + Clone + Default + Debug + PartialEq + 'static {
    type Data: Copy + Clone + Default + Debug + PartialEq;

    const NAME: &'static str;

    /// Quantize a data value (saturating where the profile has a range).
    fn from_f64(x: f64) -> Self::Data;
    /// Quantize a twiddle component in [-1, 1].
    fn twiddle_from_f64(x: f64) -> Self::Data;
    fn to_f64(x: Self::Data) -> f64;

    fn add(a: Self::Data, b: Self::Data) -> Self::Data;
    fn sub(a: Self::Data, b: Self::Data) -> Self::Data;
    fn abs(a: Self::Data) -> Self::Data;
    /// Complex product `x * w` where `w` is a twiddle.
    fn cmul(x: Sample<Self>, w: Sample<Self>) -> Sample<Self>;

    fn encode_le(x: Self::Data, out: &mut Vec<u8>);
}

/// Complex (real, imaginary) pair.
#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct Sample<P: NumericProfile> {
    pub real: P::Data,
    pub imag: P::Data,
}

impl<P: NumericProfile> Sample<P> {
    #[inline(always)]
    pub fn new(real: P::Data, imag: P::Data) -> Self {
        Self { real, imag }
    }

    pub fn from_f64(real: f64, imag: f64) -> Self {
        Self::new(P::from_f64(real), P::from_f64(imag))
    }

    pub fn to_f64(&self) -> (f64, f64) {
        (P::to_f64(self.real), P::to_f64(self.imag))
    }

    #[inline(always)]
    pub fn add(self, o: Self) -> Self {
        Self::new(P::add(self.real, o.real), P::add(self.imag, o.imag))
    }

    #[inline(always)]
    pub fn sub(self, o: Self) -> Self {
        Self::new(P::sub(self.real, o.real), P::sub(self.imag, o.imag))
    }

    /// Little-endian real then imaginary.
    pub fn encode_le(&self, out: &mut Vec<u8>) {
        P::encode_le(self.real, out);
        P::encode_le(self.imag, out);
    }
}

/// Cheap magnitude used for display: |re| + |im|.
pub fn fake_power<P: NumericProfile>(x: Sample<P>) -> P::Data {
    P::add(P::abs(x.real), P::abs(x.imag))
}

// -----------------------------------------------------------------------------
// Profiles
// -----------------------------------------------------------------------------

/// 16-bit signed integer data, Q1.15 twiddles, wrapping like the hardware.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Fixed16;

/// Round-half-up Q15 product, truncated back to 16 bits.
#[inline(always)]
fn q15_round(acc: FixedWide) -> Fixed {
    // TWIDDLE_FRAC_BITS = 15
    ((acc + s32(1 << 14)) >> 15).resize::<U16>()
}

impl NumericProfile for Fixed16 {
    type Data = Fixed;

    const NAME: &'static str = "fixed16";

    fn from_f64(x: f64) -> Fixed {
        s16(x.round().clamp(i16::MIN as f64, i16::MAX as f64) as i32)
    }

    fn twiddle_from_f64(x: f64) -> Fixed {
        s16((x * TWIDDLE_ONE as f64).round() as i32)
    }

    fn to_f64(x: Fixed) -> f64 {
        x.raw() as f64
    }

    #[inline(always)]
    fn add(a: Fixed, b: Fixed) -> Fixed {
        (a.resize::<U17>() + b.resize::<U17>()).resize::<U16>()
    }

    #[inline(always)]
    fn sub(a: Fixed, b: Fixed) -> Fixed {
        (a.resize::<U17>() - b.resize::<U17>()).resize::<U16>()
    }

    fn abs(a: Fixed) -> Fixed {
        signed::<U16>((a.raw() as i16).wrapping_abs() as i128)
    }

    fn cmul(x: Sample<Self>, w: Sample<Self>) -> Sample<Self> {
        let xr: FixedWide = x.real.resize::<U32>();
        let xi: FixedWide = x.imag.resize::<U32>();
        let wr: FixedWide = w.real.resize::<U32>();
        let wi: FixedWide = w.imag.resize::<U32>();
        Sample::new(q15_round(xr * wr - xi * wi), q15_round(xr * wi + xi * wr))
    }

    fn encode_le(x: Fixed, out: &mut Vec<u8>) {
        out.extend_from_slice(&(x.raw() as i16).to_le_bytes());
    }
}

/// IEEE single precision data.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Float32;

impl NumericProfile for Float32 {
    type Data = f32;

    const NAME: &'static str = "float32";

    fn from_f64(x: f64) -> f32 {
        x as f32
    }

    fn twiddle_from_f64(x: f64) -> f32 {
        x as f32
    }

    fn to_f64(x: f32) -> f64 {
        x as f64
    }

    #[inline(always)]
    fn add(a: f32, b: f32) -> f32 {
        a + b
    }

    #[inline(always)]
    fn sub(a: f32, b: f32) -> f32 {
        a - b
    }

    fn abs(a: f32) -> f32 {
        a.abs()
    }

    fn cmul(x: Sample<Self>, w: Sample<Self>) -> Sample<Self> {
        Sample::new(
            x.real * w.real - x.imag * w.imag,
            x.real * w.imag + x.imag * w.real,
        )
    }

    fn encode_le(x: f32, out: &mut Vec<u8>) {
        out.extend_from_slice(&x.to_le_bytes());
    }
}

// -----------------------------------------------------------------------------
// Omega LUT + butterfly
// -----------------------------------------------------------------------------

/// `N/2` roots of unity, exp(-2*pi*i*k/N), quantized to the profile.
#[derive(Clone, Debug)]
pub struct TwiddleLut<P: NumericProfile> {
    log2n: u32,
    table: Vec<Sample<P>>,
}

impl<P: NumericProfile> TwiddleLut<P> {
    pub fn new(size: FftSize) -> Self {
        let n = size.n();
        let table = (0..n / 2)
            .map(|k| {
                let angle = -2.0 * PI * k as f64 / n as f64;
                Sample::new(P::twiddle_from_f64(angle.cos()), P::twiddle_from_f64(angle.sin()))
            })
            .collect();
        Self { log2n: size.log2n(), table }
    }

    /// Twiddle for butterfly `j` of stage `s` (m = 2^s): exp(-2*pi*i*j/m).
    #[inline(always)]
    pub fn omega(&self, s: u32, j: u32) -> Sample<P> {
        self.table[(j << (self.log2n - s)) as usize]
    }
}

/// Token into the butterfly: the two operands plus pass-through tags.
#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct ButterflyIn<P: NumericProfile> {
    pub t: Sample<P>,
    pub u: Sample<P>,
    pub s: Stage,
    pub j: Addr,
}

/// Token out of the butterfly, tags unchanged.
#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct ButterflyOut<P: NumericProfile> {
    pub t: Sample<P>,
    pub u: Sample<P>,
    pub s: Stage,
    pub j: Addr,
}

/// Decimation-in-time 2-point butterfly:
///   wt = omega(s, j) * t
///   t' = u - wt
///   u' = u + wt
pub fn butterfly<P: NumericProfile>(lut: &TwiddleLut<P>, inp: ButterflyIn<P>) -> ButterflyOut<P> {
    let w = lut.omega(inp.s.raw() as u32, inp.j.raw() as u32);
    let wt = P::cmul(inp.t, w);
    ButterflyOut {
        t: inp.u.sub(wt),
        u: inp.u.add(wt),
        s: inp.s,
        j: inp.j,
    }
}
