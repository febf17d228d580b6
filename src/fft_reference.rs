// Straight-line FFT over an in-memory array: same bit reversed load, same
// (s, k, j) order and same butterfly as the streaming engine, no handshakes.

use rhdl::prelude::*;

use crate::error::{FftError, Result};
use crate::fft_arith::{butterfly, ButterflyIn, NumericProfile, Sample, TwiddleLut};
use crate::fft_bitrev::reverse;
use crate::fft_iters::FftIters;
use crate::fft_params::{addr, stage, FftSize};

/// Common entry point for the reference and streaming paths.
pub trait FftExecutor<P: NumericProfile> {
    fn size(&self) -> FftSize;

    /// `N` samples in natural order in, `N` bins in natural order out.
    fn transform(&mut self, input: &[Sample<P>]) -> Result<Vec<Sample<P>>>;
}

pub(crate) fn check_len(size: FftSize, input_len: usize) -> Result<()> {
    if input_len != size.n() {
        return Err(FftError::InputLength { expected: size.n(), got: input_len });
    }
    Ok(())
}

/// Bit-reverse copy.
fn bit_reverse_copy<P: NumericProfile>(size: FftSize, input: &[Sample<P>]) -> Vec<Sample<P>> {
    let mut output = vec![Sample::default(); size.n()];
    input.iter().enumerate().for_each(|(i, &x)| {
        let ri = reverse(addr(i as u32), size.log2n()).raw() as usize;
        output[ri] = x;
    });
    output
}

#[derive(Clone, Debug)]
pub struct ReferenceFft<P: NumericProfile> {
    size: FftSize,
    lut: TwiddleLut<P>,
}

impl<P: NumericProfile> ReferenceFft<P> {
    pub fn new(size: FftSize) -> Self {
        Self { size, lut: TwiddleLut::new(size) }
    }

    /// Iterator driven: walks `FftIters` exactly like the engine's streams.
    pub fn compute(&self, input: &[Sample<P>]) -> Result<Vec<Sample<P>>> {
        check_len(self.size, input.len())?;
        let mut output = bit_reverse_copy(self.size, input);

        let mut iters = FftIters::init();
        loop {
            let (t_index, u_index) = iters.addresses();
            let (t_index, u_index) = (t_index.raw() as usize, u_index.raw() as usize);
            let out = butterfly(
                &self.lut,
                ButterflyIn { t: output[t_index], u: output[u_index], s: iters.s, j: iters.j },
            );
            output[t_index] = out.t;
            output[u_index] = out.u;
            if iters.is_last(self.size) {
                break;
            }
            iters = iters.advance(self.size);
        }
        Ok(output)
    }

    /// Plain triple loop, used to cross-check the iterator.
    pub fn compute_nested(&self, input: &[Sample<P>]) -> Result<Vec<Sample<P>>> {
        check_len(self.size, input.len())?;
        let n = self.size.n();
        let mut output = bit_reverse_copy(self.size, input);

        (1..=self.size.log2n()).for_each(|s| {
            let m = 1usize << s;
            let m_1_2 = m >> 1;
            (0..n).step_by(m).for_each(|k| {
                (0..m_1_2).for_each(|j| {
                    let t_index = k + j + m_1_2;
                    let u_index = k + j;
                    let out = butterfly(
                        &self.lut,
                        ButterflyIn {
                            t: output[t_index],
                            u: output[u_index],
                            s: stage(s),
                            j: addr(j as u32),
                        },
                    );
                    output[t_index] = out.t;
                    output[u_index] = out.u;
                });
            });
        });
        Ok(output)
    }
}

impl<P: NumericProfile> FftExecutor<P> for ReferenceFft<P> {
    fn size(&self) -> FftSize {
        self.size
    }

    fn transform(&mut self, input: &[Sample<P>]) -> Result<Vec<Sample<P>>> {
        self.compute(input)
    }
}

/// Textbook O(N^2) DFT in f64, for checking the float profile.
pub fn naive_dft(input: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let n = input.len();
    (0..n)
        .map(|k| {
            input.iter().enumerate().fold((0.0, 0.0), |(re, im), (i, &(xr, xi))| {
                let a = -2.0 * std::f64::consts::PI * (k * i) as f64 / n as f64;
                let (c, s) = (a.cos(), a.sin());
                (re + xr * c - xi * s, im + xr * s + xi * c)
            })
        })
        .collect()
}
