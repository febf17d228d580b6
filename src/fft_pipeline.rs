// Butterfly compute pipeline model: in-order, fixed latency, bounded
// occupancy, output held until the consumer takes it. Stands in for the
// fixed-point omega-LUT butterfly unit next to the scheduler.

use std::collections::VecDeque;

use crate::fft_arith::{butterfly, ButterflyIn, ButterflyOut, NumericProfile, TwiddleLut};
use crate::fft_params::FftSize;
use crate::fft_stream::Stream;

#[derive(Copy, Clone, Default, Debug)]
pub struct PipelineOut<P: NumericProfile> {
    pub data_out: Stream<ButterflyOut<P>>,
    pub ready_for_data_in: bool,
}

/// Transfers completed this tick.
#[derive(Copy, Clone, Default, Debug)]
pub struct PipelineIn<P: NumericProfile> {
    pub data_in: Stream<ButterflyIn<P>>,
    pub data_out_taken: bool,
}

#[derive(Clone, Debug)]
pub struct ButterflyPipeline<P: NumericProfile> {
    lut: TwiddleLut<P>,
    latency: usize,
    depth: usize,
    // (result, ticks until visible)
    slots: VecDeque<(ButterflyOut<P>, usize)>,
}

impl<P: NumericProfile> ButterflyPipeline<P> {
    /// `latency` ticks from accept to output (at least 1), at most `depth`
    /// tokens in flight (at least 1).
    pub fn new(size: FftSize, latency: usize, depth: usize) -> Self {
        Self {
            lut: TwiddleLut::new(size),
            latency: latency.max(1),
            depth: depth.max(1),
            slots: VecDeque::new(),
        }
    }

    /// Drop everything in flight.
    pub fn flush(&mut self) {
        self.slots.clear();
    }

    pub fn in_flight(&self) -> usize {
        self.slots.len()
    }

    pub fn outputs(&self) -> PipelineOut<P> {
        let data_out = match self.slots.front() {
            Some((out, 0)) => Stream::valid(*out),
            _ => Stream::idle(),
        };
        PipelineOut {
            data_out,
            ready_for_data_in: self.slots.len() < self.depth,
        }
    }

    pub fn tick(&mut self, inp: PipelineIn<P>) {
        if inp.data_out_taken {
            debug_assert!(matches!(self.slots.front(), Some((_, 0))), "took an output that was not valid");
            self.slots.pop_front();
        }
        if inp.data_in.valid {
            debug_assert!(self.slots.len() < self.depth, "pipeline accepted while full");
            self.slots.push_back((butterfly(&self.lut, inp.data_in.data), self.latency));
        }
        self.slots.iter_mut().for_each(|(_, left)| *left = left.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft_arith::{s16, Fixed16, Sample};
    use crate::fft_params::{addr, stage};

    fn token(u: i32, j: u32) -> ButterflyIn<Fixed16> {
        ButterflyIn {
            t: Sample::new(s16(0), s16(0)),
            u: Sample::new(s16(u), s16(0)),
            s: stage(2),
            j: addr(j),
        }
    }

    fn push(p: &mut ButterflyPipeline<Fixed16>, tok: ButterflyIn<Fixed16>) {
        p.tick(PipelineIn { data_in: Stream::valid(tok), data_out_taken: false });
    }

    #[test]
    fn output_after_latency_in_order() {
        let mut p = ButterflyPipeline::<Fixed16>::new(FftSize::new(8).unwrap(), 3, 4);
        push(&mut p, token(10, 0));
        push(&mut p, token(20, 1));
        assert!(!p.outputs().data_out.valid);
        p.tick(PipelineIn::default());
        let out = p.outputs().data_out;
        assert!(out.valid);
        assert_eq!(out.data.u.real, s16(10));
        assert_eq!(out.data.j, addr(0));

        p.tick(PipelineIn { data_out_taken: true, ..Default::default() });
        let out = p.outputs().data_out;
        assert!(out.valid);
        assert_eq!(out.data.j, addr(1));
    }

    #[test]
    fn holds_output_and_fills_up() {
        let mut p = ButterflyPipeline::<Fixed16>::new(FftSize::new(8).unwrap(), 1, 2);
        push(&mut p, token(1, 0));
        assert!(p.outputs().ready_for_data_in);
        push(&mut p, token(2, 1));
        assert!(!p.outputs().ready_for_data_in);
        (0..5).for_each(|_| p.tick(PipelineIn::default()));
        assert_eq!(p.in_flight(), 2);
        assert_eq!(p.outputs().data_out.data.u.real, s16(1));

        p.flush();
        assert_eq!(p.in_flight(), 0);
        assert!(p.outputs().ready_for_data_in);
        assert!(!p.outputs().data_out.valid);
    }
}
