// Streaming FFT stage controller.
//
// One-tick step function over an owned state, same shape as the NTT cores:
// `fft_step(state, inputs) -> (next_state, outputs)`. Everything is derived
// from the current state and this tick's inputs, the next state is only
// visible on the following tick.
//
// LOAD_INPUTS     samples -> bit reversed RAM writes
// BUTTERFLY_ITERS three streams run at once:
//                   1) read requests to RAM           (rd_req_iters)
//                   2) read responses -> butterfly    (pipeline_req_iters, tags only)
//                   3) butterfly results -> RAM writes (wr_req_iters)
//                 a stage's reads may not start before the previous
//                 stage's last write has been accepted
// UNLOAD_OUTPUTS  RAM reads in natural order -> result stream

use rhdl::prelude::*;

use crate::fft_arith::{ButterflyIn, ButterflyOut, NumericProfile, Sample};
use crate::fft_bitrev::reverse;
use crate::fft_iters::FftIters;
use crate::fft_params::{addr, Addr, FftSize};
use crate::fft_ram::{RamReadReq, RamReadResp, RamWriteReq};
use crate::fft_stream::Stream;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FftPhase {
    #[default]
    LoadInputs,
    ButterflyIters,
    UnloadOutputs,
}

/// All engine registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FftState {
    pub size: FftSize,
    pub phase: FftPhase,

    // LOAD_INPUTS: linear sample counter
    pub load_count: Addr,

    // BUTTERFLY_ITERS: one iterator per stream
    pub rd_req_iters: FftIters,
    pub pipeline_req_iters: FftIters,
    pub wr_req_iters: FftIters,

    // set by the read stream at a stage boundary, cleared by write-back
    pub waiting_on_s_iter_to_finish: bool,
    pub rd_reqs_done: bool,

    // UNLOAD_OUTPUTS: read issue / read response counters
    pub unload_rd_count: Addr,
    pub unload_resp_count: Addr,
}

impl FftState {
    pub fn new(size: FftSize) -> Self {
        Self {
            size,
            phase: FftPhase::LoadInputs,
            load_count: addr(0),
            rd_req_iters: FftIters::init(),
            pipeline_req_iters: FftIters::init(),
            wr_req_iters: FftIters::init(),
            waiting_on_s_iter_to_finish: false,
            rd_reqs_done: false,
            unload_rd_count: addr(0),
            unload_resp_count: addr(0),
        }
    }
}

#[derive(Copy, Clone, Default, Debug)]
pub struct FftIn<P: NumericProfile> {
    // Stream of input samples
    pub samples_in: Stream<Sample<P>>,
    // Stream of read response data from RAM
    pub rd_datas_from_ram: Stream<RamReadResp<P>>,
    // Stream of data from butterfly pipeline
    pub data_from_pipeline: Stream<ButterflyOut<P>>,
    pub ready_for_wr_reqs_to_ram: bool,
    pub ready_for_rd_addrs_to_ram: bool,
    pub ready_for_data_to_pipeline: bool,
    pub ready_for_result_out: bool,
}

/// Outputs default to all idle / not ready.
#[derive(Copy, Clone, Default, Debug)]
pub struct FftOut<P: NumericProfile> {
    pub wr_reqs_to_ram: Stream<RamWriteReq<P>>,
    pub rd_addrs_to_ram: Stream<RamReadReq>,
    pub data_to_pipeline: Stream<ButterflyIn<P>>,
    pub result_out: Stream<Sample<P>>,
    pub ready_for_samples_in: bool,
    pub ready_for_rd_datas_from_ram: bool,
    pub ready_for_data_from_pipeline: bool,
}

/// One tick of the controller.
pub fn fft_step<P: NumericProfile>(st: FftState, inp: FftIn<P>) -> (FftState, FftOut<P>) {
    let mut ns = st;
    let mut out = FftOut::<P>::default();
    let size = st.size;

    match st.phase {
        FftPhase::LoadInputs => {
            // Sample counter drives the bit reversed storage address,
            // only the 't' half of the write request is used.
            out.wr_reqs_to_ram.data.t = inp.samples_in.data;
            out.wr_reqs_to_ram.data.t_index = reverse(st.load_count, size.log2n());
            out.wr_reqs_to_ram.data.t_write_en = true;
            out.wr_reqs_to_ram.valid = inp.samples_in.valid;
            out.ready_for_samples_in = inp.ready_for_wr_reqs_to_ram;

            if inp.samples_in.fires(out.ready_for_samples_in) {
                if st.load_count == size.last_index() {
                    ns.phase = FftPhase::ButterflyIters;
                    ns.load_count = addr(0);
                    ns.rd_req_iters = FftIters::init();
                    ns.pipeline_req_iters = FftIters::init();
                    ns.wr_req_iters = FftIters::init();
                } else {
                    ns.load_count = st.load_count + addr(1);
                }
            }
        }

        FftPhase::ButterflyIters => {
            // 1) read requests, until all issued or paused at a stage boundary
            if !st.rd_reqs_done & !st.waiting_on_s_iter_to_finish {
                let (t_index, u_index) = st.rd_req_iters.addresses();
                out.rd_addrs_to_ram = Stream::valid(RamReadReq { t_index, u_index });

                if inp.ready_for_rd_addrs_to_ram {
                    if st.rd_req_iters.is_stage_boundary(size) {
                        ns.waiting_on_s_iter_to_finish = true;
                    }
                    if st.rd_req_iters.is_last(size) {
                        ns.rd_reqs_done = true;
                        ns.rd_req_iters = FftIters::init();
                    } else {
                        ns.rd_req_iters = st.rd_req_iters.advance(size);
                    }
                }
            }

            // 2) read responses straight into the butterfly, tagged with (s, j)
            out.data_to_pipeline.data = ButterflyIn {
                t: inp.rd_datas_from_ram.data.t,
                u: inp.rd_datas_from_ram.data.u,
                s: st.pipeline_req_iters.s,
                j: st.pipeline_req_iters.j,
            };
            out.data_to_pipeline.valid = inp.rd_datas_from_ram.valid;
            out.ready_for_rd_datas_from_ram = inp.ready_for_data_to_pipeline;

            if out.data_to_pipeline.fires(inp.ready_for_data_to_pipeline) {
                ns.pipeline_req_iters = if st.pipeline_req_iters.is_last(size) {
                    FftIters::init()
                } else {
                    st.pipeline_req_iters.advance(size)
                };
            }

            // 3) butterfly results written back in place
            let (t_index, u_index) = st.wr_req_iters.addresses();
            out.wr_reqs_to_ram.data = RamWriteReq {
                t_index,
                t: inp.data_from_pipeline.data.t,
                t_write_en: true,
                u_index,
                u: inp.data_from_pipeline.data.u,
                u_write_en: true,
            };
            out.wr_reqs_to_ram.valid = inp.data_from_pipeline.valid;
            out.ready_for_data_from_pipeline = inp.ready_for_wr_reqs_to_ram;

            if out.wr_reqs_to_ram.fires(inp.ready_for_wr_reqs_to_ram) {
                debug_assert_eq!(
                    (inp.data_from_pipeline.data.s, inp.data_from_pipeline.data.j),
                    (st.wr_req_iters.s, st.wr_req_iters.j),
                    "butterfly result out of order"
                );
                if st.wr_req_iters.is_stage_boundary(size) {
                    // only place the barrier is released
                    ns.waiting_on_s_iter_to_finish = false;
                }
                if st.wr_req_iters.is_last(size) {
                    ns.wr_req_iters = FftIters::init();
                    ns.phase = FftPhase::UnloadOutputs;
                } else {
                    ns.wr_req_iters = st.wr_req_iters.advance(size);
                }
            }
        }

        FftPhase::UnloadOutputs => {
            // single address reads, 't' half only
            if st.unload_rd_count < size.n_bits() {
                out.rd_addrs_to_ram = Stream::valid(RamReadReq {
                    t_index: st.unload_rd_count,
                    u_index: addr(0),
                });
                if inp.ready_for_rd_addrs_to_ram {
                    ns.unload_rd_count = st.unload_rd_count + addr(1);
                }
            }

            if st.unload_resp_count < size.n_bits() {
                out.result_out.data = inp.rd_datas_from_ram.data.t;
                out.result_out.valid = inp.rd_datas_from_ram.valid;
                out.ready_for_rd_datas_from_ram = inp.ready_for_result_out;

                if out.result_out.fires(inp.ready_for_result_out) {
                    if st.unload_resp_count == size.last_index() {
                        // done, ready for the next transform
                        ns = FftState::new(size);
                    } else {
                        ns.unload_resp_count = st.unload_resp_count + addr(1);
                    }
                }
            }
        }
    }

    (ns, out)
}

/// Owns the controller registers and advances them one tick at a time.
#[derive(Clone, Debug)]
pub struct FftEngine {
    state: FftState,
}

impl FftEngine {
    pub fn new(size: FftSize) -> Self {
        Self { state: FftState::new(size) }
    }

    pub fn state(&self) -> &FftState {
        &self.state
    }

    pub fn size(&self) -> FftSize {
        self.state.size
    }

    pub fn reset(&mut self) {
        self.state = FftState::new(self.state.size);
    }

    pub fn tick<P: NumericProfile>(&mut self, inp: FftIn<P>) -> FftOut<P> {
        let (ns, out) = fft_step(self.state, inp);
        let st = &self.state;
        if ns.phase != st.phase {
            clilog::debug!("fft: {:?} -> {:?}", st.phase, ns.phase);
        }
        if ns.waiting_on_s_iter_to_finish != st.waiting_on_s_iter_to_finish {
            clilog::debug!(
                "fft: stage barrier {} (rd s={}, wr s={})",
                if ns.waiting_on_s_iter_to_finish { "engaged" } else { "released" },
                st.rd_req_iters.s.raw(),
                st.wr_req_iters.s.raw()
            );
        }
        self.state = ns;
        out
    }
}
