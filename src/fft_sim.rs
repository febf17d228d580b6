// Tick-level system: FFT engine + shared RAM + butterfly pipeline, with a
// sample source and a result sink around them.
//
// Per tick:
//   1. sample the registered outputs of RAM and pipeline
//   2. ask the schedule which ports are ready this tick
//   3. run the engine step on those values
//   4. commit every transfer (valid & ready) to RAM and pipeline together

use rhdl::prelude::*;

use crate::config::{HandshakeSection, SimConfig};
use crate::error::{FftError, Result};
use crate::fft_arith::{NumericProfile, Sample};
use crate::fft_fsm::{FftEngine, FftIn, FftPhase, FftState};
use crate::fft_iters::FftIters;
use crate::fft_params::{Addr, FftSize};
use crate::fft_pipeline::{ButterflyPipeline, PipelineIn};
use crate::fft_ram::{FftRam, RamIn, RamReadReq};
use crate::fft_reference::{check_len, FftExecutor};
use crate::fft_stream::Stream;
use crate::stimulus::Stimulus;

/// Handshake points a schedule can hold back.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Port {
    /// Source has a sample to offer.
    SamplesIn,
    /// RAM accepts a write.
    WrReq,
    /// RAM accepts a read.
    RdReq,
    /// Butterfly pipeline accepts an operand pair.
    ToPipeline,
    /// Sink accepts a result.
    ResultOut,
}

pub trait ReadySchedule {
    fn ready(&mut self, port: Port, tick: u64) -> bool;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct AlwaysReady;

impl ReadySchedule for AlwaysReady {
    fn ready(&mut self, _port: Port, _tick: u64) -> bool {
        true
    }
}

impl<F: FnMut(Port, u64) -> bool> ReadySchedule for F {
    fn ready(&mut self, port: Port, tick: u64) -> bool {
        self(port, tick)
    }
}

/// Independent random readiness per port.
pub struct RandomReady {
    stim: Stimulus,
    cfg: HandshakeSection,
}

impl RandomReady {
    pub fn new(cfg: &HandshakeSection) -> Self {
        Self { stim: Stimulus::from_seed(cfg.seed), cfg: cfg.clone() }
    }
}

impl ReadySchedule for RandomReady {
    fn ready(&mut self, port: Port, _tick: u64) -> bool {
        let p = match port {
            Port::SamplesIn => self.cfg.samples_in,
            Port::WrReq => self.cfg.wr_req,
            Port::RdReq => self.cfg.rd_req,
            Port::ToPipeline => self.cfg.to_pipeline,
            Port::ResultOut => self.cfg.result_out,
        };
        p >= 100 || self.stim.percent(p)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transfer {
    SampleIn,
    RamWrite { t_index: Addr, u_index: Option<Addr> },
    RamRead(RamReadReq),
    ToPipeline { s: u32, j: u32 },
    FromPipeline,
    ResultOut,
}

/// One completed handshake, with the engine state it happened in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceEvent {
    pub tick: u64,
    pub phase: FftPhase,
    pub transfer: Transfer,
    pub rd_iters: FftIters,
    pub wr_iters: FftIters,
}

/// What crossed the system boundary on one tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct TickIo<P: NumericProfile> {
    pub sample_taken: bool,
    pub result: Option<Sample<P>>,
}

pub struct FftSystem<P: NumericProfile, R: ReadySchedule> {
    engine: FftEngine,
    ram: FftRam<P>,
    pipeline: ButterflyPipeline<P>,
    sched: R,
    tick: u64,
    max_ticks: u64,
    last_run_ticks: u64,
    fault: Option<(usize, usize)>,
    trace: Option<Vec<TraceEvent>>,
}

/// Streaming path with every port always ready.
pub type StreamingFft<P> = FftSystem<P, AlwaysReady>;

impl<P: NumericProfile> StreamingFft<P> {
    pub fn always_ready(size: FftSize, latency: usize, depth: usize) -> Self {
        FftSystem::new(size, latency, depth, AlwaysReady)
    }
}

impl<P: NumericProfile> FftSystem<P, RandomReady> {
    pub fn from_config(cfg: &SimConfig) -> Result<Self> {
        let size = cfg.size()?;
        let sys = FftSystem::new(size, cfg.pipeline.latency, cfg.pipeline.depth, RandomReady::new(&cfg.handshake))
            .with_max_ticks(cfg.run.max_ticks);
        Ok(if cfg.run.trace { sys.with_trace() } else { sys })
    }
}

impl<P: NumericProfile, R: ReadySchedule> FftSystem<P, R> {
    pub fn new(size: FftSize, latency: usize, depth: usize, sched: R) -> Self {
        Self {
            engine: FftEngine::new(size),
            ram: FftRam::new(size),
            pipeline: ButterflyPipeline::new(size, latency, depth),
            sched,
            tick: 0,
            max_ticks: 10_000_000,
            last_run_ticks: 0,
            fault: None,
            trace: None,
        }
    }

    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn engine(&self) -> &FftEngine {
        &self.engine
    }

    pub fn pipeline(&self) -> &ButterflyPipeline<P> {
        &self.pipeline
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Ticks spent in the most recent `run`.
    pub fn last_run_ticks(&self) -> u64 {
        self.last_run_ticks
    }

    pub fn trace(&self) -> &[TraceEvent] {
        self.trace.as_deref().unwrap_or(&[])
    }

    /// Nothing in flight: engine waiting for its first sample, pipeline
    /// empty, no read response pending.
    pub fn is_idle(&self) -> bool {
        *self.engine.state() == FftState::new(self.engine.size())
            && self.pipeline.in_flight() == 0
            && !self.ram.outputs().rd_resp.valid
    }

    /// Abandon whatever is in flight (after a stall or a memory fault) and
    /// start over with cleared memory. The tick counter keeps running.
    pub fn reset(&mut self) {
        let size = self.engine.size();
        self.engine.reset();
        self.ram = FftRam::new(size);
        self.pipeline.flush();
        self.fault = None;
        self.last_run_ticks = 0;
        if let Some(t) = self.trace.as_mut() {
            t.clear();
        }
        clilog::debug!("fft: system reset at tick {}", self.tick);
    }

    /// Advance everything one tick, offering `sample` on the input stream.
    pub fn step(&mut self, sample: Option<Sample<P>>) -> Result<TickIo<P>> {
        if let Some((addr, size)) = self.fault {
            return Err(FftError::AddressOutOfRange { addr, size });
        }
        let t = self.tick;

        // 1) + 2)
        let ram_out = self.ram.outputs();
        let pipe_out = self.pipeline.outputs();
        let samples_in = match sample {
            Some(x) if self.sched.ready(Port::SamplesIn, t) => Stream::valid(x),
            _ => Stream::idle(),
        };
        let ready_wr = ram_out.ready_for_wr_req & self.sched.ready(Port::WrReq, t);
        let ready_rd = ram_out.ready_for_rd_req & self.sched.ready(Port::RdReq, t);
        let ready_pipe = pipe_out.ready_for_data_in & self.sched.ready(Port::ToPipeline, t);
        let ready_res = self.sched.ready(Port::ResultOut, t);

        // 3)
        let before = *self.engine.state();
        let out = self.engine.tick(FftIn {
            samples_in,
            rd_datas_from_ram: ram_out.rd_resp,
            data_from_pipeline: pipe_out.data_out,
            ready_for_wr_reqs_to_ram: ready_wr,
            ready_for_rd_addrs_to_ram: ready_rd,
            ready_for_data_to_pipeline: ready_pipe,
            ready_for_result_out: ready_res,
        });

        // 4)
        let sample_taken = samples_in.fires(out.ready_for_samples_in);
        let wr_fire = out.wr_reqs_to_ram.fires(ready_wr);
        let rd_fire = out.rd_addrs_to_ram.fires(ready_rd);
        let resp_taken = ram_out.rd_resp.fires(out.ready_for_rd_datas_from_ram);
        let pipe_in_fire = out.data_to_pipeline.fires(ready_pipe);
        let pipe_out_taken = pipe_out.data_out.fires(out.ready_for_data_from_pipeline);
        let result = out.result_out.fires(ready_res).then_some(out.result_out.data);

        if let Err(e) = self.ram.tick(RamIn {
            wr_req: Stream { data: out.wr_reqs_to_ram.data, valid: wr_fire },
            rd_req: Stream { data: out.rd_addrs_to_ram.data, valid: rd_fire },
            rd_resp_taken: resp_taken,
        }) {
            clilog::warn!("fft: memory fault at tick {}: {}", t, e);
            if let FftError::AddressOutOfRange { addr, size } = e {
                self.fault = Some((addr, size));
            }
            return Err(e);
        }
        self.pipeline.tick(PipelineIn {
            data_in: Stream { data: out.data_to_pipeline.data, valid: pipe_in_fire },
            data_out_taken: pipe_out_taken,
        });

        if let Some(trace) = self.trace.as_mut() {
            let mut push = |transfer| {
                trace.push(TraceEvent {
                    tick: t,
                    phase: before.phase,
                    transfer,
                    rd_iters: before.rd_req_iters,
                    wr_iters: before.wr_req_iters,
                })
            };
            if sample_taken {
                push(Transfer::SampleIn);
            }
            if wr_fire {
                let w = out.wr_reqs_to_ram.data;
                push(Transfer::RamWrite {
                    t_index: w.t_index,
                    u_index: w.u_write_en.then_some(w.u_index),
                });
            }
            if rd_fire {
                push(Transfer::RamRead(out.rd_addrs_to_ram.data));
            }
            if pipe_in_fire {
                let d = out.data_to_pipeline.data;
                push(Transfer::ToPipeline { s: d.s.raw() as u32, j: d.j.raw() as u32 });
            }
            if pipe_out_taken {
                push(Transfer::FromPipeline);
            }
            if result.is_some() {
                push(Transfer::ResultOut);
            }
        }

        self.tick += 1;
        Ok(TickIo { sample_taken, result })
    }

    /// Stream one full transform through the engine.
    pub fn run(&mut self, input: &[Sample<P>]) -> Result<Vec<Sample<P>>> {
        let size = self.engine.size();
        check_len(size, input.len())?;
        if !self.is_idle() {
            return Err(FftError::Busy(self.engine.state().phase));
        }

        let start = self.tick;
        let mut next = 0usize;
        let mut results = Vec::with_capacity(size.n());
        while results.len() < size.n() {
            if self.tick - start >= self.max_ticks {
                clilog::warn!("fft: stalled in {:?} after {} ticks", self.engine.state().phase, self.max_ticks);
                return Err(FftError::Stalled { ticks: self.max_ticks });
            }
            let io = self.step(input.get(next).copied())?;
            if io.sample_taken {
                next += 1;
            }
            if let Some(r) = io.result {
                results.push(r);
            }
        }
        self.last_run_ticks = self.tick - start;
        clilog::info!("fft: N={} {} transform done in {} ticks", size.n(), P::NAME, self.last_run_ticks);
        Ok(results)
    }
}

impl<P: NumericProfile, R: ReadySchedule> FftExecutor<P> for FftSystem<P, R> {
    fn size(&self) -> FftSize {
        self.engine.size()
    }

    fn transform(&mut self, input: &[Sample<P>]) -> Result<Vec<Sample<P>>> {
        self.run(input)
    }
}
