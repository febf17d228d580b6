// Shared two-port sample RAM behind request/response streams.
//
// - read: two addresses in, both samples out on the next tick; the
//   response is held until taken and no new read is accepted meanwhile
// - write: up to two (addr, data, we) in, memory updated at end of tick
// - no read-after-write forwarding: a read accepted on the same tick as a
//   write sees the old contents

use rhdl::prelude::*;

use crate::error::{FftError, Result};
use crate::fft_arith::{NumericProfile, Sample};
use crate::fft_params::{Addr, FftSize};
use crate::fft_stream::Stream;

#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct RamWriteReq<P: NumericProfile> {
    // t addr and data
    pub t_index: Addr,
    pub t: Sample<P>,
    pub t_write_en: bool,
    // u addr and data
    pub u_index: Addr,
    pub u: Sample<P>,
    pub u_write_en: bool,
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct RamReadReq {
    pub t_index: Addr,
    pub u_index: Addr,
}

#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct RamReadResp<P: NumericProfile> {
    pub t: Sample<P>,
    pub u: Sample<P>,
}

/// Registered outputs, valid for the whole tick.
#[derive(Copy, Clone, Default, Debug)]
pub struct RamOut<P: NumericProfile> {
    pub rd_resp: Stream<RamReadResp<P>>,
    pub ready_for_rd_req: bool,
    pub ready_for_wr_req: bool,
}

/// Transfers completed this tick (valid already AND-ed with ready).
#[derive(Copy, Clone, Default, Debug)]
pub struct RamIn<P: NumericProfile> {
    pub wr_req: Stream<RamWriteReq<P>>,
    pub rd_req: Stream<RamReadReq>,
    pub rd_resp_taken: bool,
}

#[derive(Clone, Debug)]
pub struct FftRam<P: NumericProfile> {
    mem: Vec<Sample<P>>,
    resp: Stream<RamReadResp<P>>,
}

impl<P: NumericProfile> FftRam<P> {
    pub fn new(size: FftSize) -> Self {
        Self {
            mem: vec![Sample::default(); size.n()],
            resp: Stream::idle(),
        }
    }

    pub fn outputs(&self) -> RamOut<P> {
        RamOut {
            rd_resp: self.resp,
            ready_for_rd_req: !self.resp.valid,
            ready_for_wr_req: true,
        }
    }

    #[inline(always)]
    fn check(&self, a: Addr) -> Result<usize> {
        let i = a.raw() as usize;
        if i >= self.mem.len() {
            return Err(FftError::AddressOutOfRange { addr: i, size: self.mem.len() });
        }
        Ok(i)
    }

    /// Commit one tick. An out-of-range address is fatal and leaves the
    /// memory untouched.
    pub fn tick(&mut self, inp: RamIn<P>) -> Result<()> {
        let wr = inp.wr_req;
        let wr_t = if wr.valid && wr.data.t_write_en { Some(self.check(wr.data.t_index)?) } else { None };
        let wr_u = if wr.valid && wr.data.u_write_en { Some(self.check(wr.data.u_index)?) } else { None };

        let mut next_resp = if inp.rd_resp_taken { Stream::idle() } else { self.resp };
        if inp.rd_req.valid {
            debug_assert!(!next_resp.valid, "read accepted while a response is pending");
            let t = self.check(inp.rd_req.data.t_index)?;
            let u = self.check(inp.rd_req.data.u_index)?;
            next_resp = Stream::valid(RamReadResp { t: self.mem[t], u: self.mem[u] });
        }
        self.resp = next_resp;

        if let Some(i) = wr_t {
            self.mem[i] = wr.data.t;
        }
        if let Some(i) = wr_u {
            self.mem[i] = wr.data.u;
        }
        Ok(())
    }
}
