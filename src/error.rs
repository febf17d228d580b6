use thiserror::Error;

use crate::fft_fsm::FftPhase;

/// Everything that can go wrong around the FFT core.
///
/// The scheduler itself has no runtime errors; these come from building a
/// size, feeding the wrong number of samples, the memory collaborator
/// faulting, or the surrounding harness.
#[derive(Debug, Error)]
pub enum FftError {
    #[error("FFT size {0} is not a power of two")]
    SizeNotPowerOfTwo(usize),

    #[error("FFT size {0} outside supported range 2..=32768")]
    SizeOutOfRange(usize),

    #[error("expected {expected} input samples, got {got}")]
    InputLength { expected: usize, got: usize },

    /// Fatal for the whole pipeline, matches the memory map sanity check.
    #[error("memory access at address {addr} out of range (size {size})")]
    AddressOutOfRange { addr: usize, size: usize },

    #[error("no progress after {ticks} ticks")]
    Stalled { ticks: u64 },

    /// A previous transform did not finish; `reset` before starting another.
    #[error("engine busy in {0:?} with a transform in flight")]
    Busy(FftPhase),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FftError>;
