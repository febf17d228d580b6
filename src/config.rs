// TOML simulation settings. Every field has a default so a partial (or
// empty) file is fine.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fft_params::FftSize;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    #[default]
    Fixed16,
    Float32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FftSection {
    pub size: usize,
    pub profile: ProfileKind,
}

impl Default for FftSection {
    fn default() -> Self {
        Self { size: 64, profile: ProfileKind::Fixed16 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineSection {
    /// Ticks from accept to result.
    pub latency: usize,
    /// Tokens in flight.
    pub depth: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self { latency: 3, depth: 4 }
    }
}

/// Per-port readiness in percent (100 = always ready).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HandshakeSection {
    pub seed: u64,
    pub samples_in: u8,
    pub wr_req: u8,
    pub rd_req: u8,
    pub to_pipeline: u8,
    pub result_out: u8,
}

impl Default for HandshakeSection {
    fn default() -> Self {
        Self { seed: 1, samples_in: 100, wr_req: 100, rd_req: 100, to_pipeline: 100, result_out: 100 }
    }
}

impl HandshakeSection {
    pub fn always_ready(&self) -> bool {
        [self.samples_in, self.wr_req, self.rd_req, self.to_pipeline, self.result_out]
            .iter()
            .all(|&p| p >= 100)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RunSection {
    /// Give up after this many ticks without finishing a transform.
    pub max_ticks: u64,
    /// Record every transfer.
    pub trace: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        Self { max_ticks: 10_000_000, trace: false }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SimConfig {
    pub fft: FftSection,
    pub pipeline: PipelineSection,
    pub handshake: HandshakeSection,
    pub run: RunSection,
}

impl SimConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn size(&self) -> Result<FftSize> {
        FftSize::new(self.fft.size)
    }
}
