// Streams one transform through the engine and prints the bins.
//
//   cargo run --bin fft_demo -- --size 8 --input tone --bin 2
//   cargo run --bin fft_demo -- --config sim.toml --input noise

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use streaming_fft::config::{ProfileKind, SimConfig};
use streaming_fft::fft_arith::{fake_power, Fixed16, Float32, NumericProfile, Sample};
use streaming_fft::fft_reference::ReferenceFft;
use streaming_fft::fft_sim::{FftSystem, RandomReady};
use streaming_fft::stimulus::Stimulus;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputKind {
    /// x[0] = amplitude, rest zero.
    Impulse,
    /// cos at the selected bin.
    Tone,
    /// Seeded uniform noise.
    Noise,
}

#[derive(Parser)]
#[command(name = "fft_demo")]
#[command(about = "Run the streaming FFT engine on a test vector", long_about = None)]
struct Opts {
    #[arg(long)]
    /// TOML simulation config (defaults apply for anything missing).
    config: Option<PathBuf>,

    #[arg(long)]
    /// Override the transform size.
    size: Option<usize>,

    #[arg(long, value_enum)]
    /// Override the numeric profile.
    profile: Option<ProfileKind>,

    #[arg(long, value_enum, default_value = "impulse")]
    input: InputKind,

    #[arg(long, default_value_t = 1)]
    /// Tone bin.
    bin: usize,

    #[arg(long, default_value_t = 1000.0)]
    amplitude: f64,

    #[arg(long)]
    /// Seed for noise and handshakes (overrides the config).
    seed: Option<u64>,

    #[arg(long, short)]
    /// Only print the summary line.
    quiet: bool,
}

fn make_input<P: NumericProfile>(opts: &Opts, n: usize, seed: u64) -> Vec<Sample<P>> {
    let a = opts.amplitude;
    match opts.input {
        InputKind::Impulse => (0..n)
            .map(|i| Sample::from_f64(if i == 0 { a } else { 0.0 }, 0.0))
            .collect(),
        InputKind::Tone => (0..n)
            .map(|i| {
                let ph = 2.0 * std::f64::consts::PI * (opts.bin * i) as f64 / n as f64;
                Sample::from_f64(a * ph.cos(), 0.0)
            })
            .collect(),
        InputKind::Noise => Stimulus::from_seed(seed).samples(n, a),
    }
}

fn run<P: NumericProfile>(opts: &Opts, cfg: &SimConfig) -> Result<()> {
    let size = cfg.size()?;
    let input = make_input::<P>(opts, size.n(), cfg.handshake.seed);

    let mut sys = FftSystem::<P, RandomReady>::from_config(cfg)?;
    let out = sys.run(&input).context("streaming transform")?;
    let expected = ReferenceFft::<P>::new(size).compute(&input)?;

    if !opts.quiet {
        println!("| bin | real | imag | |re|+|im| |");
        println!("|-----|------|------|-----------|");
        out.iter().enumerate().for_each(|(k, x)| {
            let (re, im) = x.to_f64();
            println!("| {:>3} | {:>10.3} | {:>10.3} | {:>10.3} |", k, re, im, P::to_f64(fake_power(*x)));
        });

        let mut bytes = Vec::with_capacity(size.n() * 8);
        out.iter().take(4).for_each(|x| x.encode_le(&mut bytes));
        println!("bins[0..4] le = {}", hex::encode(&bytes));
    }

    let matches = out == expected;
    println!(
        "N={} profile={} handshake={} ticks={} matches_reference={}",
        size.n(),
        P::NAME,
        if cfg.handshake.always_ready() { "always" } else { "random" },
        sys.last_run_ticks(),
        matches
    );
    if !matches {
        bail!("streaming output differs from the reference");
    }
    Ok(())
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    if !opts.quiet {
        clilog::init_stderr_color_debug();
    }

    let mut cfg = match &opts.config {
        Some(path) => SimConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(n) = opts.size {
        cfg.fft.size = n;
    }
    if let Some(p) = opts.profile {
        cfg.fft.profile = p;
    }
    if let Some(seed) = opts.seed {
        cfg.handshake.seed = seed;
    }

    match cfg.fft.profile {
        ProfileKind::Fixed16 => run::<Fixed16>(&opts, &cfg),
        ProfileKind::Float32 => run::<Float32>(&opts, &cfg),
    }
}
