// Counts ticks per transform for a range of sizes and prints a Markdown
// table with latency/throughput at a few clock rates.

use anyhow::Result;
use clap::Parser;

use streaming_fft::fft_arith::Fixed16;
use streaming_fft::fft_params::FftSize;
use streaming_fft::fft_sim::StreamingFft;
use streaming_fft::stimulus::Stimulus;

#[derive(Parser)]
struct Opts {
    #[arg(long, default_value_t = 3)]
    /// Butterfly pipeline latency in ticks.
    latency: usize,

    #[arg(long, default_value_t = 4)]
    /// Butterfly pipeline depth.
    depth: usize,

    #[arg(long, default_value_t = 1024)]
    /// Largest N to measure (powers of two from 2).
    max_n: usize,
}

fn ticks_for(size: FftSize, latency: usize, depth: usize) -> Result<u64> {
    let mut sys = StreamingFft::<Fixed16>::always_ready(size, latency, depth);
    let input = Stimulus::from_seed(size.n() as u64).samples::<Fixed16>(size.n(), 1000.0);
    sys.run(&input)?;
    Ok(sys.last_run_ticks())
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    clilog::init_stderr_color_debug();

    let freqs_mhz = [100.0, 200.0, 250.0];

    println!("| N | Ticks | Butterflies | F (MHz) | Latency (us) | Throughput (FFT/s) |");
    println!("|---|-------|-------------|---------|--------------|--------------------|");

    let mut n = 2usize;
    while n <= opts.max_n {
        let size = FftSize::new(n)?;
        let ticks = ticks_for(size, opts.latency, opts.depth)?;
        let bf = size.butterfly_count();
        for &f in &freqs_mhz {
            let c = ticks as f64;
            let lat_us = c / f;
            let thr = f * 1e6 / c;
            println!("| {} | {} | {} | {} | {:.3} | {:.0} |", n, ticks, bf, f as u64, lat_us, thr);
        }
        n <<= 1;
    }
    Ok(())
}
