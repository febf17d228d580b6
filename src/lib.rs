pub mod error;
pub mod config;

pub mod fft_params;
pub mod fft_arith;
pub mod fft_iters;
pub mod fft_bitrev;
pub mod fft_stream;

pub mod fft_ram;
pub mod fft_pipeline;
pub mod fft_fsm;
pub mod fft_reference;
pub mod fft_sim;

pub mod stimulus;
pub mod fft_test;
