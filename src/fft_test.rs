#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rhdl::prelude::*;

    use crate::config::HandshakeSection;
    use crate::error::FftError;
    use crate::fft_arith::{fake_power, s16, Fixed16, Float32, NumericProfile, Sample};
    use crate::fft_fsm::FftPhase;
    use crate::fft_params::FftSize;
    use crate::fft_reference::{naive_dft, FftExecutor, ReferenceFft};
    use crate::fft_sim::{FftSystem, Port, RandomReady, ReadySchedule, StreamingFft, TraceEvent, Transfer};
    use crate::stimulus::Stimulus;

    const SIZES: [usize; 5] = [2, 4, 8, 16, 64];

    type Sched = Box<dyn FnMut(Port, u64) -> bool>;

    fn size(n: usize) -> FftSize {
        FftSize::new(n).unwrap()
    }

    fn handshake(seed: u64, pct: [u8; 5]) -> HandshakeSection {
        HandshakeSection {
            seed,
            samples_in: pct[0],
            wr_req: pct[1],
            rd_req: pct[2],
            to_pipeline: pct[3],
            result_out: pct[4],
        }
    }

    // Fixed patterns that starve one side or another.
    fn adversarial() -> Vec<Sched> {
        vec![
            Box::new(|p: Port, t: u64| match p {
                Port::RdReq => t % 7 == 0,
                Port::ToPipeline => t % 3 != 0,
                _ => t % 2 == 0,
            }),
            Box::new(|p: Port, t: u64| match p {
                Port::WrReq => t % 5 == 0,
                _ => true,
            }),
            Box::new(|p: Port, t: u64| match p {
                Port::ResultOut | Port::SamplesIn => t % 11 == 0,
                Port::ToPipeline => (t / 4) % 2 == 0,
                _ => true,
            }),
        ]
    }

    fn check_against_reference<P: NumericProfile, R: ReadySchedule>(
        sys: &mut FftSystem<P, R>,
        input: &[Sample<P>],
    ) {
        let expected = ReferenceFft::<P>::new(sys.size()).compute(input).unwrap();
        let got = sys.run(input).unwrap();
        assert_eq!(got, expected, "N={} profile={}", sys.size().n(), P::NAME);
        assert_eq!(sys.engine().state().phase, FftPhase::LoadInputs);
    }

    fn load_writes(trace: &[TraceEvent]) -> usize {
        trace
            .iter()
            .filter(|e| e.phase == FftPhase::LoadInputs && matches!(e.transfer, Transfer::RamWrite { .. }))
            .count()
    }

    fn butterfly_events(trace: &[TraceEvent]) -> impl Iterator<Item = &TraceEvent> {
        trace.iter().filter(|e| e.phase == FftPhase::ButterflyIters)
    }

    #[test]
    fn streaming_matches_reference_always_ready() {
        let mut stim = Stimulus::from_seed(1);
        SIZES.iter().for_each(|&n| {
            [(1usize, 1usize), (3, 4), (6, 2)].iter().for_each(|&(lat, depth)| {
                let input = stim.samples::<Fixed16>(n, 4000.0);
                check_against_reference(&mut StreamingFft::always_ready(size(n), lat, depth), &input);

                let input = stim.samples::<Float32>(n, 1.0);
                check_against_reference(&mut StreamingFft::always_ready(size(n), lat, depth), &input);
            });
        });
    }

    #[test]
    fn streaming_matches_reference_random_handshakes() {
        let mut stim = Stimulus::from_seed(2);
        let patterns = [[50, 70, 40, 60, 30], [10, 90, 90, 10, 90], [90, 20, 60, 80, 50]];
        SIZES.iter().for_each(|&n| {
            patterns.iter().enumerate().for_each(|(i, &pct)| {
                let hs = handshake(100 + i as u64, pct);
                let input = stim.samples::<Fixed16>(n, 4000.0);
                let mut sys = FftSystem::<Fixed16, _>::new(size(n), 3, 2, RandomReady::new(&hs));
                check_against_reference(&mut sys, &input);

                let input = stim.samples::<Float32>(n, 1.0);
                let mut sys = FftSystem::<Float32, _>::new(size(n), 2, 4, RandomReady::new(&hs));
                check_against_reference(&mut sys, &input);
            });
        });
    }

    #[test]
    fn streaming_matches_reference_adversarial_handshakes() {
        let mut stim = Stimulus::from_seed(3);
        [4usize, 16, 64].iter().for_each(|&n| {
            adversarial().into_iter().for_each(|sched| {
                let input = stim.samples::<Fixed16>(n, 4000.0);
                let mut sys = FftSystem::<Fixed16, _>::new(size(n), 4, 2, sched);
                check_against_reference(&mut sys, &input);
            });
        });
    }

    #[test]
    fn transfers_are_conserved() {
        let n = 16;
        let hs = handshake(5, [60, 50, 70, 40, 80]);
        let mut sys = FftSystem::<Fixed16, _>::new(size(n), 3, 3, RandomReady::new(&hs)).with_trace();
        let input = Stimulus::from_seed(5).samples::<Fixed16>(n, 1000.0);
        sys.run(&input).unwrap();

        let count = |f: fn(&Transfer) -> bool| sys.trace().iter().filter(|e| f(&e.transfer)).count();
        let bf = size(n).butterfly_count();
        assert_eq!(count(|t| matches!(t, Transfer::SampleIn)), n);
        assert_eq!(load_writes(sys.trace()), n);
        assert_eq!(count(|t| matches!(t, Transfer::ToPipeline { .. })), bf);
        assert_eq!(count(|t| matches!(t, Transfer::FromPipeline)), bf);
        assert_eq!(count(|t| matches!(t, Transfer::ResultOut)), n);
        assert_eq!(sys.pipeline().in_flight(), 0);
    }

    #[test]
    fn nothing_moves_until_ready_then_everything_arrives() {
        let n = 16;
        let quiet = 2_000u64;
        let mut sys = FftSystem::<Fixed16, _>::new(size(n), 3, 2, move |_p: Port, t: u64| t >= quiet).with_trace();
        let input = Stimulus::from_seed(12).samples::<Fixed16>(n, 2000.0);
        check_against_reference(&mut sys, &input);

        assert!(sys.trace().iter().all(|e| e.tick >= quiet));
        let samples_in = sys.trace().iter().filter(|e| e.transfer == Transfer::SampleIn).count();
        assert_eq!(samples_in, n);
        assert_eq!(load_writes(sys.trace()), samples_in);
        let results = sys.trace().iter().filter(|e| e.transfer == Transfer::ResultOut).count();
        assert_eq!(results, n);
    }

    #[test]
    fn reads_never_run_ahead_of_writes() {
        let n = 32;
        let hs = handshake(9, [100, 30, 100, 100, 100]);
        let mut sys = FftSystem::<Fixed16, _>::new(size(n), 5, 4, RandomReady::new(&hs)).with_trace();
        sys.run(&Stimulus::from_seed(9).samples::<Fixed16>(n, 1000.0)).unwrap();

        let mut writes_per_stage = vec![0usize; size(n).log2n() as usize + 1];
        butterfly_events(sys.trace()).for_each(|e| match e.transfer {
            Transfer::RamRead(_) => {
                assert_eq!(e.rd_iters.s, e.wr_iters.s, "read issued at tick {}", e.tick);
                let s = e.rd_iters.s.raw() as usize;
                if s > 1 {
                    assert_eq!(writes_per_stage[s - 1], n / 2, "stage {} read before stage {} done", s, s - 1);
                }
            }
            Transfer::RamWrite { .. } => writes_per_stage[e.wr_iters.s.raw() as usize] += 1,
            _ => {}
        });
        assert!(writes_per_stage[1..].iter().all(|&w| w == n / 2));
    }

    #[test]
    fn one_write_per_pair_per_stage() {
        let n = 16;
        let mut sys = StreamingFft::<Fixed16>::always_ready(size(n), 2, 4).with_trace();
        sys.run(&Stimulus::from_seed(4).samples::<Fixed16>(n, 1000.0)).unwrap();

        (1..=size(n).log2n()).for_each(|s| {
            let mut touched = BTreeSet::new();
            butterfly_events(sys.trace())
                .filter(|e| e.wr_iters.s.raw() as u32 == s)
                .for_each(|e| {
                    if let Transfer::RamWrite { t_index, u_index } = e.transfer {
                        let u = u_index.expect("butterfly writes both halves");
                        assert!(touched.insert(t_index.raw() as usize));
                        assert!(touched.insert(u.raw() as usize));
                        assert_eq!(t_index.raw() - u.raw(), 1 << (s - 1));
                    }
                });
            assert_eq!(touched, (0..n).collect::<BTreeSet<_>>(), "stage {s}");
        });
    }

    #[test]
    fn impulse_gives_flat_spectrum() {
        let n = 8;
        let mut input = vec![Sample::<Fixed16>::default(); n];
        input[0] = Sample::new(s16(1000), s16(0));
        let hs = handshake(11, [70, 70, 70, 70, 70]);
        let mut sys = FftSystem::<Fixed16, _>::new(size(n), 3, 2, RandomReady::new(&hs));
        let out = sys.run(&input).unwrap();
        out.iter().for_each(|x| {
            assert_eq!(*x, Sample::new(s16(1000), s16(0)));
            assert_eq!(fake_power(*x), s16(1000));
        });
    }

    #[test]
    fn tone_lands_in_its_bin() {
        let n = 8;
        let raw: Vec<(f64, f64)> =
            (0..n).map(|i| ((2.0 * std::f64::consts::PI * 2.0 * i as f64 / n as f64).cos(), 0.0)).collect();
        let input: Vec<Sample<Float32>> = raw.iter().map(|&(r, i)| Sample::from_f64(r, i)).collect();
        let out = StreamingFft::<Float32>::always_ready(size(n), 3, 4).run(&input).unwrap();

        out.iter().zip(naive_dft(&raw)).enumerate().for_each(|(k, (x, (er, ei)))| {
            let (re, im) = x.to_f64();
            assert!((re - er).abs() < 1e-4 && (im - ei).abs() < 1e-4, "bin {k}");
            let mag = (re * re + im * im).sqrt();
            if k == 2 || k == 6 {
                assert!((mag - 4.0).abs() < 1e-4, "bin {k}: {mag}");
            } else {
                assert!(mag < 1e-4, "bin {k}: {mag}");
            }
        });
    }

    #[test]
    fn back_to_back_transforms_under_backpressure() {
        let n = 16;
        let hs = handshake(21, [40, 60, 50, 70, 30]);
        let mut sys = FftSystem::<Fixed16, _>::new(size(n), 2, 3, RandomReady::new(&hs));
        let mut stim = Stimulus::from_seed(21);
        (0..4).for_each(|_| {
            let input = stim.samples::<Fixed16>(n, 3000.0);
            check_against_reference(&mut sys, &input);
        });
    }

    #[test]
    fn executors_share_one_interface() {
        let n = 64;
        let input = Stimulus::from_seed(6).samples::<Fixed16>(n, 2000.0);
        let mut reference = ReferenceFft::<Fixed16>::new(size(n));
        let mut streaming = StreamingFft::<Fixed16>::always_ready(size(n), 3, 4);
        let mut execs: Vec<&mut dyn FftExecutor<Fixed16>> = vec![&mut reference, &mut streaming];
        let outs: Vec<_> = execs.iter_mut().map(|e| e.transform(&input).unwrap()).collect();
        assert_eq!(outs[0], outs[1]);
    }

    #[test]
    fn streaming_rejects_wrong_length_without_ticking() {
        let mut sys = StreamingFft::<Float32>::always_ready(size(8), 1, 1);
        let err = sys.transform(&[Sample::default(); 9]).unwrap_err();
        assert!(matches!(err, FftError::InputLength { expected: 8, got: 9 }));
        assert_eq!(sys.ticks(), 0);
    }
}
