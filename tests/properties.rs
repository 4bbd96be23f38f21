//! Behavioral properties of the optimizer, checked against the reference
//! interpreter on generated programs.

use proptest::prelude::*;

use tapeopt::interp::{self, Machine, Outcome, Trace};
use tapeopt::opt::local;
use tapeopt::syntax::parse;
use tapeopt::{OptConfig, Pipeline, Program, Stmt};

const FUEL: u64 = 20_000;

fn leaf() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => Just("+".to_string()),
        4 => Just("-".to_string()),
        3 => Just(">".to_string()),
        3 => Just("<".to_string()),
        1 => Just(".".to_string()),
        1 => Just(",".to_string()),
        1 => Just("[-]".to_string()),
        1 => Just("[->+<]".to_string()),
        1 => Just("[<]".to_string()),
    ]
}

fn source() -> impl Strategy<Value = String> {
    let stmt = leaf().prop_recursive(3, 32, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(|body| format!("[{}]", body.concat()))
    });
    prop::collection::vec(stmt, 0..14).prop_map(|parts| parts.concat())
}

fn tape() -> impl Strategy<Value = Vec<(i64, u8)>> {
    prop::collection::vec((-4i64..8, any::<u8>()), 0..6)
}

fn run_on(program: &Program, tape: &[(i64, u8)], input: &[u8], fuel: u64) -> Outcome {
    Machine::new(input, fuel)
        .with_tape(tape.iter().copied())
        .run(program)
}

fn expect_halted(outcome: Outcome) -> Trace {
    match outcome {
        Outcome::Halted(trace) => trace,
        Outcome::OutOfFuel(trace) => panic!("optimized program ran out of fuel: {:?}", trace),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn local_optimizer_is_idempotent(src in source()) {
        let once = local::optimize(parse(&src).unwrap());
        let twice = local::optimize(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn cancelling_pairs_vanish(n in 0usize..40, m in 0usize..40) {
        let src = format!("{}{}{}{}", "+".repeat(n), "-".repeat(n), ">".repeat(m), "<".repeat(m));
        prop_assert!(local::optimize(parse(&src).unwrap()).is_empty());
    }

    #[test]
    fn io_runs_survive_coalescing(src in "[-+<>.,]{0,40}") {
        fn io(block: &[Stmt]) -> String {
            block
                .iter()
                .map(|stmt| match stmt {
                    Stmt::Output(n) => ".".repeat(*n as usize),
                    Stmt::Input(n) => ",".repeat(*n as usize),
                    _ => String::new(),
                })
                .collect()
        }
        let original = parse(&src).unwrap();
        let optimized = local::optimize(original.clone());
        prop_assert_eq!(io(&original.body), io(&optimized.body));
    }

    #[test]
    fn zero_loop_clears_any_value(k in (0u8..128).prop_map(|k| 2 * k + 1), x in any::<u8>()) {
        let src = format!("[{}]", "+".repeat(k as usize));
        let optimized = local::optimize(parse(&src).unwrap());
        prop_assert_eq!(&optimized.body, &vec![Stmt::ZeroLoop]);
        let original = run_on(&parse(&src).unwrap(), &[(0, x)], b"", 1_000_000);
        prop_assert!(original.halted());
        prop_assert!(original.trace().tape.is_empty());
    }

    #[test]
    fn multiplication_fold_matches_iteration(
        d in (0u8..128).prop_map(|k| 2 * k + 1),
        x in any::<u8>(),
        s in any::<u8>(),
    ) {
        let src = format!(
            "{}[{}>{}<]",
            "+".repeat(x as usize),
            "-".repeat(d as usize),
            "+".repeat(s as usize)
        );
        let original = parse(&src).unwrap();
        let expected = run_on(&original, &[], b"", 10_000_000);
        prop_assert!(expected.halted());
        let optimized = Pipeline::new(OptConfig::default()).run(original);
        prop_assert!(!optimized.program.any(|s| s.is_repeating() || matches!(s, Stmt::ZeroLoop)));
        let trace = expect_halted(interp::run(&optimized.program, b"", 10_000));
        prop_assert_eq!(&trace, expected.trace());
    }

    #[test]
    fn even_decrements_are_not_multiplications(k in 1u8..128, s in 1u8..=255) {
        let src = format!(",[{}>{}<]", "-".repeat(2 * k as usize), "+".repeat(s as usize));
        let optimized = local::optimize(parse(&src).unwrap());
        prop_assert!(matches!(optimized.body[1], Stmt::Loop(_)));
    }

    #[test]
    fn optimizer_preserves_behavior_on_zeroed_tape(
        src in source(),
        input in prop::collection::vec(any::<u8>(), 0..8),
        level in 1u8..=3,
    ) {
        let original = parse(&src).unwrap();
        let expected = interp::run(&original, &input, FUEL);
        prop_assume!(expected.halted());
        let optimized = Pipeline::new(OptConfig::default().with_level(level)).run(original);
        let trace = expect_halted(interp::run(&optimized.program, &input, FUEL * 4));
        prop_assert_eq!(&trace, expected.trace());
    }

    #[test]
    fn optimizer_preserves_behavior_on_any_tape(
        src in source(),
        cells in tape(),
        input in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let config = OptConfig {
            level: 3,
            assume_zeroed_tape: false,
            ..OptConfig::default()
        };
        let original = parse(&src).unwrap();
        let expected = run_on(&original, &cells, &input, FUEL);
        prop_assume!(expected.halted());
        let optimized = Pipeline::new(config).run(original);
        let trace = expect_halted(run_on(&optimized.program, &cells, &input, FUEL * 4));
        prop_assert_eq!(&trace, expected.trace());
    }

    #[test]
    fn only_io_is_kept_when_the_tape_is_dead(
        src in source(),
        input in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let config = OptConfig {
            final_tape_live: false,
            ..OptConfig::default()
        };
        let original = parse(&src).unwrap();
        let expected = interp::run(&original, &input, FUEL);
        prop_assume!(expected.halted());
        let optimized = Pipeline::new(config).run(original);
        let trace = expect_halted(interp::run(&optimized.program, &input, FUEL * 4));
        prop_assert_eq!(&trace.output, &expected.trace().output);
        prop_assert_eq!(trace.consumed, expected.trace().consumed);
    }
}
