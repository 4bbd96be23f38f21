use tapeopt::interp::{self, Outcome};
use tapeopt::{compile_to_c, optimize_source, ConfigFile, OptConfig, Stmt};

const HELLO: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

fn halted(outcome: Outcome) -> interp::Trace {
    match outcome {
        Outcome::Halted(trace) => trace,
        Outcome::OutOfFuel(trace) => panic!("out of fuel: {:?}", trace),
    }
}

#[test]
fn known_transfer_folds_to_straight_line() {
    let optimized = optimize_source("[-]+++[->++<]", &OptConfig::default()).unwrap();
    assert_eq!(
        optimized.program.body,
        vec![Stmt::Move(1), Stmt::Add(6), Stmt::Move(-1)]
    );
    let trace = halted(interp::run(&optimized.program, b"", 1000));
    assert_eq!(trace.tape.get(&1), Some(&6));
    assert_eq!(trace.tape.get(&0), None);
}

#[test]
fn known_transfer_compiles_to_one_statement() {
    let c = compile_to_c("[-]+++[->++<]", &ConfigFile::default()).unwrap();
    insta::assert_snapshot!(c, @r###"
    #include <stdio.h>

    static unsigned char tape[30000];

    static unsigned char read_byte(void) {
        int c = getchar();
        return c == EOF ? 0 : (unsigned char)c;
    }

    int main(void) {
        unsigned char *ptr = tape;
        ptr[1] += 6;
        return 0;
    }
    "###);
}

#[test]
fn hello_world_survives_every_level() {
    let original = tapeopt::syntax::parse(HELLO).unwrap();
    let expected = halted(interp::run(&original, b"", 1_000_000));
    assert_eq!(expected.output, b"Hello World!\n");
    for level in 0..=3 {
        let optimized = optimize_source(HELLO, &OptConfig::default().with_level(level)).unwrap();
        let trace = halted(interp::run(&optimized.program, b"", 1_000_000));
        assert_eq!(trace, expected, "level {}", level);
    }
}

#[test]
fn cat_keeps_its_loop() {
    let optimized = optimize_source(",[.,]", &OptConfig::default().with_level(3)).unwrap();
    assert_eq!(optimized.program.loop_count(), 1);
    let trace = halted(interp::run(&optimized.program, b"abc", 1000));
    assert_eq!(trace.output, b"abc");
}

#[test]
fn syntax_errors_are_reported_with_spans() {
    let errors = compile_to_c("+]", &ConfigFile::default()).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "missing open bracket");
    assert_eq!(errors[0].span.start, 1);

    let errors = compile_to_c("[[", &ConfigFile::default()).unwrap_err();
    assert_eq!(errors.len(), 2);
}

#[test]
fn io_only_programs_are_untouched() {
    let optimized = optimize_source(".,.", &OptConfig::default()).unwrap();
    assert_eq!(
        optimized.program.body,
        vec![Stmt::Output(1), Stmt::Input(1), Stmt::Output(1)]
    );
}

#[test]
fn dead_tape_writes_vanish_when_only_io_is_observable() {
    let config = OptConfig {
        final_tape_live: false,
        ..OptConfig::default()
    };
    let optimized = optimize_source(",.>+++>,[-]<<", &config).unwrap();
    assert!(!optimized.program.any(|s| matches!(s, Stmt::Add(_) | Stmt::ZeroLoop)));
    assert!(optimized.stats.dead_stores_removed >= 1);
}

#[test]
fn flag_driven_loops_match_for_every_input_byte() {
    // Cell 1 holds a flag that is 0 or 1 when the second loop tests it.
    let source = ",[>+<[-]]>[<+++.>-]<.";
    let original = tapeopt::syntax::parse(source).unwrap();
    for level in 2..=3 {
        let optimized = optimize_source(source, &OptConfig::default().with_level(level)).unwrap();
        assert!(optimized
            .program
            .any(|s| matches!(s, Stmt::Conditional(_))));
        for byte in 0..=255u8 {
            let expected = halted(interp::run(&original, &[byte], 10_000));
            let trace = halted(interp::run(&optimized.program, &[byte], 10_000));
            assert_eq!(trace, expected, "level {} input {}", level, byte);
        }
    }
}

#[test]
fn guarded_multiplication_in_c() {
    let c = compile_to_c(",[-<+>]", &ConfigFile::default()).unwrap();
    assert!(c.contains("    if (*ptr) {\n        ptr[-1] += *ptr;\n        *ptr = 0;\n    }\n"));
}
