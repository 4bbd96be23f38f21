use super::*;
use crate::analysis::lattice::{Constant, Interval};
use crate::syntax::parse;

fn run<D: Domain>(source: &str) -> Facts<D> {
    analyze::<D>(&parse(source).unwrap(), &AnalysisConfig::default())
}

#[test]
fn straight_line_constants() {
    let facts = run::<Constant>("+++>++<-");
    assert_eq!(facts.exit.current(), Constant::Value(2));
    assert_eq!(facts.exit.get(1), Constant::Value(2));
    assert_eq!(facts.control(&[4]), Constant::Value(0));
}

#[test]
fn input_is_unknown() {
    let facts = run::<Interval>(",+");
    assert_eq!(facts.exit.current(), Interval::Top);
}

#[test]
fn loop_on_zero_is_never_entered() {
    let facts = run::<Constant>("[>+<-]+");
    let edges = facts.edges(&[0]);
    assert!(!edges.enter);
    assert!(edges.exit);
    assert!(!facts.is_reachable(&[0, 0]));
    assert!(facts.is_reachable(&[1]));
}

#[test]
fn copy_loop_folds_through_summary() {
    let facts = run::<Constant>("[-]+++[->++<]");
    assert_eq!(facts.exit.current(), Constant::Value(0));
    assert_eq!(facts.exit.get(1), Constant::Value(6));
}

#[test]
fn summaries_sharpen_the_fixed_point() {
    let program = parse("++[>+<-]>").unwrap();
    let without = AnalysisConfig {
        summaries: false,
        ..AnalysisConfig::default()
    };
    let plain = analyze::<Constant>(&program, &without);
    assert_eq!(plain.exit.current(), Constant::Top);
    let summarized = analyze::<Constant>(&program, &AnalysisConfig::default());
    assert_eq!(summarized.exit.current(), Constant::Value(2));
}

#[test]
fn infinite_loop_makes_the_rest_unreachable() {
    let facts = run::<Constant>("+[]>+");
    let edges = facts.edges(&[1]);
    assert!(edges.enter);
    assert!(!edges.exit);
    assert!(!facts.is_reachable(&[2]));
    assert!(!facts.exit.is_reachable());
}

#[test]
fn odd_start_with_even_decrement_never_exits() {
    let facts = run::<Constant>("+++[-->+<]>.");
    assert!(!facts.edges(&[3]).exit);
    assert!(!facts.is_reachable(&[5]));
}

#[test]
fn branch_refinement_keeps_boolean_range() {
    // The loop runs at most once and leaves 0 or 1 in the cell to its left.
    let facts = run::<Interval>(">,[[-]<+>]<");
    assert_eq!(facts.exit.current(), Interval::range(0, 1));
    assert!(facts.exit.current().is_boolean());
}

#[test]
fn unbalanced_loop_reaches_a_fixed_point() {
    let facts = run::<Constant>("+[>+]");
    // The body keeps moving right over fresh cells; the result is sound but
    // knows nothing about the landing cell apart from the loop test.
    assert!(facts.exit.is_reachable());
    assert_eq!(facts.exit.current(), Constant::Value(0));
}

#[test]
fn scan_stops_at_known_zero() {
    let program = Program::new(vec![
        Stmt::Add(1),
        Stmt::Move(1),
        Stmt::Add(1),
        Stmt::Move(1),
        Stmt::Add(1),
        Stmt::Move(-2),
        Stmt::ScanLoop(1),
        Stmt::Add(1),
    ]);
    let facts = analyze::<Constant>(&program, &AnalysisConfig::default());
    assert_eq!(facts.exit.current(), Constant::Value(1));
    assert_eq!(facts.exit.get(-1), Constant::Value(1));
    assert_eq!(facts.exit.get(-3), Constant::Value(1));
}

#[test]
fn scan_over_unknown_cells_loses_the_pointer() {
    let program = Program::new(vec![
        Stmt::Add(1),
        Stmt::Move(1),
        Stmt::Input(1),
        Stmt::Move(-1),
        Stmt::ScanLoop(1),
    ]);
    let facts = analyze::<Interval>(&program, &AnalysisConfig::default());
    assert!(facts.exit.is_reachable());
    assert_eq!(facts.exit.current(), Interval::constant(0));
    assert_eq!(facts.exit.get(1), Interval::Top);
}

#[test]
fn conditional_joins_both_branches() {
    let program = Program::new(vec![
        Stmt::Input(1),
        Stmt::Conditional(vec![Stmt::Move(1), Stmt::Add(5), Stmt::Move(-1)]),
        Stmt::Move(1),
    ]);
    let facts = analyze::<Interval>(&program, &AnalysisConfig::default());
    assert_eq!(facts.exit.current(), Interval::range(0, 5));
    let edges = facts.edges(&[1]);
    assert!(edges.enter && edges.exit);
}

#[test]
fn multiplication_loop_transfer() {
    let program = Program::new(vec![
        Stmt::Add(7),
        Stmt::MultiplicationLoop {
            decrement: 1,
            effects: vec![(1, 3), (2, 255)],
        },
    ]);
    let facts = analyze::<Constant>(&program, &AnalysisConfig::default());
    assert_eq!(facts.exit.current(), Constant::Value(0));
    assert_eq!(facts.exit.get(1), Constant::Value(21));
    assert_eq!(facts.exit.get(2), Constant::Value(249));
}

#[test]
fn unzeroed_tape_starts_unknown() {
    let program = parse("[-]>+").unwrap();
    let config = AnalysisConfig {
        assume_zeroed_tape: false,
        ..AnalysisConfig::default()
    };
    let facts = analyze::<Constant>(&program, &config);
    assert!(facts.edges(&[0]).enter);
    assert_eq!(facts.exit.get(-1), Constant::Value(0));
    assert_eq!(facts.exit.current(), Constant::Top);
}
