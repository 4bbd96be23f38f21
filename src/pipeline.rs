//! Optimization driver.
//!
//! Sequences the passes of [`crate::opt`] per optimization level and runs the
//! global ones to a fixed point, detected by fingerprinting each revision.
//! Every revision the driver hands back is a complete, sound program: running
//! out of passes only costs precision.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::{Analysis, AnalysisConfig};
use crate::config::OptConfig;
use crate::ir::Program;
use crate::opt::{conditional, dce, dse, fold::Folder, local};

/// What the optimizer did to one program.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Global passes run.
    pub passes: usize,
    pub stmts_before: usize,
    pub stmts_after: usize,
    /// General loops before and after.
    pub loops_before: usize,
    pub loops_after: usize,
    pub loops_folded: usize,
    pub conditionals: usize,
    pub dead_code_removed: usize,
    pub dead_stores_removed: usize,
    /// The pass budget ran out before a fixed point.
    pub budget_exhausted: bool,
}

pub struct Optimized {
    pub program: Program,
    pub stats: PassStats,
}

pub struct Pipeline {
    config: OptConfig,
}

impl Pipeline {
    pub fn new(config: OptConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, program: Program) -> Optimized {
        let mut stats = PassStats {
            stmts_before: program.stmt_count(),
            loops_before: program.loop_count(),
            ..PassStats::default()
        };
        let program = match self.config.level {
            0 => program,
            1 => local::optimize(program),
            _ => self.global(local::optimize(program), &mut stats),
        };
        stats.stmts_after = program.stmt_count();
        stats.loops_after = program.loop_count();
        info!(
            level = self.config.level,
            before = stats.stmts_before,
            after = stats.stmts_after,
            passes = stats.passes,
            "optimized"
        );
        Optimized { program, stats }
    }

    fn global(&self, mut program: Program, stats: &mut PassStats) -> Program {
        let analysis_config = AnalysisConfig::from(&self.config);
        let rewrite_unknown = self.config.level >= 3 && self.config.summaries;
        let mut seen = HashSet::new();
        seen.insert(program.fingerprint());

        for pass in 1..=self.config.max_passes {
            stats.passes = pass;

            let analysis = Analysis::run(&program, &analysis_config);
            program = dce::eliminate(program, &analysis, &mut stats.dead_code_removed);

            let analysis = Analysis::run(&program, &analysis_config);
            let mut folder = Folder::new(&analysis, self.config.summaries, rewrite_unknown);
            program = folder.fold(program);
            stats.loops_folded += folder.counts.loops_folded;
            stats.conditionals += folder.counts.conditionals;

            program = local::optimize(program);
            program = Program::new(conditional::convert_clearing(
                program.body,
                &mut stats.conditionals,
            ));
            program = dse::eliminate(
                program,
                self.config.final_tape_live,
                &mut stats.dead_stores_removed,
            );
            program = local::optimize(program);

            debug!(
                pass,
                stmts = program.stmt_count(),
                loops = program.loop_count(),
                "global pass"
            );
            if !seen.insert(program.fingerprint()) {
                return program;
            }
        }

        stats.budget_exhausted = true;
        warn!(
            max_passes = self.config.max_passes,
            "pass budget exhausted before a fixed point"
        );
        program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Stmt;
    use crate::syntax::parse;

    fn run(source: &str, config: OptConfig) -> Optimized {
        Pipeline::new(config).run(parse(source).unwrap())
    }

    #[test]
    fn level_zero_is_identity() {
        let program = parse("+-[->+<]").unwrap();
        let out = Pipeline::new(OptConfig::default().with_level(0)).run(program.clone());
        assert_eq!(out.program, program);
        assert_eq!(out.stats.passes, 0);
    }

    #[test]
    fn level_one_is_local_only() {
        let out = run("+++[->++<]", OptConfig::default().with_level(1));
        assert_eq!(
            out.program.body,
            vec![
                Stmt::Add(3),
                Stmt::MultiplicationLoop {
                    decrement: 1,
                    effects: vec![(1, 2)]
                }
            ]
        );
    }

    #[test]
    fn folds_a_known_transfer() {
        let out = run("[-]+++[->++<]", OptConfig::default());
        assert_eq!(
            out.program.body,
            vec![Stmt::Move(1), Stmt::Add(6), Stmt::Move(-1)]
        );
        assert_eq!(out.stats.loops_after, 0);
        assert!(!out.stats.budget_exhausted);
        assert!(out.stats.loops_folded >= 1);
    }

    #[test]
    fn stats_count_before_and_after() {
        let out = run("++[>++<-]>.", OptConfig::default());
        assert_eq!(out.stats.stmts_before, 10);
        assert_eq!(out.stats.loops_before, 1);
        assert_eq!(out.stats.loops_after, 0);
        assert!(out.stats.stmts_after < out.stats.stmts_before);
    }

    #[test]
    fn exhausted_budget_still_returns_a_program() {
        let config = OptConfig {
            max_passes: 1,
            ..OptConfig::default()
        };
        let out = run("[-]+++[->++<]", config);
        assert!(out.stats.budget_exhausted);
        assert_eq!(out.stats.passes, 1);
        assert_eq!(
            out.program.body,
            vec![Stmt::Move(1), Stmt::Add(6), Stmt::Move(-1)]
        );
    }

    #[test]
    fn stats_serialize_to_json() {
        let out = run("+.", OptConfig::default());
        let json = serde_json::to_value(&out.stats).unwrap();
        assert_eq!(json["passes"], 1);
        assert_eq!(json["budget_exhausted"], false);
    }
}
