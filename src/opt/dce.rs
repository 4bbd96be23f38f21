//! Dead code elimination over executable edges.
//!
//! Deletes statements no executable path reaches, and loop-like statements
//! whose body edge is never taken (their control cell is always zero, so
//! they do nothing).

use tracing::debug;

use crate::analysis::cfg::Cfg;
use crate::analysis::{Analysis, Path};
use crate::ir::{Program, Stmt};
use std::collections::HashSet;

pub fn eliminate(program: Program, analysis: &Analysis, removed: &mut usize) -> Program {
    let cfg = Cfg::build(&program, analysis);
    let reachable = cfg.reachable();
    let before = *removed;
    let body = block(program.body, &[], analysis, &reachable, removed);
    debug!(
        removed = *removed - before,
        exit_reachable = cfg.exit_reachable(),
        "dead code elimination"
    );
    Program::new(body)
}

fn block(
    block: Vec<Stmt>,
    prefix: &[usize],
    analysis: &Analysis,
    reachable: &HashSet<Path>,
    removed: &mut usize,
) -> Vec<Stmt> {
    let mut out = Vec::with_capacity(block.len());
    for (i, stmt) in block.into_iter().enumerate() {
        let mut path = prefix.to_vec();
        path.push(i);
        if !reachable.contains(&path) {
            *removed += size(&stmt);
            continue;
        }
        let tests_current = matches!(
            stmt,
            Stmt::Loop(_)
                | Stmt::Conditional(_)
                | Stmt::ZeroLoop
                | Stmt::ScanLoop(_)
                | Stmt::MultiplicationLoop { .. }
        );
        if tests_current && !analysis.edges(&path).enter {
            *removed += size(&stmt);
            continue;
        }
        match stmt {
            Stmt::Loop(body) => {
                out.push(Stmt::Loop(self::block(body, &path, analysis, reachable, removed)));
            }
            Stmt::Conditional(body) => {
                let body = self::block(body, &path, analysis, reachable, removed);
                if body.is_empty() {
                    *removed += 1;
                } else {
                    out.push(Stmt::Conditional(body));
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn size(stmt: &Stmt) -> usize {
    1 + stmt.body().map_or(0, |b| b.iter().map(size).sum())
}
