//! Fact-driven rewrites.
//!
//! Uses the constant and interval facts of one program revision to:
//! - delete loop-like statements whose control cell is known to be zero,
//! - turn loops with a known control value into straight-line code,
//! - inline conditionals whose control cell is known to be non-zero,
//! - convert count-down loops with a boolean control into conditionals,
//! - at the highest level, rewrite summarizable loops with unknown control.
//!
//! Facts are looked up by the paths of the revision they were computed on,
//! so the walk enumerates the original statements while building the new
//! tree.

use tracing::debug;

use crate::analysis::summary::{self, LoopSummary};
use crate::analysis::Analysis;
use crate::ir::{Program, Stmt};
use crate::opt::conditional;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FoldCounts {
    /// Loop-like statements deleted or rewritten to straight-line code.
    pub loops_folded: usize,
    /// Loops converted to conditionals.
    pub conditionals: usize,
}

pub struct Folder<'a> {
    analysis: &'a Analysis,
    summaries: bool,
    /// Rewrite summarizable loops even when the control value is unknown.
    rewrite_unknown: bool,
    pub counts: FoldCounts,
}

impl<'a> Folder<'a> {
    pub fn new(analysis: &'a Analysis, summaries: bool, rewrite_unknown: bool) -> Self {
        Self {
            analysis,
            summaries,
            rewrite_unknown,
            counts: FoldCounts::default(),
        }
    }

    pub fn fold(&mut self, program: Program) -> Program {
        let body = self.block(program.body, &[]);
        debug!(
            folded = self.counts.loops_folded,
            conditionals = self.counts.conditionals,
            "fold pass"
        );
        Program::new(body)
    }

    fn block(&mut self, block: Vec<Stmt>, prefix: &[usize]) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(block.len());
        for (i, stmt) in block.into_iter().enumerate() {
            let mut path = prefix.to_vec();
            path.push(i);
            if self.analysis.is_reachable(&path) {
                self.stmt(stmt, &path, &mut out);
            } else {
                out.push(stmt);
            }
        }
        out
    }

    fn stmt(&mut self, stmt: Stmt, path: &[usize], out: &mut Vec<Stmt>) {
        let known = self.analysis.constant_at(path);
        let tests_current = matches!(
            stmt,
            Stmt::ZeroLoop
                | Stmt::ScanLoop(_)
                | Stmt::MultiplicationLoop { .. }
                | Stmt::Loop(_)
                | Stmt::Conditional(_)
        );
        if tests_current && known == Some(0) {
            self.counts.loops_folded += 1;
            return;
        }
        match stmt {
            Stmt::ZeroLoop => match known {
                Some(c) => {
                    self.counts.loops_folded += 1;
                    out.push(Stmt::Add(c.wrapping_neg()));
                }
                None => out.push(Stmt::ZeroLoop),
            },
            Stmt::MultiplicationLoop { decrement, effects } => {
                let summary = LoopSummary {
                    decrement,
                    deltas: effects.iter().copied().collect(),
                    assigns: Default::default(),
                };
                match known.and_then(|c| summary.rewrite(Some(c))) {
                    Some(stmts) => {
                        self.counts.loops_folded += 1;
                        out.extend(stmts);
                    }
                    None => out.push(Stmt::MultiplicationLoop { decrement, effects }),
                }
            }
            Stmt::Conditional(body) => {
                let body = self.block(body, path);
                if self.analysis.nonzero_at(path) {
                    self.counts.loops_folded += 1;
                    out.extend(body);
                } else if !body.is_empty() {
                    out.push(Stmt::Conditional(body));
                }
            }
            Stmt::Loop(body) => {
                let body = self.block(body, path);
                self.repeat(body, path, known, out);
            }
            other => out.push(other),
        }
    }

    fn repeat(&mut self, body: Vec<Stmt>, path: &[usize], known: Option<u8>, out: &mut Vec<Stmt>) {
        let summary = if self.summaries {
            summary::summarize(&body)
        } else {
            None
        };
        if let (Some(c), Some(s)) = (known, &summary) {
            if let Some(stmts) = s.rewrite(Some(c)) {
                self.counts.loops_folded += 1;
                out.extend(stmts);
                return;
            }
        }
        let body = if self.analysis.boolean_at(path) {
            match conditional::convert_boolean(body) {
                Ok(stmt) => {
                    self.counts.conditionals += 1;
                    out.push(stmt);
                    return;
                }
                Err(body) => body,
            }
        } else {
            body
        };
        if self.rewrite_unknown {
            if let Some(stmts) = summary.and_then(|s| s.rewrite(None)) {
                self.counts.loops_folded += 1;
                out.extend(stmts);
                return;
            }
        }
        out.push(Stmt::Loop(body));
    }
}
