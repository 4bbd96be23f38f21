//! Local pattern optimizer.
//!
//! Runs pattern-based rewrites on a statement tree until nothing changes:
//! run coalescing, cancellation, zero/scan/multiplication loop recognition
//! and a few overwrite rules that need no global facts.


use std::collections::BTreeMap;

use tracing::trace;

use crate::field;
use crate::ir::{Program, Stmt};

/// Apply all local rewrites until no more changes occur.
pub fn optimize(program: Program) -> Program {
    let mut body = program.body;
    let mut rounds = 0usize;
    loop {
        let before = body.clone();
        body = optimize_block(body);
        rounds += 1;
        if body == before {
            break;
        }
    }
    trace!(rounds, "local optimizer converged");
    Program::new(body)
}

fn optimize_block(block: Vec<Stmt>) -> Vec<Stmt> {
    let block = optimize_nested(block);
    let block = coalesce(block);
    let block = recognize_loops(block);
    let block = drop_overwritten(block);
    drop_dead_loops(block)
}

/// Recurse into loop and conditional bodies.
fn optimize_nested(block: Vec<Stmt>) -> Vec<Stmt> {
    block
        .into_iter()
        .map(|stmt| match stmt {
            Stmt::Loop(body) => Stmt::Loop(optimize_block(body)),
            Stmt::Conditional(body) => Stmt::Conditional(optimize_block(body)),
            other => other,
        })
        .collect()
}

/// Merge adjacent runs of the same kind and delete runs with no net effect.
/// I/O runs are merged but never deleted.
fn coalesce(block: Vec<Stmt>) -> Vec<Stmt> {
    let mut out: Vec<Stmt> = Vec::with_capacity(block.len());
    for stmt in block {
        let merged = match (out.last_mut(), &stmt) {
            (Some(Stmt::Add(a)), Stmt::Add(b)) => {
                *a = a.wrapping_add(*b);
                true
            }
            (Some(Stmt::Move(a)), Stmt::Move(b)) => match a.checked_add(*b) {
                Some(sum) => {
                    *a = sum;
                    true
                }
                None => false,
            },
            (Some(Stmt::Output(a)), Stmt::Output(b)) => match a.checked_add(*b) {
                Some(sum) => {
                    *a = sum;
                    true
                }
                None => false,
            },
            (Some(Stmt::Input(a)), Stmt::Input(b)) => match a.checked_add(*b) {
                Some(sum) => {
                    *a = sum;
                    true
                }
                None => false,
            },
            _ => false,
        };
        if merged {
            if matches!(out.last(), Some(Stmt::Add(0)) | Some(Stmt::Move(0))) {
                out.pop();
            }
        } else if !matches!(stmt, Stmt::Add(0) | Stmt::Move(0)) {
            out.push(stmt);
        }
    }
    out
}

/// Replace recognizable loops with their specialized forms.
fn recognize_loops(block: Vec<Stmt>) -> Vec<Stmt> {
    block
        .into_iter()
        .map(|stmt| match stmt {
            Stmt::Loop(body) => recognize(body),
            other => other,
        })
        .collect()
}

fn recognize(body: Vec<Stmt>) -> Stmt {
    match body.as_slice() {
        [Stmt::Add(k)] if k % 2 == 1 => return Stmt::ZeroLoop,
        [Stmt::Move(step)] => return Stmt::ScanLoop(*step),
        _ => {}
    }
    match multiplication(&body) {
        Some(stmt) => stmt,
        None => Stmt::Loop(body),
    }
}

/// Recognize a transfer loop: only `Add`/`Move`, balanced, with the control
/// cell losing an odd amount per iteration.
///
/// Even decrements are left alone. Whether they terminate depends on the
/// parity of the control value, which only the global analysis can prove.
fn multiplication(body: &[Stmt]) -> Option<Stmt> {
    let mut offset = 0i64;
    let mut net: BTreeMap<i64, u8> = BTreeMap::new();
    for stmt in body {
        match stmt {
            Stmt::Add(d) => {
                let entry = net.entry(offset).or_insert(0);
                *entry = entry.wrapping_add(*d);
            }
            Stmt::Move(d) => offset = offset.checked_add(*d)?,
            _ => return None,
        }
    }
    if offset != 0 {
        return None;
    }
    let decrement = net.remove(&0).unwrap_or(0).wrapping_neg();
    field::inverse(decrement)?;
    let effects: Vec<(i64, u8)> = net.into_iter().filter(|(_, k)| *k != 0).collect();
    if effects.is_empty() {
        return Some(Stmt::ZeroLoop);
    }
    Some(Stmt::MultiplicationLoop { decrement, effects })
}

/// Drop writes to the current cell that are immediately overwritten:
/// `Add` or `ZeroLoop` followed by `ZeroLoop` or `Input`.
fn drop_overwritten(block: Vec<Stmt>) -> Vec<Stmt> {
    let mut out: Vec<Stmt> = Vec::with_capacity(block.len());
    for stmt in block {
        if matches!(stmt, Stmt::ZeroLoop | Stmt::Input(_)) {
            while matches!(out.last(), Some(Stmt::Add(_)) | Some(Stmt::ZeroLoop)) {
                out.pop();
            }
        }
        out.push(stmt);
    }
    out
}

/// A loop-like statement directly after a loop sees a zero control cell and
/// never runs.
fn drop_dead_loops(block: Vec<Stmt>) -> Vec<Stmt> {
    let mut out: Vec<Stmt> = Vec::with_capacity(block.len());
    for stmt in block {
        let after_loop = out.last().is_some_and(leaves_zero);
        if after_loop && tests_current(&stmt) {
            continue;
        }
        out.push(stmt);
    }
    out
}

/// Statements after which the current cell is known to be zero.
fn leaves_zero(stmt: &Stmt) -> bool {
    matches!(
        stmt,
        Stmt::Loop(_) | Stmt::ZeroLoop | Stmt::ScanLoop(_) | Stmt::MultiplicationLoop { .. }
    )
}

/// Statements that do nothing when the current cell is zero.
fn tests_current(stmt: &Stmt) -> bool {
    leaves_zero(stmt) || matches!(stmt, Stmt::Conditional(_))
}
