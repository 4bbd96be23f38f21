//! Tape-machine intermediate representation.
//!
//! A program is a tree: structural statements (`Loop`, `Conditional`) own
//! their bodies, so every pass is a structural recursion over `Vec<Stmt>`.
//! The front end produces only `Add`, `Move`, `Output`, `Input` and `Loop`;
//! the remaining variants are introduced by the optimizer.


use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field;

// ─── Statements ────────────────────────────────────────────────────

/// A single IR statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stmt {
    /// Add `delta` (mod 256) to the current cell.
    Add(u8),
    /// Shift the pointer by a signed distance.
    Move(i64),
    /// Emit the current cell `count` times.
    Output(u32),
    /// Consume `count` input bytes; only the last one is stored.
    Input(u32),
    /// Run the body while the current cell is non-zero.
    Loop(Vec<Stmt>),
    /// Set the current cell to zero.
    ZeroLoop,
    /// Move by `step` until the visited cell is zero.
    ScanLoop(i64),
    /// Counted transfer loop. The control cell loses `decrement` (always odd)
    /// per iteration; each `(offset, factor)` cell gains `factor`.
    /// Effects are sorted by offset and never target offset 0.
    MultiplicationLoop { decrement: u8, effects: Vec<(i64, u8)> },
    /// Run the body once if the current cell is non-zero.
    Conditional(Vec<Stmt>),
}

impl Stmt {
    pub fn is_io(&self) -> bool {
        matches!(self, Stmt::Output(_) | Stmt::Input(_))
    }

    /// True for statements whose iteration count is not bounded by one.
    pub fn is_repeating(&self) -> bool {
        matches!(
            self,
            Stmt::Loop(_) | Stmt::ScanLoop(_) | Stmt::MultiplicationLoop { .. }
        )
    }

    pub fn body(&self) -> Option<&[Stmt]> {
        match self {
            Stmt::Loop(body) | Stmt::Conditional(body) => Some(body),
            _ => None,
        }
    }
}

// ─── Program ───────────────────────────────────────────────────────

/// A whole program: the top-level block of the statement tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Number of statements in the whole tree.
    pub fn stmt_count(&self) -> usize {
        count(&self.body, &|_| true)
    }

    /// Number of general (unrecognized) loops in the whole tree.
    pub fn loop_count(&self) -> usize {
        count(&self.body, &|s| matches!(s, Stmt::Loop(_)))
    }

    /// True if any statement in the tree satisfies `pred`.
    pub fn any(&self, pred: impl Fn(&Stmt) -> bool) -> bool {
        count(&self.body, &pred) > 0
    }

    /// Content hash of the statement tree, used to detect pipeline fixed points.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hash_block(&self.body, &mut hasher);
        hasher.finalize()
    }
}

fn count(block: &[Stmt], pred: &dyn Fn(&Stmt) -> bool) -> usize {
    block
        .iter()
        .map(|s| {
            let nested = s.body().map_or(0, |b| count(b, pred));
            usize::from(pred(s)) + nested
        })
        .sum()
}

fn hash_block(block: &[Stmt], hasher: &mut blake3::Hasher) {
    hasher.update(&(block.len() as u64).to_le_bytes());
    for stmt in block {
        match stmt {
            Stmt::Add(d) => {
                hasher.update(&[0, *d]);
            }
            Stmt::Move(d) => {
                hasher.update(&[1]).update(&d.to_le_bytes());
            }
            Stmt::Output(n) => {
                hasher.update(&[2]).update(&n.to_le_bytes());
            }
            Stmt::Input(n) => {
                hasher.update(&[3]).update(&n.to_le_bytes());
            }
            Stmt::Loop(body) => {
                hasher.update(&[4]);
                hash_block(body, hasher);
            }
            Stmt::ZeroLoop => {
                hasher.update(&[5]);
            }
            Stmt::ScanLoop(step) => {
                hasher.update(&[6]).update(&step.to_le_bytes());
            }
            Stmt::MultiplicationLoop { decrement, effects } => {
                hasher.update(&[7, *decrement]);
                hasher.update(&(effects.len() as u64).to_le_bytes());
                for (offset, factor) in effects {
                    hasher.update(&offset.to_le_bytes()).update(&[*factor]);
                }
            }
            Stmt::Conditional(body) => {
                hasher.update(&[8]);
                hash_block(body, hasher);
            }
        }
    }
}

// ─── Structural queries ────────────────────────────────────────────

/// Net pointer movement of a block, or `None` when it depends on runtime data
/// (scan loops, loops or conditionals with unbalanced bodies).
pub fn net_movement(block: &[Stmt]) -> Option<i64> {
    let mut total = 0i64;
    for stmt in block {
        match stmt {
            Stmt::Move(d) => total = total.checked_add(*d)?,
            Stmt::Loop(body) | Stmt::Conditional(body) => {
                if net_movement(body)? != 0 {
                    return None;
                }
            }
            Stmt::ScanLoop(_) => return None,
            _ => {}
        }
    }
    Some(total)
}

/// True if the block always returns the pointer to where it started.
pub fn is_balanced(block: &[Stmt]) -> bool {
    net_movement(block) == Some(0)
}

/// Offsets (relative to block entry) that a balanced block may write.
/// Returns `None` if the written set cannot be bounded statically.
pub fn written_offsets(block: &[Stmt]) -> Option<std::collections::BTreeSet<i64>> {
    let mut out = std::collections::BTreeSet::new();
    collect_writes(block, 0, &mut out)?;
    Some(out)
}

fn collect_writes(
    block: &[Stmt],
    base: i64,
    out: &mut std::collections::BTreeSet<i64>,
) -> Option<()> {
    let mut offset = base;
    for stmt in block {
        match stmt {
            Stmt::Add(_) | Stmt::Input(_) | Stmt::ZeroLoop => {
                out.insert(offset);
            }
            Stmt::Move(d) => offset += d,
            Stmt::Output(_) => {}
            Stmt::MultiplicationLoop { effects, .. } => {
                out.insert(offset);
                out.extend(effects.iter().map(|(o, _)| offset + o));
            }
            Stmt::Loop(body) | Stmt::Conditional(body) => {
                if !is_balanced(body) {
                    return None;
                }
                collect_writes(body, offset, out)?;
            }
            Stmt::ScanLoop(_) => return None,
        }
    }
    Some(())
}

// ─── Display ───────────────────────────────────────────────────────

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.body {
            write_stmt(f, stmt, 0)?;
        }
        Ok(())
    }
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    match stmt {
        Stmt::Add(d) => writeln!(f, "{pad}add {:+}", field::signed(*d)),
        Stmt::Move(d) => writeln!(f, "{pad}move {:+}", d),
        Stmt::Output(n) => writeln!(f, "{pad}out {}", n),
        Stmt::Input(n) => writeln!(f, "{pad}in {}", n),
        Stmt::ZeroLoop => writeln!(f, "{pad}zero"),
        Stmt::ScanLoop(step) => writeln!(f, "{pad}scan {:+}", step),
        Stmt::MultiplicationLoop { decrement, effects } => {
            let parts: Vec<String> = effects
                .iter()
                .map(|(o, k)| format!("{:+}:{:+}", o, field::signed(*k)))
                .collect();
            writeln!(f, "{pad}mul -{} [{}]", decrement, parts.join(" "))
        }
        Stmt::Loop(body) | Stmt::Conditional(body) => {
            let head = if matches!(stmt, Stmt::Loop(_)) { "loop" } else { "if" };
            writeln!(f, "{pad}{head} {{")?;
            for inner in body {
                write_stmt(f, inner, depth + 1)?;
            }
            writeln!(f, "{pad}}}")
        }
    }
}
