//! Dead store elimination.
//!
//! A backward walk with the live set from [`crate::analysis::liveness`].
//! Writes whose only effect is on a dead cell are removed; multiplication
//! loops lose their dead effects.

use tracing::debug;

use crate::analysis::liveness::{self, LiveSet};
use crate::ir::{self, Program, Stmt};

/// Remove dead stores. With `final_tape_live` the tape contents at program
/// exit count as observable.
pub fn eliminate(program: Program, final_tape_live: bool, removed: &mut usize) -> Program {
    let live_out = if final_tape_live {
        LiveSet::everything()
    } else {
        LiveSet::none()
    };
    let before = *removed;
    let (body, live_in) = block(program.body, &live_out, removed);
    debug!(
        removed = *removed - before,
        entry_all_live = live_in.is_everything(),
        "dead store elimination"
    );
    Program::new(body)
}

/// Returns the rewritten block and the live set at its start.
fn block(block: Vec<Stmt>, live_out: &LiveSet, removed: &mut usize) -> (Vec<Stmt>, LiveSet) {
    let mut live = live_out.clone();
    let mut out = Vec::with_capacity(block.len());
    for stmt in block.into_iter().rev() {
        match stmt {
            Stmt::Add(_) | Stmt::ZeroLoop if !live.contains(0) => {
                *removed += 1;
            }
            Stmt::MultiplicationLoop { decrement, effects } => {
                let kept: Vec<(i64, u8)> = effects
                    .iter()
                    .copied()
                    .filter(|(offset, _)| live.contains(*offset))
                    .collect();
                *removed += effects.len() - kept.len();
                let stmt = if !kept.is_empty() {
                    Stmt::MultiplicationLoop {
                        decrement,
                        effects: kept,
                    }
                } else if live.contains(0) {
                    Stmt::ZeroLoop
                } else {
                    *removed += 1;
                    continue;
                };
                live = liveness::transfer(&stmt, &live);
                out.push(stmt);
            }
            Stmt::Loop(body) => {
                let header = liveness::loop_header(&body, &live);
                let (body, _) = self::block(body, &header, removed);
                out.push(Stmt::Loop(body));
                live = header;
            }
            Stmt::Conditional(body) => {
                if ir::is_balanced(&body) {
                    let (body, body_in) = self::block(body, &live, removed);
                    live = body_in.union(&live);
                    live.insert(0);
                    out.push(Stmt::Conditional(body));
                } else {
                    let (body, _) = self::block(body, &LiveSet::everything(), removed);
                    live = LiveSet::everything();
                    out.push(Stmt::Conditional(body));
                }
            }
            other => {
                live = liveness::transfer(&other, &live);
                out.push(other);
            }
        }
    }
    out.reverse();
    (out, live)
}
