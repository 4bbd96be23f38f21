//! Conditional conversion: loops that provably run at most once.
//!
//! Two shapes qualify. Both need a balanced body with no nested repeating
//! statement:
//!
//! 1. The body clears the control cell with a top-level `ZeroLoop` and
//!    never writes it again afterwards. Needs no facts.
//! 2. Every write to the control cell is a top-level `Add`, the adds sum to
//!    -1, and the control value is provably 0 or 1 on entry.

use crate::ir::{self, Stmt};

/// What a body does to its control cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Cleared by a trailing `ZeroLoop`: at most one iteration.
    Clears,
    /// Decremented by exactly one: at most one iteration for boolean input.
    CountsDown,
    Other,
}

/// Classify a loop body.
pub fn shape(body: &[Stmt]) -> Shape {
    if !ir::is_balanced(body) || contains_repeating(body) {
        return Shape::Other;
    }
    let mut offset = 0i64;
    let mut cleared = false;
    let mut total: u8 = 0;
    let mut only_adds = true;
    for stmt in body {
        match stmt {
            Stmt::Move(d) => offset += d,
            Stmt::Add(d) if offset == 0 => {
                total = total.wrapping_add(*d);
                cleared = false;
            }
            Stmt::ZeroLoop if offset == 0 => {
                cleared = true;
                only_adds = false;
            }
            Stmt::Input(_) if offset == 0 => {
                cleared = false;
                only_adds = false;
            }
            Stmt::Conditional(inner) => {
                let writes_control = ir::written_offsets(inner)
                    .map_or(true, |w| w.contains(&(-offset)));
                if writes_control {
                    cleared = false;
                    only_adds = false;
                }
            }
            _ => {}
        }
    }
    if cleared {
        Shape::Clears
    } else if only_adds && total == 255 {
        Shape::CountsDown
    } else {
        Shape::Other
    }
}

fn contains_repeating(block: &[Stmt]) -> bool {
    block.iter().any(|s| {
        s.is_repeating() || s.body().map_or(false, contains_repeating)
    })
}

/// Rewrite a loop whose body clears its control cell.
fn convert(body: Vec<Stmt>) -> Stmt {
    if body == [Stmt::ZeroLoop] {
        Stmt::ZeroLoop
    } else {
        Stmt::Conditional(body)
    }
}

/// Convert every loop whose body clears its control cell, bottom up,
/// counting conversions in `converted`.
pub fn convert_clearing(block: Vec<Stmt>, converted: &mut usize) -> Vec<Stmt> {
    block
        .into_iter()
        .map(|stmt| match stmt {
            Stmt::Loop(body) => {
                let body = convert_clearing(body, converted);
                if shape(&body) == Shape::Clears {
                    *converted += 1;
                    convert(body)
                } else {
                    Stmt::Loop(body)
                }
            }
            Stmt::Conditional(body) => Stmt::Conditional(convert_clearing(body, converted)),
            other => other,
        })
        .collect()
}

/// Rewrite a loop known to start with a boolean control value.
pub fn convert_boolean(body: Vec<Stmt>) -> Result<Stmt, Vec<Stmt>> {
    match shape(&body) {
        Shape::CountsDown | Shape::Clears => Ok(convert(body)),
        Shape::Other => Err(body),
    }
}
