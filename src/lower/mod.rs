//! Offset lowering.
//!
//! Replaces pointer movement inside straight-line code with cell offsets:
//! `>>+<-` becomes `ptr[2] += 1; ptr[1] -= 1; ptr += 1`. The pending
//! (virtual) offset is flushed into one physical `Move` before anything
//! that tests or reads the current cell through the pointer: loops,
//! conditionals, scans, multiplication loops and I/O, and at the end of
//! every block so loop bodies keep their net movement. A multiplication
//! loop becomes a guarded block of `MulAdd`s, so its effect cells are only
//! accessed when the source loop would run.


use crate::field;
use crate::ir::{Program, Stmt};

/// A lowered operation. Offsets are relative to the physical pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Add { offset: i64, delta: u8 },
    Set { offset: i64, value: u8 },
    /// `ptr[offset] += ptr[0] * factor`.
    MulAdd { offset: i64, factor: u8 },
    Output(u32),
    Input(u32),
    Move(i64),
    Loop(Vec<Op>),
    Conditional(Vec<Op>),
    Scan(i64),
}

pub fn lower(program: &Program) -> Vec<Op> {
    lower_block(&program.body)
}

fn lower_block(block: &[Stmt]) -> Vec<Op> {
    let mut lowering = Lowering::default();
    for stmt in block {
        lowering.stmt(stmt);
    }
    lowering.flush();
    lowering.out
}

#[derive(Default)]
struct Lowering {
    out: Vec<Op>,
    /// Pointer movement not yet emitted.
    offset: i64,
}

impl Lowering {
    fn flush(&mut self) {
        if self.offset != 0 {
            self.out.push(Op::Move(self.offset));
            self.offset = 0;
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Add(delta) => self.add(self.offset, *delta),
            Stmt::Move(d) => self.offset += d,
            Stmt::ZeroLoop => self.set(self.offset, 0),
            Stmt::Output(n) => {
                self.flush();
                self.out.push(Op::Output(*n));
            }
            Stmt::Input(n) => {
                self.flush();
                self.out.push(Op::Input(*n));
            }
            Stmt::ScanLoop(step) => {
                self.flush();
                self.out.push(Op::Scan(*step));
            }
            Stmt::Loop(body) => {
                self.flush();
                self.out.push(Op::Loop(lower_block(body)));
            }
            Stmt::Conditional(body) => {
                self.flush();
                self.out.push(Op::Conditional(lower_block(body)));
            }
            Stmt::MultiplicationLoop { decrement, effects } => {
                self.flush();
                self.multiplication(*decrement, effects);
            }
        }
    }

    /// Add to a cell, folding into a directly preceding write of the same cell.
    fn add(&mut self, offset: i64, delta: u8) {
        match self.out.last_mut() {
            Some(Op::Add { offset: o, delta: d }) if *o == offset => {
                *d = d.wrapping_add(delta);
                if *d == 0 {
                    self.out.pop();
                }
            }
            Some(Op::Set { offset: o, value }) if *o == offset => {
                *value = value.wrapping_add(delta);
            }
            _ => self.out.push(Op::Add { offset, delta }),
        }
    }

    fn set(&mut self, offset: i64, value: u8) {
        match self.out.last() {
            Some(Op::Add { offset: o, .. } | Op::Set { offset: o, .. }) if *o == offset => {
                self.out.pop();
            }
            _ => {}
        }
        self.out.push(Op::Set { offset, value });
    }

    fn multiplication(&mut self, decrement: u8, effects: &[(i64, u8)]) {
        match field::inverse(decrement) {
            Some(inv) => {
                let mut body: Vec<Op> = effects
                    .iter()
                    .filter_map(|(offset, factor)| {
                        let factor = factor.wrapping_mul(inv);
                        (factor != 0).then_some(Op::MulAdd {
                            offset: *offset,
                            factor,
                        })
                    })
                    .collect();
                if body.is_empty() {
                    self.set(0, 0);
                    return;
                }
                // The loop never touches its effect cells on a zero control.
                body.push(Op::Set {
                    offset: 0,
                    value: 0,
                });
                self.out.push(Op::Conditional(body));
            }
            None => {
                // Not a closed form; keep the loop.
                let mut body = vec![Op::Add {
                    offset: 0,
                    delta: decrement.wrapping_neg(),
                }];
                body.extend(effects.iter().map(|(offset, factor)| Op::Add {
                    offset: *offset,
                    delta: *factor,
                }));
                self.out.push(Op::Loop(body));
            }
        }
    }
}
