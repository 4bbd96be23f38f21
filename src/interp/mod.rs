//! Reference interpreter.
//!
//! Executes every IR variant literally on an unbounded tape of wrapping
//! cells: multiplication loops iterate, scans step. Used to check optimized
//! programs against their originals and by the `run` command.


use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::ir::{Program, Stmt};

/// Everything a run can observe.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Trace {
    pub output: Vec<u8>,
    /// Input bytes consumed, including reads past the end.
    pub consumed: usize,
    /// Non-zero cells at the end of the run.
    pub tape: BTreeMap<i64, u8>,
    pub pointer: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Halted(Trace),
    OutOfFuel(Trace),
}

impl Outcome {
    pub fn trace(&self) -> &Trace {
        match self {
            Outcome::Halted(t) | Outcome::OutOfFuel(t) => t,
        }
    }

    pub fn halted(&self) -> bool {
        matches!(self, Outcome::Halted(_))
    }
}

/// Ran out of fuel.
struct Exhausted;

pub struct Machine<'a> {
    tape: HashMap<i64, u8>,
    pointer: i64,
    input: &'a [u8],
    consumed: usize,
    output: Vec<u8>,
    fuel: u64,
}

impl<'a> Machine<'a> {
    pub fn new(input: &'a [u8], fuel: u64) -> Self {
        Self {
            tape: HashMap::new(),
            pointer: 0,
            input,
            consumed: 0,
            output: Vec::new(),
            fuel,
        }
    }

    /// Start from the given cells instead of an all-zero tape.
    pub fn with_tape(mut self, cells: impl IntoIterator<Item = (i64, u8)>) -> Self {
        self.tape.extend(cells.into_iter().filter(|(_, v)| *v != 0));
        self
    }

    pub fn run(mut self, program: &Program) -> Outcome {
        let halted = self.block(&program.body).is_ok();
        let trace = Trace {
            output: self.output,
            consumed: self.consumed,
            tape: self.tape.into_iter().filter(|(_, v)| *v != 0).collect(),
            pointer: self.pointer,
        };
        if halted {
            Outcome::Halted(trace)
        } else {
            Outcome::OutOfFuel(trace)
        }
    }

    fn get(&self, offset: i64) -> u8 {
        self.tape.get(&(self.pointer + offset)).copied().unwrap_or(0)
    }

    fn set(&mut self, offset: i64, value: u8) {
        self.tape.insert(self.pointer + offset, value);
    }

    fn add(&mut self, offset: i64, delta: u8) {
        let value = self.get(offset).wrapping_add(delta);
        self.set(offset, value);
    }

    fn tick(&mut self) -> Result<(), Exhausted> {
        if self.fuel == 0 {
            return Err(Exhausted);
        }
        self.fuel -= 1;
        Ok(())
    }

    fn block(&mut self, block: &[Stmt]) -> Result<(), Exhausted> {
        for stmt in block {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), Exhausted> {
        self.tick()?;
        match stmt {
            Stmt::Add(d) => self.add(0, *d),
            Stmt::Move(d) => self.pointer += d,
            Stmt::Output(n) => {
                let value = self.get(0);
                self.output.extend(std::iter::repeat(value).take(*n as usize));
            }
            Stmt::Input(n) => {
                let mut last = 0;
                for _ in 0..*n {
                    last = self.input.get(self.consumed).copied().unwrap_or(0);
                    self.consumed += 1;
                }
                self.set(0, last);
            }
            Stmt::Loop(body) => {
                while self.get(0) != 0 {
                    self.block(body)?;
                    self.tick()?;
                }
            }
            Stmt::ZeroLoop => self.set(0, 0),
            Stmt::ScanLoop(step) => {
                while self.get(0) != 0 {
                    self.pointer += step;
                    self.tick()?;
                }
            }
            Stmt::MultiplicationLoop { decrement, effects } => {
                while self.get(0) != 0 {
                    self.add(0, decrement.wrapping_neg());
                    for (offset, factor) in effects {
                        self.add(*offset, *factor);
                    }
                    self.tick()?;
                }
            }
            Stmt::Conditional(body) => {
                if self.get(0) != 0 {
                    self.block(body)?;
                }
            }
        }
        Ok(())
    }
}

/// Run `program` on a zeroed tape.
pub fn run(program: &Program, input: &[u8], fuel: u64) -> Outcome {
    Machine::new(input, fuel).run(program)
}
