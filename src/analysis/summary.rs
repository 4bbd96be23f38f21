//! Closed-form loop summaries.
//!
//! A loop is summarizable when one iteration of its body is an affine map of
//! the tape: every touched cell either gains a fixed delta or is assigned a
//! fixed value, and the control cell loses a fixed decrement. Inner loops are
//! allowed when their control cell holds a value known at that point of the
//! outer body, so their own summaries compose into the outer one.

use std::collections::BTreeMap;

use super::lattice::Domain;
use super::state::AbsState;
use crate::field;
use crate::ir::{self, Stmt};

/// Per-iteration effect of a summarizable loop, relative to loop entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopSummary {
    /// Amount the control cell loses per iteration (never zero).
    pub decrement: u8,
    /// Cells (other than the control) that gain a fixed delta per iteration.
    pub deltas: BTreeMap<i64, u8>,
    /// Cells that end every iteration holding a fixed value.
    pub assigns: BTreeMap<i64, u8>,
}

/// Symbolic cell during one walk of a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sym {
    /// Entry value plus a delta.
    Rel(u8),
    /// A value independent of the entry state.
    Abs(u8),
}

impl Sym {
    fn add(self, delta: u8) -> Sym {
        match self {
            Sym::Rel(k) => Sym::Rel(k.wrapping_add(delta)),
            Sym::Abs(v) => Sym::Abs(v.wrapping_add(delta)),
        }
    }
}

struct Walk {
    cells: BTreeMap<i64, Sym>,
}

impl Walk {
    fn get(&self, offset: i64) -> Sym {
        self.cells.get(&offset).copied().unwrap_or(Sym::Rel(0))
    }

    fn set(&mut self, offset: i64, sym: Sym) {
        self.cells.insert(offset, sym);
    }

    fn block(&mut self, block: &[Stmt], base: i64) -> Option<()> {
        let mut offset = base;
        for stmt in block {
            match stmt {
                Stmt::Add(d) => {
                    let sym = self.get(offset).add(*d);
                    self.set(offset, sym);
                }
                Stmt::Move(d) => offset = offset.checked_add(*d)?,
                Stmt::ZeroLoop => self.set(offset, Sym::Abs(0)),
                Stmt::Output(_) | Stmt::Input(_) | Stmt::ScanLoop(_) => return None,
                Stmt::MultiplicationLoop { effects, .. } if effects.is_empty() => {
                    self.set(offset, Sym::Abs(0));
                }
                Stmt::MultiplicationLoop { decrement, effects } => {
                    let Sym::Abs(control) = self.get(offset) else {
                        return None;
                    };
                    let n = field::iterations(control, *decrement)?;
                    for (o, factor) in effects {
                        let sym = self.get(offset + o).add(n.wrapping_mul(*factor));
                        self.set(offset + o, sym);
                    }
                    self.set(offset, Sym::Abs(0));
                }
                Stmt::Loop(body) => {
                    let inner = summarize(body)?;
                    let control = match self.get(offset) {
                        Sym::Abs(c) => c,
                        // A loop that only counts its control down is a reset.
                        Sym::Rel(_) if inner.is_reset() => {
                            self.set(offset, Sym::Abs(0));
                            continue;
                        }
                        Sym::Rel(_) => return None,
                    };
                    if control == 0 {
                        continue;
                    }
                    let n = field::iterations(control, inner.decrement)?;
                    for (o, delta) in &inner.deltas {
                        let sym = self.get(offset + o).add(n.wrapping_mul(*delta));
                        self.set(offset + o, sym);
                    }
                    for (o, value) in &inner.assigns {
                        self.set(offset + o, Sym::Abs(*value));
                    }
                    self.set(offset, Sym::Abs(0));
                }
                Stmt::Conditional(body) => {
                    let Sym::Abs(control) = self.get(offset) else {
                        return None;
                    };
                    if control != 0 {
                        if !ir::is_balanced(body) {
                            return None;
                        }
                        self.block(body, offset)?;
                    }
                }
            }
        }
        (offset == base).then_some(())
    }
}

/// Summarize a loop body, or `None` if one iteration is not affine.
pub fn summarize(body: &[Stmt]) -> Option<LoopSummary> {
    let mut walk = Walk {
        cells: BTreeMap::new(),
    };
    walk.block(body, 0)?;

    let decrement = match walk.get(0) {
        Sym::Rel(k) if k != 0 => k.wrapping_neg(),
        _ => return None,
    };
    let mut deltas = BTreeMap::new();
    let mut assigns = BTreeMap::new();
    for (offset, sym) in walk.cells {
        if offset == 0 {
            continue;
        }
        match sym {
            Sym::Rel(0) => {}
            Sym::Rel(k) => {
                deltas.insert(offset, k);
            }
            Sym::Abs(v) => {
                assigns.insert(offset, v);
            }
        }
    }
    Some(LoopSummary {
        decrement,
        deltas,
        assigns,
    })
}

impl LoopSummary {
    /// True if the summary is exactly a multiplication loop.
    pub fn is_multiplication(&self) -> bool {
        self.assigns.is_empty() && self.decrement % 2 == 1
    }

    /// True if the loop does nothing but drive its control cell to zero.
    pub fn is_reset(&self) -> bool {
        self.deltas.is_empty() && self.assigns.is_empty() && self.decrement % 2 == 1
    }

    /// Apply the whole loop to an abstract state whose pointer is at the
    /// control cell. Returns `None` when the iteration count cannot be
    /// expressed in the domain (even decrement, unknown control).
    pub fn apply<D: Domain>(&self, mut state: AbsState<D>) -> Option<AbsState<D>> {
        if !state.is_reachable() {
            return Some(state);
        }
        let control = state.current();
        if let Some(c) = control.as_constant() {
            let Some(n) = field::iterations(c, self.decrement) else {
                // Never reaches zero.
                return Some(AbsState::unreachable());
            };
            for (o, delta) in &self.deltas {
                state.update(*o, |v| v.add(n.wrapping_mul(*delta)));
            }
            if n > 0 {
                for (o, value) in &self.assigns {
                    state.set(*o, D::constant(*value));
                }
            }
        } else {
            let count = control.scale(field::inverse(self.decrement)?);
            for (o, delta) in &self.deltas {
                let gained = count.scale(*delta);
                state.update(*o, |v| v.add_value(&gained));
            }
            for (o, value) in &self.assigns {
                let assigned = D::constant(*value);
                if control.may_be_zero() {
                    state.update(*o, |v| v.join(&assigned));
                } else {
                    state.set(*o, assigned);
                }
            }
        }
        state.set(0, D::constant(0));
        Some(state)
    }

    /// Replacement statements for the loop.
    ///
    /// With a known control value the loop becomes straight-line code. With
    /// an unknown one (odd decrement only) it becomes a conditional that
    /// performs the assignments followed by a multiplication loop.
    /// `None` means the loop must stay as it is.
    pub fn rewrite(&self, control: Option<u8>) -> Option<Vec<Stmt>> {
        match control {
            Some(0) => Some(Vec::new()),
            Some(c) => {
                let n = field::iterations(c, self.decrement)?;
                let mut out = vec![Stmt::Add(c.wrapping_neg())];
                for offset in self.touched() {
                    let mut ops = Vec::new();
                    if let Some(value) = self.assigns.get(&offset) {
                        ops.push(Stmt::ZeroLoop);
                        if *value != 0 {
                            ops.push(Stmt::Add(*value));
                        }
                    }
                    if let Some(delta) = self.deltas.get(&offset) {
                        let total = n.wrapping_mul(*delta);
                        if total != 0 {
                            ops.push(Stmt::Add(total));
                        }
                    }
                    at_offset(&mut out, offset, ops);
                }
                Some(out)
            }
            None => {
                if self.decrement % 2 == 0 {
                    return None;
                }
                let mut out = Vec::new();
                if !self.assigns.is_empty() {
                    let mut body = Vec::new();
                    for (offset, value) in &self.assigns {
                        let mut ops = vec![Stmt::ZeroLoop];
                        if *value != 0 {
                            ops.push(Stmt::Add(*value));
                        }
                        at_offset(&mut body, *offset, ops);
                    }
                    out.push(Stmt::Conditional(body));
                }
                if self.deltas.is_empty() {
                    out.push(Stmt::ZeroLoop);
                } else {
                    out.push(Stmt::MultiplicationLoop {
                        decrement: self.decrement,
                        effects: self.deltas.iter().map(|(o, k)| (*o, *k)).collect(),
                    });
                }
                Some(out)
            }
        }
    }

    fn touched(&self) -> Vec<i64> {
        let mut offsets: Vec<i64> = self.deltas.keys().chain(self.assigns.keys()).copied().collect();
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }
}

fn at_offset(out: &mut Vec<Stmt>, offset: i64, ops: Vec<Stmt>) {
    if ops.is_empty() {
        return;
    }
    out.push(Stmt::Move(offset));
    out.extend(ops);
    out.push(Stmt::Move(-offset));
}
