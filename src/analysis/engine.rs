//! Generic abstract interpreter over the statement tree.
//!
//! The engine walks the tree once per domain, threading an [`AbsState`]
//! through every transfer function. Loops are solved by iterating their
//! header state to a fixed point (with widening after a configurable number
//! of rounds), or directly from a [`LoopSummary`] when the body is affine.
//! A final recording walk stores the state before every statement and the
//! executability of every loop entry and exit edge.

use std::collections::HashMap;

use tracing::trace;

use super::lattice::Domain;
use super::state::AbsState;
use super::summary;
use super::{AnalysisConfig, Path};
use crate::field;
use crate::ir::{Program, Stmt};

/// Executability of the two edges leaving a branching statement.
///
/// `enter` is the edge into the body (or into one iteration for recognized
/// loops); `exit` is the edge to the following statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeFlags {
    pub enter: bool,
    pub exit: bool,
}

/// Results of one analysis run.
#[derive(Clone, Debug)]
pub struct Facts<D> {
    before: HashMap<Path, AbsState<D>>,
    edges: HashMap<Path, EdgeFlags>,
    /// State at program end.
    pub exit: AbsState<D>,
}

impl<D: Domain> Facts<D> {
    pub fn before(&self, path: &[usize]) -> Option<&AbsState<D>> {
        self.before.get(path)
    }

    /// Value of the current cell just before `path`, or top if unknown.
    pub fn control(&self, path: &[usize]) -> D {
        match self.before(path) {
            Some(state) if state.is_reachable() => state.current(),
            Some(_) => D::bottom(),
            None => D::top(),
        }
    }

    /// Missing entries are treated as reachable.
    pub fn is_reachable(&self, path: &[usize]) -> bool {
        self.before(path).map_or(true, |s| s.is_reachable())
    }

    pub fn edges(&self, path: &[usize]) -> EdgeFlags {
        self.edges.get(path).copied().unwrap_or(EdgeFlags {
            enter: true,
            exit: true,
        })
    }
}

/// Run the engine over a whole program.
pub fn analyze<D: Domain>(program: &Program, config: &AnalysisConfig) -> Facts<D> {
    let mut engine = Engine::<D>::new(config);
    let exit = engine.block(&program.body, &[], AbsState::entry(config.assume_zeroed_tape), true);
    trace!(
        domain = D::NAME,
        cached = engine.cache.len(),
        "analysis finished"
    );
    Facts {
        before: engine.before,
        edges: engine.edges,
        exit,
    }
}

struct Engine<'a, D> {
    config: &'a AnalysisConfig,
    before: HashMap<Path, AbsState<D>>,
    edges: HashMap<Path, EdgeFlags>,
    /// Loop exit states keyed by loop and entry state.
    cache: HashMap<(Path, AbsState<D>), AbsState<D>>,
}

impl<'a, D: Domain> Engine<'a, D> {
    fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            config,
            before: HashMap::new(),
            edges: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    fn block(
        &mut self,
        block: &[Stmt],
        prefix: &[usize],
        mut state: AbsState<D>,
        record: bool,
    ) -> AbsState<D> {
        for (i, stmt) in block.iter().enumerate() {
            let mut path = prefix.to_vec();
            path.push(i);
            if record {
                self.before.insert(path.clone(), state.clone());
            }
            state = self.stmt(stmt, &path, state, record);
        }
        state
    }

    fn mark(&mut self, record: bool, path: &[usize], enter: bool, exit: bool) {
        if record {
            self.edges.insert(path.to_vec(), EdgeFlags { enter, exit });
        }
    }

    fn stmt(
        &mut self,
        stmt: &Stmt,
        path: &[usize],
        mut state: AbsState<D>,
        record: bool,
    ) -> AbsState<D> {
        if !state.is_reachable() {
            if record {
                self.mark(true, path, false, false);
                if let Some(body) = stmt.body() {
                    self.block(body, path, AbsState::unreachable(), true);
                }
            }
            return state;
        }
        match stmt {
            Stmt::Add(d) => state.update(0, |v| v.add(*d)),
            Stmt::Move(d) => state.shift(*d),
            Stmt::Output(_) => {}
            Stmt::Input(_) => state.set(0, D::top()),
            Stmt::ZeroLoop => {
                let enter = state.current().may_be_nonzero();
                self.mark(record, path, enter, true);
                state.set(0, D::constant(0));
            }
            Stmt::ScanLoop(step) => {
                let enter = state.current().may_be_nonzero();
                state = scan(state, *step);
                self.mark(record, path, enter, state.is_reachable());
            }
            Stmt::MultiplicationLoop { decrement, effects } => {
                let control = state.current();
                let enter = control.may_be_nonzero();
                match field::inverse(*decrement) {
                    Some(inverse) => {
                        let count = control.scale(inverse);
                        for (offset, factor) in effects {
                            let gained = count.scale(*factor);
                            state.update(*offset, |v| v.add_value(&gained));
                        }
                    }
                    None => {
                        for (offset, _) in effects {
                            state.set(*offset, D::top());
                        }
                    }
                }
                state.set(0, D::constant(0));
                self.mark(record, path, enter, true);
            }
            Stmt::Conditional(body) => {
                let taken = state.clone().assume_nonzero();
                let skipped = state.assume_zero();
                let enter = taken.is_reachable();
                let exit = skipped.is_reachable();
                self.mark(record, path, enter, exit);
                let after = self.block(body, path, taken, record);
                state = after.join(&skipped);
            }
            Stmt::Loop(body) => state = self.repeat(body, path, state, record),
        }
        state
    }

    /// Transfer for a general loop.
    fn repeat(
        &mut self,
        body: &[Stmt],
        path: &[usize],
        entry: AbsState<D>,
        record: bool,
    ) -> AbsState<D> {
        if !entry.current().may_be_nonzero() {
            self.mark(record, path, false, true);
            if record {
                self.block(body, path, AbsState::unreachable(), true);
            }
            return entry.assume_zero();
        }

        let summarized = if self.config.summaries {
            summary::summarize(body).and_then(|s| s.apply(entry.clone()))
        } else {
            None
        };
        if !record {
            if let Some(exit) = summarized {
                return exit;
            }
            let key = (path.to_vec(), entry.clone());
            if let Some(exit) = self.cache.get(&key) {
                return exit.clone();
            }
            let (_, exit) = self.fixpoint(body, path, entry);
            self.cache.insert(key, exit.clone());
            return exit;
        }

        let (inside, exit) = self.fixpoint(body, path, entry);
        let enter = inside.is_reachable();
        self.block(body, path, inside, true);
        let exit = summarized.unwrap_or(exit);
        self.mark(true, path, enter, exit.is_reachable());
        exit
    }

    /// Solve a loop: returns the invariant at the top of the body and the
    /// state after the loop.
    ///
    /// The back edge is refined by the loop test before it is joined, so an
    /// iteration that provably leaves zero behind never feeds the body again.
    /// Plain iteration runs for `max_loop_iterations` rounds, then widens,
    /// then gives up to top after twice that.
    fn fixpoint(
        &mut self,
        body: &[Stmt],
        path: &[usize],
        entry: AbsState<D>,
    ) -> (AbsState<D>, AbsState<D>) {
        let limit = self.config.max_loop_iterations;
        let mut inside = entry.clone().assume_nonzero();
        let mut exit = entry.assume_zero();
        let mut round = 0usize;
        loop {
            let after = self.block(body, path, inside.clone(), false);
            exit = exit.join(&after.clone().assume_zero());
            let mut next = inside.join(&after.assume_nonzero());
            if round >= 2 * limit {
                next = next.havoc();
            } else if round >= limit {
                next = inside.widen(&next);
            }
            if next == inside {
                trace!(domain = D::NAME, ?path, rounds = round + 1, "loop fixed point");
                return (inside, exit);
            }
            inside = next;
            round += 1;
        }
    }
}

/// Transfer for `ScanLoop(step)`: probe known cells for the first one that
/// must be zero. Gives up on the pointer position if the answer depends on
/// unknown cells.
fn scan<D: Domain>(mut state: AbsState<D>, step: i64) -> AbsState<D> {
    if step == 0 {
        return state.assume_zero();
    }
    let rest = state.rest().clone();
    let mut distance = 0i64;
    for _ in 0..field::MODULUS {
        let value = state.get(distance);
        if !value.may_be_nonzero() {
            state.shift(distance);
            return state.assume_zero();
        }
        if value.may_be_zero() {
            break;
        }
        distance += step;
        let beyond = state.known().all(|(offset, _)| {
            if step > 0 {
                offset < distance
            } else {
                offset > distance
            }
        });
        if beyond && !rest.may_be_zero() {
            // Every remaining cell is non-zero.
            return AbsState::unreachable();
        }
    }
    state.lose_pointer();
    state.set(0, D::constant(0));
    state
}

#[cfg(test)]
mod tests;
