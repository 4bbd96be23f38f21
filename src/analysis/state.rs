//! Pointer-relative abstract tape state.
//!
//! Cells are keyed by their offset from the *current* pointer, so a state
//! describes what holds "around here" regardless of where the pointer is on
//! the real tape. Moving the pointer rebases every key; joining two states
//! aligns them at their current pointers, which keeps the analysis sound for
//! loops whose bodies are not balanced.

use std::collections::BTreeMap;

use super::lattice::Domain;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AbsState<D> {
    /// Known cells. A cell whose value equals `rest` is never stored.
    cells: BTreeMap<i64, D>,
    /// Value of every cell not in `cells`.
    rest: D,
    reachable: bool,
}

impl<D: Domain> AbsState<D> {
    /// State at program start.
    pub fn entry(zeroed_tape: bool) -> Self {
        let rest = if zeroed_tape { D::constant(0) } else { D::top() };
        Self {
            cells: BTreeMap::new(),
            rest,
            reachable: true,
        }
    }

    /// State of a program point no execution reaches.
    pub fn unreachable() -> Self {
        Self {
            cells: BTreeMap::new(),
            rest: D::bottom(),
            reachable: false,
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn get(&self, offset: i64) -> D {
        self.cells
            .get(&offset)
            .cloned()
            .unwrap_or_else(|| self.rest.clone())
    }

    pub fn current(&self) -> D {
        self.get(0)
    }

    /// Overwrite a cell. Storing bottom makes the whole state unreachable.
    pub fn set(&mut self, offset: i64, value: D) {
        if !self.reachable {
            return;
        }
        if value.is_bottom() {
            *self = Self::unreachable();
        } else if value == self.rest {
            self.cells.remove(&offset);
        } else {
            self.cells.insert(offset, value);
        }
    }

    pub fn update(&mut self, offset: i64, f: impl FnOnce(&D) -> D) {
        let value = f(&self.get(offset));
        self.set(offset, value);
    }

    /// Move the pointer by `distance`.
    pub fn shift(&mut self, distance: i64) {
        if distance == 0 || self.cells.is_empty() {
            return;
        }
        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .map(|(offset, value)| (offset - distance, value))
            .collect();
    }

    /// Forget where the pointer is: every cell may now be any value that some
    /// cell held before.
    pub fn lose_pointer(&mut self) {
        if !self.reachable {
            return;
        }
        let cells = std::mem::take(&mut self.cells);
        self.rest = cells.values().fold(self.rest.clone(), |acc, v| acc.join(v));
    }

    /// Refine the current cell to non-zero (the branch into a loop body).
    pub fn assume_nonzero(mut self) -> Self {
        let refined = self.current().assume_nonzero();
        self.set(0, refined);
        self
    }

    /// Refine the current cell to zero (the branch past a loop).
    pub fn assume_zero(mut self) -> Self {
        let refined = self.current().assume_zero();
        self.set(0, refined);
        self
    }

    /// Least upper bound, aligned at the current pointer.
    pub fn join(&self, other: &Self) -> Self {
        if !self.reachable {
            return other.clone();
        }
        if !other.reachable {
            return self.clone();
        }
        self.combine(other, |a, b| a.join(b))
    }

    /// Widening: any cell that changed between `self` (the previous header
    /// state) and `next` jumps to top.
    pub fn widen(&self, next: &Self) -> Self {
        if !self.reachable {
            return next.clone();
        }
        if !next.reachable {
            return self.clone();
        }
        self.combine(next, |a, b| if a == b { a.clone() } else { D::top() })
    }

    /// Give up on every cell.
    pub fn havoc(&self) -> Self {
        if !self.reachable {
            return self.clone();
        }
        Self {
            cells: BTreeMap::new(),
            rest: D::top(),
            reachable: true,
        }
    }

    fn combine(&self, other: &Self, f: impl Fn(&D, &D) -> D) -> Self {
        let rest = f(&self.rest, &other.rest);
        let mut out = Self {
            cells: BTreeMap::new(),
            rest,
            reachable: true,
        };
        let offsets: Vec<i64> = self.cells.keys().chain(other.cells.keys()).copied().collect();
        for offset in offsets {
            let value = f(&self.get(offset), &other.get(offset));
            if value != out.rest {
                out.cells.insert(offset, value);
            }
        }
        out
    }

    /// Known cells as `(offset, value)` pairs, for diagnostics.
    pub fn known(&self) -> impl Iterator<Item = (i64, &D)> {
        self.cells.iter().map(|(o, v)| (*o, v))
    }

    pub fn rest(&self) -> &D {
        &self.rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::lattice::{Constant, Interval};

    #[test]
    fn entry_state() {
        let zeroed = AbsState::<Constant>::entry(true);
        assert_eq!(zeroed.get(17), Constant::Value(0));
        let unknown = AbsState::<Constant>::entry(false);
        assert_eq!(unknown.get(-3), Constant::Top);
    }

    #[test]
    fn shift_rebases_offsets() {
        let mut state = AbsState::<Constant>::entry(true);
        state.set(2, Constant::Value(9));
        state.shift(2);
        assert_eq!(state.current(), Constant::Value(9));
        state.shift(-5);
        assert_eq!(state.get(5), Constant::Value(9));
    }

    #[test]
    fn join_aligns_at_current_pointer() {
        let mut a = AbsState::<Constant>::entry(true);
        a.set(1, Constant::Value(4));
        let mut b = AbsState::<Constant>::entry(true);
        b.set(0, Constant::Value(4));
        b.set(1, Constant::Value(4));
        let joined = a.join(&b);
        assert_eq!(joined.get(1), Constant::Value(4));
        assert_eq!(joined.get(0), Constant::Top);
        assert_eq!(joined.get(7), Constant::Value(0));
    }

    #[test]
    fn bottom_value_makes_state_unreachable() {
        let mut state = AbsState::<Interval>::entry(true);
        state.set(0, Interval::constant(3));
        let zero = state.clone().assume_zero();
        assert!(!zero.is_reachable());
        assert_eq!(zero, AbsState::unreachable());
        assert!(state.assume_nonzero().is_reachable());
    }

    #[test]
    fn join_with_unreachable_is_identity() {
        let mut state = AbsState::<Constant>::entry(false);
        state.set(0, Constant::Value(1));
        assert_eq!(state.join(&AbsState::unreachable()), state);
        assert_eq!(AbsState::unreachable().join(&state), state);
    }

    #[test]
    fn lose_pointer_joins_everything() {
        let mut state = AbsState::<Interval>::entry(true);
        state.set(0, Interval::range(2, 4));
        state.set(3, Interval::constant(9));
        state.lose_pointer();
        assert_eq!(state.get(100), Interval::range(0, 9));
        assert_eq!(state.current(), Interval::range(0, 9));
    }

    #[test]
    fn widen_drops_changed_cells() {
        let mut old = AbsState::<Interval>::entry(true);
        old.set(0, Interval::range(1, 2));
        old.set(1, Interval::constant(5));
        let mut new = old.clone();
        new.set(0, Interval::range(1, 3));
        let widened = old.widen(&new);
        assert_eq!(widened.current(), Interval::Top);
        assert_eq!(widened.get(1), Interval::constant(5));
    }
}
