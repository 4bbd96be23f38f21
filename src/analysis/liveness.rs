//! Backward live-cell analysis.
//!
//! A cell is live at a point if some path from that point may read its
//! current value before overwriting it. Offsets are relative to the pointer
//! at that point, like the forward engine.

use std::collections::BTreeSet;

use crate::ir::{self, Stmt};

/// Rounds of loop iteration before giving up and assuming everything live.
const MAX_ROUNDS: usize = 64;

/// A set of pointer-relative cells, possibly co-finite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveSet {
    /// When true, every cell is live except those in `cells`.
    all: bool,
    cells: BTreeSet<i64>,
}

impl LiveSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn everything() -> Self {
        Self {
            all: true,
            cells: BTreeSet::new(),
        }
    }

    pub fn contains(&self, offset: i64) -> bool {
        self.all != self.cells.contains(&offset)
    }

    pub fn insert(&mut self, offset: i64) {
        if self.all {
            self.cells.remove(&offset);
        } else {
            self.cells.insert(offset);
        }
    }

    pub fn remove(&mut self, offset: i64) {
        if self.all {
            self.cells.insert(offset);
        } else {
            self.cells.remove(&offset);
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        let cells = match (self.all, other.all) {
            (false, false) => self.cells.union(&other.cells).copied().collect(),
            (true, true) => self.cells.intersection(&other.cells).copied().collect(),
            (true, false) => self.cells.difference(&other.cells).copied().collect(),
            (false, true) => other.cells.difference(&self.cells).copied().collect(),
        };
        Self {
            all: self.all || other.all,
            cells,
        }
    }

    /// Live set before a `Move(distance)` given the set after it.
    pub fn before_move(&self, distance: i64) -> Self {
        Self {
            all: self.all,
            cells: self.cells.iter().map(|o| o + distance).collect(),
        }
    }

    pub fn is_everything(&self) -> bool {
        self.all && self.cells.is_empty()
    }
}

/// Live set at the start of `block` given the set at its end.
pub fn live_in(block: &[Stmt], live_out: &LiveSet) -> LiveSet {
    block
        .iter()
        .rev()
        .fold(live_out.clone(), |live, stmt| transfer(stmt, &live))
}

/// Live set before one statement.
pub fn transfer(stmt: &Stmt, live: &LiveSet) -> LiveSet {
    let mut live = live.clone();
    match stmt {
        Stmt::Add(_) => {}
        Stmt::Move(d) => live = live.before_move(*d),
        Stmt::Output(_) => live.insert(0),
        Stmt::Input(_) | Stmt::ZeroLoop => live.remove(0),
        Stmt::ScanLoop(_) => live = LiveSet::everything(),
        Stmt::MultiplicationLoop { .. } => live.insert(0),
        Stmt::Loop(body) => live = loop_header(body, &live),
        Stmt::Conditional(body) => {
            if !ir::is_balanced(body) {
                return LiveSet::everything();
            }
            live = live_in(body, &live).union(&live);
            live.insert(0);
        }
    }
    live
}

/// Live set at a loop test: the least `X ⊇ live_out ∪ {0}` with
/// `live_in(body, X) ⊆ X`. Also the live set at the end of the body.
pub fn loop_header(body: &[Stmt], live_out: &LiveSet) -> LiveSet {
    if !ir::is_balanced(body) {
        return LiveSet::everything();
    }
    let mut header = live_out.clone();
    header.insert(0);
    for _ in 0..MAX_ROUNDS {
        let mut next = live_in(body, &header).union(live_out);
        next.insert(0);
        if next == header {
            return header;
        }
        header = next;
    }
    LiveSet::everything()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn live(source: &str, live_out: LiveSet) -> LiveSet {
        live_in(&parse(source).unwrap().body, &live_out)
    }

    #[test]
    fn set_algebra() {
        let mut a = LiveSet::none();
        a.insert(1);
        a.insert(3);
        let mut b = LiveSet::everything();
        b.remove(1);
        b.remove(2);
        let u = a.union(&b);
        assert!(u.contains(1));
        assert!(!u.contains(2));
        assert!(u.contains(3));
        assert!(u.contains(40));
        let shifted = b.before_move(5);
        assert!(!shifted.contains(6));
        assert!(shifted.contains(1));
    }

    #[test]
    fn output_generates_and_input_kills() {
        assert!(live(".", LiveSet::none()).contains(0));
        assert!(!live(",.", LiveSet::none()).contains(0));
        assert!(live(">.<", LiveSet::none()).contains(1));
    }

    #[test]
    fn loop_reads_its_control_and_carried_cells() {
        let out = LiveSet::none();
        let l = live("[->+<]", out);
        assert!(l.contains(0));
        assert!(!l.contains(1));
        let mut out = LiveSet::none();
        out.insert(1);
        assert!(live("[->+<]", out).contains(1));
    }

    #[test]
    fn loop_carried_reads_reach_the_header() {
        // Cell 1 is printed inside the loop, so it is live at entry.
        let l = live("[>.<-]", LiveSet::none());
        assert!(l.contains(1));
    }

    #[test]
    fn unbalanced_loops_and_scans_read_everything() {
        assert!(live("[>]", LiveSet::none()).is_everything());
        assert!(live("[>-]", LiveSet::none()).is_everything());
    }

    #[test]
    fn overwritten_cells_are_dead() {
        let mut out = LiveSet::none();
        out.insert(0);
        let l = live_in(&[Stmt::Add(3), Stmt::ZeroLoop], &out);
        assert!(!l.contains(0));
        // A general loop still tests the cell before clearing it.
        assert!(live("+++[-]", LiveSet::none()).contains(0));
    }
}
