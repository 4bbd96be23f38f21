//! Abstract value domains for a single tape cell.
//!
//! Both lattices implement [`Domain`], so the engine in
//! [`super::engine`] runs one fixed-point skeleton for either of them.

use std::fmt;
use std::hash::Hash;

/// A lattice of abstract cell values over ℤ/256ℤ.
///
/// Every operation must over-approximate: the concretization of the result
/// contains every concrete result obtainable from the concretizations of the
/// inputs.
pub trait Domain: Clone + Eq + Hash + fmt::Debug {
    /// Short name used in trace output.
    const NAME: &'static str;

    fn bottom() -> Self;
    fn top() -> Self;
    fn constant(value: u8) -> Self;

    fn is_bottom(&self) -> bool;
    fn join(&self, other: &Self) -> Self;
    fn meet(&self, other: &Self) -> Self;

    /// Add a known delta (mod 256).
    fn add(&self, delta: u8) -> Self;
    /// Add another abstract value (mod 256).
    fn add_value(&self, other: &Self) -> Self;
    /// Multiply by a known factor (mod 256).
    fn scale(&self, factor: u8) -> Self;

    fn as_constant(&self) -> Option<u8>;
    fn may_be_zero(&self) -> bool;
    fn may_be_nonzero(&self) -> bool;

    /// Refine under the assumption that the value is non-zero.
    fn assume_nonzero(&self) -> Self;

    /// Refine under the assumption that the value is zero.
    fn assume_zero(&self) -> Self {
        self.meet(&Self::constant(0))
    }

    /// True if every concrete value is 0 or 1.
    fn is_boolean(&self) -> bool;
}

// ─── Constant lattice ──────────────────────────────────────────────

/// `⊥ ⊑ c ⊑ ⊤` for every cell value `c`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    Bottom,
    Value(u8),
    Top,
}

impl Domain for Constant {
    const NAME: &'static str = "constant";

    fn bottom() -> Self {
        Constant::Bottom
    }

    fn top() -> Self {
        Constant::Top
    }

    fn constant(value: u8) -> Self {
        Constant::Value(value)
    }

    fn is_bottom(&self) -> bool {
        matches!(self, Constant::Bottom)
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Constant::Bottom, x) | (x, Constant::Bottom) => *x,
            (Constant::Value(a), Constant::Value(b)) if a == b => *self,
            _ => Constant::Top,
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Constant::Top, x) | (x, Constant::Top) => *x,
            (Constant::Value(a), Constant::Value(b)) if a == b => *self,
            _ => Constant::Bottom,
        }
    }

    fn add(&self, delta: u8) -> Self {
        match self {
            Constant::Value(v) => Constant::Value(v.wrapping_add(delta)),
            other => *other,
        }
    }

    fn add_value(&self, other: &Self) -> Self {
        match (self, other) {
            (Constant::Bottom, _) | (_, Constant::Bottom) => Constant::Bottom,
            (Constant::Value(a), Constant::Value(b)) => Constant::Value(a.wrapping_add(*b)),
            _ => Constant::Top,
        }
    }

    fn scale(&self, factor: u8) -> Self {
        match self {
            Constant::Bottom => Constant::Bottom,
            _ if factor == 0 => Constant::Value(0),
            Constant::Value(v) => Constant::Value(v.wrapping_mul(factor)),
            Constant::Top => Constant::Top,
        }
    }

    fn as_constant(&self) -> Option<u8> {
        match self {
            Constant::Value(v) => Some(*v),
            _ => None,
        }
    }

    fn may_be_zero(&self) -> bool {
        matches!(self, Constant::Value(0) | Constant::Top)
    }

    fn may_be_nonzero(&self) -> bool {
        match self {
            Constant::Value(v) => *v != 0,
            Constant::Top => true,
            Constant::Bottom => false,
        }
    }

    fn assume_nonzero(&self) -> Self {
        match self {
            Constant::Value(0) => Constant::Bottom,
            other => *other,
        }
    }

    fn is_boolean(&self) -> bool {
        matches!(self, Constant::Value(0) | Constant::Value(1))
    }
}

// ─── Interval lattice ──────────────────────────────────────────────

/// Closed intervals `[lo, hi]` of cell values with `lo ≤ hi`.
///
/// Intervals never wrap around 255 → 0. An operation whose exact result
/// would straddle that boundary goes to `Top`. `[0, 255]` is always
/// represented as `Top` so equal sets compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interval {
    Bottom,
    Range { lo: u8, hi: u8 },
    Top,
}

impl Interval {
    pub fn range(lo: u8, hi: u8) -> Self {
        if lo > hi {
            Interval::Bottom
        } else if lo == 0 && hi == 255 {
            Interval::Top
        } else {
            Interval::Range { lo, hi }
        }
    }

    fn bounds(&self) -> Option<(u8, u8)> {
        match self {
            Interval::Bottom => None,
            Interval::Range { lo, hi } => Some((*lo, *hi)),
            Interval::Top => Some((0, 255)),
        }
    }

    /// Reduce an integer interval into the ring, or `Top` if it wraps.
    fn wrap(lo: u32, hi: u32) -> Self {
        if hi - lo >= 256 || lo / 256 != hi / 256 {
            Interval::Top
        } else {
            Interval::range((lo % 256) as u8, (hi % 256) as u8)
        }
    }
}

impl Domain for Interval {
    const NAME: &'static str = "interval";

    fn bottom() -> Self {
        Interval::Bottom
    }

    fn top() -> Self {
        Interval::Top
    }

    fn constant(value: u8) -> Self {
        Interval::Range {
            lo: value,
            hi: value,
        }
    }

    fn is_bottom(&self) -> bool {
        matches!(self, Interval::Bottom)
    }

    fn join(&self, other: &Self) -> Self {
        match (self.bounds(), other.bounds()) {
            (None, _) => *other,
            (_, None) => *self,
            (Some((a, b)), Some((c, d))) => Interval::range(a.min(c), b.max(d)),
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self.bounds(), other.bounds()) {
            (Some((a, b)), Some((c, d))) => Interval::range(a.max(c), b.min(d)),
            _ => Interval::Bottom,
        }
    }

    fn add(&self, delta: u8) -> Self {
        match self {
            Interval::Range { lo, hi } => {
                Interval::wrap(*lo as u32 + delta as u32, *hi as u32 + delta as u32)
            }
            other => *other,
        }
    }

    fn add_value(&self, other: &Self) -> Self {
        match (self.bounds(), other.bounds()) {
            (Some((a, b)), Some((c, d))) => {
                Interval::wrap(a as u32 + c as u32, b as u32 + d as u32)
            }
            _ => Interval::Bottom,
        }
    }

    fn scale(&self, factor: u8) -> Self {
        match self.bounds() {
            None => Interval::Bottom,
            Some(_) if factor == 0 => Interval::constant(0),
            Some((lo, hi)) => Interval::wrap(lo as u32 * factor as u32, hi as u32 * factor as u32),
        }
    }

    fn as_constant(&self) -> Option<u8> {
        match self {
            Interval::Range { lo, hi } if lo == hi => Some(*lo),
            _ => None,
        }
    }

    fn may_be_zero(&self) -> bool {
        matches!(self.bounds(), Some((0, _)))
    }

    fn may_be_nonzero(&self) -> bool {
        matches!(self.bounds(), Some((_, hi)) if hi > 0)
    }

    fn assume_nonzero(&self) -> Self {
        match self.bounds() {
            Some((0, hi)) => Interval::range(1, hi),
            _ => *self,
        }
    }

    fn is_boolean(&self) -> bool {
        matches!(self, Interval::Range { hi, .. } if *hi <= 1)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Bottom => write!(f, "⊥"),
            Constant::Value(v) => write!(f, "{}", v),
            Constant::Top => write!(f, "⊤"),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Bottom => write!(f, "⊥"),
            Interval::Range { lo, hi } => write!(f, "[{}, {}]", lo, hi),
            Interval::Top => write!(f, "⊤"),
        }
    }
}
