//! Global analyses over the statement tree.
//!
//! - [`lattice`]: the constant and interval value domains.
//! - [`engine`]: the SCCP-style abstract interpreter, generic over a domain.
//! - [`cfg`]: a petgraph view of the tree for reachability.
//! - [`summary`]: closed-form summaries of affine loops.
//! - [`liveness`]: backward live-cell analysis.
//!
//! Program points are identified by [`Path`]s: the index of a statement in
//! its block, prefixed by the paths of the enclosing loops.

pub mod cfg;
pub mod engine;
pub mod lattice;
pub mod liveness;
pub mod state;
pub mod summary;

use tracing::debug;

use crate::config::OptConfig;
use crate::ir::Program;
use engine::{EdgeFlags, Facts};
use lattice::{Constant, Domain, Interval};

/// Position of a statement in the tree.
pub type Path = Vec<usize>;

/// Engine parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Rounds of plain iteration at a loop header before widening.
    pub max_loop_iterations: usize,
    /// Use loop summaries instead of fixed-point iteration where possible.
    pub summaries: bool,
    /// The program starts on an all-zero tape.
    pub assume_zeroed_tape: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_loop_iterations: 64,
            summaries: true,
            assume_zeroed_tape: true,
        }
    }
}

impl From<&OptConfig> for AnalysisConfig {
    fn from(config: &OptConfig) -> Self {
        Self {
            max_loop_iterations: config.max_loop_iterations,
            summaries: config.summaries,
            assume_zeroed_tape: config.assume_zeroed_tape,
        }
    }
}

/// Constant and interval facts for one program revision.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub constants: Facts<Constant>,
    pub ranges: Facts<Interval>,
}

impl Analysis {
    pub fn run(program: &Program, config: &AnalysisConfig) -> Self {
        let constants = engine::analyze::<Constant>(program, config);
        let ranges = engine::analyze::<Interval>(program, config);
        debug!(
            exit_reachable = constants.exit.is_reachable() && ranges.exit.is_reachable(),
            "analysis complete"
        );
        Self { constants, ranges }
    }

    /// A statement is reachable only if both domains agree it is.
    pub fn is_reachable(&self, path: &[usize]) -> bool {
        self.constants.is_reachable(path) && self.ranges.is_reachable(path)
    }

    /// An edge is executable only if both domains agree it is.
    pub fn edges(&self, path: &[usize]) -> EdgeFlags {
        let a = self.constants.edges(path);
        let b = self.ranges.edges(path);
        EdgeFlags {
            enter: a.enter && b.enter,
            exit: a.exit && b.exit,
        }
    }

    /// Known value of the current cell before `path`.
    pub fn constant_at(&self, path: &[usize]) -> Option<u8> {
        self.constants
            .control(path)
            .as_constant()
            .or_else(|| self.ranges.control(path).as_constant())
    }

    /// The current cell before `path` is provably non-zero.
    pub fn nonzero_at(&self, path: &[usize]) -> bool {
        !self.constants.control(path).may_be_zero() || !self.ranges.control(path).may_be_zero()
    }

    /// The current cell before `path` is provably 0 or 1.
    pub fn boolean_at(&self, path: &[usize]) -> bool {
        self.constants.control(path).is_boolean() || self.ranges.control(path).is_boolean()
    }
}
