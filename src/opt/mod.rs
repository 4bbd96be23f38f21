//! Optimization passes.
//!
//! - [`local`]: pattern rewrites that need no global facts.
//! - [`conditional`]: loops that run at most once become conditionals.
//! - [`fold`]: rewrites driven by constant and interval facts.
//! - [`dce`]: removal of unreachable statements.
//! - [`dse`]: removal of writes nothing reads.
//!
//! Every pass consumes a [`crate::ir::Program`] and returns a new one; the
//! sequencing lives in [`crate::pipeline`].

pub mod conditional;
pub mod dce;
pub mod dse;
pub mod fold;
pub mod local;
