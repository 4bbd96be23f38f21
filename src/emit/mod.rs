//! Back ends over the lowered form.

pub mod c;

use crate::config::EmitConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitOptions {
    /// Number of cells in the generated tape.
    pub tape_size: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self::from(&EmitConfig::default())
    }
}

impl From<&EmitConfig> for EmitOptions {
    fn from(config: &EmitConfig) -> Self {
        Self {
            tape_size: config.tape_size,
        }
    }
}
