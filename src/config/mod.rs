//! Optimizer configuration from `tapeopt.toml`.
//!
//! ```toml
//! [optimizer]
//! level = 3
//! final_tape_live = false
//!
//! [emit]
//! tape_size = 65536
//! ```
//!
//! Every key is optional. The file is looked up in the input's directory and
//! its ancestors; command-line flags override what it says.

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const FILE_NAME: &str = "tapeopt.toml";

/// Optimizer knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptConfig {
    /// 0 = none, 1 = local, 2 = local + global, 3 = level 2 + summary rewrites.
    pub level: u8,
    /// Outer pipeline iteration budget.
    pub max_passes: usize,
    /// Per-loop fixed-point rounds before widening.
    pub max_loop_iterations: usize,
    /// The program starts on an all-zero tape.
    pub assume_zeroed_tape: bool,
    /// The tape contents at exit are observable.
    pub final_tape_live: bool,
    /// Use loop summaries.
    pub summaries: bool,
}

impl Default for OptConfig {
    fn default() -> Self {
        Self {
            level: 2,
            max_passes: 16,
            max_loop_iterations: 64,
            assume_zeroed_tape: true,
            final_tape_live: true,
            summaries: true,
        }
    }
}

impl OptConfig {
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }
}

/// C emitter knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitConfig {
    pub tape_size: usize,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self { tape_size: 30000 }
    }
}

/// The whole `tapeopt.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub optimizer: OptConfig,
    pub emit: EmitConfig,
}

impl ConfigFile {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Find a `tapeopt.toml` in `start_dir` or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(FILE_NAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Load the nearest config above `start_dir`, or the defaults if none.
    pub fn discover(start_dir: &Path) -> Result<Self> {
        match Self::find(start_dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}
