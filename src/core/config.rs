/// Engine configuration loaded from RON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::grammar::GrammarLimits;
use crate::core::pipeline::EngineError;

/// Every field is optional in the file.
///
/// ```ron
/// (
///     seed: Some(42),
///     grammar: Some("grammar_data/tavern.pg"),
///     max_expansion_depth: 256,
///     max_unfold_passes: 64,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed: Option<u64>,
    /// Grammar file, resolved against the working directory.
    pub grammar: Option<PathBuf>,
    pub max_expansion_depth: usize,
    pub max_unfold_passes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let limits = GrammarLimits::default();
        Self {
            seed: None,
            grammar: None,
            max_expansion_depth: limits.max_expansion_depth,
            max_unfold_passes: limits.max_unfold_passes,
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(contents: &str) -> Result<EngineConfig, EngineError> {
        let config: EngineConfig = ron::from_str(contents)?;
        Ok(config)
    }

    pub fn limits(&self) -> GrammarLimits {
        GrammarLimits {
            max_expansion_depth: self.max_expansion_depth,
            max_unfold_passes: self.max_unfold_passes,
        }
    }
}
