//! Router configuration, loadable from YAML.
//!
//! Every field has a default, so a partial file (or an empty one) is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Reference limit for [`SearchSettings::max_search_nodes`].
pub const AYSTAR_DEF_MAX_SEARCH_NODES: u32 = 10_000;

/// Length of a diagonal track piece (one full tile).
pub const NPF_TILE_LENGTH: i32 = 100;
/// Length of a straight (non-diagonal) track piece, tile length / sqrt(2).
pub const NPF_STRAIGHT_LENGTH: i32 = 70;

mod defaults {
    use super::*;

    pub fn max_search_nodes() -> u32 {
        AYSTAR_DEF_MAX_SEARCH_NODES
    }
    pub fn tile_length() -> i32 {
        NPF_TILE_LENGTH
    }
    pub fn straight_length() -> i32 {
        NPF_STRAIGHT_LENGTH
    }
    pub fn curve_penalty() -> i32 {
        1
    }
    pub fn red_signal_penalty() -> i32 {
        10 * NPF_TILE_LENGTH
    }
    pub fn depot_reverse_penalty() -> i32 {
        50 * NPF_TILE_LENGTH
    }
    pub fn heuristic_weight() -> f32 {
        1.0
    }
}

/// Full router configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Search engine limits
    #[serde(default)]
    pub search: SearchSettings,

    /// Edge costs used by the rail routing callbacks
    #[serde(default)]
    pub costs: CostSettings,
}

/// Limits for a single search. Zero means "no limit" for every field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Maximum number of node expansions before giving up
    #[serde(default = "defaults::max_search_nodes")]
    pub max_search_nodes: u32,

    /// Candidates whose accumulated cost exceeds this are dropped
    #[serde(default)]
    pub max_path_cost: i32,

    /// Iterations per batch before control returns to the caller
    #[serde(default)]
    pub loops_per_tick: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_search_nodes: AYSTAR_DEF_MAX_SEARCH_NODES,
            max_path_cost: 0,
            loops_per_tick: 0,
        }
    }
}

/// What to do with a signal showing red along the direction of travel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPolicy {
    /// Allow passing, but add `red_signal_penalty`
    #[default]
    Penalize,
    /// Treat the segment as impassable
    Forbid,
}

/// Edge cost model for rail routing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostSettings {
    /// Cost of a diagonal trackdir
    #[serde(default = "defaults::tile_length")]
    pub tile_length: i32,

    /// Cost of a non-diagonal trackdir
    #[serde(default = "defaults::straight_length")]
    pub straight_length: i32,

    /// Added when the trackdir is not the straight continuation of its parent
    #[serde(default = "defaults::curve_penalty")]
    pub curve_penalty: i32,

    #[serde(default)]
    pub signal_policy: SignalPolicy,

    /// Added when entering a segment guarded by a red signal (Penalize policy)
    #[serde(default = "defaults::red_signal_penalty")]
    pub red_signal_penalty: i32,

    /// Cost of turning around inside a depot
    #[serde(default = "defaults::depot_reverse_penalty")]
    pub depot_reverse_penalty: i32,

    /// Disallow turning onto a track that crosses the current one at 90 degrees
    #[serde(default)]
    pub forbid_90_deg: bool,

    /// Heuristic multiplier (1.0 = admissible, >1.0 trades optimality for speed)
    #[serde(default = "defaults::heuristic_weight")]
    pub heuristic_weight: f32,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            tile_length: NPF_TILE_LENGTH,
            straight_length: NPF_STRAIGHT_LENGTH,
            curve_penalty: defaults::curve_penalty(),
            signal_policy: SignalPolicy::Penalize,
            red_signal_penalty: defaults::red_signal_penalty(),
            depot_reverse_penalty: defaults::depot_reverse_penalty(),
            forbid_90_deg: false,
            heuristic_weight: 1.0,
        }
    }
}

impl RouterConfig {
    /// Parse from a YAML string and validate
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file and validate
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate()?;
        self.costs.validate()
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_path_cost < 0 {
            return Err(ConfigError::Invalid {
                field: "search.max_path_cost",
                reason: format!("must be >= 0, got {}", self.max_path_cost),
            });
        }
        Ok(())
    }
}

impl CostSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("costs.tile_length", self.tile_length),
            ("costs.straight_length", self.straight_length),
            ("costs.curve_penalty", self.curve_penalty),
            ("costs.red_signal_penalty", self.red_signal_penalty),
            ("costs.depot_reverse_penalty", self.depot_reverse_penalty),
        ];
        for (field, value) in non_negative {
            if value < 0 {
                return Err(ConfigError::Invalid { field, reason: format!("must be >= 0, got {value}") });
            }
        }
        if !(self.heuristic_weight.is_finite() && self.heuristic_weight >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "costs.heuristic_weight",
                reason: format!("must be a finite value >= 0, got {}", self.heuristic_weight),
            });
        }
        Ok(())
    }

    /// Cheapest possible cost of moving onto a neighbouring tile.
    #[inline]
    pub fn min_step_cost(&self) -> i32 {
        self.tile_length.min(self.straight_length)
    }
}
