//! # Runtime Configuration
//!
//! The few table behaviours that are not capacities. Capacities live in the
//! compile-time [`Layout`](crate::Layout); everything here can come from a
//! TOML document:
//!
//! ```toml
//! destroy_mode = "immediate"
//! max_hierarchy_depth = 4
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};

/// Default bound on parent-chain length.
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 8;

/// How destroys requested by table processors are carried out.
///
/// Entity processors and cached applies always defer: they run inside a
/// scan of a subscription set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyMode {
    /// Mark now, reclaim after the processor returns.
    #[default]
    Deferred,
    /// Reclaim the row on the spot.
    Immediate,
}

/// Runtime table configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Destroy behaviour for table processors.
    pub destroy_mode: DestroyMode,
    /// Longest parent chain the hierarchy resolver follows.
    pub max_hierarchy_depth: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            destroy_mode: DestroyMode::Deferred,
            max_hierarchy_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
        }
    }
}

impl TableConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidConfig`] if the document does not parse or a
    /// value is out of range.
    pub fn from_toml_str(source: &str) -> TableResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| TableError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidConfig`] if `max_hierarchy_depth` is zero.
    pub fn validate(&self) -> TableResult<()> {
        if self.max_hierarchy_depth == 0 {
            return Err(TableError::InvalidConfig(
                "max_hierarchy_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
