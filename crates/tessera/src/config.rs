//! # Demo Configuration
//!
//! Which scene to run, for how long, with which seed and input script:
//!
//! ```toml
//! scene = "squares"
//! ticks = 600
//! seed = 7
//!
//! [table]
//! destroy_mode = "deferred"
//!
//! [[presses]]
//! tick = 1
//! button = "up"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tessera_core::TableConfig;

use crate::error::{DemoError, DemoResult};
use crate::keypad::{Button, ScriptedPress};

/// Ticks run when the configuration does not say.
pub const DEFAULT_TICKS: u32 = 600;

/// Seed used when the configuration does not say.
pub const DEFAULT_SEED: u64 = 0x7E55_E8A;

/// The demo scenes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scene {
    /// Bouncing, rotating, flashing squares driven by the keypad.
    #[default]
    Squares,
    /// Stars, planets and moons orbiting a black hole.
    Galaxy,
}

/// Everything a demo run needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Scene to run.
    pub scene: Scene,
    /// Number of ticks.
    pub ticks: u32,
    /// Seed of the spawning PRNG.
    pub seed: u64,
    /// Entity table settings.
    pub table: TableConfig,
    /// Keypad script.
    pub presses: Vec<ScriptedPress>,
}

/// Input played when the configuration has no script: three waves of
/// squares, then every manager action once.
const SHOWCASE: [(u32, Button); 12] = [
    (0, Button::Up),
    (30, Button::Up),
    (60, Button::Up),
    (90, Button::A),
    (120, Button::B),
    (150, Button::Right),
    (240, Button::Left),
    (300, Button::R),
    (360, Button::L),
    (400, Button::B),
    (420, Button::Up),
    (540, Button::Down),
];

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            scene: Scene::default(),
            ticks: DEFAULT_TICKS,
            seed: DEFAULT_SEED,
            table: TableConfig::default(),
            presses: SHOWCASE
                .iter()
                .map(|&(tick, button)| ScriptedPress { tick, button })
                .collect(),
        }
    }
}

impl DemoConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`DemoError::Config`] on malformed input, [`DemoError::Table`] if the
    /// table section is out of range.
    pub fn from_toml_str(source: &str) -> DemoResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| DemoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`DemoError::Io`] if the file cannot be read, otherwise as
    /// [`DemoConfig::from_toml_str`].
    pub fn load(path: &Path) -> DemoResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| DemoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`DemoError::Config`] if a press is scheduled past the last tick.
    pub fn validate(&self) -> DemoResult<()> {
        self.table.validate()?;
        if let Some(press) = self.presses.iter().find(|p| p.tick >= self.ticks) {
            return Err(DemoError::Config(format!(
                "press of {} at tick {} is past the last tick {}",
                press.button,
                press.tick,
                self.ticks.saturating_sub(1)
            )));
        }
        Ok(())
    }
}
