//! # Scene Runner
//!
//! Builds a scene from a [`DemoConfig`] and drives it tick by tick:
//!
//! ```text
//! build table ─> spawn initial bodies ─> ┌─ table.update() ─┐
//!                                        │  record stats    │ x ticks
//!                                        └─ keypad.advance()┘
//! ```

use std::rc::Rc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use tessera_core::{EntityTable, Fixed, Layout};

use crate::config::{DemoConfig, Scene};
use crate::error::DemoResult;
use crate::galaxy::{self, Backdrop, Galaxy};
use crate::keypad::Keypad;
use crate::squares::{self, Squares};

/// What a run did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Scene that ran.
    pub scene: Scene,
    /// Ticks completed.
    pub ticks: u32,
    /// Live entities after the last tick.
    pub live: usize,
    /// Most live entities after any tick.
    pub peak: usize,
}

impl RunReport {
    fn new(scene: Scene) -> Self {
        Self {
            scene,
            ticks: 0,
            live: 0,
            peak: 0,
        }
    }

    fn record(&mut self, live: usize) {
        self.ticks += 1;
        self.live = live;
        self.peak = self.peak.max(live);
    }
}

fn drive<L: Layout>(
    table: &mut EntityTable<L>,
    keypad: &Keypad,
    ticks: u32,
    report: &mut RunReport,
) {
    for _ in 0..ticks {
        table.update();
        report.record(table.size());
        if report.ticks % 60 == 0 {
            debug!("Tick {}: {} live entities", report.ticks, report.live);
        }
        keypad.advance();
    }
}

/// Runs the colored squares scene and hands back the final table.
///
/// # Errors
///
/// Propagates table setup errors.
pub fn run_squares(config: &DemoConfig) -> DemoResult<(EntityTable<Squares>, RunReport)> {
    let keypad = Rc::new(Keypad::new(config.presses.clone()));
    let mut table = squares::build(config.table.clone(), &keypad)?;
    let mut report = RunReport::new(Scene::Squares);

    drive(&mut table, &keypad, config.ticks, &mut report);

    let [red, blue, yellow, flashing] = squares::census(table.rows());
    info!(
        "Squares after {} ticks: {} red, {} blue, {} yellow, {} flashing (peak {})",
        report.ticks, red, blue, yellow, flashing, report.peak
    );
    Ok((table, report))
}

/// Runs the galaxy scene and hands back the final table.
///
/// # Errors
///
/// Propagates table setup errors, including a galaxy that does not fit.
pub fn run_galaxy(config: &DemoConfig) -> DemoResult<(EntityTable<Galaxy>, RunReport)> {
    let keypad = Keypad::new(config.presses.clone());
    let backdrop = Rc::new(Backdrop::default());
    let mut table = galaxy::build(config.table.clone(), &backdrop)?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    galaxy::galaxy(&mut table, &mut rng, Fixed::ZERO, Fixed::ZERO)?;
    let mut report = RunReport::new(Scene::Galaxy);

    drive(&mut table, &keypad, config.ticks, &mut report);

    let (x, y) = backdrop.offset();
    info!(
        "Galaxy after {} ticks: {} bodies, backdrop at ({}, {})",
        report.ticks, report.live, x, y
    );
    Ok((table, report))
}

/// Runs the configured scene.
///
/// # Errors
///
/// Propagates table setup errors.
pub fn run(config: &DemoConfig) -> DemoResult<RunReport> {
    info!(
        "Running {:?} for {} ticks (seed {}, destroy mode {:?})",
        config.scene, config.ticks, config.seed, config.table.destroy_mode
    );
    match config.scene {
        Scene::Squares => run_squares(config).map(|(_, report)| report),
        Scene::Galaxy => run_galaxy(config).map(|(_, report)| report),
    }
}
