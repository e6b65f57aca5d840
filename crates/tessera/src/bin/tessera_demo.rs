//! # TESSERA Demo
//!
//! Runs one scene headless and logs what happened.
//!
//! ```bash
//! # Built-in squares showcase
//! tessera_demo
//!
//! # Scene from a config file, with per-tick logging
//! RUST_LOG=tessera=debug tessera_demo crates/tessera/configs/galaxy.toml
//! ```

use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tessera::{run, DemoConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tessera=info".parse()?))
        .init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            match DemoConfig::load(&path) {
                Ok(config) => config,
                Err(e) => {
                    error!("{}", e);
                    return Err(e.into());
                }
            }
        }
        None => DemoConfig::default(),
    };

    let report = match run(&config) {
        Ok(report) => report,
        Err(e) => {
            error!("Run failed: {}", e);
            return Err(e.into());
        }
    };
    info!(
        "Done: {} ticks, {} live, peak {}",
        report.ticks, report.live, report.peak
    );
    Ok(())
}
