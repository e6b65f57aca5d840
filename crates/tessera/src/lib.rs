//! # TESSERA
//!
//! Headless demo scenes for [`tessera_core`].
//!
//! The entity table consumes three things it does not provide: a
//! presentation handle, edge-triggered input and a random source. This
//! crate supplies headless stand-ins and two scenes that use them:
//!
//! - [`squares`]: movement, rotation, scaling, visibility, animation, an
//!   entity manager, cached and ad-hoc queries and applies
//! - [`galaxy`]: orbits resolved through a bounded parent hierarchy
//!
//! ## Modules
//!
//! - `config`: TOML demo configuration
//! - `keypad`: scripted input
//! - `runner`: tick loop and run statistics
//! - `sprite`: presentation handle

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod galaxy;
pub mod keypad;
pub mod runner;
pub mod sprite;
pub mod squares;

pub use config::{DemoConfig, Scene};
pub use error::{DemoError, DemoResult};
pub use keypad::{Button, Keypad, ScriptedPress};
pub use runner::{run, RunReport};
pub use sprite::Sprite;
