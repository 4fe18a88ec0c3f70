pub mod actions;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod file_updater;
pub mod release;
pub mod replacer;
pub mod ui;
pub mod vcs;
pub mod warning;

pub use error::{PunchError, Result};
