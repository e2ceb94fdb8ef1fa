//! Configuration module for nexo-envelope
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Settings persistence
//! - Key source selection

pub mod paths;
pub mod settings;

pub use paths::EnvelopePaths;
pub use settings::{KeySettings, KeySource, Settings};
