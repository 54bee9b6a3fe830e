//! Infrastructure layer - process environment and configuration.

pub mod config;
