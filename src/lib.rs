//! Counting-based versus material-flow analysis of recycling systems
//!
//! This crate wires the numerical core in `cpnflow-core` to scenario files,
//! CSV reports and SVG charts. The `cpnflow` binary exposes each analysis as
//! a subcommand.

pub mod commands;
pub mod config;
pub mod plot;
pub mod report;

pub use config::ScenarioConfig;
