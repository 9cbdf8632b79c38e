//! Material flow analysis of recycling systems
//!
//! This crate provides the numerical core used to compare two estimates of
//! the flows through a use/recycling system:
//!
//! - `cfa`: counting-based estimates read from Petri-net simulation logs
//! - `mfa`: a lifetime-convolution model solved by fixed-point iteration
//!
//! # Module Organisation
//!
//! - `grid`: uniform time grids shared by every series
//! - `lifetime`: log-normal product lifetime densities
//! - `parameters`: parameter structs with the reference scenario defaults
//! - `forcing`: radiative forcing of emission series (dynamic LCA)
//! - `amc`: closed-form absorbing Markov chain check of the flow fractions

pub mod amc;
pub mod cfa;
pub mod errors;
pub mod forcing;
pub mod grid;
pub mod lifetime;
pub mod mfa;
pub mod parameters;

pub use errors::{FlowError, FlowResult};
pub use grid::TimeGrid;
pub use mfa::{FlowConvergenceSolver, MfaSolution};
