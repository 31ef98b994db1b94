//! Scenario parameter sets and the matrices built from them
//!
//! A scenario is one assignment of values to a family's flags. A matrix is
//! the ordered, rectangular list of scenarios a suite family fans out over.

mod matrix;
mod params;

pub use matrix::ScenarioMatrix;
pub use params::ScenarioParameterSet;
