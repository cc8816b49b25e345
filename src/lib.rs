//! Projects COVID-19 case trajectories for a region.
//!
//! A run calibrates a two-wave epidemic model against the region's recent case counts and runs it
//! forward:
//! * The [`simulator`] turns [`simulator::SimulationParameters`] (transmission probability and the
//!   timing and width of up to two Gaussian surges) into daily reported cases, limited by the
//!   susceptible population and the daily testing capacity.
//! * The [`similarity`] matcher finds historical regions whose rising phase grew like the target
//!   region is growing now; their remaining weeks to peak and growth rates widen the search.
//! * The [`optimizer`] searches the parameter space in parallel for the candidate whose simulated
//!   curve best reproduces the fitment window.
//! * The [`intervention`] helpers turn stringency scores into a dampening of transmission.
//! * The [`runner`] drives a request through these stages and scores the projection against
//!   held-out test days.
//!
//! Data enters through the provider traits in [`data`]; results leave through [`report`].
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod intervention;
pub mod log;
#[macro_use]
pub mod macros;
pub mod numeric;
pub mod optimizer;
pub mod prelude;
pub mod random;
pub mod report;
pub mod runner;
pub mod similarity;
pub mod simulator;

pub use crate::error::ProjectionError;
pub use crate::runner::{ProjectionRequest, ProjectionResult, ProjectionRunner};
