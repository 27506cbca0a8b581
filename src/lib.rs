//! Hamiltonian Monte Carlo sampling of misfit functionals.
//!
//! A [`distributions::Distribution`] target and prior define the potential
//! `target.misfit + prior.misfit`, a [`mass_matrix::MassMatrix`] the kinetic
//! energy. [`hmc::Hmc`] explores the resulting posterior with leapfrog
//! trajectories that bounce off the prior's bounds, and streams the thinned
//! chain into an [`io::SampleStore`] in a way that survives interruption.

pub mod buffer;
pub mod config;
pub mod distributions;
pub mod error;
pub mod euclidean;
pub mod hmc;
pub mod integrator;
pub mod interrupt;
pub mod io;
pub mod mass_matrix;
pub mod stats;
