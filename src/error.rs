//! Error types shared by the sampler, the integrator and the sample stores.

use thiserror::Error;

/// Everything that can go wrong while setting up or running a chain.
///
/// A user interruption is not an error: it ends a run through the same exit
/// path as normal completion and is reported in [`crate::hmc::RunOutcome`].
#[derive(Debug, Error)]
pub enum HmcError {
    /// Invalid run settings, bounds or initial state. Raised before sampling.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(
        "incompatible target/prior/mass matrix: target has {target} dimensions, \
         prior has {prior}, mass matrix has {mass_matrix}"
    )]
    DimensionMismatch {
        target: usize,
        prior: usize,
        mass_matrix: usize,
    },

    /// The collaborator does not provide this operation (e.g. `generate`).
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// A misfit, gradient or Hamiltonian evaluated to NaN or infinity where a
    /// finite value is required.
    #[error("non-finite {what} encountered at proposal {proposal}")]
    NonFinite { what: &'static str, proposal: usize },

    #[error("sample storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[cfg(feature = "arrow")]
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, HmcError>;
