//! Mass matrices: momentum generation and the kinetic energy of the fictitious
//! particle simulated by HMC.

use crate::error::{HmcError, Result};
use crate::euclidean::EuclideanVector;
use ndarray::{Array1, Zip};
use rand::RngCore;

/// Kinetic part of the Hamiltonian.
pub trait MassMatrix {
    fn dimensions(&self) -> usize;

    /// Draws a momentum from the Gaussian with this matrix as covariance.
    fn generate_momentum(&self, rng: &mut dyn RngCore) -> Array1<f64>;

    /// `K(p) = ½ pᵀ M⁻¹ p`.
    fn kinetic_energy(&self, momentum: &Array1<f64>) -> f64;

    /// `∂K/∂p = M⁻¹ p`, the velocity used in the position updates.
    fn kinetic_energy_gradient(&self, momentum: &Array1<f64>) -> Array1<f64>;
}

impl<M: MassMatrix + ?Sized> MassMatrix for Box<M> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn generate_momentum(&self, rng: &mut dyn RngCore) -> Array1<f64> {
        (**self).generate_momentum(rng)
    }

    fn kinetic_energy(&self, momentum: &Array1<f64>) -> f64 {
        (**self).kinetic_energy(momentum)
    }

    fn kinetic_energy_gradient(&self, momentum: &Array1<f64>) -> Array1<f64> {
        (**self).kinetic_energy_gradient(momentum)
    }
}

/// The identity mass matrix.
#[derive(Debug, Clone, Copy)]
pub struct Unit {
    dimensions: usize,
}

impl Unit {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl MassMatrix for Unit {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn generate_momentum(&self, rng: &mut dyn RngCore) -> Array1<f64> {
        let mut momentum = Array1::<f64>::zeros(self.dimensions);
        momentum.fill_standard_normal(rng);
        momentum
    }

    fn kinetic_energy(&self, momentum: &Array1<f64>) -> f64 {
        0.5 * momentum.norm_sq()
    }

    fn kinetic_energy_gradient(&self, momentum: &Array1<f64>) -> Array1<f64> {
        momentum.clone()
    }
}

/// A diagonal mass matrix, one mass per parameter.
#[derive(Debug, Clone)]
pub struct Diagonal {
    masses: Array1<f64>,
    inverse_masses: Array1<f64>,
    standard_deviations: Array1<f64>,
}

impl Diagonal {
    pub fn new(masses: Array1<f64>) -> Result<Self> {
        if masses.iter().any(|m| !(m.is_finite() && *m > 0.0)) {
            return Err(HmcError::Config(
                "masses must be finite and strictly positive".into(),
            ));
        }
        Ok(Self {
            inverse_masses: masses.mapv(|m| 1.0 / m),
            standard_deviations: masses.mapv(f64::sqrt),
            masses,
        })
    }

    pub fn masses(&self) -> &Array1<f64> {
        &self.masses
    }
}

impl MassMatrix for Diagonal {
    fn dimensions(&self) -> usize {
        self.masses.len()
    }

    fn generate_momentum(&self, rng: &mut dyn RngCore) -> Array1<f64> {
        let mut momentum = Array1::<f64>::zeros(self.masses.len());
        momentum.fill_standard_normal(rng);
        momentum * &self.standard_deviations
    }

    fn kinetic_energy(&self, momentum: &Array1<f64>) -> f64 {
        let mut k = 0.0;
        Zip::from(momentum)
            .and(&self.inverse_masses)
            .for_each(|p, im| k += p * p * im);
        0.5 * k
    }

    fn kinetic_energy_gradient(&self, momentum: &Array1<f64>) -> Array1<f64> {
        momentum * &self.inverse_masses
    }
}
