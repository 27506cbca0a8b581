//! Position-leading leapfrog integration of Hamiltonian dynamics with
//! reflecting-boundary correction.

use crate::distributions::Distribution;
use crate::error::{HmcError, Result};
use crate::euclidean::EuclideanVector;
use crate::mass_matrix::MassMatrix;
use ndarray::Array1;

/// Simulates the fictitious particle of HMC through the potential
/// `target.misfit + prior.misfit` with the kinetic energy of `mass_matrix`.
///
/// The scheme is symplectic and time-reversible: integrating the output again
/// with the negated step size returns the input, and integrating it with the
/// negated momentum returns the input with negated momentum. Both hold up to
/// rounding and as long as no boundary is crossed more than once within a
/// single micro-step.
pub struct Leapfrog<'a, T: ?Sized, P: ?Sized, M: ?Sized> {
    target: &'a T,
    prior: &'a P,
    mass_matrix: &'a M,
}

impl<'a, T, P, M> Leapfrog<'a, T, P, M>
where
    T: Distribution + ?Sized,
    P: Distribution + ?Sized,
    M: MassMatrix + ?Sized,
{
    pub fn new(target: &'a T, prior: &'a P, mass_matrix: &'a M) -> Self {
        Self {
            target,
            prior,
            mass_matrix,
        }
    }

    /// Gradient of the potential, `target.gradient + prior.gradient`.
    pub fn potential_gradient(&self, coordinates: &Array1<f64>) -> Array1<f64> {
        self.target.gradient(coordinates) + self.prior.gradient(coordinates)
    }

    /// Propagates copies of `coordinates` and `momentum` for `steps` steps of
    /// size `step_size`. Exactly `steps` potential gradients are evaluated.
    ///
    /// The prior's corrector runs after every position update when the prior
    /// is bounded. A non-finite potential gradient aborts with
    /// [`HmcError::NonFinite`]; `proposal` only labels that error.
    pub fn propagate(
        &self,
        coordinates: &Array1<f64>,
        momentum: &Array1<f64>,
        steps: usize,
        step_size: f64,
        proposal: usize,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        if steps == 0 {
            return Err(HmcError::Config(
                "the integrator needs at least one step".into(),
            ));
        }
        let mut coordinates = coordinates.clone();
        let mut momentum = momentum.clone();

        // Half step in position.
        self.drift(&mut coordinates, &mut momentum, 0.5 * step_size);

        for _ in 1..steps {
            self.kick(&coordinates, &mut momentum, step_size, proposal)?;
            self.drift(&mut coordinates, &mut momentum, step_size);
        }

        // Closing full momentum step and half position step.
        self.kick(&coordinates, &mut momentum, step_size, proposal)?;
        self.drift(&mut coordinates, &mut momentum, 0.5 * step_size);

        Ok((coordinates, momentum))
    }

    fn kick(
        &self,
        coordinates: &Array1<f64>,
        momentum: &mut Array1<f64>,
        step_size: f64,
        proposal: usize,
    ) -> Result<()> {
        let gradient = self.potential_gradient(coordinates);
        if !gradient.all_finite() {
            return Err(HmcError::NonFinite {
                what: "potential gradient",
                proposal,
            });
        }
        momentum.add_scaled_assign(&gradient, -step_size);
        Ok(())
    }

    fn drift(&self, coordinates: &mut Array1<f64>, momentum: &mut Array1<f64>, dt: f64) {
        let velocity = self.mass_matrix.kinetic_energy_gradient(momentum);
        coordinates.add_scaled_assign(&velocity, dt);
        if self.prior.bounded() {
            self.prior.corrector(coordinates, momentum);
        }
    }
}
