//! Vector helpers used by the integrator and the mass matrices.

use ndarray::{Array1, Zip};
use rand::Rng;
use rand_distr::StandardNormal;

/// In-place vector operations needed by the integrator and the mass matrices.
///
/// Implemented for `Array1<f64>`, the representation of coordinates and
/// momenta throughout the crate.
pub trait EuclideanVector {
    /// In-place fused multiply-add: `self += alpha * other`.
    fn add_scaled_assign(&mut self, other: &Self, alpha: f64);

    /// Fills the vector with samples from N(0, 1) in-place.
    fn fill_standard_normal<R: Rng + ?Sized>(&mut self, rng: &mut R);

    /// Returns `true` if no component is NaN or infinite.
    fn all_finite(&self) -> bool;

    /// Squared Euclidean norm.
    fn norm_sq(&self) -> f64;
}

impl EuclideanVector for Array1<f64> {
    fn add_scaled_assign(&mut self, other: &Self, alpha: f64) {
        Zip::from(self).and(other).for_each(|a, &b| {
            *a += b * alpha;
        });
    }

    fn fill_standard_normal<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.iter_mut().for_each(|x| *x = rng.sample(StandardNormal));
    }

    fn all_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }

    fn norm_sq(&self) -> f64 {
        self.dot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn add_scaled_assign_is_axpy() {
        let mut x = array![1.0, 2.0, 3.0];
        x.add_scaled_assign(&array![1.0, -1.0, 0.5], 2.0);
        assert_eq!(x, array![3.0, 0.0, 4.0]);
    }

    #[test]
    fn fill_standard_normal_overwrites_every_entry() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut x = Array1::from_elem(64, f64::NAN);
        x.fill_standard_normal(&mut rng);
        assert!(x.all_finite());
    }

    #[test]
    fn all_finite_detects_nan_and_inf() {
        assert!(array![0.0, 1.0].all_finite());
        assert!(!array![0.0, f64::NAN].all_finite());
        assert!(!array![f64::INFINITY, 1.0].all_finite());
    }
}
