/*!
Capability trait for the target (likelihood) and prior distributions consumed by
the sampler, the reflecting [`Bounds`] they can carry, and a handful of reference
distributions.

Distributions are described by their *misfit*, the negative log-density up to an
additive constant, and the misfit gradient. Bounded distributions return an
infinite misfit outside their support and expose a corrector that reflects an HMC
particle back inside after every position update of the integrator.

# Examples

```rust
use hmc_tomography::distributions::{Distribution, Normal, Uniform};
use ndarray::array;

let likelihood = Normal::new(array![0.0, 0.0], array![1.0, 4.0]).unwrap();
let chi = likelihood.misfit(&array![1.0, 2.0]);
assert!((chi - 1.0).abs() < 1e-12);

let prior = Uniform::new(array![0.0, 0.0], array![1.0, 1.0]).unwrap();
assert!(prior.bounded());
assert!(prior.misfit(&array![1.5, 0.5]).is_infinite());
```
*/

use crate::error::{HmcError, Result};
use ndarray::{Array1, Zip};
use rand::RngCore;
use rand_distr::{Distribution as RandDistribution, StandardNormal};

/// A distribution in model space, seen through its misfit.
///
/// Both the target and the prior of a run implement this trait. Only the
/// prior's [`bounded`](Distribution::bounded) flag and
/// [`corrector`](Distribution::corrector) are consulted by the integrator.
pub trait Distribution {
    /// Model space dimension.
    fn dimensions(&self) -> usize;

    /// Negative log-density at `coordinates`, `+inf` outside the support.
    fn misfit(&self, coordinates: &Array1<f64>) -> f64;

    /// Gradient of the misfit with respect to `coordinates`.
    fn gradient(&self, coordinates: &Array1<f64>) -> Array1<f64>;

    /// Draws an independent sample. Most distributions cannot do this.
    fn generate(&self, _rng: &mut dyn RngCore) -> Result<Array1<f64>> {
        Err(HmcError::Unsupported("generate"))
    }

    /// Whether [`corrector`](Distribution::corrector) has to run after every
    /// position update.
    fn bounded(&self) -> bool {
        false
    }

    /// Moves a particle that left the support back inside it, in place.
    fn corrector(&self, _coordinates: &mut Array1<f64>, _momentum: &mut Array1<f64>) {}
}

impl<D: Distribution + ?Sized> Distribution for Box<D> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn misfit(&self, coordinates: &Array1<f64>) -> f64 {
        (**self).misfit(coordinates)
    }

    fn gradient(&self, coordinates: &Array1<f64>) -> Array1<f64> {
        (**self).gradient(coordinates)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Result<Array1<f64>> {
        (**self).generate(rng)
    }

    fn bounded(&self) -> bool {
        (**self).bounded()
    }

    fn corrector(&self, coordinates: &mut Array1<f64>, momentum: &mut Array1<f64>) {
        (**self).corrector(coordinates, momentum)
    }
}

/// Optional per-parameter lower and upper limits.
///
/// Use `-inf`/`+inf` entries for parameters that should only be bounded on
/// one side or not at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bounds {
    lower: Option<Array1<f64>>,
    upper: Option<Array1<f64>>,
}

impl Bounds {
    /// No limits in any direction.
    pub fn none() -> Self {
        Self::default()
    }

    /// Validates and stores the limits. Each vector must have `dimensions`
    /// entries, and where both are present every upper bound must lie strictly
    /// above its lower bound.
    pub fn new(
        dimensions: usize,
        lower: Option<Array1<f64>>,
        upper: Option<Array1<f64>>,
    ) -> Result<Self> {
        for (name, bound) in [("lower", &lower), ("upper", &upper)] {
            if let Some(b) = bound {
                if b.len() != dimensions {
                    return Err(HmcError::Config(format!(
                        "{name} bounds have {} entries, expected {dimensions}",
                        b.len()
                    )));
                }
                if b.iter().any(|x| x.is_nan()) {
                    return Err(HmcError::Config(format!("{name} bounds contain NaN")));
                }
            }
        }
        if let (Some(l), Some(u)) = (&lower, &upper) {
            if l.iter().zip(u.iter()).any(|(l, u)| u <= l) {
                return Err(HmcError::Config(
                    "upper bounds must lie strictly above lower bounds".into(),
                ));
            }
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> Option<&Array1<f64>> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Option<&Array1<f64>> {
        self.upper.as_ref()
    }

    pub fn is_bounded(&self) -> bool {
        self.lower.is_some() || self.upper.is_some()
    }

    pub fn contains(&self, coordinates: &Array1<f64>) -> bool {
        let above = self
            .lower
            .as_ref()
            .map_or(true, |l| Zip::from(coordinates).and(l).all(|x, l| x >= l));
        let below = self
            .upper
            .as_ref()
            .map_or(true, |u| Zip::from(coordinates).and(u).all(|x, u| x <= u));
        above && below
    }

    /// Misfit contribution of the truncation: `0` inside, `+inf` outside.
    pub fn misfit(&self, coordinates: &Array1<f64>) -> f64 {
        if self.contains(coordinates) {
            0.0
        } else {
            f64::INFINITY
        }
    }

    /// Reflecting boundary: every coordinate below its lower bound is mirrored
    /// about it and its momentum negated, then the same for the upper bounds.
    ///
    /// One reflection per bound and call. A particle that overshoots by more
    /// than the width of the feasible interval stays outside after the call;
    /// this is accurate to first order in the step size only.
    pub fn reflect(&self, coordinates: &mut Array1<f64>, momentum: &mut Array1<f64>) {
        if let Some(lower) = &self.lower {
            Zip::from(&mut *coordinates)
                .and(&mut *momentum)
                .and(lower)
                .for_each(|x, p, &l| {
                    if *x < l {
                        *x += 2.0 * (l - *x);
                        *p = -*p;
                    }
                });
        }
        if let Some(upper) = &self.upper {
            Zip::from(&mut *coordinates)
                .and(&mut *momentum)
                .and(upper)
                .for_each(|x, p, &u| {
                    if *x > u {
                        *x += 2.0 * (u - *x);
                        *p = -*p;
                    }
                });
        }
    }
}

fn require_len(what: &str, v: &Array1<f64>, dimensions: usize) -> Result<()> {
    if v.len() != dimensions {
        return Err(HmcError::Config(format!(
            "{what} has {} entries, expected {dimensions}",
            v.len()
        )));
    }
    Ok(())
}

fn require_positive(what: &str, v: &Array1<f64>) -> Result<()> {
    if v.iter().any(|x| !(x.is_finite() && *x > 0.0)) {
        return Err(HmcError::Config(format!(
            "{what} must be finite and strictly positive"
        )));
    }
    Ok(())
}

/**
An uncorrelated Gaussian, parameterized by its means and variances.

```rust
use hmc_tomography::distributions::{Distribution, Normal};
use ndarray::array;

let normal = Normal::new(array![1.0], array![2.0]).unwrap();
assert_eq!(normal.gradient(&array![3.0]), array![1.0]);
```
*/
#[derive(Debug, Clone)]
pub struct Normal {
    means: Array1<f64>,
    variances: Array1<f64>,
    inverse_variances: Array1<f64>,
    bounds: Bounds,
}

impl Normal {
    pub fn new(means: Array1<f64>, variances: Array1<f64>) -> Result<Self> {
        require_len("variances", &variances, means.len())?;
        require_positive("variances", &variances)?;
        let inverse_variances = variances.mapv(|v| 1.0 / v);
        Ok(Self {
            means,
            variances,
            inverse_variances,
            bounds: Bounds::none(),
        })
    }

    /// Truncates the distribution to the given box.
    pub fn with_bounds(
        mut self,
        lower: Option<Array1<f64>>,
        upper: Option<Array1<f64>>,
    ) -> Result<Self> {
        self.bounds = Bounds::new(self.means.len(), lower, upper)?;
        Ok(self)
    }

    pub fn means(&self) -> &Array1<f64> {
        &self.means
    }

    pub fn variances(&self) -> &Array1<f64> {
        &self.variances
    }
}

impl Distribution for Normal {
    fn dimensions(&self) -> usize {
        self.means.len()
    }

    fn misfit(&self, coordinates: &Array1<f64>) -> f64 {
        let mut chi = 0.0;
        Zip::from(coordinates)
            .and(&self.means)
            .and(&self.inverse_variances)
            .for_each(|x, m, iv| chi += (x - m) * (x - m) * iv);
        self.bounds.misfit(coordinates) + 0.5 * chi
    }

    fn gradient(&self, coordinates: &Array1<f64>) -> Array1<f64> {
        (coordinates - &self.means) * &self.inverse_variances
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Result<Array1<f64>> {
        if self.bounds.is_bounded() {
            return Err(HmcError::Unsupported("generate on a truncated Normal"));
        }
        Ok(Zip::from(&self.means)
            .and(&self.variances)
            .map_collect(|m, v| {
                let z: f64 = StandardNormal.sample(rng);
                *m + v.sqrt() * z
            }))
    }

    fn bounded(&self) -> bool {
        self.bounds.is_bounded()
    }

    fn corrector(&self, coordinates: &mut Array1<f64>, momentum: &mut Array1<f64>) {
        self.bounds.reflect(coordinates, momentum)
    }
}

/// Least absolute deviations (L1): `misfit = sum |x - mean| / dispersion`.
#[derive(Debug, Clone)]
pub struct Laplace {
    means: Array1<f64>,
    inverse_dispersions: Array1<f64>,
    bounds: Bounds,
}

impl Laplace {
    pub fn new(means: Array1<f64>, dispersions: Array1<f64>) -> Result<Self> {
        require_len("dispersions", &dispersions, means.len())?;
        require_positive("dispersions", &dispersions)?;
        Ok(Self {
            inverse_dispersions: dispersions.mapv(|d| 1.0 / d),
            means,
            bounds: Bounds::none(),
        })
    }

    pub fn with_bounds(
        mut self,
        lower: Option<Array1<f64>>,
        upper: Option<Array1<f64>>,
    ) -> Result<Self> {
        self.bounds = Bounds::new(self.means.len(), lower, upper)?;
        Ok(self)
    }
}

impl Distribution for Laplace {
    fn dimensions(&self) -> usize {
        self.means.len()
    }

    fn misfit(&self, coordinates: &Array1<f64>) -> f64 {
        let mut chi = 0.0;
        Zip::from(coordinates)
            .and(&self.means)
            .and(&self.inverse_dispersions)
            .for_each(|x, m, id| chi += (x - m).abs() * id);
        self.bounds.misfit(coordinates) + chi
    }

    fn gradient(&self, coordinates: &Array1<f64>) -> Array1<f64> {
        // d|x|/dx, zero at the kink
        Zip::from(coordinates)
            .and(&self.means)
            .and(&self.inverse_dispersions)
            .map_collect(|x, m, id| {
                let r = x - m;
                if r > 0.0 {
                    *id
                } else if r < 0.0 {
                    -id
                } else {
                    0.0
                }
            })
    }

    fn bounded(&self) -> bool {
        self.bounds.is_bounded()
    }

    fn corrector(&self, coordinates: &mut Array1<f64>, momentum: &mut Array1<f64>) {
        self.bounds.reflect(coordinates, momentum)
    }
}

/// Constant density inside a box, or everywhere when built with
/// [`Uniform::unbounded`].
#[derive(Debug, Clone)]
pub struct Uniform {
    dimensions: usize,
    bounds: Bounds,
}

impl Uniform {
    pub fn new(lower: Array1<f64>, upper: Array1<f64>) -> Result<Self> {
        let dimensions = lower.len();
        Ok(Self {
            dimensions,
            bounds: Bounds::new(dimensions, Some(lower), Some(upper))?,
        })
    }

    /// The improper flat distribution: zero misfit and gradient everywhere.
    pub fn unbounded(dimensions: usize) -> Self {
        Self {
            dimensions,
            bounds: Bounds::none(),
        }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }
}

impl Distribution for Uniform {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn misfit(&self, coordinates: &Array1<f64>) -> f64 {
        self.bounds.misfit(coordinates)
    }

    fn gradient(&self, _coordinates: &Array1<f64>) -> Array1<f64> {
        Array1::zeros(self.dimensions)
    }

    fn bounded(&self) -> bool {
        self.bounds.is_bounded()
    }

    fn corrector(&self, coordinates: &mut Array1<f64>, momentum: &mut Array1<f64>) {
        self.bounds.reflect(coordinates, momentum)
    }
}

/// Himmelblau's function `((x² + y - 11)² + (x + y² - 7)²) / T` used as a
/// two-dimensional multimodal misfit, with annealing temperature `T`.
#[derive(Debug, Clone, Copy)]
pub struct Himmelblau {
    pub annealing: f64,
}

impl Default for Himmelblau {
    fn default() -> Self {
        Self { annealing: 1.0 }
    }
}

impl Distribution for Himmelblau {
    fn dimensions(&self) -> usize {
        2
    }

    fn misfit(&self, coordinates: &Array1<f64>) -> f64 {
        let (x, y) = (coordinates[0], coordinates[1]);
        ((x * x + y - 11.0).powi(2) + (x + y * y - 7.0).powi(2)) / self.annealing
    }

    fn gradient(&self, coordinates: &Array1<f64>) -> Array1<f64> {
        let (x, y) = (coordinates[0], coordinates[1]);
        let a = x * x + y - 11.0;
        let b = x + y * y - 7.0;
        Array1::from_vec(vec![
            2.0 * (2.0 * x * a + b) / self.annealing,
            2.0 * (a + 2.0 * y * b) / self.annealing,
        ])
    }
}

/// Sum of misfits of distributions over the same parameters, e.g. a
/// likelihood and a prior combined by Bayes' rule.
///
/// If the combination carries bounds of its own, its corrector only applies
/// those; otherwise the correctors of the parts run in order.
pub struct Additive {
    dimensions: usize,
    parts: Vec<Box<dyn Distribution>>,
    bounds: Bounds,
}

impl Additive {
    pub fn new(parts: Vec<Box<dyn Distribution>>) -> Result<Self> {
        let dimensions = parts
            .first()
            .map(|d| d.dimensions())
            .ok_or_else(|| HmcError::Config("an additive distribution needs parts".into()))?;
        if let Some(bad) = parts.iter().find(|d| d.dimensions() != dimensions) {
            return Err(HmcError::Config(format!(
                "additive parts disagree on dimensions: {} vs {dimensions}",
                bad.dimensions()
            )));
        }
        Ok(Self {
            dimensions,
            parts,
            bounds: Bounds::none(),
        })
    }

    pub fn with_bounds(
        mut self,
        lower: Option<Array1<f64>>,
        upper: Option<Array1<f64>>,
    ) -> Result<Self> {
        self.bounds = Bounds::new(self.dimensions, lower, upper)?;
        Ok(self)
    }
}

impl Distribution for Additive {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn misfit(&self, coordinates: &Array1<f64>) -> f64 {
        self.parts
            .iter()
            .map(|d| d.misfit(coordinates))
            .sum::<f64>()
            + self.bounds.misfit(coordinates)
    }

    fn gradient(&self, coordinates: &Array1<f64>) -> Array1<f64> {
        let mut gradient = Array1::<f64>::zeros(self.dimensions);
        for part in &self.parts {
            gradient += &part.gradient(coordinates);
        }
        gradient
    }

    fn bounded(&self) -> bool {
        self.bounds.is_bounded() || self.parts.iter().any(|d| d.bounded())
    }

    fn corrector(&self, coordinates: &mut Array1<f64>, momentum: &mut Array1<f64>) {
        if self.bounds.is_bounded() {
            self.bounds.reflect(coordinates, momentum);
        } else {
            for part in self.parts.iter().filter(|d| d.bounded()) {
                part.corrector(coordinates, momentum);
            }
        }
    }
}
