/*!
The Hamiltonian Monte Carlo sampler.

Each proposal draws a momentum from the mass matrix, integrates Hamiltonian
dynamics with [`Leapfrog`] for a jittered number of steps of jittered size and
accepts the endpoint with the Metropolis probability `min(1, exp(H - H'))`,
where `H = target.misfit + prior.misfit + kinetic energy`.

Every `online_thinning`-th state of the chain is staged in a [`SampleBuffer`]
and written to the [`SampleWriter`] in blocks. However the loop ends, normal
completion, [`Interrupt`], time limit or error, the pending samples are
flushed and the writer is closed before [`Hmc::sample`] returns.

# Example

```rust
use hmc_tomography::config::HmcConfig;
use hmc_tomography::distributions::{Normal, Uniform};
use hmc_tomography::hmc::Hmc;
use hmc_tomography::interrupt::Interrupt;
use hmc_tomography::io::memory::MemoryStore;
use hmc_tomography::mass_matrix::Unit;
use ndarray::array;

let target = Normal::new(array![0.0, 1.0], array![1.0, 0.5])?;
let sampler = Hmc::new(target, Uniform::unbounded(2), Unit::new(2))?;

let config = HmcConfig::default().set_proposals(200).set_seed(42);
let outcome = sampler.sample(MemoryStore, &config, &Interrupt::new(), &mut ())?;

assert_eq!(outcome.columns_written, 200);
assert_eq!(outcome.finalized.samples().shape(), [3, 200]);
# Ok::<(), hmc_tomography::error::HmcError>(())
```
*/

use crate::buffer::SampleBuffer;
use crate::config::HmcConfig;
use crate::distributions::Distribution;
use crate::error::{HmcError, Result};
use crate::integrator::Leapfrog;
use crate::interrupt::Interrupt;
use crate::io::{RunMetadata, SampleStore, SampleWriter, SAMPLER_NAME};
use crate::mass_matrix::MassMatrix;
use crate::stats::{AcceptanceTracker, Progress};
use ndarray::Array1;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::{info, warn};

/// Why the proposal loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// All configured proposals were made.
    Completed,
    /// The [`Interrupt`] was triggered.
    Interrupted,
    /// `max_time` elapsed.
    TimeLimit,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome<F> {
    /// Proposals that ran to completion.
    pub proposals: usize,
    pub accepted: usize,
    /// Columns persisted, `proposals / online_thinning`.
    pub columns_written: usize,
    pub termination: Termination,
    /// What the writer returned on close.
    pub finalized: F,
}

impl<F> RunOutcome<F> {
    /// `true` unless every configured proposal was made.
    pub fn interrupted(&self) -> bool {
        self.termination != Termination::Completed
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.proposals == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposals as f64
        }
    }
}

/// Current state of the chain.
struct Chain {
    coordinates: Array1<f64>,
    /// Potential (`target.misfit + prior.misfit`) at `coordinates`.
    misfit: f64,
    acceptance: AcceptanceTracker,
}

/// HMC sampler of the posterior `exp(-target.misfit - prior.misfit)`.
#[derive(Debug, Clone)]
pub struct Hmc<T, P, M> {
    target: T,
    prior: P,
    mass_matrix: M,
}

impl<T, P, M> Hmc<T, P, M>
where
    T: Distribution,
    P: Distribution,
    M: MassMatrix,
{
    /// Fails with [`HmcError::DimensionMismatch`] unless the three
    /// collaborators agree on the number of parameters.
    pub fn new(target: T, prior: P, mass_matrix: M) -> Result<Self> {
        let (t, p, m) = (
            target.dimensions(),
            prior.dimensions(),
            mass_matrix.dimensions(),
        );
        if t != p || t != m {
            return Err(HmcError::DimensionMismatch {
                target: t,
                prior: p,
                mass_matrix: m,
            });
        }
        Ok(Self {
            target,
            prior,
            mass_matrix,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.target.dimensions()
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn prior(&self) -> &P {
        &self.prior
    }

    pub fn mass_matrix(&self) -> &M {
        &self.mass_matrix
    }

    /// `target.misfit + prior.misfit`.
    pub fn potential(&self, coordinates: &Array1<f64>) -> f64 {
        self.target.misfit(coordinates) + self.prior.misfit(coordinates)
    }

    pub fn hamiltonian(&self, coordinates: &Array1<f64>, momentum: &Array1<f64>) -> f64 {
        self.potential(coordinates) + self.mass_matrix.kinetic_energy(momentum)
    }

    /// Runs a chain and persists it into `storage`.
    ///
    /// Configuration problems, including initial coordinates outside the
    /// support, are reported before `storage` is opened. Once it is open, the
    /// run always ends with a final flush and `close`, and the dataset then
    /// holds exactly `completed / online_thinning` columns. An error from the
    /// loop is returned after that cleanup.
    pub fn sample<S, G>(
        &self,
        storage: S,
        config: &HmcConfig,
        interrupt: &Interrupt,
        progress: &mut G,
    ) -> Result<RunOutcome<<S::Writer as SampleWriter>::Finalized>>
    where
        S: SampleStore,
        G: Progress + ?Sized,
    {
        let dimensions = self.dimensions();
        config.validate(dimensions)?;

        let coordinates = config
            .initial_coordinates
            .clone()
            .unwrap_or_else(|| Array1::ones(dimensions));
        let misfit = self.potential(&coordinates);
        if !misfit.is_finite() {
            return Err(HmcError::Config(format!(
                "initial coordinates lie outside the support (misfit {misfit})"
            )));
        }

        let total_samples = config.total_samples();
        let mut buffer = SampleBuffer::new(dimensions, config.ram_buffer_size.min(total_samples))?;
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let metadata = RunMetadata {
            proposals: config.proposals,
            online_thinning: config.online_thinning,
            nominal_step_size: config.nominal_step_size,
            nominal_steps: config.nominal_steps,
            randomize_step_size: config.randomize_step_size,
            randomize_steps: config.randomize_steps,
            sampler_name: SAMPLER_NAME.to_string(),
        };
        let mut writer = storage.open(dimensions, total_samples, &metadata)?;

        info!(
            dimensions,
            proposals = config.proposals,
            online_thinning = config.online_thinning,
            total_samples,
            "starting HMC run"
        );
        let mut chain = Chain {
            coordinates,
            misfit,
            acceptance: AcceptanceTracker::new(),
        };
        progress.start(config.proposals);
        let result = self.run_chain(
            config,
            &mut chain,
            &mut buffer,
            &mut writer,
            &mut rng,
            interrupt,
            progress,
        );

        // Single exit path: whatever ended the loop, persist what is pending
        // and close the dataset before reporting.
        let flushed = buffer.flush(&mut writer);
        let columns_written = writer.last_written_column();
        let closed = writer.close();
        let interrupted = !matches!(result, Ok(Termination::Completed));
        progress.finish(&chain.acceptance, interrupted);

        let termination = match result {
            Ok(termination) => termination,
            Err(err) => {
                if let Err(flush_err) = flushed {
                    warn!(error = %flush_err, "final flush after a failed run did not succeed");
                }
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "closing the dataset after a failed run did not succeed");
                }
                return Err(err);
            }
        };
        let finalized = match (flushed, closed) {
            (Ok(_), Ok(finalized)) => finalized,
            (Err(flush_err), closed) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "closing the dataset after a failed flush did not succeed");
                }
                return Err(flush_err);
            }
            (Ok(_), Err(close_err)) => return Err(close_err),
        };

        let outcome = RunOutcome {
            proposals: chain.acceptance.proposals(),
            accepted: chain.acceptance.accepted(),
            columns_written,
            termination,
            finalized,
        };
        info!(
            proposals = outcome.proposals,
            accepted = outcome.accepted,
            columns = outcome.columns_written,
            termination = ?outcome.termination,
            "HMC run finished"
        );
        Ok(outcome)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_chain<W, G>(
        &self,
        config: &HmcConfig,
        chain: &mut Chain,
        buffer: &mut SampleBuffer,
        writer: &mut W,
        rng: &mut SmallRng,
        interrupt: &Interrupt,
        progress: &mut G,
    ) -> Result<Termination>
    where
        W: SampleWriter,
        G: Progress + ?Sized,
    {
        let deadline = config.max_time.map(|limit| Instant::now() + limit);
        let leapfrog = Leapfrog::new(&self.target, &self.prior, &self.mass_matrix);

        for proposal in 0..config.proposals {
            if interrupt.is_triggered() {
                info!(completed = proposal, "interrupted, stopping after the last completed proposal");
                return Ok(Termination::Interrupted);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                info!(completed = proposal, "time limit reached");
                return Ok(Termination::TimeLimit);
            }

            let accepted = self.propose(&leapfrog, config, chain, rng, proposal)?;
            chain.acceptance.record(accepted);

            // Keep the state that closes each thinning window.
            if (proposal + 1) % config.online_thinning == 0
                && buffer.append(&chain.coordinates, chain.misfit)?
            {
                buffer.flush(writer)?;
            }
            progress.update(&chain.acceptance);
        }
        Ok(Termination::Completed)
    }

    /// One HMC transition. Returns whether the proposal was accepted; the
    /// chain moves only then.
    fn propose(
        &self,
        leapfrog: &Leapfrog<'_, T, P, M>,
        config: &HmcConfig,
        chain: &mut Chain,
        rng: &mut SmallRng,
        proposal: usize,
    ) -> Result<bool> {
        let momentum = self.mass_matrix.generate_momentum(rng);
        let hamiltonian = chain.misfit + self.mass_matrix.kinetic_energy(&momentum);
        if !hamiltonian.is_finite() {
            return Err(HmcError::NonFinite {
                what: "Hamiltonian",
                proposal,
            });
        }

        let step_size = if config.randomize_step_size {
            config.nominal_step_size * rng.gen_range(0.5..1.5)
        } else {
            config.nominal_step_size
        };
        let steps = if config.randomize_steps {
            ((config.nominal_steps as f64 * rng.gen_range(0.5..1.5)) as usize).max(1)
        } else {
            config.nominal_steps
        };

        let (coordinates, momentum) =
            leapfrog.propagate(&chain.coordinates, &momentum, steps, step_size, proposal)?;
        let misfit = self.potential(&coordinates);
        let proposed = misfit + self.mass_matrix.kinetic_energy(&momentum);
        // +inf means zero posterior density and is rejected below; NaN has no
        // meaning at all.
        if proposed.is_nan() {
            return Err(HmcError::NonFinite {
                what: "proposed Hamiltonian",
                proposal,
            });
        }

        let accepted = metropolis(hamiltonian, proposed, rng.gen::<f64>());
        if accepted {
            chain.coordinates = coordinates;
            chain.misfit = misfit;
        }
        Ok(accepted)
    }
}

/// Metropolis test for a move from energy `hamiltonian` to `proposed`, given
/// a uniform draw from `[0, 1)`. Never rejects a move that does not raise the
/// energy; a proposal at `+inf` is always rejected.
fn metropolis(hamiltonian: f64, proposed: f64, uniform: f64) -> bool {
    (hamiltonian - proposed).exp() > uniform
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{Normal, Uniform};
    use crate::io::memory::MemoryStore;
    use crate::io::Dataset;
    use crate::mass_matrix::Unit;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::RngCore;
    use ndarray::ArrayView2;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Identity mass matrix that always hands out zero momentum.
    struct Resting;

    impl MassMatrix for Resting {
        fn dimensions(&self) -> usize {
            1
        }

        fn generate_momentum(&self, _rng: &mut dyn RngCore) -> Array1<f64> {
            array![0.0]
        }

        fn kinetic_energy(&self, momentum: &Array1<f64>) -> f64 {
            0.5 * momentum[0] * momentum[0]
        }

        fn kinetic_energy_gradient(&self, momentum: &Array1<f64>) -> Array1<f64> {
            momentum.clone()
        }
    }

    /// Triggers an interrupt from inside `update` after a number of proposals.
    struct InterruptAfter {
        proposals: usize,
        interrupt: Interrupt,
    }

    impl Progress for InterruptAfter {
        fn update(&mut self, acceptance: &AcceptanceTracker) {
            if acceptance.proposals() == self.proposals {
                self.interrupt.trigger();
            }
        }
    }

    /// Records every `update` so the call sequence can be inspected.
    #[derive(Default)]
    struct Recorder {
        total: usize,
        updates: usize,
        finished: Option<bool>,
    }

    impl Progress for Recorder {
        fn start(&mut self, total_proposals: usize) {
            self.total = total_proposals;
        }

        fn update(&mut self, _acceptance: &AcceptanceTracker) {
            self.updates += 1;
        }

        fn finish(&mut self, _acceptance: &AcceptanceTracker, interrupted: bool) {
            self.finished = Some(interrupted);
        }
    }

    /// A store whose every write fails; `close` is still observable.
    struct BrokenDisk {
        closed: Rc<Cell<bool>>,
    }

    struct BrokenWriter {
        dimensions: usize,
        total_samples: usize,
        closed: Rc<Cell<bool>>,
    }

    impl SampleStore for BrokenDisk {
        type Writer = BrokenWriter;

        fn open(
            self,
            dimensions: usize,
            total_samples: usize,
            _metadata: &RunMetadata,
        ) -> Result<BrokenWriter> {
            Ok(BrokenWriter {
                dimensions,
                total_samples,
                closed: self.closed,
            })
        }
    }

    impl SampleWriter for BrokenWriter {
        type Finalized = ();

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn total_samples(&self) -> usize {
            self.total_samples
        }

        fn last_written_column(&self) -> usize {
            0
        }

        fn write(&mut self, _first_column: usize, _columns: ArrayView2<f64>) -> Result<()> {
            Err(HmcError::Storage("disk full".into()))
        }

        fn close(self) -> Result<()> {
            self.closed.set(true);
            Ok(())
        }
    }

    fn gaussian_sampler() -> Hmc<Normal, Uniform, Unit> {
        let target = Normal::new(array![0.0, 0.0], array![1.0, 1.0]).unwrap();
        Hmc::new(target, Uniform::unbounded(2), Unit::new(2)).unwrap()
    }

    #[test]
    fn dimension_mismatch_names_all_three() {
        let target = Normal::new(array![0.0, 0.0], array![1.0, 1.0]).unwrap();
        let err = Hmc::new(target, Uniform::unbounded(3), Unit::new(2)).unwrap_err();
        assert!(matches!(
            err,
            HmcError::DimensionMismatch {
                target: 2,
                prior: 3,
                mass_matrix: 2
            }
        ));
    }

    #[test]
    fn free_particle_at_rest_is_accepted_in_place() {
        let flat = Uniform::unbounded(1);
        let sampler = Hmc::new(flat.clone(), flat, Resting).unwrap();
        let config = HmcConfig::default()
            .set_proposals(1)
            .set_steps(1)
            .set_step_size(0.1)
            .set_randomize_step_size(false)
            .set_randomize_steps(false)
            .set_initial_coordinates(array![1.0]);
        assert_eq!(sampler.hamiltonian(&array![1.0], &array![0.0]), 0.0);

        let outcome = sampler
            .sample(MemoryStore, &config, &Interrupt::new(), &mut ())
            .unwrap();
        assert_eq!(outcome.accepted, 1);
        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(outcome.finalized.samples(), array![[1.0], [0.0]]);
    }

    #[test]
    fn thinning_keeps_every_tenth_state() {
        let config = HmcConfig::default()
            .set_proposals(1000)
            .set_online_thinning(10)
            .set_ram_buffer_size(7)
            .set_seed(3);
        let outcome = gaussian_sampler()
            .sample(MemoryStore, &config, &Interrupt::new(), &mut ())
            .unwrap();
        assert_eq!(outcome.proposals, 1000);
        assert_eq!(outcome.columns_written, 100);
        let dataset = outcome.finalized;
        assert_eq!(dataset.last_written_column(), 100);
        assert_eq!(dataset.total_samples(), 100);
        assert!(dataset.samples().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn buffer_larger_than_run_is_flushed_at_the_end() {
        let config = HmcConfig::default()
            .set_proposals(12)
            .set_online_thinning(4)
            .set_ram_buffer_size(1000)
            .set_seed(5);
        let outcome = gaussian_sampler()
            .sample(MemoryStore, &config, &Interrupt::new(), &mut ())
            .unwrap();
        assert_eq!(outcome.columns_written, 3);
    }

    #[test]
    fn buffer_of_one_flushes_every_sample() {
        let config = HmcConfig::default()
            .set_proposals(9)
            .set_ram_buffer_size(1)
            .set_seed(9);
        let outcome = gaussian_sampler()
            .sample(MemoryStore, &config, &Interrupt::new(), &mut ())
            .unwrap();
        assert_eq!(outcome.columns_written, 9);
    }

    #[test]
    fn interrupt_keeps_completed_windows_only() {
        let interrupt = Interrupt::new();
        let mut progress = InterruptAfter {
            proposals: 37,
            interrupt: interrupt.clone(),
        };
        let config = HmcConfig::default()
            .set_proposals(10_000)
            .set_online_thinning(5)
            .set_ram_buffer_size(3)
            .set_seed(1);
        let outcome = gaussian_sampler()
            .sample(MemoryStore, &config, &interrupt, &mut progress)
            .unwrap();
        assert_eq!(outcome.proposals, 37);
        assert_eq!(outcome.termination, Termination::Interrupted);
        assert!(outcome.interrupted());
        assert_eq!(outcome.columns_written, 7);
        assert_eq!(outcome.finalized.last_written_column(), 7);
        assert_eq!(outcome.finalized.total_samples(), 2000);
    }

    #[test]
    fn pre_triggered_interrupt_writes_nothing() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let mut recorder = Recorder::default();
        let outcome = gaussian_sampler()
            .sample(MemoryStore, &HmcConfig::default(), &interrupt, &mut recorder)
            .unwrap();
        assert_eq!(outcome.proposals, 0);
        assert_eq!(outcome.columns_written, 0);
        assert_eq!(recorder.updates, 0);
        assert_eq!(recorder.finished, Some(true));
    }

    #[test]
    fn zero_time_limit_stops_immediately() {
        let config = HmcConfig::default().set_max_time(Duration::ZERO);
        let outcome = gaussian_sampler()
            .sample(MemoryStore, &config, &Interrupt::new(), &mut ())
            .unwrap();
        assert_eq!(outcome.termination, Termination::TimeLimit);
        assert_eq!(outcome.proposals, 0);
    }

    #[test]
    fn progress_sees_every_proposal() {
        let mut recorder = Recorder::default();
        let config = HmcConfig::default().set_proposals(25).set_seed(2);
        gaussian_sampler()
            .sample(MemoryStore, &config, &Interrupt::new(), &mut recorder)
            .unwrap();
        assert_eq!(recorder.total, 25);
        assert_eq!(recorder.updates, 25);
        assert_eq!(recorder.finished, Some(false));
    }

    #[test]
    fn same_seed_gives_same_chain() {
        let config = HmcConfig::default().set_proposals(50).set_seed(77);
        let run = || -> Dataset {
            gaussian_sampler()
                .sample(MemoryStore, &config, &Interrupt::new(), &mut ())
                .unwrap()
                .finalized
        };
        assert_eq!(run().samples(), run().samples());
    }

    #[test]
    fn rejection_repeats_previous_sample() {
        // Steps far too large for a narrow Gaussian: most proposals fail.
        let target = Normal::new(array![0.0], array![1e-4]).unwrap();
        let sampler = Hmc::new(target, Uniform::unbounded(1), Unit::new(1)).unwrap();
        let config = HmcConfig::default()
            .set_proposals(200)
            .set_step_size(1.0)
            .set_initial_coordinates(array![0.0])
            .set_seed(4);
        let outcome = sampler
            .sample(MemoryStore, &config, &Interrupt::new(), &mut ())
            .unwrap();
        assert!(outcome.accepted < outcome.proposals);

        // With no thinning every rejection after the first proposal shows up
        // as a column identical to its predecessor.
        let coordinates = outcome.finalized.coordinates().row(0).to_vec();
        let repeats = coordinates.windows(2).filter(|w| w[0] == w[1]).count();
        let rejections = outcome.proposals - outcome.accepted;
        assert!(
            repeats == rejections || repeats + 1 == rejections,
            "{repeats} repeated columns for {rejections} rejections"
        );
    }

    #[test]
    fn metropolis_never_rejects_a_non_increasing_energy() {
        let almost_one = 1.0 - f64::EPSILON;
        assert!(metropolis(10.0, 9.5, almost_one));
        assert!(metropolis(10.0, 10.0, almost_one));
        assert!(metropolis(-3.0, -1e6, almost_one));
    }

    #[test]
    fn metropolis_rejects_infinite_energy() {
        assert!(!metropolis(10.0, f64::INFINITY, 0.0));
        assert!(!metropolis(f64::MAX, f64::INFINITY, 0.0));
    }

    #[test]
    fn metropolis_accepts_uphill_moves_by_their_probability() {
        // exp(-1) ~ 0.368
        assert!(metropolis(0.0, 1.0, 0.3));
        assert!(!metropolis(0.0, 1.0, 0.4));
        assert!(metropolis(0.0, 50.0, 0.0));
    }

    #[test]
    fn failed_final_flush_still_closes_the_dataset() {
        let closed = Rc::new(Cell::new(false));
        let interrupt = Interrupt::new();
        let mut progress = InterruptAfter {
            proposals: 3,
            interrupt: interrupt.clone(),
        };
        let config = HmcConfig::default()
            .set_proposals(10)
            .set_ram_buffer_size(1000)
            .set_seed(4);
        let result = gaussian_sampler().sample(
            BrokenDisk {
                closed: closed.clone(),
            },
            &config,
            &interrupt,
            &mut progress,
        );
        assert!(matches!(result, Err(HmcError::Storage(_))));
        assert!(closed.get(), "the dataset must be closed on every exit");
    }

    #[test]
    fn failed_flush_mid_run_still_closes_and_finishes() {
        let closed = Rc::new(Cell::new(false));
        let mut progress = Recorder::default();
        let config = HmcConfig::default()
            .set_proposals(10)
            .set_ram_buffer_size(2)
            .set_seed(4);
        let result = gaussian_sampler().sample(
            BrokenDisk {
                closed: closed.clone(),
            },
            &config,
            &Interrupt::new(),
            &mut progress,
        );
        assert!(matches!(result, Err(HmcError::Storage(_))));
        // The second proposal fills the buffer and its flush fails.
        assert_eq!(progress.updates, 1);
        assert_eq!(progress.finished, Some(true));
        assert!(closed.get());
    }

    #[test]
    fn smaller_steps_accept_more_often() {
        let rate = |step_size: f64| {
            let config = HmcConfig::default()
                .set_proposals(400)
                .set_step_size(step_size)
                .set_randomize_step_size(false)
                .set_seed(13);
            gaussian_sampler()
                .sample(MemoryStore, &config, &Interrupt::new(), &mut ())
                .unwrap()
                .acceptance_rate()
        };
        let (coarse, medium, fine) = (rate(1.2), rate(0.5), rate(0.05));
        assert!(coarse <= medium, "{coarse} > {medium}");
        assert!(medium <= fine, "{medium} > {fine}");
        assert!(fine > 0.95);
    }

    #[test]
    fn initial_coordinates_outside_support_are_rejected() {
        let prior = Uniform::new(array![0.0], array![1.0]).unwrap();
        let target = Normal::new(array![0.5], array![1.0]).unwrap();
        let sampler = Hmc::new(target, prior, Unit::new(1)).unwrap();
        let config = HmcConfig::default().set_initial_coordinates(array![2.0]);
        let result = sampler.sample(MemoryStore, &config, &Interrupt::new(), &mut ());
        assert!(matches!(result, Err(HmcError::Config(_))));
    }

    #[test]
    fn default_start_is_a_vector_of_ones() {
        let flat = Uniform::unbounded(2);
        let sampler = Hmc::new(flat.clone(), flat, Unit::new(2)).unwrap();
        // A flat potential with no motion allowed: every step is zero-length.
        let config = HmcConfig::default()
            .set_proposals(1)
            .set_step_size(1e-300)
            .set_randomize_step_size(false)
            .set_seed(0);
        let outcome = sampler
            .sample(MemoryStore, &config, &Interrupt::new(), &mut ())
            .unwrap();
        let first = outcome.finalized.coordinates().column(0).to_owned();
        assert_abs_diff_eq!(first, array![1.0, 1.0], epsilon = 1e-12);
    }
}
