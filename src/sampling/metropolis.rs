/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! A bare-bones Metropolis walk over configurations, weighted by a bias cluster.

use crate::FailResult;
use crate::acceptance::acceptance_ratio;
use crate::coordinator::{SamplingCoordinator, ClusterId, MovePolicy};
use virial_cluster::{ConfigurationError, Subset};

use rand::{Rng, SeedableRng, XorShiftRng};
use std::fmt;

/// Running totals of a [`MetropolisSampler`].
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SamplerStats {
    pub attempted: u64,
    pub accepted: u64,
    pub samples: u64,
    /// sum of `target / |bias|`
    pub sum: f64,
}

impl SamplerStats {
    pub fn average(&self) -> f64 {
        match self.samples {
            0 => 0.0,
            n => self.sum / n as f64,
        }
    }

    pub fn acceptance_rate(&self) -> f64 {
        match self.attempted {
            0 => 0.0,
            n => self.accepted as f64 / n as f64,
        }
    }
}

/// Moves one random point at a time by a uniform displacement, accepting with
/// probability `min(1, |bias_new| / |bias_old|)`, and averages `target / |bias|`.
pub struct MetropolisSampler {
    coordinator: SamplingCoordinator,
    target: ClusterId,
    bias: ClusterId,
    step_size: f64,
    rng: XorShiftRng,
    weight: f64,
    stats: SamplerStats,
}

impl fmt::Debug for MetropolisSampler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MetropolisSampler")
            .field("coordinator", &self.coordinator)
            .field("step_size", &self.step_size)
            .field("weight", &self.weight)
            .field("stats", &self.stats)
            .finish()
    }
}

impl MetropolisSampler {
    pub fn new(
        mut coordinator: SamplingCoordinator,
        target: ClusterId,
        bias: ClusterId,
        step_size: f64,
        seed: [u32; 4],
    ) -> FailResult<Self> {
        if !(step_size > 0.0 && step_size.is_finite()) {
            throw!(ConfigurationError::InvalidParameter { what: "step size", value: step_size });
        }
        let weight = coordinator.value(bias)?.abs();
        if weight == 0.0 {
            bail!("the starting configuration has zero sampling weight");
        }
        Ok(MetropolisSampler {
            coordinator, target, bias, step_size, weight,
            rng: XorShiftRng::from_seed(seed),
            stats: SamplerStats::default(),
        })
    }

    pub fn coordinator(&self) -> &SamplingCoordinator { &self.coordinator }
    pub fn coordinator_mut(&mut self) -> &mut SamplingCoordinator { &mut self.coordinator }
    pub fn stats(&self) -> SamplerStats { self.stats }
    pub fn target(&self) -> ClusterId { self.target }
    pub fn bias(&self) -> ClusterId { self.bias }

    /// One attempted move. Returns whether it was accepted.
    pub fn step(&mut self) -> FailResult<bool> {
        let n = self.coordinator.point_count();
        let dim = self.coordinator.geometry().dim();
        let i = self.rng.gen_range(0, n);
        let delta: Vec<f64> = {
            (0..dim).map(|_| self.step_size * self.rng.gen_range(-1.0, 1.0)).collect()
        };

        self.coordinator.trial(Subset::single(i), MovePolicy::Rejectable, |c| c.translate(i, &delta))??;
        let new = self.coordinator.value(self.bias)?.abs();
        let ratio = acceptance_ratio(self.weight, new);

        self.stats.attempted += 1;
        let accept = ratio >= 1.0 || self.rng.next_f64() < ratio;
        match accept {
            true => {
                self.coordinator.accept()?;
                self.weight = new;
                self.stats.accepted += 1;
            },
            false => self.coordinator.reject()?,
        }
        Ok(accept)
    }

    /// Adds the current configuration to the average.
    pub fn sample(&mut self) -> FailResult<f64> {
        let target = self.coordinator.value(self.target)?;
        let x = target / self.weight;
        self.stats.samples += 1;
        self.stats.sum += x;
        Ok(x)
    }

    /// `steps` moves, sampling after each one.
    pub fn run(&mut self, steps: u64) -> FailResult<SamplerStats> {
        for _ in 0..steps {
            self.step()?;
            self.sample()?;
        }
        info!(
            "{} steps: average {:.6e}, acceptance {:.3}",
            steps, self.stats.average(), self.stats.acceptance_rate(),
        );
        Ok(self.stats)
    }
}
