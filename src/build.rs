/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Turns [`Settings`] into evaluators and a sampler.

use crate::FailResult;
use crate::config::{self, Settings, PotentialKind, ClusterKind, Diagrams};
use crate::cluster::{
    ClusterEvaluator, ClusterWheatley, ClusterTree, ClusterSum, ClusterBonds, ClusterWeightAbs,
    Configuration, PairGeometry, PeriodicCubic, PairOracles, DiagramKind, Precision,
};
use crate::mayer::{
    ConfigurationError, SharedMayer, shared,
    MayerGeneral, MayerHardSphere, LennardJones, SquareWell,
};
use crate::sampling::{SamplingCoordinator, MetropolisSampler, SamplerStats};

use std::sync::Arc;

fn check_positive(what: &'static str, value: f64) -> Result<f64, ConfigurationError> {
    match value.is_finite() && value > 0.0 {
        true => Ok(value),
        false => Err(ConfigurationError::InvalidParameter { what, value }),
    }
}

/// Length scale of the potential, used to size the starting configuration.
pub fn potential_sigma(potential: &PotentialKind) -> f64 {
    match *potential {
        PotentialKind::LennardJones(ref p) => p.sigma,
        PotentialKind::SquareWell(ref p) => p.sigma,
        PotentialKind::HardSphere(ref p) => p.sigma,
    }
}

pub fn bond_function(potential: &PotentialKind) -> Result<SharedMayer, ConfigurationError> {
    Ok(match *potential {
        PotentialKind::LennardJones(config::PotentialLennardJones { sigma, epsilon }) => {
            check_positive("Lennard-Jones sigma", sigma)?;
            check_positive("Lennard-Jones epsilon", epsilon)?;
            shared(MayerGeneral::new(LennardJones { sigma, epsilon }))
        },
        PotentialKind::SquareWell(config::PotentialSquareWell { sigma, lambda, epsilon }) => {
            check_positive("square-well sigma", sigma)?;
            if !(lambda >= 1.0 && lambda.is_finite()) {
                return Err(ConfigurationError::InvalidParameter { what: "square-well lambda", value: lambda });
            }
            if !epsilon.is_finite() {
                return Err(ConfigurationError::InvalidParameter { what: "square-well epsilon", value: epsilon });
            }
            shared(MayerGeneral::new(SquareWell { sigma, lambda, epsilon }))
        },
        PotentialKind::HardSphere(config::PotentialHardSphere { sigma }) => {
            shared(MayerHardSphere::new(check_positive("hard-sphere sigma", sigma)?))
        },
    })
}

pub fn precision(precision: &config::Precision) -> Result<Precision, ConfigurationError> {
    let precision = match *precision {
        config::Precision::Double => Precision::Double,
        config::Precision::Decimal { digits } => Precision::Decimal { digits },
        config::Precision::Adaptive { tolerance } => Precision::Adaptive { tolerance },
    };
    precision.validate()?;
    Ok(precision)
}

fn diagram_kind(diagrams: Diagrams) -> DiagramKind {
    match diagrams {
        Diagrams::Connected => DiagramKind::Connected,
        Diagrams::Biconnected => DiagramKind::Biconnected,
    }
}

/// The cluster whose average is being computed.
pub fn target_cluster(settings: &Settings) -> Result<Box<dyn ClusterEvaluator>, ConfigurationError> {
    let n = settings.points;
    let f = bond_function(&settings.potential)?;

    Ok(match settings.cluster {
        ClusterKind::Wheatley(ref c) => {
            let oracles = PairOracles::uniform(n, f)?;
            let mut cluster = ClusterWheatley::new(
                oracles, diagram_kind(c.diagrams), c.derivatives, precision(&settings.precision)?,
            )?;
            if let Some(coefficient) = c.coefficient {
                cluster = cluster.with_coefficient(coefficient);
            }
            if let Some(cutoff) = c.cutoff {
                cluster = cluster.with_cutoff(cutoff)?;
            }
            Box::new(cluster)
        },
        ClusterKind::HardSphereWheatley(ref c) => {
            let sigma = match settings.potential {
                PotentialKind::HardSphere(ref p) => p.sigma,
                _ => return Err(ConfigurationError::Incompatible(
                    "hard-sphere-wheatley needs a hard-sphere potential".into(),
                )),
            };
            if settings.precision != config::Precision::Double {
                warn!("hard-sphere-wheatley always uses exact arithmetic; ignoring the precision setting");
            }
            Box::new(ClusterWheatley::hard_sphere(n, sigma, diagram_kind(c.diagrams))?)
        },
        ClusterKind::Tree => Box::new(ClusterTree::new(PairOracles::uniform(n, f)?)),
        ClusterKind::Sum(ref c) => {
            let mut diagrams = Vec::with_capacity(c.diagrams.len());
            let mut weights = Vec::with_capacity(c.diagrams.len());
            for diagram in &c.diagrams {
                diagrams.push(ClusterBonds::new(n, diagram.bonds.clone())?);
                weights.push(diagram.weight);
            }
            Box::new(ClusterSum::new(diagrams, weights, vec![f], c.e_bonds)?)
        },
    })
}

/// The sampling weight: overlap trees of the reference, or else `|target|`.
pub fn bias_cluster(
    settings: &Settings,
    target: &dyn ClusterEvaluator,
) -> Result<Box<dyn ClusterEvaluator>, ConfigurationError> {
    Ok(match settings.reference {
        Some(ref reference) => Box::new(ClusterTree::hard_sphere_reference(settings.points, reference.sigma)?),
        None => Box::new(ClusterWeightAbs::new(target.make_copy())),
    })
}

/// Points on a line, close enough that every pair overlaps for the reference (or
/// potential) diameter.
pub fn initial_geometry(settings: &Settings) -> Result<PairGeometry, ConfigurationError> {
    let n = settings.points;
    let scale = match settings.reference {
        Some(ref reference) => reference.sigma,
        None => potential_sigma(&settings.potential),
    };
    let spacing = 0.9 * check_positive("length scale", scale)? / n as f64;

    let mut config = Configuration::new(n, settings.dimension)?;
    for i in 0..n {
        config.point_mut(i)[0] = spacing * i as f64;
    }

    Ok(match settings.box_length {
        None => PairGeometry::open(config),
        Some(length) => PairGeometry::new(config, Arc::new(PeriodicCubic::new(length)?)),
    })
}

/// A ready-to-run sampler and what it was built from.
#[derive(Debug)]
pub struct Simulation {
    pub sampler: MetropolisSampler,
    pub steps: u64,
}

impl Simulation {
    pub fn run(&mut self) -> FailResult<SamplerStats> {
        self.sampler.run(self.steps)
    }
}

pub fn build_simulation(settings: &Settings) -> FailResult<Simulation> {
    check_positive("temperature", settings.temperature)?;
    let target = target_cluster(settings)?;
    let bias = bias_cluster(settings, &*target)?;

    let mut coordinator = SamplingCoordinator::new(initial_geometry(settings)?);
    coordinator.set_temperature(settings.temperature)?;
    let target = coordinator.add_cluster(target)?;
    let bias = coordinator.add_cluster(bias)?;

    let step_size = check_positive("step size", settings.sampling.step_size)?;
    let sampler = MetropolisSampler::new(coordinator, target, bias, step_size, settings.sampling.seed)?;
    info!(
        "{} points at T = {}, {} steps",
        settings.points, settings.temperature, settings.sampling.steps,
    );
    Ok(Simulation { sampler, steps: settings.sampling.steps })
}
