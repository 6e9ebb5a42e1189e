/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! The Wheatley evaluator: all connected or all biconnected diagrams of one bond type.

use crate::{FailResult, ConfigurationError, PairGeometry, PairOracles, Subset, SharedMayer};
use crate::cache::CacheTable;
use crate::evaluator::{ClusterEvaluator, check_geometry, check_values};
use crate::numeric::{ClusterScalar, Decimal, DecimalContext, Precision, adaptive_digits};
use crate::protocol::{Tracker, Pending};
use crate::subset::{pairs, pair_index, pair_count};

mod tables;
pub use self::tables::{WheatleyTables, DiagramKind};

/// Fallbacks to decimal arithmetic taken by an adaptive evaluator.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FallbackStats {
    pub evaluations: u64,
    pub fallbacks: u64,
}

impl FallbackStats {
    pub fn fraction(&self) -> f64 {
        match self.evaluations {
            0 => 0.0,
            n => self.fallbacks as f64 / n as f64,
        }
    }
}

#[derive(Debug, Clone)]
enum Engine {
    Double(WheatleyTables<f64>),
    Decimal(WheatleyTables<Decimal>),
    Adaptive {
        tables: WheatleyTables<f64>,
        tolerance: f64,
        context: DecimalContext,
    },
    Exact(WheatleyTables<i64>),
}

macro_rules! with_tables {
    ($engine:expr, $t:ident => $body:expr) => {
        match $engine {
            Engine::Double($t) => $body,
            Engine::Decimal($t) => $body,
            Engine::Adaptive { tables: $t, .. } => $body,
            Engine::Exact($t) => $body,
        }
    };
}

impl Engine {
    fn new(n: usize, derivatives: usize, kind: DiagramKind, precision: Precision) -> Result<Engine, ConfigurationError> {
        Ok(match precision {
            Precision::Double => Engine::Double(WheatleyTables::new(n, derivatives, kind, ())?),
            Precision::Decimal { digits } => {
                let ctx = DecimalContext::new(digits)?;
                Engine::Decimal(WheatleyTables::new(n, derivatives, kind, ctx)?)
            },
            Precision::Adaptive { tolerance } => {
                let context = DecimalContext::new(adaptive_digits(tolerance)?)?;
                let tables = WheatleyTables::new(n, derivatives, kind, ())?;
                Engine::Adaptive { tables, tolerance, context }
            },
            Precision::Exact => {
                if derivatives > 0 {
                    return Err(ConfigurationError::InvalidParameter {
                        what: "derivative count for exact arithmetic",
                        value: derivatives as f64,
                    });
                }
                Engine::Exact(WheatleyTables::new(n, derivatives, kind, ())?)
            },
        })
    }

    fn set_bond(&mut self, k: usize, f: f64, beta: f64) -> Result<(), ConfigurationError> {
        with_tables!(self, t => t.set_bond(k, f, beta))
    }

    fn recompute(&mut self, dirty: Subset) -> FailResult<()> {
        with_tables!(self, t => t.recompute(dirty)?);
        Ok(())
    }

    fn results(&self) -> Vec<f64> {
        with_tables!(self, t => collect_results(t))
    }

    fn begin(&mut self) { with_tables!(self, t => t.begin()) }
    fn commit(&mut self) { with_tables!(self, t => t.commit()) }
    fn rollback(&mut self) { with_tables!(self, t => t.rollback()) }
}

fn collect_results<T: ClusterScalar>(tables: &WheatleyTables<T>) -> Vec<f64> {
    (0..tables.width()).map(|m| tables.result(m).to_f64()).collect()
}

/// Sum of all connected or all biconnected diagrams of `n` points, times a coefficient.
///
/// Biconnected sums default to the coefficient `(1 - n)/n!`, which makes the value
/// the integrand of the `n`th virial coefficient. With derivatives, the value has
/// `derivatives + 1` components: the value and its successive derivatives in `beta`.
#[derive(Debug, Clone)]
pub struct ClusterWheatley {
    oracles: PairOracles,
    kind: DiagramKind,
    derivatives: usize,
    precision: Precision,
    coefficient: f64,
    r_cut2: Option<f64>,
    tracker: Tracker,
    /// f-bond of each pair
    bonds: CacheTable<f64>,
    engine: Engine,
    value: Vec<f64>,
    baseline: Option<Vec<f64>>,
    stats: FallbackStats,
}

impl ClusterWheatley {
    pub fn new(
        oracles: PairOracles,
        kind: DiagramKind,
        derivatives: usize,
        precision: Precision,
    ) -> Result<Self, ConfigurationError> {
        let n = oracles.point_count();
        let engine = Engine::new(n, derivatives, kind, precision)?;
        info!(
            "{:?} Wheatley cluster on {} points ({:?}, {} derivatives)",
            kind, n, precision, derivatives,
        );
        Ok(ClusterWheatley {
            kind, derivatives, precision, engine,
            coefficient: kind.default_coefficient(n),
            r_cut2: None,
            tracker: Tracker::new(n),
            bonds: CacheTable::new(pair_count(n), 0.0),
            value: vec![0.0; derivatives + 1],
            baseline: None,
            stats: FallbackStats::default(),
            oracles,
        })
    }

    /// The biconnected sum for one bond function, in double precision.
    pub fn biconnected(n: usize, f: SharedMayer) -> Result<Self, ConfigurationError> {
        ClusterWheatley::new(PairOracles::uniform(n, f)?, DiagramKind::Biconnected, 0, Precision::Double)
    }

    /// Hard spheres of diameter `sigma`, in exact integer arithmetic.
    pub fn hard_sphere(n: usize, sigma: f64, kind: DiagramKind) -> Result<Self, ConfigurationError> {
        let f = crate::shared(virial_mayer::MayerHardSphere::new(sigma));
        ClusterWheatley::new(PairOracles::uniform(n, f)?, kind, 0, Precision::Exact)
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    /// Makes the value zero whenever any pair is farther apart than `r_cut`.
    pub fn with_cutoff(mut self, r_cut: f64) -> Result<Self, ConfigurationError> {
        if !(r_cut > 0.0) {
            return Err(ConfigurationError::InvalidParameter { what: "pair cutoff", value: r_cut });
        }
        self.r_cut2 = Some(r_cut * r_cut);
        Ok(self)
    }

    pub fn kind(&self) -> DiagramKind { self.kind }
    pub fn precision(&self) -> Precision { self.precision }
    pub fn coefficient(&self) -> f64 { self.coefficient }
    pub fn fallback_stats(&self) -> FallbackStats { self.stats }

    fn beyond_cutoff(&self, geometry: &PairGeometry) -> bool {
        match self.r_cut2 {
            None => false,
            Some(r_cut2) => pairs(self.point_count()).any(|(i, j)| geometry.r2(i, j) > r_cut2),
        }
    }

    fn update_bonds(&mut self, geometry: &PairGeometry, dirty: Subset, beta: f64) -> FailResult<()> {
        let n = self.point_count();
        let mut count = 0;
        for (i, j) in pairs(n) {
            if dirty.contains(i) || dirty.contains(j) {
                let k = pair_index(n, i, j);
                let f = self.oracles.bond(i, j, geometry.r2(i, j), beta)?;
                self.bonds.set(k, f);
                self.engine.set_bond(k, f, beta)?;
                count += 1;
            }
        }
        trace!("recomputed {} bonds for points {:?}", count, dirty);
        Ok(())
    }

    /// Redoes the whole recursion in decimal arithmetic if the double precision result
    /// is small enough to be dominated by rounding.
    fn refine(&mut self, raw: Vec<f64>, beta: f64) -> FailResult<Vec<f64>> {
        let (tolerance, context) = match self.engine {
            Engine::Adaptive { tolerance, context, .. } => (tolerance, context),
            _ => return Ok(raw),
        };
        self.stats.evaluations += 1;
        if raw[0] == 0.0 || raw[0].abs() >= 100.0 * tolerance {
            return Ok(raw);
        }

        let n = self.point_count();
        let mut tables = WheatleyTables::<Decimal>::new(n, self.derivatives, self.kind, context)?;
        for (k, &f) in self.bonds.as_slice().iter().enumerate() {
            tables.set_bond(k, f, beta)?;
        }
        tables.recompute(Subset::full(n))?;
        let refined = collect_results(&tables);

        self.stats.fallbacks += 1;
        debug!(
            "decimal fallback ({} digits): {:e} -> {:e} (fallback fraction {:.3e})",
            context.digits(), raw[0], refined[0], self.stats.fraction(),
        );
        Ok(refined)
    }
}

impl ClusterEvaluator for ClusterWheatley {
    fn point_count(&self) -> usize { self.oracles.point_count() }

    fn value(&mut self, geometry: &PairGeometry) -> FailResult<f64> {
        check_geometry(self.point_count(), geometry)?;
        let beta = self.tracker.beta()?;
        let dirty = match self.tracker.pending(geometry.stamp())? {
            Pending::Cached => return Ok(self.value[0]),
            Pending::Recompute(dirty) => dirty,
        };

        if self.beyond_cutoff(geometry) {
            for x in &mut self.value {
                *x = 0.0;
            }
            self.tracker.served_untabulated(geometry.stamp());
            return Ok(0.0);
        }

        self.update_bonds(geometry, dirty, beta)?;
        self.engine.recompute(dirty)?;
        let raw = self.engine.results();
        let raw = self.refine(raw, beta)?;

        let value: Vec<f64> = raw.iter().map(|x| self.coefficient * x).collect();
        check_values(&value)?;
        self.value = value;
        self.tracker.served(geometry.stamp());
        Ok(self.value[0])
    }

    fn num_values(&self) -> usize { self.derivatives + 1 }

    fn all_last_values(&mut self, geometry: &PairGeometry) -> FailResult<Vec<f64>> {
        self.value(geometry)?;
        Ok(self.value.clone())
    }

    fn set_temperature(&mut self, temperature: f64) -> FailResult<()> {
        self.tracker.set_temperature(temperature)
    }

    fn make_copy(&self) -> Box<dyn ClusterEvaluator> {
        let mut copy = self.clone();
        copy.tracker = self.tracker.fresh_copy();
        copy.bonds.commit();
        copy.engine.commit();
        copy.baseline = None;
        copy.stats = FallbackStats::default();
        Box::new(copy)
    }

    fn trial_notify(&mut self, moved: Subset) -> FailResult<()> {
        self.tracker.trial(moved)?;
        self.bonds.begin();
        self.engine.begin();
        self.baseline = Some(self.value.clone());
        Ok(())
    }

    fn accept_notify(&mut self) -> FailResult<()> {
        self.tracker.accept()?;
        self.bonds.commit();
        self.engine.commit();
        self.baseline = None;
        Ok(())
    }

    fn reject_notify(&mut self) -> FailResult<()> {
        self.tracker.reject()?;
        self.bonds.rollback();
        self.engine.rollback();
        if let Some(baseline) = self.baseline.take() {
            self.value = baseline;
        }
        Ok(())
    }
}
