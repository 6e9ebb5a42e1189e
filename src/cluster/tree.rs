/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Sum over all trees (singly connected diagrams).

use crate::{FailResult, ConfigurationError, PairGeometry, PairOracles, Subset, SharedMayer};
use crate::cache::CacheTable;
use crate::evaluator::{ClusterEvaluator, check_geometry, check_values};
use crate::protocol::{Tracker, Pending};
use crate::subset::{pairs, pair_index, pair_count};

/// Sum of the products of f-bonds over every spanning tree of the points.
///
/// For `S` with lowest member `i` and `m` the lowest member of `S \ {i}`,
///
/// ```text
/// T(S) = sum over J ⊆ S \ {i} with m ∈ J of  T(J) · (Σ_{k ∈ J} f(i, k)) · T(S \ J)
/// ```
///
/// where `J` is the branch hanging off `i` that contains `m`.
///
/// With positive hard-sphere bonds this counts overlap trees, which makes it a
/// good sampling bias for hard-core systems.
#[derive(Debug, Clone)]
pub struct ClusterTree {
    oracles: PairOracles,
    coefficient: f64,
    tracker: Tracker,
    bonds: CacheTable<f64>,
    trees: CacheTable<f64>,
    value: f64,
    baseline: Option<f64>,
}

impl ClusterTree {
    pub fn new(oracles: PairOracles) -> Self {
        let n = oracles.point_count();
        info!("tree cluster on {} points", n);
        ClusterTree {
            coefficient: 1.0,
            tracker: Tracker::new(n),
            bonds: CacheTable::new(pair_count(n), 0.0),
            trees: CacheTable::new(1 << n, 1.0),
            value: 0.0,
            baseline: None,
            oracles,
        }
    }

    pub fn uniform(n: usize, f: SharedMayer) -> Result<Self, ConfigurationError> {
        Ok(ClusterTree::new(PairOracles::uniform(n, f)?))
    }

    /// Overlap trees of hard spheres of diameter `sigma` (bond `+1` inside the core).
    pub fn hard_sphere_reference(n: usize, sigma: f64) -> Result<Self, ConfigurationError> {
        if !(sigma > 0.0) {
            return Err(ConfigurationError::InvalidParameter { what: "reference sigma", value: sigma });
        }
        ClusterTree::uniform(n, crate::shared(virial_mayer::MayerHardSphere::positive(sigma)))
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    fn bond(&self, i: usize, k: usize) -> f64 {
        *self.bonds.get(pair_index(self.oracles.point_count(), i, k))
    }

    fn recompute(&mut self, dirty: Subset) {
        let n = self.oracles.point_count();
        let mut count = 0;
        // proper subsets have smaller indices, so index order is bottom-up
        for index in 3..(1usize << n) {
            let s = Subset(index as u32);
            if s.len() < 2 || !s.intersects(dirty) {
                continue;
            }
            let (i, rest) = match s.lowest() {
                Some(i) => (i, s.without(i)),
                None => continue,
            };
            let m = match rest.lowest() {
                Some(m) => m,
                None => continue,
            };

            let mut total = 0.0;
            for sub in rest.without(m).submasks() {
                let branch = sub.with(m);
                let link: f64 = branch.iter().map(|k| self.bond(i, k)).sum();
                if link == 0.0 {
                    continue;
                }
                total += self.trees.get(branch.index()) * link * self.trees.get((s - branch).index());
            }
            self.trees.set(index, total);
            count += 1;
        }
        trace!("recomputed {} tree sums", count);
    }
}

impl ClusterEvaluator for ClusterTree {
    fn point_count(&self) -> usize { self.oracles.point_count() }

    fn value(&mut self, geometry: &PairGeometry) -> FailResult<f64> {
        let n = self.point_count();
        check_geometry(n, geometry)?;
        let beta = self.tracker.beta()?;
        let dirty = match self.tracker.pending(geometry.stamp())? {
            Pending::Cached => return Ok(self.value),
            Pending::Recompute(dirty) => dirty,
        };

        for (i, j) in pairs(n) {
            if dirty.contains(i) || dirty.contains(j) {
                let f = self.oracles.bond(i, j, geometry.r2(i, j), beta)?;
                self.bonds.set(pair_index(n, i, j), f);
            }
        }
        self.recompute(dirty);

        let value = self.coefficient * self.trees.get(Subset::full(n).index());
        check_values(&[value])?;
        self.value = value;
        self.tracker.served(geometry.stamp());
        Ok(value)
    }

    fn set_temperature(&mut self, temperature: f64) -> FailResult<()> {
        self.tracker.set_temperature(temperature)
    }

    fn make_copy(&self) -> Box<dyn ClusterEvaluator> {
        let mut copy = self.clone();
        copy.tracker = self.tracker.fresh_copy();
        copy.bonds.commit();
        copy.trees.commit();
        copy.baseline = None;
        Box::new(copy)
    }

    fn trial_notify(&mut self, moved: Subset) -> FailResult<()> {
        self.tracker.trial(moved)?;
        self.bonds.begin();
        self.trees.begin();
        self.baseline = Some(self.value);
        Ok(())
    }

    fn accept_notify(&mut self) -> FailResult<()> {
        self.tracker.accept()?;
        self.bonds.commit();
        self.trees.commit();
        self.baseline = None;
        Ok(())
    }

    fn reject_notify(&mut self) -> FailResult<()> {
        self.tracker.reject()?;
        self.bonds.rollback();
        self.trees.rollback();
        if let Some(value) = self.baseline.take() {
            self.value = value;
        }
        Ok(())
    }
}
