/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Weighted sums of explicitly listed diagrams.

use crate::{FailResult, ConfigurationError, PairGeometry, Subset, SharedMayer, Pair, MayerFunction};
use crate::cache::CacheTable;
use crate::evaluator::{ClusterEvaluator, check_geometry, check_values};
use crate::protocol::{Tracker, Pending};
use crate::subset::{check_point_count, pair_index, pair_count};

use std::sync::Arc;

/// One diagram: for each bond slot, the pairs that carry a bond of that slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterBonds {
    n: usize,
    bonds: Vec<Vec<Pair>>,
}

impl ClusterBonds {
    pub fn new(n: usize, bonds: Vec<Vec<(usize, usize)>>) -> Result<Self, ConfigurationError> {
        check_point_count(n)?;
        let mut pairs = Vec::with_capacity(bonds.len());
        for slot in bonds {
            let mut list = Vec::with_capacity(slot.len());
            for (a, b) in slot {
                if a == b || a >= n || b >= n {
                    return Err(ConfigurationError::InvalidParameter {
                        what: "bonded pair",
                        value: a.max(b) as f64,
                    });
                }
                list.push(Pair::new(a, b));
            }
            pairs.push(list);
        }
        Ok(ClusterBonds { n, bonds: pairs })
    }

    /// A diagram with every listed pair bonded by slot 0.
    pub fn single(n: usize, bonds: Vec<(usize, usize)>) -> Result<Self, ConfigurationError> {
        ClusterBonds::new(n, vec![bonds])
    }

    pub fn point_count(&self) -> usize { self.n }
    pub fn slot_count(&self) -> usize { self.bonds.len() }
    pub fn bonds(&self, slot: usize) -> &[Pair] { &self.bonds[slot] }
}

#[derive(Debug)]
struct Diagrams {
    diagrams: Vec<ClusterBonds>,
    weights: Vec<f64>,
}

/// `Σ_d w_d · Π_{bonds of d} b(i, j)`.
///
/// With `e_bonds`, a diagram may refer to `2m` slots for `m` oracles: slot `k < m`
/// is the f-bond of oracle `k` and slot `m + k` is its e-bond `f + 1`.
///
/// Only the bonds some diagram uses are ever evaluated. A zero bond ends the
/// product of its diagram.
#[derive(Debug, Clone)]
pub struct ClusterSum {
    n: usize,
    oracles: Vec<SharedMayer>,
    diagrams: Arc<Diagrams>,
    /// (slot, pair) combinations used by some diagram
    used: Vec<(usize, Pair)>,
    /// bond of each slot and pair, `slot * pair_count + pair_index`
    values: CacheTable<f64>,
    tracker: Tracker,
    value: f64,
    baseline: Option<f64>,
}

impl ClusterSum {
    pub fn new(
        diagrams: Vec<ClusterBonds>,
        weights: Vec<f64>,
        oracles: Vec<SharedMayer>,
        e_bonds: bool,
    ) -> Result<Self, ConfigurationError> {
        if diagrams.is_empty() {
            return Err(ConfigurationError::Empty { what: "ClusterSum" });
        }
        if oracles.is_empty() {
            return Err(ConfigurationError::Empty { what: "ClusterSum oracle list" });
        }
        if diagrams.len() != weights.len() {
            return Err(ConfigurationError::LengthMismatch {
                what: "ClusterSum",
                children: diagrams.len(),
                coefficients: weights.len(),
            });
        }

        let n = diagrams[0].point_count();
        let slots = match e_bonds {
            true => 2 * oracles.len(),
            false => oracles.len(),
        };
        let mut is_used = vec![false; slots * pair_count(n)];
        for diagram in &diagrams {
            if diagram.point_count() != n {
                return Err(ConfigurationError::PointCountMismatch { expected: n, found: diagram.point_count() });
            }
            if diagram.slot_count() > slots {
                return Err(ConfigurationError::InvalidParameter {
                    what: "bond slot",
                    value: (diagram.slot_count() - 1) as f64,
                });
            }
            for slot in 0..diagram.slot_count() {
                for pair in diagram.bonds(slot) {
                    is_used[slot * pair_count(n) + pair_index(n, pair.i, pair.j)] = true;
                }
            }
        }

        let used = {
            (0..slots)
                .flat_map(|slot| crate::subset::pairs(n).map(move |(i, j)| (slot, Pair { i, j })))
                .filter(|&(slot, pair)| is_used[slot * pair_count(n) + pair_index(n, pair.i, pair.j)])
                .collect()
        };

        info!("sum of {} diagrams on {} points", diagrams.len(), n);
        Ok(ClusterSum {
            n, oracles, used,
            diagrams: Arc::new(Diagrams { diagrams, weights }),
            values: CacheTable::new(slots * pair_count(n), 0.0),
            tracker: Tracker::new(n),
            value: 0.0,
            baseline: None,
        })
    }

    fn slot_offset(&self, slot: usize, pair: Pair) -> usize {
        slot * pair_count(self.n) + pair_index(self.n, pair.i, pair.j)
    }

    fn update_bonds(&mut self, geometry: &PairGeometry, dirty: Subset, beta: f64) -> FailResult<()> {
        let m = self.oracles.len();
        for k in 0..self.used.len() {
            let (slot, pair) = self.used[k];
            if !(dirty.contains(pair.i) || dirty.contains(pair.j)) {
                continue;
            }
            let f = self.oracles[slot % m].f(pair, geometry.r2(pair.i, pair.j), beta)?;
            let bond = match slot < m {
                true => f,
                false => f + 1.0,
            };
            let offset = self.slot_offset(slot, pair);
            self.values.set(offset, bond);
        }
        Ok(())
    }

    fn diagram_value(&self, diagram: &ClusterBonds) -> f64 {
        let mut product = 1.0;
        for slot in 0..diagram.slot_count() {
            for &pair in diagram.bonds(slot) {
                let bond = *self.values.get(self.slot_offset(slot, pair));
                if bond == 0.0 {
                    return 0.0;
                }
                product *= bond;
            }
        }
        product
    }
}

impl ClusterEvaluator for ClusterSum {
    fn point_count(&self) -> usize { self.n }

    fn value(&mut self, geometry: &PairGeometry) -> FailResult<f64> {
        check_geometry(self.n, geometry)?;
        let beta = self.tracker.beta()?;
        let dirty = match self.tracker.pending(geometry.stamp())? {
            Pending::Cached => return Ok(self.value),
            Pending::Recompute(dirty) => dirty,
        };

        self.update_bonds(geometry, dirty, beta)?;
        let diagrams = self.diagrams.clone();
        let value: f64 = {
            diagrams.diagrams.iter().zip(&diagrams.weights)
                .filter(|&(_, &w)| w != 0.0)
                .map(|(d, &w)| w * self.diagram_value(d))
                .sum()
        };

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
        copy.values.commit();
        copy.baseline = None;
        Box::new(copy)
    }

    fn trial_notify(&mut self, moved: Subset) -> FailResult<()> {
        self.tracker.trial(moved)?;
        self.values.begin();
        self.baseline = Some(self.value);
        Ok(())
    }

    fn accept_notify(&mut self) -> FailResult<()> {
        self.tracker.accept()?;
        self.values.commit();
        self.baseline = None;
        Ok(())
    }

    fn reject_notify(&mut self) -> FailResult<()> {
        self.tracker.reject()?;
        self.values.rollback();
        if let Some(value) = self.baseline.take() {
            self.value = value;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{shared, Configuration, NumericalAnomaly};
    use virial_mayer::{MayerGeneral, MayerHardSphere, LennardJones};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn geometry(points: &[[f64; 3]]) -> PairGeometry {
        let points: Vec<Vec<f64>> = points.iter().map(|p| p.to_vec()).collect();
        PairGeometry::open(Configuration::from_points(3, &points).unwrap())
    }

    fn triangle() -> PairGeometry {
        geometry(&[[0.0, 0.0, 0.0], [1.1, 0.0, 0.0], [0.3, 1.2, 0.0]])
    }

    #[test]
    fn overlapping_e_bond_zeroes_the_diagram() {
        // pair (0, 1) overlaps; everything else is far apart
        let geom = geometry(&[[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [5.0, 5.0, 0.0]]);
        let f = shared(MayerHardSphere::new(1.0));
        let e_product = ClusterBonds::new(3, vec![vec![], vec![(0, 1), (0, 2), (1, 2)]]).unwrap();
        let mut sum = ClusterSum::new(vec![e_product], vec![1.0], vec![f], true).unwrap();
        sum.set_temperature(1.0).unwrap();
        assert_eq!(sum.value(&geom).unwrap(), 0.0);
    }

    #[test]
    fn ring_and_chains() {
        // 3 chains and the ring on three points
        let geom = triangle();
        let lj = shared(MayerGeneral::new(LennardJones::default()));
        let diagrams = vec![
            ClusterBonds::single(3, vec![(0, 1), (1, 2)]).unwrap(),
            ClusterBonds::single(3, vec![(0, 1), (0, 2)]).unwrap(),
            ClusterBonds::single(3, vec![(0, 2), (1, 2)]).unwrap(),
            ClusterBonds::single(3, vec![(0, 1), (0, 2), (1, 2)]).unwrap(),
        ];
        let mut sum = ClusterSum::new(diagrams, vec![1.0; 4], vec![lj.clone()], false).unwrap();
        sum.set_temperature(1.0).unwrap();

        let f = |i, j| lj.f(Pair::new(i, j), geom.r2(i, j), 1.0).unwrap();
        let (a, b, c) = (f(0, 1), f(0, 2), f(1, 2));
        assert_close!(sum.value(&geom).unwrap(), a * b + a * c + b * c + a * b * c);
    }

    #[test]
    fn only_used_bonds_are_computed() {
        #[derive(Debug, Default)]
        struct Counting(AtomicUsize);
        impl MayerFunction for Counting {
            fn f(&self, _: Pair, _: f64, _: f64) -> Result<f64, NumericalAnomaly> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(0.5)
            }
        }

        let counter = Arc::new(Counting::default());
        let diagram = ClusterBonds::single(4, vec![(0, 1), (2, 3)]).unwrap();
        let mut sum = ClusterSum::new(vec![diagram], vec![2.0], vec![counter.clone() as SharedMayer], false).unwrap();
        sum.set_temperature(1.0).unwrap();

        let mut geom = PairGeometry::open(Configuration::new(4, 3).unwrap());
        assert_eq!(sum.value(&geom).unwrap(), 0.5);
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);

        sum.trial_notify(Subset::single(3)).unwrap();
        geom.update(Subset::single(3), |c| c.point_mut(3)[0] = 1.0).unwrap();
        sum.value(&geom).unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 3);
        sum.reject_notify().unwrap();
    }

    #[test]
    fn validation() {
        let f = shared(MayerHardSphere::new(1.0));
        let d3 = ClusterBonds::single(3, vec![(0, 1)]).unwrap();
        let d4 = ClusterBonds::single(4, vec![(0, 1)]).unwrap();
        assert!(ClusterBonds::single(3, vec![(1, 1)]).is_err());
        assert!(ClusterBonds::single(3, vec![(0, 3)]).is_err());

        assert_eq!(
            ClusterSum::new(vec![d3.clone()], vec![], vec![f.clone()], false).unwrap_err(),
            ConfigurationError::LengthMismatch { what: "ClusterSum", children: 1, coefficients: 0 },
        );
        assert!(ClusterSum::new(vec![], vec![], vec![f.clone()], false).is_err());
        assert!(ClusterSum::new(vec![d3.clone(), d4], vec![1.0, 1.0], vec![f.clone()], false).is_err());

        // slot 1 only exists with e-bonds
        let e_only = ClusterBonds::new(3, vec![vec![], vec![(0, 1)]]).unwrap();
        assert!(ClusterSum::new(vec![e_only.clone()], vec![1.0], vec![f.clone()], false).is_err());
        assert!(ClusterSum::new(vec![e_only], vec![1.0], vec![f], true).is_ok());
    }

    #[test]
    fn copies_share_diagrams() {
        let geom = triangle();
        let f = shared(MayerHardSphere::new(1.5));
        let ring = ClusterBonds::single(3, vec![(0, 1), (0, 2), (1, 2)]).unwrap();
        let mut sum = ClusterSum::new(vec![ring], vec![-1.0 / 3.0], vec![f], false).unwrap();
        sum.set_temperature(1.0).unwrap();
        let mut copy = sum.make_copy();
        assert_eq!(sum.value(&geom).unwrap(), 1.0 / 3.0);
        assert_eq!(copy.value(&geom).unwrap(), 1.0 / 3.0);
    }
}
