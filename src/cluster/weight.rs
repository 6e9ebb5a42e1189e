/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Nonnegative clusters built from other clusters, for use as sampling weights.

use crate::{FailResult, ConfigurationError, PairGeometry, Subset};
use crate::evaluator::ClusterEvaluator;

use std::sync::Arc;

/// `|inner|`
#[derive(Debug)]
pub struct ClusterWeightAbs {
    inner: Box<dyn ClusterEvaluator>,
}

impl ClusterWeightAbs {
    pub fn new(inner: Box<dyn ClusterEvaluator>) -> Self {
        ClusterWeightAbs { inner }
    }
}

impl ClusterEvaluator for ClusterWeightAbs {
    fn point_count(&self) -> usize { self.inner.point_count() }

    fn value(&mut self, geometry: &PairGeometry) -> FailResult<f64> {
        Ok(self.inner.value(geometry)?.abs())
    }

    fn set_temperature(&mut self, temperature: f64) -> FailResult<()> {
        self.inner.set_temperature(temperature)
    }

    fn make_copy(&self) -> Box<dyn ClusterEvaluator> {
        Box::new(ClusterWeightAbs { inner: self.inner.make_copy() })
    }

    fn trial_notify(&mut self, moved: Subset) -> FailResult<()> { self.inner.trial_notify(moved) }
    fn accept_notify(&mut self) -> FailResult<()> { self.inner.accept_notify() }
    fn reject_notify(&mut self) -> FailResult<()> { self.inner.reject_notify() }
}

/// `Σ_k w_k |cluster_k|`, which stays positive wherever any of the clusters is nonzero.
#[derive(Debug)]
pub struct ClusterWeightUmbrella {
    clusters: Vec<Box<dyn ClusterEvaluator>>,
    weights: Arc<Vec<f64>>,
}

impl ClusterWeightUmbrella {
    pub fn new(clusters: Vec<Box<dyn ClusterEvaluator>>, weights: Vec<f64>) -> Result<Self, ConfigurationError> {
        if clusters.is_empty() {
            return Err(ConfigurationError::Empty { what: "ClusterWeightUmbrella" });
        }
        if clusters.len() != weights.len() {
            return Err(ConfigurationError::LengthMismatch {
                what: "ClusterWeightUmbrella",
                children: clusters.len(),
                coefficients: weights.len(),
            });
        }
        if let Some(&w) = weights.iter().find(|w| !(**w >= 0.0 && w.is_finite())) {
            return Err(ConfigurationError::InvalidParameter { what: "umbrella weight", value: w });
        }
        let n = clusters[0].point_count();
        if let Some(c) = clusters.iter().find(|c| c.point_count() != n) {
            return Err(ConfigurationError::PointCountMismatch { expected: n, found: c.point_count() });
        }
        Ok(ClusterWeightUmbrella { clusters, weights: Arc::new(weights) })
    }

    /// Equal weights for every cluster.
    pub fn uniform(clusters: Vec<Box<dyn ClusterEvaluator>>) -> Result<Self, ConfigurationError> {
        let weights = vec![1.0; clusters.len()];
        ClusterWeightUmbrella::new(clusters, weights)
    }
}

impl ClusterEvaluator for ClusterWeightUmbrella {
    fn point_count(&self) -> usize { self.clusters[0].point_count() }

    fn value(&mut self, geometry: &PairGeometry) -> FailResult<f64> {
        let mut total = 0.0;
        for (cluster, &w) in self.clusters.iter_mut().zip(self.weights.iter()) {
            total += w * cluster.value(geometry)?.abs();
        }
        Ok(total)
    }

    fn set_temperature(&mut self, temperature: f64) -> FailResult<()> {
        for cluster in &mut self.clusters {
            cluster.set_temperature(temperature)?;
        }
        Ok(())
    }

    fn make_copy(&self) -> Box<dyn ClusterEvaluator> {
        Box::new(ClusterWeightUmbrella {
            clusters: self.clusters.iter().map(|c| c.make_copy()).collect(),
            weights: self.weights.clone(),
        })
    }

    fn trial_notify(&mut self, moved: Subset) -> FailResult<()> {
        for cluster in &mut self.clusters {
            cluster.trial_notify(moved)?;
        }
        Ok(())
    }

    fn accept_notify(&mut self) -> FailResult<()> {
        for cluster in &mut self.clusters {
            cluster.accept_notify()?;
        }
        Ok(())
    }

    fn reject_notify(&mut self) -> FailResult<()> {
        for cluster in &mut self.clusters {
            cluster.reject_notify()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Configuration, ClusterWheatley, ClusterTree, DiagramKind};

    fn overlapping() -> PairGeometry {
        let points = vec![vec![0.0, 0.0, 0.0], vec![0.5, 0.0, 0.0], vec![0.0, 0.5, 0.0]];
        PairGeometry::open(Configuration::from_points(3, &points).unwrap())
    }

    #[test]
    fn absolute_value() {
        let geom = overlapping();
        // connected value is 3f^2 + f^3 = 2, coefficient makes it negative
        let inner = ClusterWheatley::hard_sphere(3, 1.0, DiagramKind::Connected).unwrap().with_coefficient(-1.0);
        let mut weight = ClusterWeightAbs::new(Box::new(inner));
        weight.set_temperature(1.0).unwrap();
        assert_eq!(weight.value(&geom).unwrap(), 2.0);
        assert_eq!(weight.make_copy().value(&geom).unwrap(), 2.0);
    }

    #[test]
    fn umbrella() {
        let geom = overlapping();
        let biconnected = ClusterWheatley::hard_sphere(3, 1.0, DiagramKind::Biconnected).unwrap();
        let tree = ClusterTree::hard_sphere_reference(3, 1.0).unwrap();
        let mut weight = ClusterWeightUmbrella::new(vec![Box::new(biconnected), Box::new(tree)], vec![3.0, 0.5]).unwrap();
        weight.set_temperature(1.0).unwrap();
        // |−1/3 · (−1)| · 3 + 3 trees · 0.5
        assert_close!(weight.value(&geom).unwrap(), 2.5);

        weight.trial_notify(Subset::single(0)).unwrap();
        assert!(weight.trial_notify(Subset::single(0)).is_err());
        weight.reject_notify().unwrap();
    }

    #[test]
    fn umbrella_validation() {
        let a = || -> Box<dyn ClusterEvaluator> { Box::new(ClusterTree::hard_sphere_reference(3, 1.0).unwrap()) };
        let b = || -> Box<dyn ClusterEvaluator> { Box::new(ClusterTree::hard_sphere_reference(4, 1.0).unwrap()) };
        assert!(ClusterWeightUmbrella::new(vec![], vec![]).is_err());
        assert!(ClusterWeightUmbrella::new(vec![a()], vec![1.0, 2.0]).is_err());
        assert!(ClusterWeightUmbrella::new(vec![a()], vec![-1.0]).is_err());
        assert!(ClusterWeightUmbrella::new(vec![a(), b()], vec![1.0, 1.0]).is_err());
        assert!(ClusterWeightUmbrella::uniform(vec![a(), a()]).is_ok());
    }
}
