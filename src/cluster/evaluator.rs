/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{FailResult, PairGeometry, Subset};
use std::fmt;

/// A cluster integrand evaluated on the points of a [`PairGeometry`].
///
/// Evaluators cache their tables between calls. To keep the caches honest, every
/// change to the geometry must be announced:
///
/// * `trial_notify(moved)` before (or right after) the points in `moved` change,
/// * then exactly one of `accept_notify` or `reject_notify`. After a reject the
///   geometry must be back in its pre-trial state, and the evaluator returns to
///   the values it had then, bit for bit.
///
/// A geometry that changes without notification is reported by `value` as a
/// protocol error.
pub trait ClusterEvaluator: fmt::Debug + Send {
    fn point_count(&self) -> usize;

    /// The cluster value (the first component, for multi-valued clusters).
    fn value(&mut self, geometry: &PairGeometry) -> FailResult<f64>;

    fn num_values(&self) -> usize { 1 }

    /// Every component of the value for `geometry`.
    fn all_last_values(&mut self, geometry: &PairGeometry) -> FailResult<Vec<f64>> {
        Ok(vec![self.value(geometry)?])
    }

    /// Sets `beta = 1 / temperature` for this evaluator and its bond functions.
    fn set_temperature(&mut self, temperature: f64) -> FailResult<()>;

    /// An independent evaluator that shares bond functions and weights but not caches.
    fn make_copy(&self) -> Box<dyn ClusterEvaluator>;

    fn trial_notify(&mut self, moved: Subset) -> FailResult<()>;
    fn accept_notify(&mut self) -> FailResult<()>;
    fn reject_notify(&mut self) -> FailResult<()>;
}

impl Clone for Box<dyn ClusterEvaluator> {
    fn clone(&self) -> Self { self.make_copy() }
}

/// Checks that a geometry has the point count an evaluator was built for.
pub(crate) fn check_geometry(n: usize, geometry: &PairGeometry) -> Result<(), crate::ConfigurationError> {
    match geometry.point_count() {
        found if found == n => Ok(()),
        found => Err(crate::ConfigurationError::PointCountMismatch { expected: n, found }),
    }
}

/// Turns non-finite components into an error.
pub(crate) fn check_values(values: &[f64]) -> Result<(), crate::NumericalAnomaly> {
    match values.iter().position(|x| !x.is_finite()) {
        None => Ok(()),
        Some(component) => Err(crate::NumericalAnomaly::ClusterValue { component, value: values[component] }),
    }
}
