/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Mayer bond functions.
//!
//! A bond function maps a pair of points, their squared separation and the
//! inverse temperature to a real number. Bond functions carry no per-call state,
//! so a single instance may be shared by any number of cluster evaluators.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[cfg(test)] #[macro_use] extern crate virial_assert_close;

use std::fmt;
use std::sync::Arc;

pub mod errors;
pub mod potential;
mod general;
mod hard_sphere;
mod composite;

pub use crate::errors::{ConfigurationError, NumericalAnomaly};
pub use crate::potential::{PairPotential, LennardJones, SquareWell, SoftSphere, SphericalFn};
pub use crate::general::{MayerGeneral, MayerEGeneral, MayerSeries, exp_minus_one, TAYLOR_THRESHOLD};
pub use crate::hard_sphere::{MayerHardSphere, MayerEHardSphere};
pub use crate::composite::{MayerSum, MayerProduct, MayerTemperature, TemperatureMode};

pub type FailResult<T> = Result<T, failure::Error>;

/// An unordered pair of point indices, stored with `i < j`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair {
    pub i: usize,
    pub j: usize,
}

impl Pair {
    /// Builds the pair, ordering the indices.
    ///
    /// # Panics
    ///
    /// Panics if `a == b`.
    pub fn new(a: usize, b: usize) -> Pair {
        assert_ne!(a, b, "a point cannot bond to itself");
        match a < b {
            true => Pair { i: a, j: b },
            false => Pair { i: b, j: a },
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// A bond oracle.
///
/// Implementations must be pure functions of `(pair, r2, beta)`. A non-finite result
/// from finite input is reported as a [`NumericalAnomaly`] instead of being returned.
pub trait MayerFunction: fmt::Debug + Send + Sync {
    fn f(&self, pair: Pair, r2: f64, beta: f64) -> Result<f64, NumericalAnomaly>;
}

/// Bond oracles are shared between evaluators (and between copies of an evaluator).
pub type SharedMayer = Arc<dyn MayerFunction>;

impl<M: MayerFunction + ?Sized> MayerFunction for Arc<M> {
    fn f(&self, pair: Pair, r2: f64, beta: f64) -> Result<f64, NumericalAnomaly> {
        (**self).f(pair, r2, beta)
    }
}

impl<'a, M: MayerFunction + ?Sized> MayerFunction for &'a M {
    fn f(&self, pair: Pair, r2: f64, beta: f64) -> Result<f64, NumericalAnomaly> {
        (**self).f(pair, r2, beta)
    }
}

/// Wraps a value in the shared handle used by evaluators.
pub fn shared<M: MayerFunction + 'static>(f: M) -> SharedMayer { Arc::new(f) }

/// Rejects a non-finite bond computed from finite input.
pub(crate) fn check_bond(pair: Pair, r2: f64, beta: f64, value: f64) -> Result<f64, NumericalAnomaly> {
    match value.is_finite() {
        true => Ok(value),
        false => {
            debug!("non-finite bond {} for pair {} (r2 = {}, beta = {})", value, pair, r2, beta);
            Err(NumericalAnomaly::Bond { pair, r2, beta, value })
        },
    }
}

#[cfg(test)]
pub(crate) fn uniform(a: f64, b: f64) -> f64 { ::rand::random::<f64>() * (b - a) + a }
