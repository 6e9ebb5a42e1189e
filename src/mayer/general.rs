/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{MayerFunction, Pair, PairPotential, NumericalAnomaly, ConfigurationError};
use crate::check_bond;

/// Below this magnitude of `-beta u`, `exp(x) - 1` is evaluated by its Taylor series.
pub const TAYLOR_THRESHOLD: f64 = 0.01;

/// `exp(x) - 1` without cancellation for small `x`.
///
/// Uses five terms of the series when `|x| < TAYLOR_THRESHOLD`; the truncation
/// error there is below `x^6 / 720`, which is under machine epsilon relative to `x`.
#[inline]
pub fn exp_minus_one(x: f64) -> f64 {
    if x.abs() < TAYLOR_THRESHOLD {
        x * (1.0 + x / 2.0 * (1.0 + x / 3.0 * (1.0 + x / 4.0 * (1.0 + x / 5.0))))
    } else {
        x.exp() - 1.0
    }
}

/// `f(r) = exp(-beta u(r)) - 1`
#[derive(Debug, Clone)]
pub struct MayerGeneral<P> {
    potential: P,
}

impl<P: PairPotential> MayerGeneral<P> {
    pub fn new(potential: P) -> Self { MayerGeneral { potential } }

    pub fn potential(&self) -> &P { &self.potential }
}

impl<P: PairPotential> MayerFunction for MayerGeneral<P> {
    fn f(&self, pair: Pair, r2: f64, beta: f64) -> Result<f64, NumericalAnomaly> {
        let x = -beta * self.potential.energy(pair, r2);
        // an infinite energy at beta = 0 gives NaN here; it is not a meaningful limit
        check_bond(pair, r2, beta, exp_minus_one(x))
    }
}

/// `e(r) = exp(-beta u(r)) = f(r) + 1`
#[derive(Debug, Clone)]
pub struct MayerEGeneral<P> {
    potential: P,
}

impl<P: PairPotential> MayerEGeneral<P> {
    pub fn new(potential: P) -> Self { MayerEGeneral { potential } }
}

impl<P: PairPotential> MayerFunction for MayerEGeneral<P> {
    fn f(&self, pair: Pair, r2: f64, beta: f64) -> Result<f64, NumericalAnomaly> {
        let x = -beta * self.potential.energy(pair, r2);
        check_bond(pair, r2, beta, x.exp())
    }
}

/// The Mayer function expanded in powers of `beta`, truncated after `order` terms.
///
/// `f_k(r) = sum_{m=1}^{k} (-beta u)^m / m!`. Used for high temperature expansions,
/// where each power of `beta` is integrated separately.
#[derive(Debug, Clone)]
pub struct MayerSeries<P> {
    potential: P,
    order: u32,
}

impl<P: PairPotential> MayerSeries<P> {
    pub fn new(potential: P, order: u32) -> Result<Self, ConfigurationError> {
        if order == 0 {
            return Err(ConfigurationError::InvalidParameter { what: "series order", value: 0.0 });
        }
        Ok(MayerSeries { potential, order })
    }
}

impl<P: PairPotential> MayerFunction for MayerSeries<P> {
    fn f(&self, pair: Pair, r2: f64, beta: f64) -> Result<f64, NumericalAnomaly> {
        let x = -beta * self.potential.energy(pair, r2);
        let mut term = 1.0;
        let mut sum = 0.0;
        for m in 1..=self.order {
            term *= x / f64::from(m);
            sum += term;
        }
        check_bond(pair, r2, beta, sum)
    }
}
