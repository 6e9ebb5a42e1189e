/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Spherically symmetric pair potentials.
//!
//! Energies are in units where `beta * energy` is dimensionless. A potential may
//! return `+inf` for an overlap; bond functions map that to the `beta -> inf` limit.

use crate::Pair;
use std::f64::INFINITY;
use std::fmt;

pub trait PairPotential: fmt::Debug + Send + Sync {
    /// Energy of `pair` at squared separation `r2`.
    fn energy(&self, pair: Pair, r2: f64) -> f64;
}

impl<'a, P: PairPotential + ?Sized> PairPotential for &'a P {
    fn energy(&self, pair: Pair, r2: f64) -> f64 { (**self).energy(pair, r2) }
}

impl<P: PairPotential + ?Sized> PairPotential for Box<P> {
    fn energy(&self, pair: Pair, r2: f64) -> f64 { (**self).energy(pair, r2) }
}

/// `4 eps ((sigma/r)^12 - (sigma/r)^6)`
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LennardJones {
    pub sigma: f64,
    pub epsilon: f64,
}

impl Default for LennardJones {
    fn default() -> Self { LennardJones { sigma: 1.0, epsilon: 1.0 } }
}

impl PairPotential for LennardJones {
    fn energy(&self, _: Pair, r2: f64) -> f64 {
        // factored so that r2 = 0 gives +inf, not inf - inf
        let s6 = (self.sigma * self.sigma / r2).powi(3);
        4.0 * self.epsilon * s6 * (s6 - 1.0)
    }
}

/// Hard core of diameter `sigma` surrounded by a well of depth `epsilon`
/// that extends to `lambda * sigma`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SquareWell {
    pub sigma: f64,
    pub lambda: f64,
    pub epsilon: f64,
}

impl PairPotential for SquareWell {
    fn energy(&self, _: Pair, r2: f64) -> f64 {
        let core2 = self.sigma * self.sigma;
        let well2 = core2 * self.lambda * self.lambda;
        if r2 < core2 {
            INFINITY
        } else if r2 < well2 {
            -self.epsilon
        } else {
            0.0
        }
    }
}

/// `eps (sigma/r)^n`, purely repulsive.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SoftSphere {
    pub sigma: f64,
    pub epsilon: f64,
    pub exponent: i32,
}

impl PairPotential for SoftSphere {
    fn energy(&self, _: Pair, r2: f64) -> f64 {
        // exponent is applied to r2, so halve it (odd exponents go through sqrt)
        let s2 = self.sigma * self.sigma / r2;
        match self.exponent % 2 {
            0 => self.epsilon * s2.powi(self.exponent / 2),
            _ => self.epsilon * s2.sqrt().powi(self.exponent),
        }
    }
}

/// Adapts a closure of `r2` into a potential.
pub struct SphericalFn<F>(pub F);

impl<F> fmt::Debug for SphericalFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "SphericalFn(..)") }
}

impl<F> PairPotential for SphericalFn<F>
where F: Fn(f64) -> f64 + Send + Sync,
{
    fn energy(&self, _: Pair, r2: f64) -> f64 { (self.0)(r2) }
}
