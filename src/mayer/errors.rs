/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Error kinds shared by every crate that builds on bond functions.

use crate::Pair;

/// A setup that can never produce a meaningful value.
///
/// These are reported when the offending object is built (or first evaluated, for
/// problems that depend on later input), never silently worked around.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum ConfigurationError {
    #[fail(display = "{} has {} children but {} coefficients", what, children, coefficients)]
    LengthMismatch { what: &'static str, children: usize, coefficients: usize },

    #[fail(display = "{} needs at least one child", what)]
    Empty { what: &'static str },

    #[fail(display = "value requested before the temperature was set")]
    TemperatureUnset,

    #[fail(display = "invalid temperature: {}", _0)]
    InvalidTemperature(f64),

    #[fail(display = "{} points requested, but at most {} are supported", requested, max)]
    TooManyPoints { requested: usize, max: usize },

    #[fail(display = "expected {} points, found {}", expected, found)]
    PointCountMismatch { expected: usize, found: usize },

    #[fail(display = "point {} is out of range for {} points", index, n)]
    PointOutOfRange { index: usize, n: usize },

    #[fail(display = "invalid mixture: {}", _0)]
    InvalidMixture(String),

    #[fail(display = "bond value {} cannot be represented by the {} backend", value, backend)]
    Unrepresentable { value: f64, backend: &'static str },

    #[fail(display = "invalid {}: {}", what, value)]
    InvalidParameter { what: &'static str, value: f64 },

    #[fail(display = "incompatible settings: {}", _0)]
    Incompatible(String),
}

/// A non-finite number produced from finite input.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum NumericalAnomaly {
    #[fail(display = "bond for pair {} is {} (r2 = {}, beta = {})", pair, value, r2, beta)]
    Bond { pair: Pair, r2: f64, beta: f64, value: f64 },

    #[fail(display = "component {} of a cluster value is {}", component, value)]
    ClusterValue { component: usize, value: f64 },

    #[fail(display = "integer overflow in the {} backend", backend)]
    Overflow { backend: &'static str },
}
