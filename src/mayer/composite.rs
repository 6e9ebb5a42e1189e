/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Bond functions built out of other bond functions.

use crate::{MayerFunction, SharedMayer, Pair, NumericalAnomaly, ConfigurationError};
use crate::check_bond;

fn validate(what: &'static str, children: &[SharedMayer], coefficients: &[f64]) -> Result<(), ConfigurationError> {
    if children.is_empty() {
        return Err(ConfigurationError::Empty { what });
    }
    if children.len() != coefficients.len() {
        return Err(ConfigurationError::LengthMismatch {
            what,
            children: children.len(),
            coefficients: coefficients.len(),
        });
    }
    Ok(())
}

/// `sum_k c_k f_k`
#[derive(Debug, Clone)]
pub struct MayerSum {
    children: Vec<SharedMayer>,
    coefficients: Vec<f64>,
}

impl MayerSum {
    pub fn new(children: Vec<SharedMayer>, coefficients: Vec<f64>) -> Result<Self, ConfigurationError> {
        validate("MayerSum", &children, &coefficients)?;
        Ok(MayerSum { children, coefficients })
    }
}

impl MayerFunction for MayerSum {
    fn f(&self, pair: Pair, r2: f64, beta: f64) -> Result<f64, NumericalAnomaly> {
        let mut sum = 0.0;
        for (child, &c) in self.children.iter().zip(&self.coefficients) {
            sum += c * child.f(pair, r2, beta)?;
        }
        check_bond(pair, r2, beta, sum)
    }
}

/// `prod_k c_k f_k`
#[derive(Debug, Clone)]
pub struct MayerProduct {
    children: Vec<SharedMayer>,
    coefficients: Vec<f64>,
}

impl MayerProduct {
    pub fn new(children: Vec<SharedMayer>, coefficients: Vec<f64>) -> Result<Self, ConfigurationError> {
        validate("MayerProduct", &children, &coefficients)?;
        Ok(MayerProduct { children, coefficients })
    }
}

impl MayerFunction for MayerProduct {
    fn f(&self, pair: Pair, r2: f64, beta: f64) -> Result<f64, NumericalAnomaly> {
        let mut prod = 1.0;
        for (child, &c) in self.children.iter().zip(&self.coefficients) {
            prod *= c * child.f(pair, r2, beta)?;
            if prod == 0.0 {
                return Ok(0.0);
            }
        }
        check_bond(pair, r2, beta, prod)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TemperatureMode {
    /// Ignore the caller's `beta` and always use this one.
    Fixed { beta: f64 },
    /// Multiply the caller's `beta` by this factor.
    Scaled { factor: f64 },
}

/// Evaluates another bond function at a different temperature.
#[derive(Debug, Clone)]
pub struct MayerTemperature {
    inner: SharedMayer,
    mode: TemperatureMode,
}

impl MayerTemperature {
    pub fn new(inner: SharedMayer, mode: TemperatureMode) -> Result<Self, ConfigurationError> {
        match mode {
            TemperatureMode::Fixed { beta } if !(beta.is_finite() && beta > 0.0) => {
                Err(ConfigurationError::InvalidTemperature(beta))
            },
            TemperatureMode::Scaled { factor } if !factor.is_finite() => {
                Err(ConfigurationError::InvalidParameter { what: "temperature scale factor", value: factor })
            },
            _ => Ok(MayerTemperature { inner, mode }),
        }
    }
}

impl MayerFunction for MayerTemperature {
    fn f(&self, pair: Pair, r2: f64, beta: f64) -> Result<f64, NumericalAnomaly> {
        let beta = match self.mode {
            TemperatureMode::Fixed { beta } => beta,
            TemperatureMode::Scaled { factor } => factor * beta,
        };
        self.inner.f(pair, r2, beta)
    }
}
