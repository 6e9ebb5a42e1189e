/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{MayerFunction, Pair, NumericalAnomaly};

/// Hard-sphere Mayer function: `-1` for `r < sigma`, `0` beyond.
///
/// Temperature independent. The [`positive`](MayerHardSphere::positive) variant
/// returns `+1` inside the core, which is what reference-system samplers use to
/// keep the reference integrand nonnegative.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MayerHardSphere {
    sigma2: f64,
    inside: f64,
}

impl MayerHardSphere {
    pub fn new(sigma: f64) -> Self {
        MayerHardSphere { sigma2: sigma * sigma, inside: -1.0 }
    }

    pub fn positive(sigma: f64) -> Self {
        MayerHardSphere { sigma2: sigma * sigma, inside: 1.0 }
    }

    pub fn sigma(&self) -> f64 { self.sigma2.sqrt() }
}

impl MayerFunction for MayerHardSphere {
    fn f(&self, _: Pair, r2: f64, _: f64) -> Result<f64, NumericalAnomaly> {
        Ok(if r2 < self.sigma2 { self.inside } else { 0.0 })
    }
}

/// Hard-sphere e-bond: `0` for `r < sigma`, `1` beyond.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MayerEHardSphere {
    sigma2: f64,
}

impl MayerEHardSphere {
    pub fn new(sigma: f64) -> Self { MayerEHardSphere { sigma2: sigma * sigma } }
}

impl MayerFunction for MayerEHardSphere {
    fn f(&self, _: Pair, r2: f64, _: f64) -> Result<f64, NumericalAnomaly> {
        Ok(if r2 < self.sigma2 { 0.0 } else { 1.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_boundary() {
        let p = Pair::new(0, 1);
        let f = MayerHardSphere::new(1.0);
        let fpos = MayerHardSphere::positive(1.0);
        let e = MayerEHardSphere::new(1.0);

        // contact counts as outside
        assert_eq!(f.f(p, 1.0, 1.0).unwrap(), 0.0);
        assert_eq!(f.f(p, 0.999, 1.0).unwrap(), -1.0);
        assert_eq!(fpos.f(p, 0.999, 1.0).unwrap(), 1.0);
        assert_eq!(e.f(p, 0.999, 7.0).unwrap(), 0.0);
        assert_eq!(e.f(p, 1.0, 7.0).unwrap(), 1.0);

        // no temperature dependence
        assert_eq!(f.f(p, 0.5, 0.0).unwrap(), f.f(p, 0.5, 100.0).unwrap());
        assert_eq!(f.sigma(), 1.0);
    }
}
