/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Which bond function applies to each pair of points.

use crate::{ConfigurationError, NumericalAnomaly, SharedMayer, Pair, MayerFunction};
use crate::subset::{check_point_count, pair_index, pair_count, pairs};

/// A precomputed map from pairs to bond functions.
///
/// For a mixture, points `0..counts[0]` belong to species 0, the next `counts[1]`
/// points to species 1, and so on; a pair uses the oracle for its two species.
#[derive(Debug, Clone)]
pub struct PairOracles {
    n: usize,
    oracles: Vec<SharedMayer>,
    by_pair: Vec<usize>,
}

impl PairOracles {
    /// Every pair uses `f`.
    pub fn uniform(n: usize, f: SharedMayer) -> Result<Self, ConfigurationError> {
        check_point_count(n)?;
        Ok(PairOracles { n, oracles: vec![f], by_pair: vec![0; pair_count(n)] })
    }

    /// `matrix[a][b]` is the bond between species `a` and `b`; only the entries
    /// with `a <= b` are used.
    pub fn mixture(counts: &[usize], matrix: Vec<Vec<SharedMayer>>) -> Result<Self, ConfigurationError> {
        let nspecies = counts.len();
        if nspecies == 0 {
            return Err(ConfigurationError::InvalidMixture("no species".into()));
        }
        if matrix.len() != nspecies || matrix.iter().any(|row| row.len() != nspecies) {
            return Err(ConfigurationError::InvalidMixture(format!(
                "{} species need a {0}x{0} matrix of bond functions", nspecies,
            )));
        }

        let n: usize = counts.iter().sum();
        check_point_count(n)?;

        let species: Vec<usize> = {
            counts.iter().enumerate()
                .flat_map(|(s, &count)| ::std::iter::repeat(s).take(count))
                .collect()
        };

        let mut oracles = vec![];
        let mut slot = vec![vec![None; nspecies]; nspecies];
        let mut by_pair = vec![0; pair_count(n)];
        for (i, j) in pairs(n) {
            let (a, b) = (species[i], species[j]);
            let id = match slot[a][b] {
                Some(id) => id,
                None => {
                    oracles.push(matrix[a][b].clone());
                    slot[a][b] = Some(oracles.len() - 1);
                    oracles.len() - 1
                },
            };
            by_pair[pair_index(n, i, j)] = id;
        }
        if oracles.is_empty() {
            // a single point; keep something to hand out
            oracles.push(matrix[0][0].clone());
        }
        Ok(PairOracles { n, oracles, by_pair })
    }

    pub fn point_count(&self) -> usize { self.n }

    pub fn oracle(&self, i: usize, j: usize) -> &SharedMayer {
        &self.oracles[self.by_pair[pair_index(self.n, i, j)]]
    }

    /// Bond for `i < j` at squared distance `r2`.
    #[inline]
    pub fn bond(&self, i: usize, j: usize, r2: f64, beta: f64) -> Result<f64, NumericalAnomaly> {
        self.oracle(i, j).f(Pair { i, j }, r2, beta)
    }
}
