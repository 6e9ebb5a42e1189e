/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Wheatley's recursion for the sums of all connected and all biconnected
//! diagrams on `n` points.
//!
//! Three families of tables are indexed by subsets `S` of the points:
//!
//! * `Q(S)`, the product of e-bonds over every pair in `S`.
//! * `C(S)`, the sum over connected diagrams on `S` (f-bonds), obtained from `Q` by
//!   removing every way of splitting `S` into the component of its lowest point and
//!   the rest: `C(S) = Q(S) - sum_{low(S) in J, J < S} C(J) Q(S \ J)`.
//! * `B_v(S)`, the connected diagrams on `S` with no articulation point among the
//!   points `0..=v`. Stage `v` removes the diagrams whose articulation point is `v`.
//!   `B_{n-1}` is the biconnected sum.
//!
//! Every entry may carry temperature derivatives (a fixed number of components per
//! subset); products then expand by the Leibniz rule.
//!
//! Entries of `S` depend only on bonds inside `S` and entries of proper subsets of
//! `S`, so after some points move only the subsets touching them are recomputed.

use crate::{ConfigurationError, NumericalAnomaly, Subset};
use crate::cache::CacheTable;
use crate::numeric::ClusterScalar;
use crate::subset::{check_point_count, pair_index, pair_count};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DiagramKind {
    /// Sum of all connected diagrams.
    Connected,
    /// Sum of all biconnected diagrams.
    Biconnected,
}

impl DiagramKind {
    /// Factor turning the diagram sum on `n` points into its contribution to the
    /// virial coefficient: `1` for connected sums, `(1 - n)/n!` for biconnected ones.
    pub fn default_coefficient(self, n: usize) -> f64 {
        match self {
            DiagramKind::Connected => 1.0,
            DiagramKind::Biconnected => {
                let factorial: f64 = (1..=n).map(|k| k as f64).product();
                (1.0 - n as f64) / factorial
            },
        }
    }
}

/// The subset tables for one numeric backend.
#[derive(Debug, Clone)]
pub struct WheatleyTables<T: ClusterScalar> {
    n: usize,
    width: usize,
    kind: DiagramKind,
    ctx: T::Context,
    binomial: Vec<(i64, T)>,
    /// e-bond of each pair
    e: CacheTable<T>,
    /// `ln(e) / beta` of each pair; only used for derivatives
    g: CacheTable<T>,
    q: CacheTable<T>,
    /// sum of `g` over the pairs of each subset
    gq: CacheTable<T>,
    c: CacheTable<T>,
    /// one block of `2^(n-1)` subsets per stage, holding the subsets that contain it
    stages: CacheTable<T>,
}

impl<T: ClusterScalar> WheatleyTables<T> {
    /// Tables for `n` points with `derivatives` temperature derivatives per entry.
    pub fn new(n: usize, derivatives: usize, kind: DiagramKind, ctx: T::Context) -> Result<Self, ConfigurationError> {
        check_point_count(n)?;
        let width = derivatives + 1;
        let nf = 1usize << n;
        let zero = T::zero(&ctx);
        let one = T::one(&ctx);

        let mut binomial = Vec::with_capacity(width * width);
        for m in 0..width {
            for l in 0..width {
                let k = match l <= m {
                    true => binomial_coefficient(m, l),
                    false => 0,
                };
                binomial.push((k, T::from_int(k, &ctx)));
            }
        }

        let derivative_len = |len: usize| match width { 1 => 0, _ => len };
        let stage_len = match kind {
            DiagramKind::Connected => 0,
            DiagramKind::Biconnected => n * (nf / 2) * width,
        };

        let mut q = CacheTable::new(nf * width, zero.clone());
        let mut c = CacheTable::new(nf * width, zero.clone());
        // nothing to bond in the empty set and in singletons
        q.set(0, one.clone());
        for i in 0..n {
            q.set((1 << i) * width, one.clone());
            c.set((1 << i) * width, one.clone());
        }

        Ok(WheatleyTables {
            n, width, kind, binomial,
            e: CacheTable::new(pair_count(n), one.clone()),
            g: CacheTable::new(derivative_len(pair_count(n)), zero.clone()),
            q,
            gq: CacheTable::new(derivative_len(nf), zero.clone()),
            c,
            stages: CacheTable::new(stage_len, zero.clone()),
            ctx,
        })
    }

    pub fn point_count(&self) -> usize { self.n }
    pub fn width(&self) -> usize { self.width }
    pub fn kind(&self) -> DiagramKind { self.kind }
    pub fn context(&self) -> &T::Context { &self.ctx }

    /// Stores the bond of pair `k` (packed index) from its f-bond value.
    pub fn set_bond(&mut self, k: usize, f: f64, beta: f64) -> Result<(), ConfigurationError> {
        let e = f + 1.0;
        self.e.set(k, T::from_f64(e, &self.ctx)?);
        if self.width > 1 {
            // d e / d beta = e ln(e) / beta, for e = exp(-beta u)
            let g = match e {
                e if e > 0.0 => e.ln() / beta,
                e if e == 0.0 => 0.0,
                e => return Err(ConfigurationError::InvalidParameter {
                    what: "e-bond used with temperature derivatives",
                    value: e,
                }),
            };
            self.g.set(k, T::from_f64(g, &self.ctx)?);
        }
        Ok(())
    }

    /// Brings every subset that contains a point of `dirty` up to date with the bonds.
    pub fn recompute(&mut self, dirty: Subset) -> Result<(), NumericalAnomaly> {
        self.compute_products(dirty)?;
        self.compute_connected(dirty)?;
        if self.kind == DiagramKind::Biconnected {
            self.compute_biconnected(dirty)?;
        }
        Ok(())
    }

    /// Component `m` of the diagram sum over all points.
    pub fn result(&self, m: usize) -> &T {
        let full = Subset::full(self.n);
        match self.kind {
            DiagramKind::Connected => self.c.get(full.index() * self.width + m),
            DiagramKind::Biconnected => self.biconnected(full, m),
        }
    }

    pub fn product(&self, s: Subset, m: usize) -> &T { self.q.get(s.index() * self.width + m) }
    pub fn connected(&self, s: Subset, m: usize) -> &T { self.c.get(s.index() * self.width + m) }

    /// `B_{n-1}(s)`, the biconnected sum on `s`. Only available on biconnected tables.
    pub(crate) fn biconnected(&self, s: Subset, m: usize) -> &T {
        assert_eq!(self.kind, DiagramKind::Biconnected, "no biconnected stages were kept");
        let v = self.n - 1;
        stage_value(&self.c, &self.stages, self.n, self.width, Some(v), s, m)
    }

    pub fn begin(&mut self) {
        self.for_each_table(CacheTable::begin);
    }

    pub fn commit(&mut self) {
        self.for_each_table(CacheTable::commit);
    }

    pub fn rollback(&mut self) {
        self.for_each_table(CacheTable::rollback);
    }

    fn for_each_table(&mut self, mut func: impl FnMut(&mut CacheTable<T>)) {
        func(&mut self.e);
        func(&mut self.g);
        func(&mut self.q);
        func(&mut self.gq);
        func(&mut self.c);
        func(&mut self.stages);
    }

    fn compute_products(&mut self, dirty: Subset) -> Result<(), NumericalAnomaly> {
        let WheatleyTables { n, width, ref ctx, ref e, ref g, ref mut q, ref mut gq, .. } = *self;
        let nf = 1u32 << n;

        for bits in 3..nf {
            let s = Subset(bits);
            if s.len() < 2 || !s.intersects(dirty) {
                continue;
            }
            let j = bits.trailing_zeros() as usize;
            let rest = s.without(j);
            let base = s.index() * width;

            if rest.len() == 1 {
                let k = pair_index(n, j, rest.0.trailing_zeros() as usize);
                q.set(base, e.get(k).clone());
                if width > 1 {
                    gq.set(s.index(), g.get(k).clone());
                }
            } else {
                // bonds of `rest` times the bonds from j to each member of rest
                let mut prod = q.get(rest.index() * width).clone();
                let mut gsum = match width {
                    1 => None,
                    _ => Some(gq.get(rest.index()).clone()),
                };
                for l in rest {
                    if prod.is_zero() {
                        break;
                    }
                    let k = pair_index(n, j, l);
                    prod = prod.mul(e.get(k), ctx)?;
                    if let Some(sum) = gsum.as_mut() {
                        *sum = sum.add(g.get(k), ctx)?;
                    }
                }
                q.set(base, prod);
                if let Some(sum) = gsum {
                    gq.set(s.index(), sum);
                }
            }

            if width > 1 {
                if q.get(base).is_zero() {
                    for m in 1..width {
                        q.set(base + m, T::zero(ctx));
                    }
                } else {
                    let factor = gq.get(s.index()).clone();
                    for m in 1..width {
                        let next = q.get(base + m - 1).mul(&factor, ctx)?;
                        q.set(base + m, next);
                    }
                }
            }
        }
        Ok(())
    }

    fn compute_connected(&mut self, dirty: Subset) -> Result<(), NumericalAnomaly> {
        let WheatleyTables { n, width, ref ctx, ref binomial, ref q, ref mut c, .. } = *self;
        let nf = 1u32 << n;
        let mut acc = vec![T::zero(ctx); width];

        for bits in 3..nf {
            let s = Subset(bits);
            if s.len() < 2 || !s.intersects(dirty) {
                continue;
            }
            let base = s.index() * width;
            for m in 0..width {
                acc[m] = q.get(base + m).clone();
            }

            let i = bits.trailing_zeros() as usize;
            let rest = s.without(i);
            for sub in rest.proper_submasks() {
                let comp = rest - sub;
                let comp_base = comp.index() * width;
                if q.get(comp_base).is_zero() {
                    // every derivative of a zero product is zero too
                    continue;
                }
                let j_base = sub.with(i).index() * width;
                for m in 0..width {
                    for l in 0..=m {
                        let term = leibniz_term(binomial, width, m, l, c.get(j_base + l), q.get(comp_base + m - l), ctx)?;
                        acc[m] = acc[m].sub(&term, ctx)?;
                    }
                }
            }

            for m in 0..width {
                c.set(base + m, acc[m].clone());
            }
        }
        Ok(())
    }

    fn compute_biconnected(&mut self, dirty: Subset) -> Result<(), NumericalAnomaly> {
        let WheatleyTables { n, width, ref ctx, ref binomial, ref c, ref mut stages, .. } = *self;
        let nf = 1u32 << n;
        let mut acc = vec![T::zero(ctx); width];

        for v in 0..n {
            let previous = v.checked_sub(1);
            for bits in 7..nf {
                let s = Subset(bits);
                if !s.contains(v) || s.len() < 3 || !s.intersects(dirty) {
                    continue;
                }

                // start from the diagrams with no articulation point below v
                for m in 0..width {
                    acc[m] = stage_value(c, stages, n, width, previous, s, m).clone();
                }

                // the part containing v and the lowest other point stays whole
                let low = bits.trailing_zeros() as usize;
                let fixed = match low == v {
                    true => Subset::single(low).with(s.without(low).0.trailing_zeros() as usize),
                    false => Subset::single(low).with(v),
                };
                let rest = s - fixed;
                for sub in rest.proper_submasks() {
                    let j = fixed | sub;
                    let comp = (rest - sub).with(v);
                    for m in 0..width {
                        for l in 0..=m {
                            let term = leibniz_term(
                                binomial, width, m, l,
                                stage_value(c, stages, n, width, Some(v), j, l),
                                stage_value(c, stages, n, width, previous, comp, m - l),
                                ctx,
                            )?;
                            acc[m] = acc[m].sub(&term, ctx)?;
                        }
                    }
                }

                let base = stage_index(n, v, s) * width;
                for m in 0..width {
                    stages.set(base + m, acc[m].clone());
                }
            }
        }
        Ok(())
    }
}

/// `binomial(m, l) * a * b`
#[inline]
fn leibniz_term<T: ClusterScalar>(
    binomial: &[(i64, T)],
    width: usize,
    m: usize,
    l: usize,
    a: &T,
    b: &T,
    ctx: &T::Context,
) -> Result<T, NumericalAnomaly> {
    let product = a.mul(b, ctx)?;
    match binomial[m * width + l] {
        (1, _) => Ok(product),
        (_, ref k) => product.mul(k, ctx),
    }
}

/// Position of subset `s` (which contains `v`) within the block of stage `v`.
#[inline(always)]
fn stage_index(n: usize, v: usize, s: Subset) -> usize {
    let bits = s.0 as usize;
    let below = bits & ((1 << v) - 1);
    let above = bits >> (v + 1);
    (v << (n - 1)) | below | (above << v)
}

/// `B_v(s)`: the entry of the last stage at or below `v` that touched `s`.
#[inline]
fn stage_value<'a, T: ClusterScalar>(
    c: &'a CacheTable<T>,
    stages: &'a CacheTable<T>,
    n: usize,
    width: usize,
    v: Option<usize>,
    s: Subset,
    m: usize,
) -> &'a T {
    if s.len() < 3 {
        return c.get(s.index() * width + m);
    }
    match v.and_then(|v| s.highest_at_most(v)) {
        None => c.get(s.index() * width + m),
        Some(w) => stages.get(stage_index(n, w, s) * width + m),
    }
}

fn binomial_coefficient(m: usize, l: usize) -> i64 {
    (0..l).fold(1i64, |acc, k| acc * (m - k) as i64 / (k + 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Decimal, DecimalContext};

    fn uniform_tables<T: ClusterScalar>(n: usize, kind: DiagramKind, f: f64, ctx: T::Context) -> WheatleyTables<T> {
        let mut tables = WheatleyTables::<T>::new(n, 0, kind, ctx).unwrap();
        for k in 0..pair_count(n) {
            tables.set_bond(k, f, 1.0).unwrap();
        }
        tables.recompute(Subset::full(n)).unwrap();
        tables
    }

    #[test]
    fn binomials() {
        assert_eq!(binomial_coefficient(4, 2), 6);
        assert_eq!(binomial_coefficient(5, 0), 1);
        assert_eq!(binomial_coefficient(5, 5), 1);
        assert_eq!(binomial_coefficient(6, 3), 20);
    }

    #[test]
    fn stage_indices_are_a_bijection() {
        let n = 5;
        let mut seen = vec![false; n << (n - 1)];
        for v in 0..n {
            for bits in 0..(1u32 << n) {
                let s = Subset(bits);
                if s.contains(v) {
                    let k = stage_index(n, v, s);
                    assert!(!seen[k]);
                    seen[k] = true;
                }
            }
        }
        assert!(seen.iter().all(|&x| x));
    }

    #[test]
    fn small_sets_are_one() {
        for &kind in &[DiagramKind::Connected, DiagramKind::Biconnected] {
            let tables = uniform_tables::<f64>(4, kind, -0.7, ());
            assert_eq!(*tables.product(Subset::EMPTY, 0), 1.0);
            for i in 0..4 {
                assert_eq!(*tables.product(Subset::single(i), 0), 1.0);
                assert_eq!(*tables.connected(Subset::single(i), 0), 1.0);
            }
        }
    }

    #[test]
    fn three_points_closed_form() {
        for &f in &[0.3, -1.0, -0.25, 2.0] {
            let tables = uniform_tables::<f64>(3, DiagramKind::Biconnected, f, ());
            let full = Subset::full(3);
            assert_close!(*tables.connected(full, 0), 3.0 * f * f + f * f * f);
            assert_close!(*tables.biconnected(full, 0), f * f * f);
            assert_close!(*tables.product(full, 0), (1.0 + f).powi(3));
        }
    }

    #[test]
    fn four_points_closed_form() {
        // 16 trees, 15 unicyclic graphs with 4 edges, 6 with 5 edges, 1 complete;
        // only the 4-cycles (3) and the graphs with 5 and 6 edges are biconnected
        for &f in &[0.3, -1.0, 0.8] {
            let tables = uniform_tables::<f64>(4, DiagramKind::Biconnected, f, ());
            let full = Subset::full(4);
            let connected = 16.0 * f.powi(3) + 15.0 * f.powi(4) + 6.0 * f.powi(5) + f.powi(6);
            let biconnected = 3.0 * f.powi(4) + 6.0 * f.powi(5) + f.powi(6);
            assert_close!(*tables.connected(full, 0), connected);
            assert_close!(*tables.biconnected(full, 0), biconnected);
        }
    }

    #[test]
    fn result_follows_the_table_kind() {
        let f = -0.6;
        let full = Subset::full(4);
        let connected = uniform_tables::<f64>(4, DiagramKind::Connected, f, ());
        assert_identical!(*connected.result(0), *connected.connected(full, 0));

        let biconnected = uniform_tables::<f64>(4, DiagramKind::Biconnected, f, ());
        assert_identical!(*biconnected.result(0), *biconnected.biconnected(full, 0));
        assert_identical!(*biconnected.connected(full, 0), *connected.result(0));
    }

    #[test]
    fn two_points() {
        let tables = uniform_tables::<f64>(2, DiagramKind::Biconnected, -0.4, ());
        assert_close!(*tables.result(0), -0.4);
        let tables = uniform_tables::<i64>(2, DiagramKind::Biconnected, -1.0, ());
        assert_eq!(*tables.result(0), -1);
    }

    #[test]
    fn exact_hard_spheres() {
        // all overlapping: every graph counts with sign (-1)^edges
        let tables = uniform_tables::<i64>(4, DiagramKind::Biconnected, -1.0, ());
        assert_eq!(*tables.connected(Subset::full(4), 0), -16 + 15 - 6 + 1);
        assert_eq!(*tables.result(0), 3 - 6 + 1);
    }

    #[test]
    fn decimal_matches_double() {
        let ctx = DecimalContext::new(40).unwrap();
        let dec = uniform_tables::<Decimal>(5, DiagramKind::Biconnected, -0.37, ctx);
        let dbl = uniform_tables::<f64>(5, DiagramKind::Biconnected, -0.37, ());
        assert_close!(rel=1e-10, dec.result(0).to_f64(), *dbl.result(0));
    }

    #[test]
    fn derivatives_of_uniform_bonds() {
        // all pairs share u, so every e-bond is exp(-beta u) and
        // C(full) = 3 f^2 + f^3 with f = exp(-beta u) - 1 for three points
        let (u, beta): (f64, f64) = (0.6, 0.8);
        let f: f64 = (-beta * u).exp() - 1.0;
        let mut tables = WheatleyTables::<f64>::new(3, 2, DiagramKind::Biconnected, ()).unwrap();
        for k in 0..3 {
            tables.set_bond(k, f, beta).unwrap();
        }
        tables.recompute(Subset::full(3)).unwrap();

        let e = f + 1.0;
        let df = -u * e;
        let d2f = u * u * e;
        let full = Subset::full(3);
        // B = f^3
        assert_close!(*tables.biconnected(full, 0), f.powi(3));
        assert_close!(*tables.biconnected(full, 1), 3.0 * f * f * df);
        assert_close!(*tables.biconnected(full, 2), 6.0 * f * df * df + 3.0 * f * f * d2f);
        // C = 3 f^2 + f^3
        assert_close!(*tables.connected(full, 1), (6.0 * f + 3.0 * f * f) * df);
    }

    #[test]
    fn incremental_matches_full_recompute() {
        let n = 5;
        let bonds: Vec<f64> = (0..pair_count(n)).map(|k| -0.9 + 0.13 * k as f64).collect();
        let mut tables = WheatleyTables::<f64>::new(n, 1, DiagramKind::Biconnected, ()).unwrap();
        for (k, &f) in bonds.iter().enumerate() {
            tables.set_bond(k, f, 1.3).unwrap();
        }
        tables.recompute(Subset::full(n)).unwrap();

        // move point 2
        let mut moved = bonds.clone();
        for j in (0..n).filter(|&j| j != 2) {
            let (a, b) = if j < 2 { (j, 2) } else { (2, j) };
            moved[pair_index(n, a, b)] *= 0.5;
        }
        for j in (0..n).filter(|&j| j != 2) {
            let (a, b) = if j < 2 { (j, 2) } else { (2, j) };
            let k = pair_index(n, a, b);
            tables.set_bond(k, moved[k], 1.3).unwrap();
        }
        tables.recompute(Subset::single(2)).unwrap();

        let mut fresh = WheatleyTables::<f64>::new(n, 1, DiagramKind::Biconnected, ()).unwrap();
        for (k, &f) in moved.iter().enumerate() {
            fresh.set_bond(k, f, 1.3).unwrap();
        }
        fresh.recompute(Subset::full(n)).unwrap();

        for m in 0..2 {
            assert_identical!(*tables.result(m), *fresh.result(m));
        }
    }

    #[test]
    fn rollback_is_exact() {
        let n = 4;
        let mut tables = uniform_tables::<f64>(n, DiagramKind::Biconnected, -0.3, ());
        let before = *tables.result(0);

        tables.begin();
        tables.set_bond(pair_index(n, 0, 3), 0.7, 1.0).unwrap();
        tables.recompute(Subset::single(3)).unwrap();
        assert!(*tables.result(0) != before);
        tables.rollback();

        assert_identical!(*tables.result(0), before);
    }

    #[test]
    fn negative_e_bond_rejects_derivatives() {
        let mut tables = WheatleyTables::<f64>::new(3, 1, DiagramKind::Connected, ()).unwrap();
        assert!(tables.set_bond(0, -2.0, 1.0).is_err());
        let mut plain = WheatleyTables::<f64>::new(3, 0, DiagramKind::Connected, ()).unwrap();
        assert!(plain.set_bond(0, -2.0, 1.0).is_ok());
    }
}
