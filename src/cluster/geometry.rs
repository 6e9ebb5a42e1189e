/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Point positions and lazily computed pair separations.

use crate::{ConfigurationError, Subset};
use crate::subset::{check_point_count, pair_index, pair_count};

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of geometry stamps. Shared by every geometry in the process, so two
/// distinct states never carry the same stamp.
static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

fn fresh_stamp() -> u64 { NEXT_STAMP.fetch_add(1, Ordering::Relaxed) }

/// Convention applied to a coordinate difference before it is squared.
pub trait Boundary: fmt::Debug + Send + Sync {
    fn minimum_image(&self, dx: f64) -> f64;
}

/// Open space.
#[derive(Debug, Copy, Clone, Default)]
pub struct NoBoundary;

impl Boundary for NoBoundary {
    #[inline]
    fn minimum_image(&self, dx: f64) -> f64 { dx }
}

/// A periodic cube of side `length`; differences are wrapped to the nearest image.
#[derive(Debug, Copy, Clone)]
pub struct PeriodicCubic {
    length: f64,
}

impl PeriodicCubic {
    pub fn new(length: f64) -> Result<Self, ConfigurationError> {
        match length.is_finite() && length > 0.0 {
            true => Ok(PeriodicCubic { length }),
            false => Err(ConfigurationError::InvalidParameter { what: "box length", value: length }),
        }
    }

    pub fn length(&self) -> f64 { self.length }
}

impl Boundary for PeriodicCubic {
    #[inline]
    fn minimum_image(&self, dx: f64) -> f64 {
        dx - self.length * (dx / self.length).round()
    }
}

/// Positions of `n` points in `dim` dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    dim: usize,
    positions: Vec<f64>,
}

impl Configuration {
    /// All points at the origin.
    pub fn new(n: usize, dim: usize) -> Result<Self, ConfigurationError> {
        check_point_count(n)?;
        check_dim(dim)?;
        Ok(Configuration { dim, positions: vec![0.0; n * dim] })
    }

    pub fn from_points(dim: usize, points: &[Vec<f64>]) -> Result<Self, ConfigurationError> {
        check_point_count(points.len())?;
        check_dim(dim)?;
        let mut positions = Vec::with_capacity(points.len() * dim);
        for point in points {
            if point.len() != dim {
                return Err(ConfigurationError::InvalidParameter {
                    what: "point dimension",
                    value: point.len() as f64,
                });
            }
            positions.extend_from_slice(point);
        }
        Ok(Configuration { dim, positions })
    }

    pub fn len(&self) -> usize { self.positions.len() / self.dim }
    pub fn dim(&self) -> usize { self.dim }

    pub fn point(&self, i: usize) -> &[f64] { &self.positions[i * self.dim..(i + 1) * self.dim] }
    pub fn point_mut(&mut self, i: usize) -> &mut [f64] { &mut self.positions[i * self.dim..(i + 1) * self.dim] }

    pub fn translate(&mut self, i: usize, delta: &[f64]) -> Result<(), ConfigurationError> {
        if i >= self.len() {
            return Err(ConfigurationError::PointOutOfRange { index: i, n: self.len() });
        }
        if delta.len() != self.dim {
            return Err(ConfigurationError::InvalidParameter {
                what: "displacement dimension",
                value: delta.len() as f64,
            });
        }
        for (x, d) in self.point_mut(i).iter_mut().zip(delta) {
            *x += d;
        }
        Ok(())
    }
}

fn check_dim(dim: usize) -> Result<(), ConfigurationError> {
    match dim {
        0 => Err(ConfigurationError::InvalidParameter { what: "dimension", value: 0.0 }),
        _ => Ok(()),
    }
}

/// Squared separations of every pair of a [`Configuration`], recomputed on demand.
///
/// Moving points goes through [`update`](PairGeometry::update), which marks every pair
/// touching a moved point as stale and assigns the geometry a new stamp. Evaluators
/// compare stamps to decide whether a cached cluster value is still current.
pub struct PairGeometry {
    config: Configuration,
    boundary: Arc<dyn Boundary>,
    r2: Vec<Cell<f64>>,
    stale: Vec<Cell<bool>>,
    stamp: u64,
}

/// What [`PairGeometry::restore`] needs to undo an update of the given points.
#[derive(Debug, Clone)]
pub struct GeometrySnapshot {
    moved: Subset,
    positions: Vec<(usize, Vec<f64>)>,
    pairs: Vec<(usize, f64, bool)>,
    stamp: u64,
}

impl GeometrySnapshot {
    pub fn moved(&self) -> Subset { self.moved }
}

impl PairGeometry {
    pub fn new(config: Configuration, boundary: Arc<dyn Boundary>) -> Self {
        let npairs = pair_count(config.len());
        PairGeometry {
            config,
            boundary,
            r2: vec![Cell::new(0.0); npairs],
            stale: vec![Cell::new(true); npairs],
            stamp: fresh_stamp(),
        }
    }

    /// Geometry in open space.
    pub fn open(config: Configuration) -> Self { PairGeometry::new(config, Arc::new(NoBoundary)) }

    pub fn point_count(&self) -> usize { self.config.len() }
    pub fn dim(&self) -> usize { self.config.dim() }
    pub fn configuration(&self) -> &Configuration { &self.config }
    pub fn boundary(&self) -> &Arc<dyn Boundary> { &self.boundary }

    /// Identifies the current state; changes on every update and returns to its old value
    /// when an update is undone through [`restore`](PairGeometry::restore).
    pub fn stamp(&self) -> u64 { self.stamp }

    /// Squared separation of points `i` and `j`; zero when `i == j`.
    pub fn r2(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        let n = self.point_count();
        let k = pair_index(n, i, j);
        if self.stale[k].get() {
            let (a, b) = (self.config.point(i), self.config.point(j));
            let r2: f64 = a.iter().zip(b)
                .map(|(&x, &y)| self.boundary.minimum_image(y - x))
                .map(|d| d * d)
                .sum();
            self.r2[k].set(r2);
            self.stale[k].set(false);
        }
        self.r2[k].get()
    }

    /// Fails if `moved` names a point this geometry does not have.
    pub fn check_moved(&self, moved: Subset) -> Result<(), ConfigurationError> {
        let n = self.point_count();
        match moved.is_subset_of(Subset::full(n)) {
            true => Ok(()),
            false => Err(ConfigurationError::PointOutOfRange {
                index: (moved - Subset::full(n)).lowest().unwrap_or(n),
                n,
            }),
        }
    }

    /// Marks every pair that involves a point in `moved` as stale.
    pub fn invalidate(&mut self, moved: Subset) -> Result<(), ConfigurationError> {
        self.check_moved(moved)?;
        let n = self.point_count();
        for p in moved {
            for q in (0..n).filter(|&q| q != p) {
                let (i, j) = if p < q { (p, q) } else { (q, p) };
                self.stale[pair_index(n, i, j)].set(true);
            }
        }
        self.stamp = fresh_stamp();
        Ok(())
    }

    /// Runs `mutate` on the positions, then invalidates the pairs of `moved`.
    /// Nothing changes if `moved` is out of range.
    ///
    /// `mutate` must only change points in `moved`.
    pub fn update<R>(
        &mut self,
        moved: Subset,
        mutate: impl FnOnce(&mut Configuration) -> R,
    ) -> Result<R, ConfigurationError> {
        self.check_moved(moved)?;
        let out = mutate(&mut self.config);
        self.invalidate(moved)?;
        Ok(out)
    }

    /// Replaces every position at once.
    pub fn set_configuration(&mut self, config: Configuration) -> Result<(), ConfigurationError> {
        if (config.len(), config.dim()) != (self.point_count(), self.dim()) {
            return Err(ConfigurationError::PointCountMismatch {
                expected: self.point_count(),
                found: config.len(),
            });
        }
        let n = self.point_count();
        self.config = config;
        self.invalidate(Subset::full(n))
    }

    /// Records the positions and pair cells that an update of `moved` could change.
    pub fn snapshot(&self, moved: Subset) -> GeometrySnapshot {
        let n = self.point_count();
        let positions = moved.iter().map(|p| (p, self.config.point(p).to_vec())).collect();
        let mut pairs = vec![];
        for (i, j) in crate::subset::pairs(n) {
            if moved.contains(i) || moved.contains(j) {
                let k = pair_index(n, i, j);
                pairs.push((k, self.r2[k].get(), self.stale[k].get()));
            }
        }
        GeometrySnapshot { moved, positions, pairs, stamp: self.stamp }
    }

    /// Puts back the state recorded by `snapshot`, stamp included.
    pub fn restore(&mut self, snapshot: GeometrySnapshot) {
        let GeometrySnapshot { positions, pairs, stamp, .. } = snapshot;
        for (p, x) in positions {
            self.config.point_mut(p).copy_from_slice(&x);
        }
        for (k, r2, stale) in pairs {
            self.r2[k].set(r2);
            self.stale[k].set(stale);
        }
        self.stamp = stamp;
    }
}

/// Clones get their own stamp.
impl Clone for PairGeometry {
    fn clone(&self) -> Self {
        PairGeometry {
            config: self.config.clone(),
            boundary: self.boundary.clone(),
            r2: self.r2.clone(),
            stale: self.stale.clone(),
            stamp: fresh_stamp(),
        }
    }
}

impl fmt::Debug for PairGeometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PairGeometry")
            .field("config", &self.config)
            .field("boundary", &self.boundary)
            .field("stamp", &self.stamp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(xs: &[f64]) -> PairGeometry {
        let points: Vec<_> = xs.iter().map(|&x| vec![x, 0.0, 0.0]).collect();
        PairGeometry::open(Configuration::from_points(3, &points).unwrap())
    }

    #[test]
    fn distances() {
        let geom = line(&[0.0, 1.0, 3.0]);
        assert_eq!(geom.r2(0, 1), 1.0);
        assert_eq!(geom.r2(2, 0), 9.0);
        assert_eq!(geom.r2(1, 2), 4.0);
        // reads are idempotent
        assert_eq!(geom.r2(1, 2), 4.0);
    }

    #[test]
    fn same_point_distance_is_zero() {
        let geom = line(&[0.0, 1.0, 3.0]);
        assert_eq!(geom.r2(1, 1), 0.0);
        assert_eq!(geom.r2(2, 2), 0.0);
        // no other pair's cell is touched
        assert_eq!(geom.r2(0, 2), 9.0);
        assert_eq!(geom.r2(0, 1), 1.0);
        assert_eq!(geom.r2(1, 2), 4.0);
    }

    #[test]
    fn out_of_range_moves_are_refused() {
        let mut geom = line(&[0.0, 1.0, 3.0]);
        let _ = geom.r2(0, 2);
        let stamp = geom.stamp();
        let moved = Subset::from_indices(vec![1, 5]);
        let err = geom.update(moved, |c| c.point_mut(1)[0] = 7.0).unwrap_err();
        assert_eq!(err, ConfigurationError::PointOutOfRange { index: 5, n: 3 });
        assert!(geom.invalidate(Subset::single(3)).is_err());

        assert_eq!(geom.stamp(), stamp);
        assert_eq!(geom.configuration().point(1), &[1.0, 0.0, 0.0]);
        assert_eq!(geom.r2(0, 2), 9.0);
    }

    #[test]
    fn translate_checks_its_input() {
        let mut config = Configuration::new(2, 3).unwrap();
        config.translate(1, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(config.point(1), &[1.0, 2.0, 3.0]);

        assert!(config.translate(1, &[1.0, 2.0]).is_err());
        assert_eq!(
            config.translate(2, &[0.0, 0.0, 0.0]),
            Err(ConfigurationError::PointOutOfRange { index: 2, n: 2 }),
        );
        assert_eq!(config.point(1), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn update_invalidates_moved_pairs() {
        let mut geom = line(&[0.0, 1.0, 3.0]);
        let _ = geom.r2(0, 1);
        let stamp = geom.stamp();
        geom.update(Subset::single(1), |c| c.translate(1, &[1.0, 0.0, 0.0])).unwrap().unwrap();
        assert_ne!(geom.stamp(), stamp);
        assert_eq!(geom.r2(0, 1), 4.0);
        assert_eq!(geom.r2(1, 2), 1.0);
        assert_eq!(geom.r2(0, 2), 9.0);
    }

    #[test]
    fn restore_undoes_update() {
        let mut geom = line(&[0.0, 1.0, 3.0]);
        let before: Vec<_> = vec![geom.r2(0, 1), geom.r2(0, 2), geom.r2(1, 2)];
        let stamp = geom.stamp();

        let snap = geom.snapshot(Subset::single(2));
        geom.update(Subset::single(2), |c| c.point_mut(2)[1] = 5.0).unwrap();
        assert_eq!(geom.r2(1, 2), 29.0);

        geom.restore(snap);
        assert_eq!(geom.stamp(), stamp);
        assert_eq!(geom.configuration().point(2), &[3.0, 0.0, 0.0]);
        assert_eq!(vec![geom.r2(0, 1), geom.r2(0, 2), geom.r2(1, 2)], before);
    }

    #[test]
    fn stamps_are_unique() {
        let a = line(&[0.0, 1.0]);
        let b = a.clone();
        let c = line(&[0.0, 1.0]);
        assert_ne!(a.stamp(), b.stamp());
        assert_ne!(a.stamp(), c.stamp());
    }

    #[test]
    fn periodic_minimum_image() {
        let boundary = PeriodicCubic::new(10.0).unwrap();
        assert_eq!(boundary.minimum_image(9.0), -1.0);
        assert_eq!(boundary.minimum_image(-6.0), 4.0);
        assert_eq!(boundary.minimum_image(2.0), 2.0);

        let points = vec![vec![0.5, 0.0], vec![9.5, 0.0]];
        let geom = PairGeometry::new(
            Configuration::from_points(2, &points).unwrap(),
            Arc::new(boundary),
        );
        assert_eq!(geom.r2(0, 1), 1.0);
        assert!(PeriodicCubic::new(0.0).is_err());
    }

    #[test]
    fn bad_configurations() {
        assert!(Configuration::from_points(2, &[vec![0.0, 1.0], vec![1.0]]).is_err());
        assert!(Configuration::new(0, 3).is_err());
        assert!(Configuration::new(3, 0).is_err());

        let mut geom = line(&[0.0, 1.0]);
        assert!(geom.set_configuration(Configuration::new(3, 3).unwrap()).is_err());
        geom.set_configuration(Configuration::new(2, 3).unwrap()).unwrap();
        assert_eq!(geom.r2(0, 1), 0.0);
    }
}
