/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Sets of point indices as bitmasks.

use crate::ConfigurationError;
use itertools::Itertools;
use std::fmt;
use std::ops::{BitOr, BitAnd, Sub};

/// Largest point count an evaluator accepts.
///
/// Tables are indexed by subsets, so memory grows as `2^n`.
pub const MAX_POINTS: usize = 20;

pub fn check_point_count(n: usize) -> Result<(), ConfigurationError> {
    match n {
        0 => Err(ConfigurationError::InvalidParameter { what: "point count", value: 0.0 }),
        n if n > MAX_POINTS => Err(ConfigurationError::TooManyPoints { requested: n, max: MAX_POINTS }),
        _ => Ok(()),
    }
}

/// A set of point indices; bit `i` is set when point `i` is a member.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Subset(pub u32);

impl Subset {
    pub const EMPTY: Subset = Subset(0);

    /// All of the points `0..n`.
    pub fn full(n: usize) -> Subset {
        debug_assert!(n <= MAX_POINTS);
        Subset(((1u64 << n) - 1) as u32)
    }

    pub fn single(i: usize) -> Subset { Subset(1 << i) }

    pub fn from_indices<I: IntoIterator<Item=usize>>(indices: I) -> Subset {
        indices.into_iter().fold(Subset::EMPTY, |acc, i| acc | Subset::single(i))
    }

    /// The subset as a table index.
    #[inline(always)]
    pub fn index(self) -> usize { self.0 as usize }

    #[inline(always)]
    pub fn len(self) -> usize { self.0.count_ones() as usize }

    #[inline(always)]
    pub fn is_empty(self) -> bool { self.0 == 0 }

    #[inline(always)]
    pub fn contains(self, i: usize) -> bool { self.0 & (1 << i) != 0 }

    #[inline(always)]
    pub fn intersects(self, other: Subset) -> bool { self.0 & other.0 != 0 }

    pub fn is_subset_of(self, other: Subset) -> bool { self.0 & !other.0 == 0 }

    /// Index of the lowest member.
    #[inline(always)]
    pub fn lowest(self) -> Option<usize> {
        match self.0 {
            0 => None,
            bits => Some(bits.trailing_zeros() as usize),
        }
    }

    /// Index of the highest member.
    pub fn highest(self) -> Option<usize> {
        match self.0 {
            0 => None,
            bits => Some(31 - bits.leading_zeros() as usize),
        }
    }

    /// The highest member that is `<= bound`.
    #[inline]
    pub fn highest_at_most(self, bound: usize) -> Option<usize> {
        let mask = match bound {
            b if b >= 31 => !0,
            b => (2u32 << b) - 1,
        };
        Subset(self.0 & mask).highest()
    }

    #[inline(always)]
    pub fn with(self, i: usize) -> Subset { Subset(self.0 | (1 << i)) }

    #[inline(always)]
    pub fn without(self, i: usize) -> Subset { Subset(self.0 & !(1 << i)) }

    /// Members in increasing order.
    pub fn iter(self) -> Members { Members(self.0) }

    /// Every subset of `self` (including `self` and the empty set), in decreasing order.
    pub fn submasks(self) -> Submasks { Submasks { set: self.0, next: Some(self.0) } }

    /// Every subset of `self` other than `self` itself, in decreasing order.
    pub fn proper_submasks(self) -> Submasks {
        let mut iter = self.submasks();
        iter.next();
        iter
    }
}

impl fmt::Debug for Subset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl BitOr for Subset {
    type Output = Subset;
    #[inline(always)]
    fn bitor(self, rhs: Subset) -> Subset { Subset(self.0 | rhs.0) }
}

impl BitAnd for Subset {
    type Output = Subset;
    #[inline(always)]
    fn bitand(self, rhs: Subset) -> Subset { Subset(self.0 & rhs.0) }
}

/// Set difference.
impl Sub for Subset {
    type Output = Subset;
    #[inline(always)]
    fn sub(self, rhs: Subset) -> Subset { Subset(self.0 & !rhs.0) }
}

impl IntoIterator for Subset {
    type Item = usize;
    type IntoIter = Members;
    fn into_iter(self) -> Members { self.iter() }
}

#[derive(Debug, Clone)]
pub struct Members(u32);

impl Iterator for Members {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        match self.0 {
            0 => None,
            bits => {
                self.0 &= bits - 1;
                Some(bits.trailing_zeros() as usize)
            },
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.0.count_ones() as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Members {}

#[derive(Debug, Clone)]
pub struct Submasks {
    set: u32,
    next: Option<u32>,
}

impl Iterator for Submasks {
    type Item = Subset;

    #[inline]
    fn next(&mut self) -> Option<Subset> {
        let cur = self.next?;
        self.next = match cur {
            0 => None,
            _ => Some((cur - 1) & self.set),
        };
        Some(Subset(cur))
    }
}

/// Position of the unordered pair `(i, j)`, `i < j`, in a packed upper triangle.
#[inline(always)]
pub fn pair_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < n);
    i * n - i * (i + 1) / 2 + (j - i - 1)
}

pub fn pair_count(n: usize) -> usize { n * n.saturating_sub(1) / 2 }

/// All pairs `(i, j)` with `i < j < n`, in packed order.
pub fn pairs(n: usize) -> impl Iterator<Item=(usize, usize)> {
    (0..n).tuple_combinations()
}
