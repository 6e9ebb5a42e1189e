/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Cluster evaluators: diagram sums over the points of a configuration, computed
//! by dynamic programming over subsets of points and cached between Monte Carlo
//! moves.
//!
//! Subsets are bitmasks ([`Subset`]), so a cluster has at most [`MAX_POINTS`] points.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[cfg(test)] #[macro_use] extern crate virial_assert_close;

pub use virial_mayer::{ConfigurationError, NumericalAnomaly, Pair, MayerFunction, SharedMayer, shared};

pub mod subset;
pub mod geometry;
pub mod protocol;
pub mod numeric;
mod cache;
mod bonds;
mod evaluator;
mod wheatley;
mod tree;
mod sum;
mod weight;

pub use crate::subset::{Subset, MAX_POINTS};
pub use crate::geometry::{Boundary, NoBoundary, PeriodicCubic, Configuration, PairGeometry, GeometrySnapshot};
pub use crate::protocol::ProtocolMisuse;
pub use crate::numeric::{ClusterScalar, Decimal, DecimalContext, Precision, MAX_DECIMAL_DIGITS};
pub use crate::bonds::PairOracles;
pub use crate::evaluator::ClusterEvaluator;
pub use crate::wheatley::{ClusterWheatley, WheatleyTables, DiagramKind, FallbackStats};
pub use crate::tree::ClusterTree;
pub use crate::sum::{ClusterSum, ClusterBonds};
pub use crate::weight::{ClusterWeightAbs, ClusterWeightUmbrella};

pub type FailResult<T> = Result<T, failure::Error>;
