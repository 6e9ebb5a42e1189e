/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Drives cluster evaluators through Monte Carlo moves.
//!
//! A [`SamplingCoordinator`] owns one configuration and every cluster that observes
//! it; each move is announced to all of them before any value is read.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[cfg(test)] #[macro_use] extern crate virial_assert_close;

macro_rules! throw {
    ($e:expr) => {
        return Err(::std::convert::Into::into($e))
    }
}

mod coordinator;
mod acceptance;
mod metropolis;

pub use crate::coordinator::{SamplingCoordinator, ClusterId, MovePolicy};
pub use crate::acceptance::acceptance_ratio;
pub use crate::metropolis::{MetropolisSampler, SamplerStats};

pub type FailResult<T> = Result<T, failure::Error>;
