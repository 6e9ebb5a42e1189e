/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Virial coefficients from cluster integrals.
//!
//! The work is split over the workspace:
//!
//! * [`mayer`]: bond functions and pair potentials,
//! * [`cluster`]: the evaluators, which cache subset tables between moves,
//! * [`sampling`]: the coordinator that keeps evaluators in step with a configuration,
//! * [`config`]: YAML settings.
//!
//! This crate sets up logging and builds a sampler from [`config::Settings`].

#[macro_use] extern crate log;

pub extern crate virial_mayer as mayer;
pub extern crate virial_cluster as cluster;
pub extern crate virial_sampling as sampling;
pub extern crate virial_config as config;

pub mod ui;
pub mod build;

pub use crate::ui::logging::GlobalLogger;
pub use crate::build::{Simulation, build_simulation};

pub type FailResult<T> = Result<T, failure::Error>;
