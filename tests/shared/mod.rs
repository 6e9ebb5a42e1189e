#![allow(dead_code)]

#[macro_use]
pub mod util;
pub mod graphs;

use ::rand::{Rng, SeedableRng, XorShiftRng};
use ::virial::cluster::{Configuration, PairGeometry};

pub fn init_logger() {
    let _ = ::env_logger::try_init();
}

pub fn rng(seed: u32) -> XorShiftRng {
    XorShiftRng::from_seed([seed, 0x1234_5678, 0x9abc_def0, seed ^ 0xdead_beef])
}

/// `n` points scattered uniformly in a cube of side `side`.
pub fn random_configuration(rng: &mut XorShiftRng, n: usize, side: f64) -> Configuration {
    let points: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..3).map(|_| side * rng.gen_range(0.0, 1.0)).collect())
        .collect();
    Configuration::from_points(3, &points).unwrap()
}

pub fn random_geometry(rng: &mut XorShiftRng, n: usize, side: f64) -> PairGeometry {
    PairGeometry::open(random_configuration(rng, n, side))
}
