/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

#![allow(non_snake_case)]

// Settings are plain data here; turning them into evaluators (and rejecting
// combinations that make no sense) happens in the root crate.
//
// NOTE: Read settings through the YamlRead trait so that unknown keys are
//       reported through serde_ignored.

#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate log;

use std::io::Read;

/// Reads YAML, warning about every key that nothing consumed.
pub trait YamlRead: for<'de> serde::Deserialize<'de> {
    fn from_reader(mut r: impl Read) -> Result<Self, serde_yaml::Error>
    { YamlRead::from_dyn_reader(&mut r) }

    fn from_dyn_reader(r: &mut dyn Read) -> Result<Self, serde_yaml::Error> {
        // serde_ignored needs a Deserializer, and serde_yaml::Value is one.
        Self::from_value(value_from_dyn_reader(r)?)
    }

    fn from_value(value: serde_yaml::Value) -> Result<Self, serde_yaml::Error>;
}

macro_rules! derive_yaml_read {
    ($Type:ty) => {
        impl YamlRead for $Type {
            fn from_value(value: serde_yaml::Value) -> Result<$Type, serde_yaml::Error> {
                serde_ignored::deserialize(
                    value,
                    |path| warn!("Unused config item (possible typo?): {}", path),
                )
            }
        }
    };
}

derive_yaml_read!{serde_yaml::Value}

fn value_from_dyn_reader(r: &mut dyn Read) -> Result<serde_yaml::Value, serde_yaml::Error>
{ serde_yaml::from_reader(r) }

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    pub temperature: f64,

    /// Number of points in each diagram.
    pub points: usize,

    #[serde(default = "_settings__dimension")]
    pub dimension: usize,

    /// Side of a periodic cubic box. `None` is open space.
    #[serde(default)]
    pub box_length: Option<f64>,

    pub potential: PotentialKind,

    pub cluster: ClusterKind,

    #[serde(default)]
    pub precision: Precision,

    /// Sampling bias; without one, the target cluster's absolute value is used.
    #[serde(default)]
    pub reference: Option<Reference>,

    #[serde(default)]
    pub sampling: Sampling,
}
derive_yaml_read!{Settings}

fn _settings__dimension() -> usize { 3 }

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
pub enum PotentialKind {
    #[serde(rename = "lennard-jones")] LennardJones(PotentialLennardJones),
    #[serde(rename = "square-well")] SquareWell(PotentialSquareWell),
    #[serde(rename = "hard-sphere")] HardSphere(PotentialHardSphere),
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PotentialLennardJones {
    #[serde(default = "_one")]
    pub sigma: f64,
    #[serde(default = "_one")]
    pub epsilon: f64,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PotentialSquareWell {
    #[serde(default = "_one")]
    pub sigma: f64,
    /// Well width, as a multiple of `sigma`.
    pub lambda: f64,
    #[serde(default = "_one")]
    pub epsilon: f64,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PotentialHardSphere {
    #[serde(default = "_one")]
    pub sigma: f64,
}

fn _one() -> f64 { 1.0 }

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterKind {
    /// Every connected or biconnected diagram, by subset recursion.
    #[serde(rename = "wheatley")] Wheatley(ClusterWheatley),
    /// Like `wheatley`, in exact integer arithmetic; needs a hard-sphere potential.
    #[serde(rename = "hard-sphere-wheatley")] HardSphereWheatley(ClusterHardSphereWheatley),
    /// Every tree.
    #[serde(rename = "tree")] Tree,
    /// Explicitly listed diagrams.
    #[serde(rename = "sum")] Sum(ClusterSum),
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterWheatley {
    #[serde(default)]
    pub diagrams: Diagrams,

    /// Number of temperature derivatives computed alongside the value.
    #[serde(default)]
    pub derivatives: usize,

    /// The value is zero when any pair is farther apart than this.
    #[serde(default)]
    pub cutoff: Option<f64>,

    /// Replaces the default coefficient (`(1 - n)/n!` for biconnected, `1` for connected).
    #[serde(default)]
    pub coefficient: Option<f64>,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterHardSphereWheatley {
    #[serde(default)]
    pub diagrams: Diagrams,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Diagrams {
    Connected,
    Biconnected,
}

impl Default for Diagrams {
    fn default() -> Self { Diagrams::Biconnected }
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterSum {
    /// Whether bond slot 1 (the e-bond `f + 1`) is available.
    #[serde(default)]
    pub e_bonds: bool,
    pub diagrams: Vec<Diagram>,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Diagram {
    pub weight: f64,
    /// Bonded pairs, per bond slot.
    pub bonds: Vec<Vec<(usize, usize)>>,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Copy, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum Precision {
    Double,
    Decimal {
        digits: u32,
    },
    /// Double precision, redone in decimal arithmetic when the result is
    /// small enough to be doubtful.
    Adaptive {
        tolerance: f64,
    },
}

impl Default for Precision {
    fn default() -> Self { Precision::Double }
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Reference {
    /// Hard-sphere diameter of the overlap-tree bias.
    pub sigma: f64,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Sampling {
    #[serde(default = "_sampling__steps")]
    pub steps: u64,
    #[serde(default = "_sampling__step_size")]
    pub step_size: f64,
    #[serde(default = "_sampling__seed")]
    pub seed: [u32; 4],
}

fn _sampling__steps() -> u64 { 1000 }
fn _sampling__step_size() -> f64 { 0.5 }
fn _sampling__seed() -> [u32; 4] { [1, 2, 3, 4] }

impl Default for Sampling {
    fn default() -> Self {
        Sampling {
            steps: _sampling__steps(),
            step_size: _sampling__step_size(),
            seed: _sampling__seed(),
        }
    }
}
