/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

/// Ratio of the new sampling weight to the old one.
///
/// A walk that starts (or lands) in a region of zero weight must be able to leave it,
/// so any move away from `old == 0` is accepted: the ratio is `+inf` there, even when
/// `new` is also zero.
pub fn acceptance_ratio(old: f64, new: f64) -> f64 {
    match old == 0.0 {
        true => ::std::f64::INFINITY,
        false => new / old,
    }
}
