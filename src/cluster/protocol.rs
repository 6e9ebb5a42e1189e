/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! The trial/accept/reject state machine that every caching evaluator follows.
//!
//! ```text
//!            trial(moved)
//!  Settled ---------------> Trial
//!     ^                       |
//!     +---- accept/reject ----+
//! ```
//!
//! [`Tracker`] remembers which points have bonds that the evaluator's tables do not
//! yet reflect, and for which geometry stamp the cached value was computed.

use crate::{ConfigurationError, Subset};

/// Calls made out of order. These are programmer errors in the driving loop.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum ProtocolMisuse {
    #[fail(display = "trial notification while another trial is pending")]
    DoubleTrial,

    #[fail(display = "accept or reject without a pending trial")]
    NoTrial,

    #[fail(display = "the pending move does not allow rejection")]
    RejectForbidden,

    #[fail(display = "temperature changed during a trial")]
    TemperatureDuringTrial,

    #[fail(display = "configuration changed without a trial notification")]
    UnnotifiedChange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Baseline {
    dirty: Subset,
    served: Option<u64>,
    notified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Settled,
    Trial(Baseline),
}

/// What an evaluator must do to answer `value()` for a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pending {
    /// The cached value is current.
    Cached,
    /// Recompute everything that involves these points.
    Recompute(Subset),
}

#[derive(Debug, Clone)]
pub struct Tracker {
    n: usize,
    phase: Phase,
    /// Points whose bonds are not reflected in the tables.
    dirty: Subset,
    /// Stamp of the geometry the cached value belongs to.
    served: Option<u64>,
    /// Whether a change has been announced since the value was last served.
    notified: bool,
    beta: Option<f64>,
}

impl Tracker {
    /// A tracker for which nothing has been computed yet.
    pub fn new(n: usize) -> Tracker {
        Tracker {
            n,
            phase: Phase::Settled,
            dirty: Subset::full(n),
            served: None,
            notified: true,
            beta: None,
        }
    }

    /// A fresh tracker that keeps this one's temperature.
    pub fn fresh_copy(&self) -> Tracker {
        Tracker { beta: self.beta, ..Tracker::new(self.n) }
    }

    pub fn in_trial(&self) -> bool { self.phase != Phase::Settled }

    pub fn beta(&self) -> Result<f64, ConfigurationError> {
        self.beta.ok_or(ConfigurationError::TemperatureUnset)
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<(), failure::Error> {
        if self.in_trial() {
            return Err(ProtocolMisuse::TemperatureDuringTrial.into());
        }
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(ConfigurationError::InvalidTemperature(temperature).into());
        }
        self.beta = Some(1.0 / temperature);
        self.invalidate_all();
        Ok(())
    }

    /// Forget every cached result.
    pub fn invalidate_all(&mut self) {
        self.dirty = Subset::full(self.n);
        self.served = None;
        self.notified = true;
    }

    pub fn trial(&mut self, moved: Subset) -> Result<(), ProtocolMisuse> {
        match self.phase {
            Phase::Trial(_) => Err(ProtocolMisuse::DoubleTrial),
            Phase::Settled => {
                self.phase = Phase::Trial(Baseline {
                    dirty: self.dirty,
                    served: self.served,
                    notified: self.notified,
                });
                self.dirty = self.dirty | moved;
                self.notified = true;
                Ok(())
            },
        }
    }

    pub fn accept(&mut self) -> Result<(), ProtocolMisuse> {
        match self.phase {
            Phase::Settled => Err(ProtocolMisuse::NoTrial),
            Phase::Trial(_) => {
                self.phase = Phase::Settled;
                Ok(())
            },
        }
    }

    pub fn reject(&mut self) -> Result<(), ProtocolMisuse> {
        match self.phase {
            Phase::Settled => Err(ProtocolMisuse::NoTrial),
            Phase::Trial(Baseline { dirty, served, notified }) => {
                self.phase = Phase::Settled;
                self.dirty = dirty;
                self.served = served;
                self.notified = notified;
                Ok(())
            },
        }
    }

    /// Decides whether the value cached for `stamp` can be reused.
    pub fn pending(&self, stamp: u64) -> Result<Pending, ProtocolMisuse> {
        if self.served == Some(stamp) {
            return Ok(Pending::Cached);
        }
        if !self.notified {
            return Err(ProtocolMisuse::UnnotifiedChange);
        }
        Ok(Pending::Recompute(self.dirty))
    }

    /// Records that the tables now reflect every bond and the value belongs to `stamp`.
    pub fn served(&mut self, stamp: u64) {
        self.dirty = Subset::EMPTY;
        self.served = Some(stamp);
        self.notified = false;
    }

    /// Records a value for `stamp` that was produced without touching the tables.
    pub fn served_untabulated(&mut self, stamp: u64) {
        self.served = Some(stamp);
        self.notified = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_recomputes_everything() {
        let t = Tracker::new(3);
        assert_eq!(t.pending(10), Ok(Pending::Recompute(Subset::full(3))));
        assert_eq!(t.beta(), Err(ConfigurationError::TemperatureUnset));
    }

    #[test]
    fn serve_then_cache() {
        let mut t = Tracker::new(3);
        t.served(10);
        assert_eq!(t.pending(10), Ok(Pending::Cached));
        assert_eq!(t.pending(11), Err(ProtocolMisuse::UnnotifiedChange));

        t.trial(Subset::single(1)).unwrap();
        assert_eq!(t.pending(11), Ok(Pending::Recompute(Subset::single(1))));
        t.served(11);
        t.reject().unwrap();
        // back to the baseline
        assert_eq!(t.pending(10), Ok(Pending::Cached));
    }

    #[test]
    fn accept_keeps_trial_state() {
        let mut t = Tracker::new(2);
        t.served(1);
        t.trial(Subset::single(0)).unwrap();
        t.accept().unwrap();
        // value never requested during the trial; still owed
        assert_eq!(t.pending(2), Ok(Pending::Recompute(Subset::single(0))));
    }

    #[test]
    fn misuse() {
        let mut t = Tracker::new(2);
        assert_eq!(t.accept(), Err(ProtocolMisuse::NoTrial));
        assert_eq!(t.reject(), Err(ProtocolMisuse::NoTrial));
        t.trial(Subset::single(0)).unwrap();
        assert_eq!(t.trial(Subset::single(1)), Err(ProtocolMisuse::DoubleTrial));

        let err = t.set_temperature(1.0).unwrap_err();
        assert_eq!(err.downcast::<ProtocolMisuse>().unwrap(), ProtocolMisuse::TemperatureDuringTrial);
    }

    #[test]
    fn temperature() {
        let mut t = Tracker::new(2);
        assert!(t.set_temperature(-1.0).is_err());
        assert!(t.set_temperature(0.0).is_err());
        t.set_temperature(2.0).unwrap();
        assert_eq!(t.beta(), Ok(0.5));

        t.served(5);
        t.set_temperature(4.0).unwrap();
        assert_eq!(t.pending(5), Ok(Pending::Recompute(Subset::full(2))));
        assert_eq!(t.fresh_copy().beta(), Ok(0.25));
    }
}
