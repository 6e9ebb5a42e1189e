/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::FailResult;
use virial_cluster::{
    ClusterEvaluator, Configuration, ConfigurationError, GeometrySnapshot,
    PairGeometry, ProtocolMisuse, Subset,
};

/// Handle to a cluster registered with a [`SamplingCoordinator`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClusterId(usize);

/// Whether a move may be undone.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MovePolicy {
    Rejectable,
    /// Moves that build a new configuration from scratch; they are always accepted.
    Constructive,
}

#[derive(Debug)]
enum State {
    Settled,
    Trial {
        moved: Subset,
        snapshot: Option<GeometrySnapshot>,
        policy: MovePolicy,
    },
}

/// Owns a configuration and the clusters observing it, and drives the
/// trial/accept/reject protocol on all of them at once.
///
/// ```text
///   trial(moved, policy, mutate)      accept() / reject()
/// Settled ------------------> Trial -------------------> Settled
/// ```
#[derive(Debug)]
pub struct SamplingCoordinator {
    geometry: PairGeometry,
    clusters: Vec<Box<dyn ClusterEvaluator>>,
    state: State,
    temperature: Option<f64>,
}

impl SamplingCoordinator {
    pub fn new(geometry: PairGeometry) -> Self {
        SamplingCoordinator {
            geometry,
            clusters: vec![],
            state: State::Settled,
            temperature: None,
        }
    }

    /// Registers a cluster. It inherits the coordinator's temperature, if one was set.
    pub fn add_cluster(&mut self, mut cluster: Box<dyn ClusterEvaluator>) -> FailResult<ClusterId> {
        if self.in_trial() {
            bail!("cannot add a cluster during a trial");
        }
        if cluster.point_count() != self.geometry.point_count() {
            throw!(ConfigurationError::PointCountMismatch {
                expected: self.geometry.point_count(),
                found: cluster.point_count(),
            });
        }
        if let Some(temperature) = self.temperature {
            cluster.set_temperature(temperature)?;
        }
        self.clusters.push(cluster);
        Ok(ClusterId(self.clusters.len() - 1))
    }

    pub fn geometry(&self) -> &PairGeometry { &self.geometry }
    pub fn configuration(&self) -> &Configuration { self.geometry.configuration() }
    pub fn point_count(&self) -> usize { self.geometry.point_count() }
    pub fn temperature(&self) -> Option<f64> { self.temperature }

    pub fn in_trial(&self) -> bool {
        match self.state {
            State::Settled => false,
            State::Trial { .. } => true,
        }
    }

    /// Points moved by the pending trial.
    pub fn pending_move(&self) -> Option<Subset> {
        match self.state {
            State::Settled => None,
            State::Trial { moved, .. } => Some(moved),
        }
    }

    pub fn set_temperature(&mut self, temperature: f64) -> FailResult<()> {
        if self.in_trial() {
            throw!(ProtocolMisuse::TemperatureDuringTrial);
        }
        for cluster in &mut self.clusters {
            cluster.set_temperature(temperature)?;
        }
        self.temperature = Some(temperature);
        Ok(())
    }

    /// Starts a trial: notifies every cluster, then lets `mutate` move the points in `moved`.
    pub fn trial<R>(
        &mut self,
        moved: Subset,
        policy: MovePolicy,
        mutate: impl FnOnce(&mut Configuration) -> R,
    ) -> FailResult<R> {
        if self.in_trial() {
            throw!(ProtocolMisuse::DoubleTrial);
        }
        self.geometry.check_moved(moved)?;
        for cluster in &mut self.clusters {
            cluster.trial_notify(moved)?;
        }
        let snapshot = match policy {
            MovePolicy::Rejectable => Some(self.geometry.snapshot(moved)),
            MovePolicy::Constructive => None,
        };
        let out = self.geometry.update(moved, mutate)?;
        self.state = State::Trial { moved, snapshot, policy };
        Ok(out)
    }

    pub fn accept(&mut self) -> FailResult<()> {
        if !self.in_trial() {
            throw!(ProtocolMisuse::NoTrial);
        }
        for cluster in &mut self.clusters {
            cluster.accept_notify()?;
        }
        self.state = State::Settled;
        Ok(())
    }

    /// Undoes the pending trial. Fails without changing anything for a constructive move.
    pub fn reject(&mut self) -> FailResult<()> {
        let snapshot = match std::mem::replace(&mut self.state, State::Settled) {
            State::Settled => throw!(ProtocolMisuse::NoTrial),
            State::Trial { snapshot: Some(snapshot), .. } => snapshot,
            trial @ State::Trial { snapshot: None, .. } => {
                self.state = trial;
                throw!(ProtocolMisuse::RejectForbidden);
            },
        };
        self.geometry.restore(snapshot);
        for cluster in &mut self.clusters {
            cluster.reject_notify()?;
        }
        Ok(())
    }

    /// Replaces every position, as an accepted move of all points.
    pub fn set_configuration(&mut self, config: Configuration) -> FailResult<()> {
        if (config.len(), config.dim()) != (self.point_count(), self.geometry.dim()) {
            throw!(ConfigurationError::PointCountMismatch {
                expected: self.point_count(),
                found: config.len(),
            });
        }
        let all = Subset::full(self.point_count());
        let mut config = Some(config);
        self.trial(all, MovePolicy::Constructive, |c| {
            if let Some(new) = config.take() {
                *c = new;
            }
        })?;
        self.accept()
    }

    pub fn value(&mut self, id: ClusterId) -> FailResult<f64> {
        self.clusters[id.0].value(&self.geometry)
    }

    pub fn all_values(&mut self, id: ClusterId) -> FailResult<Vec<f64>> {
        self.clusters[id.0].all_last_values(&self.geometry)
    }

    pub fn num_values(&self, id: ClusterId) -> usize { self.clusters[id.0].num_values() }

    /// Evaluators for another coordinator that samples the same clusters independently.
    pub fn copy_clusters(&self) -> Vec<Box<dyn ClusterEvaluator>> {
        self.clusters.iter().map(|c| c.make_copy()).collect()
    }
}
