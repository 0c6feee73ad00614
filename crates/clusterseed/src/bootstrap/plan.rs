use std::fmt;

use clusterseed_core::{SeedError, SeedResult};

use crate::topology::{ReplicaSet, Topology};

/// One administrative call of the bootstrap
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// `replSetInitiate` sent to `target`
    InitiateReplicaSet { target: String, replica_set: ReplicaSet },
    /// `addShard` sent to `router`
    AddShard { router: String, seed: String },
}

impl Step {
    /// Short name used in progress output and errors
    pub fn label(&self) -> String {
        match self {
            Step::InitiateReplicaSet { replica_set, .. } if replica_set.configsvr => {
                format!("initiate config server replica set {}", replica_set.id)
            }
            Step::InitiateReplicaSet { replica_set, .. } => {
                format!("initiate replica set {}", replica_set.id)
            }
            Step::AddShard { seed, .. } => format!("add shard {}", seed),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::InitiateReplicaSet { target, replica_set } => write!(
                f,
                "{} -> replSetInitiate {}",
                target,
                replica_set.to_document()
            ),
            Step::AddShard { router, seed } => write!(f, "{} -> addShard \"{}\"", router, seed),
        }
    }
}

/// The ordered list of calls for a topology
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapPlan {
    pub steps: Vec<Step>,
}

impl BootstrapPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Build the bootstrap plan: every replica set first, in manifest order, then
/// every shard registration
///
/// Shards cannot be registered before their replica sets exist, so no
/// registration is ever interleaved with an initiation.
pub fn plan(topology: &Topology) -> SeedResult<BootstrapPlan> {
    let mut steps = Vec::with_capacity(topology.replica_sets.len() + topology.shards.len());

    for rs in &topology.replica_sets {
        let target = rs.seed_host().ok_or_else(|| {
            SeedError::Validation(format!("Replica set '{}' has no members", rs.id))
        })?;

        steps.push(Step::InitiateReplicaSet {
            target: target.to_string(),
            replica_set: rs.clone(),
        });
    }

    for shard in &topology.shards {
        steps.push(Step::AddShard {
            router: topology.router.uri.clone(),
            seed: shard.seed.clone(),
        });
    }

    Ok(BootstrapPlan { steps })
}
