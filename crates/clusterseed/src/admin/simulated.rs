use std::collections::{HashMap, HashSet};

use clusterseed_core::{SeedError, SeedResult};

use super::{AdminClient, ALREADY_INITIALIZED, INVALID_REPLICA_SET_CONFIG};
use crate::topology::ReplicaSet;

/// In-memory stand-in for a cluster, answering the bootstrap commands the way
/// the server does
#[derive(Debug, Default)]
pub struct SimulatedCluster {
    /// Replica set configuration seen by each member host
    nodes: HashMap<String, ReplicaSet>,
    /// Registered shard hosts per router URI, in registration order
    shards: HashMap<String, Vec<String>>,
    unreachable: HashSet<String>,
    calls: Vec<String>,
}

impl SimulatedCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every command sent to `target` (a host or router URI) fail to connect
    pub fn mark_unreachable(&mut self, target: &str) {
        self.unreachable.insert(target.to_string());
    }

    /// Every command received, in order
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Distinct replica sets that have been initiated, sorted by name
    pub fn replica_sets(&self) -> Vec<&ReplicaSet> {
        let mut seen = HashSet::new();
        let mut sets: Vec<&ReplicaSet> = self
            .nodes
            .values()
            .filter(|rs| seen.insert(rs.id.as_str()))
            .collect();
        sets.sort_by(|a, b| a.id.cmp(&b.id));
        sets
    }

    fn check_reachable(&self, target: &str) -> SeedResult<()> {
        if self.unreachable.contains(target) {
            return Err(SeedError::Connection {
                target: target.to_string(),
                message: "No servers available (connection refused)".to_string(),
            });
        }
        Ok(())
    }
}

impl AdminClient for SimulatedCluster {
    fn initiate_replica_set(&mut self, target: &str, replica_set: &ReplicaSet) -> SeedResult<()> {
        self.calls.push(format!("replSetInitiate {} {}", target, replica_set.id));
        self.check_reachable(target)?;

        if self.nodes.contains_key(target) {
            return Err(SeedError::Command {
                target: target.to_string(),
                code: ALREADY_INITIALIZED,
                code_name: "AlreadyInitialized".to_string(),
                message: "already initialized".to_string(),
            });
        }

        if !replica_set.members.iter().any(|m| m.host == target) {
            return Err(SeedError::Command {
                target: target.to_string(),
                code: INVALID_REPLICA_SET_CONFIG,
                code_name: "InvalidReplicaSetConfig".to_string(),
                message: format!(
                    "No host described in new configuration for replica set {} maps to this node",
                    replica_set.id
                ),
            });
        }

        let mut stored = replica_set.clone();
        stored.connect = None;
        for member in &replica_set.members {
            self.nodes.insert(member.host.clone(), stored.clone());
        }

        Ok(())
    }

    fn add_shard(&mut self, router: &str, seed: &str) -> SeedResult<()> {
        self.calls.push(format!("addShard {} {}", router, seed));
        self.check_reachable(router)?;

        // The router records the set's own member list, not the seed it was given
        let host = match seed.split_once('/') {
            Some((name, hosts)) => hosts
                .split(',')
                .find_map(|h| self.nodes.get(h))
                .filter(|rs| rs.id == name)
                .map(|rs| format!("{}/{}", rs.id, rs.member_hosts().join(",")))
                .unwrap_or_else(|| seed.to_string()),
            None => seed.to_string(),
        };

        let registered = self.shards.entry(router.to_string()).or_default();
        // Re-adding an identical shard is accepted by the server as a no-op
        if !registered.contains(&host) {
            registered.push(host);
        }

        Ok(())
    }

    fn replica_set_config(&mut self, target: &str) -> SeedResult<Option<ReplicaSet>> {
        self.calls.push(format!("replSetGetConfig {}", target));
        self.check_reachable(target)?;

        Ok(self.nodes.get(target).cloned())
    }

    fn list_shards(&mut self, router: &str) -> SeedResult<Vec<String>> {
        self.calls.push(format!("listShards {}", router));
        self.check_reachable(router)?;

        Ok(self.shards.get(router).cloned().unwrap_or_default())
    }
}
