pub mod mongo;
pub mod simulated;

use crate::topology::ReplicaSet;
use clusterseed_core::SeedResult;

pub use mongo::MongoAdmin;
pub use simulated::SimulatedCluster;

/// Server error code for `replSetInitiate` on an initiated node
pub const ALREADY_INITIALIZED: i32 = 23;
/// Server error code when the receiving node is not in the new configuration
pub const INVALID_REPLICA_SET_CONFIG: i32 = 93;
/// Server error code for `replSetGetConfig` before initiation
pub const NOT_YET_INITIALIZED: i32 = 94;

/// The administrative commands the bootstrap needs from a cluster
///
/// `target` is a `host:port` of a replica set member; `router` is a
/// connection URI for the mongos the shards are registered with.
pub trait AdminClient {
    /// Send `replSetInitiate` with the replica set configuration to `target`
    fn initiate_replica_set(&mut self, target: &str, replica_set: &ReplicaSet) -> SeedResult<()>;

    /// Send `addShard` with the seed string, unchanged, to the router
    fn add_shard(&mut self, router: &str, seed: &str) -> SeedResult<()>;

    /// Current replica set configuration of `target`, `None` if not yet initiated
    fn replica_set_config(&mut self, target: &str) -> SeedResult<Option<ReplicaSet>>;

    /// Host strings of every shard the router knows about
    fn list_shards(&mut self, router: &str) -> SeedResult<Vec<String>>;
}
