// clusterseed - replica set and shard bootstrap for MongoDB clusters

pub mod admin;
pub mod bootstrap;
pub mod topology;
pub mod verify;

// CLI handling
pub mod cli;

// Re-export core functionality
pub use clusterseed_core::{SeedError, SeedResult};

pub use admin::{AdminClient, MongoAdmin, SimulatedCluster};
pub use bootstrap::{apply, plan, BootstrapPlan, BootstrapReport, Step};
pub use topology::{Member, ReplicaSet, ShardRegistration, Topology};
pub use verify::{verify, VerificationReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
