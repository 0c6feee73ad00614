use clusterseed_core::filesystem;
use clusterseed_core::validate;
use clusterseed_core::{ResultExt, SeedError, SeedResult, log_debug};
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_ROUTER_URI: &str = "mongodb://localhost:27017";

/// Cluster layout: the replica sets to initiate and the shards to register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub router: Router,

    /// Initiated in order, before any shard is registered
    #[serde(default)]
    pub replica_sets: Vec<ReplicaSet>,

    /// Registered in order, after every replica set is initiated
    #[serde(default)]
    pub shards: Vec<ShardRegistration>,
}

/// Descriptive metadata for a topology manifest
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

/// The router (mongos) that shards are registered with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Router {
    pub uri: String,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            uri: DEFAULT_ROUTER_URI.to_string(),
        }
    }
}

/// Replica set descriptor, sent as the `replSetInitiate` configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaSet {
    /// Replica set name (`_id`)
    pub id: String,

    /// Whether this set holds the cluster metadata
    #[serde(default, skip_serializing_if = "is_false")]
    pub configsvr: bool,

    /// Member to send the initiate command to, if not the first one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect: Option<String>,

    pub members: Vec<Member>,
}

/// A replica set member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i32,
    pub host: String,
}

/// A shard seed string passed verbatim to `addShard`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardRegistration {
    pub seed: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ReplicaSet {
    pub fn new(id: &str, configsvr: bool, hosts: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            configsvr,
            connect: None,
            members: hosts
                .iter()
                .enumerate()
                .map(|(i, host)| Member {
                    id: i as i32,
                    host: host.to_string(),
                })
                .collect(),
        }
    }

    /// The member the initiate command is sent to
    pub fn seed_host(&self) -> Option<&str> {
        self.connect
            .as_deref()
            .or_else(|| self.members.first().map(|m| m.host.as_str()))
    }

    pub fn member_hosts(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.host.as_str()).collect()
    }

    /// Build the `replSetInitiate` configuration document
    ///
    /// `configsvr` is only present when set, matching what the shell sends.
    pub fn to_document(&self) -> Document {
        let members: Vec<Document> = self
            .members
            .iter()
            .map(|m| doc! { "_id": m.id, "host": m.host.clone() })
            .collect();

        let mut config = doc! { "_id": self.id.clone() };
        if self.configsvr {
            config.insert("configsvr", true);
        }
        config.insert("members", members);
        config
    }
}

impl ShardRegistration {
    pub fn new(seed: &str) -> Self {
        Self {
            seed: seed.to_string(),
        }
    }

    /// Replica set name as written in the seed
    pub fn replica_set_name(&self) -> SeedResult<&str> {
        validate::parse_shard_seed(&self.seed).map(|(name, _)| name)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::default_cluster()
    }
}

impl Topology {
    /// The local three-set cluster: one config server set and two shards
    ///
    /// Shard seeds name `shard1ReplSet`/`shard2ReplSet` while the sets are
    /// initiated as `shard1`/`shard2`; both are kept as written.
    pub fn default_cluster() -> Self {
        Self {
            metadata: Metadata {
                name: "local-sharded".to_string(),
                description: "Config server set and two single-member shards on localhost".to_string(),
            },
            router: Router::default(),
            replica_sets: vec![
                ReplicaSet::new("configReplSet", true, &["localhost:27018"]),
                ReplicaSet::new("shard1", false, &["localhost:27019"]),
                ReplicaSet::new("shard2", false, &["localhost:27020"]),
            ],
            shards: vec![
                ShardRegistration::new("shard1ReplSet/shard1:27019"),
                ShardRegistration::new("shard2ReplSet/shard2:27020"),
            ],
        }
    }

    /// Load a topology from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SeedResult<Self> {
        let path = path.as_ref();
        log_debug(&format!("Loading topology from: {}", path.display()));

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read topology file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse topology file: {}", path.display()))
    }

    /// Load a topology from a file, or the default cluster when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> SeedResult<Self> {
        let path = path.as_ref();
        if filesystem::file_exists(path) {
            Self::from_file(path)
        } else {
            log_debug(&format!(
                "No topology at {}, using the default cluster",
                path.display()
            ));
            Ok(Self::default_cluster())
        }
    }

    /// Save the topology to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> SeedResult<()> {
        let path = path.as_ref();
        log_debug(&format!("Saving topology to: {}", path.display()));

        let content = toml::to_string_pretty(self)?;
        filesystem::ensure_parent_dir_exists(path)?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write topology file: {}", path.display()))
    }

    pub fn replica_set(&self, id: &str) -> Option<&ReplicaSet> {
        self.replica_sets.iter().find(|rs| rs.id == id)
    }

    /// Check the topology before anything is sent, returning non-fatal warnings
    pub fn validate(&self) -> SeedResult<Vec<String>> {
        let mut warnings = Vec::new();

        if self.replica_sets.is_empty() {
            return Err(SeedError::Validation(
                "Topology must define at least one replica set".to_string(),
            ));
        }

        if self.router.uri.trim().is_empty() && !self.shards.is_empty() {
            return Err(SeedError::Validation(
                "Router URI is required when shards are registered".to_string(),
            ));
        }

        let mut set_ids = HashSet::new();
        let mut config_servers = 0;

        for rs in &self.replica_sets {
            validate::validate_replica_set_name(&rs.id)?;

            if !set_ids.insert(rs.id.as_str()) {
                return Err(SeedError::Validation(format!(
                    "Replica set '{}' is defined more than once",
                    rs.id
                )));
            }

            if rs.members.is_empty() {
                return Err(SeedError::Validation(format!(
                    "Replica set '{}' has no members",
                    rs.id
                )));
            }

            let mut member_ids = HashSet::new();
            for member in &rs.members {
                validate::validate_host_port(&member.host)?;
                if !member_ids.insert(member.id) {
                    return Err(SeedError::Validation(format!(
                        "Replica set '{}' has duplicate member id {}",
                        rs.id, member.id
                    )));
                }
            }

            if let Some(connect) = &rs.connect {
                validate::validate_host_port(connect)?;
                if !rs.members.iter().any(|m| &m.host == connect) {
                    warnings.push(format!(
                        "Replica set '{}' connects via {} which is not one of its members",
                        rs.id, connect
                    ));
                }
            }

            if rs.configsvr {
                config_servers += 1;
            }
        }

        if config_servers > 1 {
            return Err(SeedError::Validation(format!(
                "Only one config server replica set is allowed, found {}",
                config_servers
            )));
        }

        let mut seeds = HashSet::new();
        for shard in &self.shards {
            let name = shard.replica_set_name()?;

            if !seeds.insert(shard.seed.as_str()) {
                return Err(SeedError::Validation(format!(
                    "Shard '{}' is registered more than once",
                    shard.seed
                )));
            }

            if !set_ids.contains(name) {
                warnings.push(format!(
                    "Shard seed '{}' names replica set '{}', which this topology does not initiate",
                    shard.seed, name
                ));
            }
        }

        Ok(warnings)
    }
}
