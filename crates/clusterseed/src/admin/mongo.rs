use std::collections::HashMap;
use std::time::Duration;

use clusterseed_core::{SeedError, SeedResult};
use mongodb::bson::{self, doc, Document};
use mongodb::error::{Error as DriverError, ErrorKind};
use mongodb::sync::Client;
use serde::Deserialize;
use tracing::debug;

use super::{AdminClient, NOT_YET_INITIALIZED};
use crate::topology::{Member, ReplicaSet};

/// Admin client backed by the MongoDB driver's blocking API
pub struct MongoAdmin {
    /// One client per connection URI
    clients: HashMap<String, Client>,
    server_selection_timeout: Duration,
}

/// Subset of the `replSetGetConfig` reply we read back
#[derive(Debug, Deserialize)]
struct ReplicaSetConfig {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    configsvr: bool,
    members: Vec<ReplicaSetMember>,
}

#[derive(Debug, Deserialize)]
struct ReplicaSetMember {
    #[serde(rename = "_id")]
    id: i32,
    host: String,
}

impl MongoAdmin {
    pub fn new(server_selection_timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            server_selection_timeout,
        }
    }

    /// URI for talking to one replica set member directly
    ///
    /// Uninitiated members are not part of any set yet, so the driver must not
    /// try to discover one.
    pub fn member_uri(&self, host: &str) -> String {
        format!(
            "mongodb://{}/?directConnection=true&serverSelectionTimeoutMS={}",
            host,
            self.server_selection_timeout.as_millis()
        )
    }

    /// Router URI with the server selection timeout applied unless already given
    pub fn router_uri(&self, uri: &str) -> String {
        if uri.contains("serverSelectionTimeoutMS") {
            return uri.to_string();
        }

        let separator = match uri.split_once("://").map(|(_, rest)| rest) {
            Some(rest) if rest.contains('?') => "&",
            Some(rest) if rest.contains('/') => "?",
            _ => "/?",
        };
        format!(
            "{}{}serverSelectionTimeoutMS={}",
            uri,
            separator,
            self.server_selection_timeout.as_millis()
        )
    }

    fn client(&mut self, uri: &str) -> SeedResult<&Client> {
        if !self.clients.contains_key(uri) {
            debug!("Opening connection: {}", uri);
            let client = Client::with_uri_str(uri).map_err(|e| map_driver_error(uri, e))?;
            self.clients.insert(uri.to_string(), client);
        }

        self.clients
            .get(uri)
            .ok_or_else(|| SeedError::Connection {
                target: uri.to_string(),
                message: "client cache lost the connection".to_string(),
            })
    }

    fn run_admin_command(&mut self, uri: &str, label: &str, command: Document) -> SeedResult<Document> {
        debug!("{} <- {}", label, command);
        let client = self.client(uri)?;

        client
            .database("admin")
            .run_command(command)
            .run()
            .map_err(|e| map_driver_error(label, e))
    }
}

impl AdminClient for MongoAdmin {
    fn initiate_replica_set(&mut self, target: &str, replica_set: &ReplicaSet) -> SeedResult<()> {
        let uri = self.member_uri(target);
        let command = doc! { "replSetInitiate": replica_set.to_document() };

        self.run_admin_command(&uri, target, command)?;
        Ok(())
    }

    fn add_shard(&mut self, router: &str, seed: &str) -> SeedResult<()> {
        let uri = self.router_uri(router);
        let command = doc! { "addShard": seed };

        let reply = self.run_admin_command(&uri, router, command)?;
        if let Ok(added) = reply.get_str("shardAdded") {
            debug!("Router registered shard as '{}'", added);
        }
        Ok(())
    }

    fn replica_set_config(&mut self, target: &str) -> SeedResult<Option<ReplicaSet>> {
        let uri = self.member_uri(target);
        let command = doc! { "replSetGetConfig": 1 };

        let reply = match self.run_admin_command(&uri, target, command) {
            Ok(reply) => reply,
            Err(SeedError::Command { code, .. }) if code == NOT_YET_INITIALIZED => return Ok(None),
            Err(e) => return Err(e),
        };

        let config = reply
            .get_document("config")
            .map_err(|e| unexpected_reply(target, "replSetGetConfig", e))?;
        let config: ReplicaSetConfig = bson::from_document(config.clone())
            .map_err(|e| unexpected_reply(target, "replSetGetConfig", e))?;

        Ok(Some(ReplicaSet {
            id: config.id,
            configsvr: config.configsvr,
            connect: None,
            members: config
                .members
                .into_iter()
                .map(|m| Member { id: m.id, host: m.host })
                .collect(),
        }))
    }

    fn list_shards(&mut self, router: &str) -> SeedResult<Vec<String>> {
        let uri = self.router_uri(router);
        let reply = self.run_admin_command(&uri, router, doc! { "listShards": 1 })?;

        let shards = reply
            .get_array("shards")
            .map_err(|e| unexpected_reply(router, "listShards", e))?;

        let mut hosts = Vec::with_capacity(shards.len());
        for shard in shards {
            let host = shard
                .as_document()
                .and_then(|d| d.get_str("host").ok())
                .ok_or_else(|| SeedError::Configuration(format!(
                    "Unexpected listShards reply from {}: shard entry without a host",
                    router
                )))?;
            hosts.push(host.to_string());
        }

        Ok(hosts)
    }
}

/// Map a driver error onto a server command failure or an unreachable target
fn map_driver_error(target: &str, err: DriverError) -> SeedError {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => SeedError::Command {
            target: target.to_string(),
            code: command.code,
            code_name: command.code_name.clone(),
            message: command.message.clone(),
        },
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
            SeedError::Connection {
                target: target.to_string(),
                message: err.to_string(),
            }
        }
        _ => SeedError::Anyhow(anyhow::Error::new(err).context(format!("Driver error talking to {}", target))),
    }
}

fn unexpected_reply(target: &str, command: &str, err: impl std::fmt::Display) -> SeedError {
    SeedError::Configuration(format!(
        "Unexpected {} reply from {}: {}",
        command, target, err
    ))
}
