//! Input validation for names and addresses that end up in admin commands.
//!
//! These are stricter than what the server accepts in places; anything
//! rejected here would either be refused by the server or be almost
//! certainly a typo in the topology manifest.

use crate::error::{SeedError, SeedResult};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Replica set names: letters, digits, dashes and underscores
    static ref REPLICA_SET_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_\-]+$").unwrap();

    // host:port where host is a DNS name, IPv4 address or bare hostname
    static ref HOST_PORT_REGEX: Regex = Regex::new(r"^([A-Za-z0-9_\-\.]+):([0-9]{1,5})$").unwrap();

    // <replicaSetName>/<host:port>[,<host:port>...]
    static ref SHARD_SEED_REGEX: Regex = Regex::new(r"^([A-Za-z0-9_\-]+)/(.+)$").unwrap();
}

/// Validate a replica set name
pub fn validate_replica_set_name(name: &str) -> SeedResult<&str> {
    if name.is_empty() {
        return Err(SeedError::Validation("Replica set name cannot be empty".to_string()));
    }

    if !REPLICA_SET_NAME_REGEX.is_match(name) {
        return Err(SeedError::Validation(format!(
            "Invalid replica set name: '{}'. Names may contain only letters, numbers, dashes and underscores.",
            name
        )));
    }

    Ok(name)
}

/// Validate a `host:port` address
pub fn validate_host_port(address: &str) -> SeedResult<&str> {
    let captures = HOST_PORT_REGEX.captures(address).ok_or_else(|| {
        SeedError::Validation(format!(
            "Invalid address: '{}'. Expected the form host:port",
            address
        ))
    })?;

    let port: u32 = captures[2].parse().unwrap_or(0);
    if !(1..=65535).contains(&port) {
        return Err(SeedError::Validation(format!(
            "Invalid port in '{}': must be between 1 and 65535",
            address
        )));
    }

    Ok(address)
}

/// Split a shard seed string into its replica set name and member addresses
pub fn parse_shard_seed(seed: &str) -> SeedResult<(&str, Vec<&str>)> {
    let captures = SHARD_SEED_REGEX.captures(seed).ok_or_else(|| {
        SeedError::Validation(format!(
            "Invalid shard seed: '{}'. Expected <replicaSetName>/<host>:<port>",
            seed
        ))
    })?;

    let name = captures.get(1).map_or("", |m| m.as_str());
    let hosts_part = captures.get(2).map_or("", |m| m.as_str());

    let mut hosts = Vec::new();
    for host in hosts_part.split(',') {
        hosts.push(validate_host_port(host)?);
    }

    Ok((name, hosts))
}

/// Test if a string is a valid `host:port` without generating errors
pub fn is_valid_host_port(address: &str) -> bool {
    validate_host_port(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_set_names() {
        assert!(validate_replica_set_name("configReplSet").is_ok());
        assert!(validate_replica_set_name("shard-1_a").is_ok());
        assert!(validate_replica_set_name("").is_err());
        assert!(validate_replica_set_name("shard 1").is_err());
        assert!(validate_replica_set_name("shard/1").is_err());
    }

    #[test]
    fn host_port_addresses() {
        assert!(is_valid_host_port("localhost:27018"));
        assert!(is_valid_host_port("10.0.0.4:27017"));
        assert!(is_valid_host_port("db-1.internal.example:65535"));
        assert!(!is_valid_host_port("localhost"));
        assert!(!is_valid_host_port("localhost:0"));
        assert!(!is_valid_host_port("localhost:70000"));
        assert!(!is_valid_host_port(":27017"));
    }

    #[test]
    fn shard_seeds_keep_names_verbatim() {
        let (name, hosts) = parse_shard_seed("shard1ReplSet/shard1:27019").unwrap();
        assert_eq!(name, "shard1ReplSet");
        assert_eq!(hosts, vec!["shard1:27019"]);

        let (name, hosts) = parse_shard_seed("rs0/a:1,b:2").unwrap();
        assert_eq!(name, "rs0");
        assert_eq!(hosts, vec!["a:1", "b:2"]);
    }

    #[test]
    fn malformed_shard_seeds() {
        assert!(parse_shard_seed("shard1:27019").is_err());
        assert!(parse_shard_seed("shard1ReplSet/").is_err());
        assert!(parse_shard_seed("shard1ReplSet/shard1").is_err());
        assert!(parse_shard_seed("/shard1:27019").is_err());
    }
}
