use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use clusterseed_core::{SeedError, SeedResult};

use crate::admin::AdminClient;
use crate::topology::Topology;

/// The outcome of one check against the live cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl Check {
    fn pass(name: String, detail: String) -> Self {
        Self { name, passed: true, detail }
    }

    fn fail(name: String, detail: String) -> Self {
        Self { name, passed: false, detail }
    }
}

/// All checks of a verification run
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub checked_at: DateTime<Utc>,
    pub checks: Vec<Check>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed)
    }

    pub fn to_yaml(&self) -> SeedResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            let mark = if check.passed { "ok  " } else { "FAIL" };
            writeln!(f, "[{}] {}: {}", mark, check.name, check.detail)?;
        }
        Ok(())
    }
}

/// Compare the cluster's replica sets and shard registrations with the topology
///
/// Unreachable members and an unreachable router are reported as failed checks
/// rather than errors so one down node does not hide the state of the others.
pub fn verify<C: AdminClient + ?Sized>(topology: &Topology, client: &mut C) -> SeedResult<VerificationReport> {
    let mut checks = Vec::new();

    for expected in &topology.replica_sets {
        let Some(target) = expected.seed_host() else {
            continue;
        };

        let actual = match client.replica_set_config(target) {
            Ok(Some(actual)) => actual,
            Ok(None) => {
                checks.push(Check::fail(
                    format!("replica set {} initiated", expected.id),
                    format!("{} reports no replica set configuration", target),
                ));
                continue;
            }
            Err(SeedError::Connection { message, .. }) => {
                checks.push(Check::fail(
                    format!("replica set {} initiated", expected.id),
                    format!("{} unreachable: {}", target, message),
                ));
                continue;
            }
            Err(e) => return Err(e),
        };

        if actual.id == expected.id {
            checks.push(Check::pass(
                format!("replica set {} initiated", expected.id),
                format!("{} is a member of {}", target, actual.id),
            ));
        } else {
            checks.push(Check::fail(
                format!("replica set {} initiated", expected.id),
                format!("{} belongs to replica set {}", target, actual.id),
            ));
        }

        let flag = format!("replica set {} configsvr", expected.id);
        let flag_detail = format!("expected {}, found {}", expected.configsvr, actual.configsvr);
        checks.push(if actual.configsvr == expected.configsvr {
            Check::pass(flag, flag_detail)
        } else {
            Check::fail(flag, flag_detail)
        });

        let members = format!("replica set {} members", expected.id);
        let expected_hosts = expected.member_hosts();
        let actual_hosts = actual.member_hosts();
        let members_detail = format!("expected [{}], found [{}]", expected_hosts.join(", "), actual_hosts.join(", "));
        checks.push(if actual_hosts == expected_hosts {
            Check::pass(members, members_detail)
        } else {
            Check::fail(members, members_detail)
        });
    }

    checks.push(match client.list_shards(&topology.router.uri) {
        Ok(reported) => check_shards(topology, &reported),
        Err(SeedError::Connection { message, .. }) => Check::fail(
            "router shards".to_string(),
            format!("{} unreachable: {}", topology.router.uri, message),
        ),
        Err(e) => return Err(e),
    });

    Ok(VerificationReport {
        checked_at: Utc::now(),
        checks,
    })
}

/// Match every shard seed against the router's `listShards` hosts
///
/// The router reports `<setName>/<member hosts>` from the replica set config,
/// not the seed it was given, so a seed matches an entry with the same set
/// name whose hosts include all of the seed's hosts.
fn check_shards(topology: &Topology, reported: &[String]) -> Check {
    let reported_sets: Vec<(&str, Vec<&str>)> = reported
        .iter()
        .map(|entry| match entry.split_once('/') {
            Some((name, hosts)) => (name, hosts.split(',').collect()),
            None => (entry.as_str(), Vec::new()),
        })
        .collect();

    let mut claimed = vec![false; reported_sets.len()];
    let mut missing = Vec::new();

    for shard in &topology.shards {
        let (name, hosts) = match shard.seed.split_once('/') {
            Some((name, hosts)) => (name, hosts.split(',').collect::<Vec<_>>()),
            None => (shard.seed.as_str(), Vec::new()),
        };

        let found = reported_sets.iter().enumerate().position(|(i, (set, set_hosts))| {
            !claimed[i] && *set == name && hosts.iter().all(|h| set_hosts.contains(h))
        });

        match found {
            Some(i) => claimed[i] = true,
            None => missing.push(shard.seed.as_str()),
        }
    }

    let extra: Vec<&str> = reported
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(entry, _)| entry.as_str())
        .collect();

    let detail = format!(
        "expected [{}], found [{}]",
        topology.shards.iter().map(|s| s.seed.as_str()).collect::<Vec<_>>().join(", "),
        reported.join(", ")
    );

    if missing.is_empty() && extra.is_empty() {
        Check::pass("router shards".to_string(), detail)
    } else {
        Check::fail(
            "router shards".to_string(),
            format!("{}; unmatched seeds [{}], unexpected shards [{}]", detail, missing.join(", "), extra.join(", ")),
        )
    }
}
