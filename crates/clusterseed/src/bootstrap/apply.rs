use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

use clusterseed_core::{SeedError, SeedResult, log_error, log_step, log_success};

use super::plan::{BootstrapPlan, Step};
use crate::admin::AdminClient;

/// What a bootstrap run did
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Labels of the steps that completed, in order
    pub completed: Vec<String>,
}

impl BootstrapReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Run every step of the plan against the cluster, one at a time
///
/// Stops at the first failure. Nothing is retried and completed steps are
/// left in place.
pub fn apply<C: AdminClient + ?Sized>(
    plan: &BootstrapPlan,
    client: &mut C,
    show_progress: bool,
) -> SeedResult<BootstrapReport> {
    let started_at = Utc::now();
    let mut completed = Vec::with_capacity(plan.len());

    for step in &plan.steps {
        let label = step.label();
        log_step(&format!("{}...", capitalize(&label)));

        let spinner = show_progress.then(|| spinner(step));
        let result = run_step(step, client);

        if let Some(pb) = spinner {
            match &result {
                Ok(()) => pb.finish_with_message(format!("{} {}", style("✓").green().bold(), step)),
                Err(_) => pb.finish_with_message(format!("{} {}", style("✗").red().bold(), step)),
            }
        }

        if let Err(e) = result {
            log_error(&format!("Failed to {}", label));
            return Err(SeedError::StepFailed {
                step: label,
                source: Box::new(e),
            });
        }

        completed.push(label);
    }

    let report = BootstrapReport {
        started_at,
        finished_at: Utc::now(),
        completed,
    };
    log_success(&format!(
        "Sharded cluster initialization complete ({} steps)",
        report.completed.len()
    ));

    Ok(report)
}

fn run_step<C: AdminClient + ?Sized>(step: &Step, client: &mut C) -> SeedResult<()> {
    match step {
        Step::InitiateReplicaSet { target, replica_set } => {
            client.initiate_replica_set(target, replica_set)
        }
        Step::AddShard { router, seed } => client.add_shard(router, seed),
    }
}

fn spinner(step: &Step) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(template);
    }
    pb.set_message(step.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
