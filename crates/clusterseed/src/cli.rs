use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use dialoguer::Confirm;
use std::path::PathBuf;

use clusterseed_core::config::{self, Settings};
use clusterseed_core::{filesystem, init_logging, log_success, log_warning, SeedError};

use crate::admin::MongoAdmin;
use crate::bootstrap::{self, BootstrapPlan};
use crate::topology::Topology;
use crate::verify;

#[derive(Debug, Parser)]
#[command(author, version = crate::VERSION, about = "Bootstrap a sharded MongoDB cluster", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Topology manifest (defaults to ~/.clusterseed/topology.toml, or the built-in cluster when absent)
    #[arg(short, long, global = true)]
    pub topology: Option<PathBuf>,

    /// Router URI, overriding the topology and settings
    #[arg(long, global = true)]
    pub router: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write the default topology manifest
    Init {
        /// Overwrite an existing manifest
        #[arg(short, long)]
        force: bool,
    },

    /// Show the admin commands that would be sent, in order
    Plan,

    /// Initiate the replica sets and register the shards
    Apply {
        /// Print the plan without contacting the cluster
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check the cluster state against the topology
    Verify {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show or change settings
    Config {
        /// Setting to read or write
        key: Option<String>,

        /// New value
        value: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Yaml,
}

/// Run the clusterseed CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

/// Dispatch a parsed command line
///
/// Settings are loaded only by the commands that use them, so `config` can
/// still repair a broken settings file.
pub fn execute(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Init { force } => init(&cli, &Settings::load()?, *force),
        Commands::Plan => {
            let settings = Settings::load()?;
            let topology = load_topology(&cli, &settings)?;
            let plan = bootstrap::plan(&topology)?;
            print_plan(&plan);
            Ok(())
        }
        Commands::Apply { dry_run, yes } => {
            let settings = Settings::load()?;
            let topology = load_topology(&cli, &settings)?;
            let plan = bootstrap::plan(&topology)?;

            if *dry_run {
                println!("{} no commands will be sent", style("Dry run:").bold().yellow());
                print_plan(&plan);
                return Ok(());
            }

            if !*yes {
                let prompt = format!("Send {} admin commands to the cluster?", plan.len());
                let confirmed = Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .map_err(SeedError::from)?;
                if !confirmed {
                    println!("Aborted, nothing was sent.");
                    return Ok(());
                }
            }

            let mut admin = MongoAdmin::new(settings.server_selection_timeout());
            let report = bootstrap::apply(&plan, &mut admin, true)?;
            println!(
                "Completed {} steps in {} ms",
                report.completed.len(),
                report.elapsed().num_milliseconds()
            );
            Ok(())
        }
        Commands::Verify { format } => {
            let settings = Settings::load()?;
            let topology = load_topology(&cli, &settings)?;
            let mut admin = MongoAdmin::new(settings.server_selection_timeout());
            let report = verify::verify(&topology, &mut admin)?;

            match format {
                OutputFormat::Text => print!("{}", report),
                OutputFormat::Yaml => print!("{}", report.to_yaml()?),
            }

            let failed = report.failures().count();
            if failed > 0 {
                bail!("{} of {} checks failed", failed, report.checks.len());
            }
            log_success("Cluster matches the topology");
            Ok(())
        }
        Commands::Config { key, value } => configure(key.as_deref(), value.as_deref()),
    }
}

fn topology_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    match &cli.topology {
        Some(path) => Ok(filesystem::expand_path(&path.to_string_lossy())),
        None => Ok(settings.topology_path()?),
    }
}

/// Load and validate the topology, applying router overrides
///
/// A manifest named with `--topology` must exist; the default location falls
/// back to the built-in cluster.
fn load_topology(cli: &Cli, settings: &Settings) -> Result<Topology> {
    let path = topology_path(cli, settings)?;

    let mut topology = if cli.topology.is_some() {
        if !filesystem::file_exists(&path) {
            bail!("Topology file not found: {}", path.display());
        }
        Topology::from_file(&path)?
    } else {
        Topology::load_or_default(&path)?
    };

    if let Some(uri) = cli.router.as_ref().or(settings.router_uri.as_ref()) {
        topology.router.uri = uri.clone();
    }

    for warning in topology.validate()? {
        log_warning(&warning);
    }

    Ok(topology)
}

fn init(cli: &Cli, settings: &Settings, force: bool) -> Result<()> {
    let path = topology_path(cli, settings)?;

    if filesystem::file_exists(&path) && !force {
        bail!(
            "Topology already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    Topology::default_cluster().to_file(&path)?;
    log_success(&format!("Wrote topology: {}", path.display()));
    Ok(())
}

fn print_plan(plan: &BootstrapPlan) {
    for (i, step) in plan.steps.iter().enumerate() {
        println!("{:>2}. {}", i + 1, step);
    }
}

fn configure(key: Option<&str>, value: Option<&str>) -> Result<()> {
    let path = Settings::config_path()?;

    match (key, value) {
        (Some(key), Some(value)) => {
            config::set_value(&path, key, value)?;
            log_success(&format!("Set {} = {}", key, value));
        }
        (Some(key), None) => match config::get_value(&path, key)? {
            Some(value) => println!("{}", value),
            None => bail!("Setting '{}' is not set", key),
        },
        (None, _) => {
            let table = config::load_table(&path)?;
            if table.is_empty() {
                println!("No settings in {} (defaults in use)", path.display());
            } else {
                print!("{}", toml::to_string_pretty(&table)?);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "clusterseed",
            "apply",
            "--dry-run",
            "--topology",
            "/tmp/t.toml",
            "--router",
            "mongodb://mongos:27017",
        ])
        .unwrap();

        assert_eq!(cli.topology, Some(PathBuf::from("/tmp/t.toml")));
        assert_eq!(cli.router.as_deref(), Some("mongodb://mongos:27017"));
        assert!(matches!(cli.command, Commands::Apply { dry_run: true, yes: false }));
    }

    #[test]
    fn verify_accepts_yaml_format() {
        let cli = Cli::try_parse_from(["clusterseed", "verify", "--format", "yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::Verify { format: OutputFormat::Yaml }));
    }
}
