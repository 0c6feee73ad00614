use console::style;
use std::sync::Once;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Static to ensure we only initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Initialize the logging subsystem
///
/// `RUST_LOG` is honoured; the verbose flag only raises the default level
/// for the clusterseed crates.
pub fn init_logging(verbose: bool) {
    INIT_LOGGER.call_once(|| {
        let log_level = if verbose { Level::DEBUG } else { Level::WARN };

        let mut filter = EnvFilter::from_default_env();
        for target in ["clusterseed", "clusterseed_core"] {
            if let Ok(directive) = format!("{}={}", target, log_level).parse() {
                filter = filter.add_directive(directive);
            }
        }

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Warning: Could not set global default tracing subscriber: {}", e);
        } else {
            debug!("Logging initialized at level: {}", log_level);
        }
    });
}

// Console helpers print to the terminal only; diagnostics go through tracing.

/// Log a success message
pub fn log_success(message: &str) {
    println!("{} {}", style("✓").bold().green(), message);
}

/// Log a warning message
pub fn log_warning(message: &str) {
    println!("{} {}", style("!").bold().yellow(), message);
}

/// Log an error message
pub fn log_error(message: &str) {
    eprintln!("{} {}", style("✗").bold().red(), message);
}

/// Log a step message
pub fn log_step(message: &str) {
    println!("{} {}", style(">>>").bold().blue(), message);
}

/// Log a debug message
pub fn log_debug(message: &str) {
    debug!("{}", message);
}
