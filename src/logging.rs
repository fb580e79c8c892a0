use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::VerbosityLevel;

/// Filter used when `RUST_LOG` is not set
fn default_directive(verbosity: VerbosityLevel) -> &'static str {
    match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "warn,validate_jenkinsfile=info",
        VerbosityLevel::Debug => "info,validate_jenkinsfile=debug",
    }
}

/// Initialize structured logging to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity derived from the CLI.
pub fn init_logging(verbosity: VerbosityLevel) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    tracing::debug!(?verbosity, "logging initialized");

    Ok(())
}
