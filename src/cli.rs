use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
    /// Show all available debugging information
    Debug,
}

/// Validate a Jenkinsfile against a Jenkins server
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "validate-jenkinsfile")]
#[command(
    about = "Validate a declarative Jenkinsfile using a Jenkins server's pipeline-model-converter endpoint"
)]
#[command(version)]
pub struct Cli {
    /// Jenkinsfile to validate, relative to the base directory
    #[arg(short = 'f', long = "jenkinsfile")]
    pub jenkinsfile: Option<PathBuf>,

    /// Project base directory
    #[arg(short = 'C', long = "basedir")]
    pub basedir: Option<PathBuf>,

    /// Jenkins base URL (e.g. http://localhost:8080/jenkins)
    #[arg(short = 's', long = "server")]
    pub server: Option<String>,

    /// Username for preemptive Basic authentication
    #[arg(short = 'u', long = "username")]
    pub username: Option<String>,

    /// Password or API token for preemptive Basic authentication
    #[arg(short = 'p', long = "password")]
    pub password: Option<String>,

    /// Accept any TLS certificate and hostname (insecure)
    #[arg(short = 'k', long = "insecure-ssl")]
    pub insecure_ssl: bool,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable quiet mode (errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Prefix error messages with the time they were reported
    #[arg(long = "timestamps")]
    pub timestamps: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Verbosity requested on the command line alone
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else {
            match self.verbose {
                0 => VerbosityLevel::Normal,
                1 => VerbosityLevel::Verbose,
                _ => VerbosityLevel::Debug,
            }
        }
    }
}
