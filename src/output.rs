//! Success reporting on stdout.

use crate::cli::VerbosityLevel;
use crate::validator::ValidationSettings;

/// Simple output formatter for human-readable results
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Formatter with colors forced on or off
    pub fn with_colors(verbosity: VerbosityLevel, show_colors: bool) -> Self {
        Self {
            verbosity,
            show_colors,
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Success report, or `None` in quiet mode
    pub fn format_success(&self, file: &str, settings: &ValidationSettings) -> Option<String> {
        if self.verbosity == VerbosityLevel::Quiet {
            return None;
        }

        let mut output = self.colorize(&format!("{} Successfully Validated", file), "32");

        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&format!(
                "\n  File: {}",
                settings.basedir.join(&settings.jenkinsfile).display()
            ));
            output.push_str(&format!("\n  Server: {}", settings.server));
            if let Some(credentials) = &settings.credentials {
                output.push_str(&format!("\n  User: {}", credentials.username()));
            }
            if settings.insecure_ssl {
                output.push_str(&format!(
                    "\n  {}",
                    self.colorize("TLS verification disabled", "33")
                ));
            }
        }

        Some(output)
    }
}
