use std::process::ExitCode;

use validate_jenkinsfile::{Cli, ConfigManager, ErrorReporter, Output, init_logging, try_validate};

/// Exit status for configuration problems, distinct from a failed validation
const CONFIG_ERROR_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(error) => {
            ErrorReporter::with_options(cli.verbosity(), cli.timestamps)
                .report_config_error(&error);
            return ExitCode::from(CONFIG_ERROR_EXIT);
        }
    };

    let verbosity = config.verbosity();
    if let Err(error) = init_logging(verbosity) {
        eprintln!("{error:#}");
    }

    let settings = config.settings();
    match try_validate(&settings).await {
        Ok(file) => {
            if let Some(line) = Output::new(verbosity).format_success(&file, &settings) {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            ErrorReporter::with_options(verbosity, config.output.timestamps)
                .report_validation_error(&error);
            ExitCode::FAILURE
        }
    }
}
