use clap::Parser;
use catalog::cli::commands::Cli;
use catalog::cli::handlers;
use catalog::io::config_io::load_config;
use catalog::logging::{LogConfig, LogTarget, init_logging};

fn main() {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
    let config = match load_config(cli.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    // The TUI owns the terminal, so it only logs to a file
    let target = match (&cli.log_file, &cli.command) {
        (Some(path), _) => LogTarget::File(path.clone()),
        (None, None) => LogTarget::Off,
        (None, Some(_)) => LogTarget::Stderr,
    };
    if let Err(e) = init_logging(&LogConfig::from_verbosity(cli.verbose).with_target(target)) {
        eprintln!("error: could not open log file: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = handlers::dispatch(cli, &config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
