//! Sonde Binary Entry Point
//!
//! Validates a configuration file or runs a single probe and prints its
//! metrics. Core functionality is provided by the `sonde` library crate.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use sonde::{
    config::{Config, parse_duration},
    prober::{Deadline, ProberRegistry},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sonde - Configuration-Driven Network Probing
#[derive(Parser, Debug)]
#[command(name = "sonde", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sonde.yml", env = "SONDE_CONFIG")]
    config: String,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,

    /// Print the loaded configuration with secrets redacted and exit
    #[arg(long)]
    dump: bool,

    /// Module to probe with
    #[arg(short, long, required_unless_present_any = ["check", "dump"])]
    module: Option<String>,

    /// Target to probe (e.g. `ldap.example.org:389`)
    #[arg(short, long, required_unless_present_any = ["check", "dump"])]
    target: Option<String>,

    /// Overall probe timeout; a shorter module timeout wins
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sonde=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!(path = %cli.config, "Loading configuration");
    let config = Config::load(&cli.config).inspect_err(|e| {
        tracing::error!(path = %cli.config, error = %e, "Invalid configuration");
    })?;

    if cli.check {
        tracing::info!(modules = config.modules.len(), "Configuration is valid");
        return Ok(ExitCode::SUCCESS);
    }

    if cli.dump {
        print!("{}", config.to_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let (Some(module), Some(target)) = (cli.module.as_deref(), cli.target.as_deref()) else {
        return Err("--module and --target are required to run a probe".into());
    };

    let registry = ProberRegistry::default();
    let report = registry
        .run_module(&config, module, target, Deadline::after(cli.timeout))
        .await?;

    print!("{}", report.render());

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
