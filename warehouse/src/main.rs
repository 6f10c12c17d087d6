use anyhow::{Context, bail};
use clap::{Arg, Command};
use etl::build_time_dimension;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/warehouse.toml";

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cli() -> Command {
    Command::new("warehouse-cli")
        .version("1.0")
        .about("Builds the vehicle-registration star schema from a CSV extract")
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["text", "json"])
                .default_value("text")
                .global(true)
                .help("Log output format"),
        )
        .subcommand(
            Command::new("run")
                .about("Run the full warehouse pipeline")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .default_value(DEFAULT_CONFIG)
                        .help("Sets a custom config file"),
                ),
        )
        .subcommand(
            Command::new("time-dimension")
                .about("Build the time dimension and print its size and range"),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let log_format = matches
        .get_one::<String>("log-format")
        .map(String::as_str)
        .unwrap_or("text");
    init_tracing(log_format);

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let config_path = run_matches
                .get_one::<String>("config")
                .map(String::as_str)
                .unwrap_or(DEFAULT_CONFIG);
            info!(config = config_path, "Starting warehouse pipeline");

            let summary = warehouse::run_warehouse_pipeline(config_path)
                .await
                .with_context(|| format!("warehouse run with config {} aborted", config_path))?;

            if !summary.succeeded() {
                let failed: Vec<&str> = summary
                    .failed_stages()
                    .map(|stage| stage.name.as_str())
                    .collect();
                bail!("warehouse run {} failed at {:?}", summary.run_id, failed);
            }
            Ok(())
        }
        Some(("time-dimension", _)) => {
            let dimension = build_time_dimension().context("building the time dimension")?;
            let first = dimension.rows.first().map(|row| row.fecha_completa);
            let last = dimension.rows.last().map(|row| row.fecha_completa);
            println!(
                "{} rows from {} to {}",
                dimension.len(),
                first.map(|d| d.to_string()).unwrap_or_default(),
                last.map(|d| d.to_string()).unwrap_or_default()
            );
            Ok(())
        }
        _ => bail!("No subcommand specified. Use --help for usage information."),
    }
}
