use std::process::ExitCode;
use std::time::Duration;

use clap::{Arg, ArgAction, Command, value_parser};
use tracing::error;
use tracing_subscriber::EnvFilter;

use zoneinfo::config::{InspectConfig, parse_resolver};
use zoneinfo::inspect::ZoneInspector;
use zoneinfo::render::render_report;

fn cli() -> Command {
    Command::new("zoneinfo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Report on a DNS zone's nameservers, their reachability and its DNSSEC deployment")
        .arg(
            Arg::new("zones")
                .value_name("ZONE")
                .help("Zones to inspect")
                .required(true)
                .num_args(1..),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Print the debug trace as it is recorded")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Per-query timeout")
                .value_parser(value_parser!(u64).range(1..=300)),
        )
        .arg(
            Arg::new("resolver")
                .short('r')
                .long("resolver")
                .value_name("ADDRESS[:PORT]")
                .help("Recursive resolver to use (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("no-dlv")
                .long("no-dlv")
                .help("Skip the DNSSEC lookaside lookup")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dlv-suffix")
                .long("dlv-suffix")
                .value_name("SUFFIX")
                .help("Lookaside registry to query"),
        )
        .arg(
            Arg::new("system-resolver")
                .long("system-resolver")
                .help("Resolve nameserver addresses with the operating system resolver")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Emit reports as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("deadline")
                .long("deadline")
                .value_name("SECONDS")
                .help("Give up on a zone after this long")
                .value_parser(value_parser!(u64).range(1..)),
        )
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    let debug = matches.get_flag("debug");

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match InspectConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    config.debug |= debug;
    if let Some(&secs) = matches.get_one::<u64>("timeout") {
        config.query_timeout = Duration::from_secs(secs);
    }
    if let Some(&secs) = matches.get_one::<u64>("deadline") {
        config.deadline = Some(Duration::from_secs(secs));
    }
    if matches.get_flag("no-dlv") {
        config.check_dlv = false;
    }
    if let Some(suffix) = matches.get_one::<String>("dlv-suffix") {
        config.dlv_suffix = suffix.clone();
    }
    if let Some(resolvers) = matches.get_many::<String>("resolver") {
        match resolvers
            .map(|r| parse_resolver(r))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(resolvers) => config.resolvers = resolvers,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    let mut inspector = match ZoneInspector::new(config) {
        Ok(inspector) => inspector,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if matches.get_flag("system-resolver") {
        inspector = inspector.with_system_resolver();
    }

    let json = matches.get_flag("json");
    let mut failed = false;
    for zone in matches.get_many::<String>("zones").into_iter().flatten() {
        match inspector.inspect_zone(zone).await {
            Ok(report) if json => match serde_json::to_string_pretty(&report) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    error!("Failed to serialize report for {}: {}", zone, e);
                    failed = true;
                }
            },
            Ok(report) => println!("{}", render_report(&report)),
            Err(failure) => {
                eprintln!("ERROR: {}: {}", zone, failure.error);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
