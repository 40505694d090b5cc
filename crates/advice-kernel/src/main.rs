//! advice-kernel command line

use advice_kernel::demo::run_demo;
use advice_kernel::logging::init_tracing;
use advice_kernel::RuntimeConfig;
use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("advice-kernel")
        .version(advice_kernel::VERSION)
        .about("Before/after method advice over a type hierarchy")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Runtime configuration file (TOML)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log filter directive, overrides RUST_LOG"),
        )
        .subcommand(Command::new("demo").about("Run the canonical advice scenarios"))
        .subcommand(
            Command::new("report")
                .about("Run the scenarios and print the composition records they leave")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    init_tracing(
        matches.get_one::<String>("log-level").map(String::as_str),
        config.log_format,
    )?;

    let report = run_demo(&config)?;

    match matches.subcommand() {
        Some(("demo", _)) => {
            println!("{}", report.generate_text());
        }
        Some(("report", args)) => {
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.generate_records_text());
            }
        }
        _ => unreachable!("subcommand required"),
    }

    if !report.passed() {
        tracing::error!(failures = report.failures(), "demo failed");
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn global_options_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["advice-kernel", "report", "--json", "--log-level", "debug"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("log-level").map(String::as_str),
            Some("debug")
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "report");
        assert!(args.get_flag("json"));
    }

    #[test]
    fn subcommand_required() {
        assert!(cli().try_get_matches_from(["advice-kernel"]).is_err());
    }
}
