//! layerconf — layered CLI configuration demo.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use layerconf::constants;
use layerconf::{ResolveError, Resolver};

use std::env;
use std::ffi::OsString;
use std::iter;
use std::process;

use anyhow::{Context, Result, bail};

use cli::args::{Cli, Command, DEFAULT_COMMAND, Report, ShowArgs};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let log = cli::init_logging();

    let resolver = Resolver::new(constants::ENV_CONFIG);
    let mut cli = resolve(&resolver)?;
    if cli.command.is_none() {
        // Resolve again with the default subcommand so its flags see the
        // config file too.
        let args = env::args_os()
            .skip(1)
            .chain(iter::once(OsString::from(DEFAULT_COMMAND)));
        cli = resolve(&resolver.clone().with_args(args))?;
    }
    cli::set_verbose(&log, cli.verbose);

    match &cli.command {
        Some(Command::Check) => run_check(&resolver, &cli),
        Some(Command::Show(args)) => run_show(&cli, args),
        None => bail!("no command resolved"),
    }
}

fn resolve(resolver: &Resolver) -> Result<Cli> {
    match resolver.parse() {
        Ok(cli) => Ok(cli),
        // Help, version and usage errors keep clap's own output and exit codes.
        Err(ResolveError::Argument(err)) => err.exit(),
        Err(err) => Err(err).context("failed to resolve configuration"),
    }
}

/// Print the merged configuration.
fn run_show(cli: &Cli, args: &ShowArgs) -> Result<()> {
    let report = Report {
        cli,
        workers: args.workers,
    };
    let rendered = if args.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .context("failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}

/// Report where the configuration came from.
fn run_check(resolver: &Resolver, cli: &Cli) -> Result<()> {
    match resolver.locate(cli) {
        Some(location) => {
            println!("config: {} (from {})", location.path.display(), location.origin);
        }
        None => {
            println!(
                "config: none (set --config or ${}); using flags and defaults",
                resolver.env_var()
            );
        }
    }
    Ok(())
}
