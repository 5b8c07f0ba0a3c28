//! `hotbar` - compose, randomize, and render block palettes from the terminal

mod commands;

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let color = || Arg::new("color").value_name("COLOR").required(true);
    let slot = || {
        Arg::new("slot")
            .value_name("SLOT")
            .required(true)
            .value_parser(value_parser!(usize))
            .help("Slot number, starting at 1")
    };
    let id = || {
        Arg::new("id")
            .value_name("ID")
            .required(true)
            .value_parser(value_parser!(u64))
            .help("Result id as listed by `hotbar history`")
    };

    Command::new("hotbar")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compose, randomize, and render block palettes")
        .subcommand_required(true)
        .arg(
            Arg::new("state-dir")
                .long("state-dir")
                .global(true)
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding the session snapshot [default: .hotbar]"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .global(true)
                .value_parser(value_parser!(u64))
                .help("Random seed for reproducible randomize and render"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging (overrides RUST_LOG)"),
        )
        .subcommand(Command::new("palette").about("List palette colors"))
        .subcommand(Command::new("show").about("Show the hotbar, selections, and active result"))
        .subcommand(
            Command::new("add")
                .about("Put a color in the first empty slot")
                .arg(color()),
        )
        .subcommand(
            Command::new("set")
                .about("Set a slot's color; `-` empties it")
                .arg(slot())
                .arg(color())
                .arg(
                    Arg::new("weight")
                        .long("weight")
                        .value_parser(value_parser!(u32))
                        .help("Also set the weight (manual mode)"),
                ),
        )
        .subcommand(
            Command::new("weight")
                .about("Set a slot's weight (manual mode)")
                .arg(slot())
                .arg(
                    Arg::new("weight")
                        .value_name("N")
                        .required(true)
                        .value_parser(value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("clear")
                .about("Empty one slot, or every slot")
                .arg(slot().required(false)),
        )
        .subcommand(
            Command::new("mode").about("Choose how weights are derived").arg(
                Arg::new("mode")
                    .required(true)
                    .value_parser(["manual", "unit", "count"]),
            ),
        )
        .subcommand(
            Command::new("subset")
                .about("Replace the randomize subset; no colors clears it")
                .arg(Arg::new("colors").value_name("COLOR").num_args(0..)),
        )
        .subcommand(
            Command::new("lock")
                .about("Replace the locked colors; no colors clears them")
                .arg(Arg::new("colors").value_name("COLOR").num_args(0..)),
        )
        .subcommand(
            Command::new("generate")
                .about("Render the current hotbar")
                .arg(
                    Arg::new("width")
                        .long("width")
                        .value_parser(value_parser!(u32))
                        .help("Grid width in blocks"),
                )
                .arg(
                    Arg::new("height")
                        .long("height")
                        .value_parser(value_parser!(u32))
                        .help("Grid height in blocks"),
                )
                .arg(
                    Arg::new("block")
                        .long("block")
                        .value_parser(value_parser!(u32))
                        .help("Pixels per block"),
                ),
        )
        .subcommand(
            Command::new("randomize")
                .about("Randomize the hotbar and render it")
                .arg(
                    Arg::new("subset")
                        .long("subset")
                        .action(ArgAction::SetTrue)
                        .help("Draw from the subset instead of the whole palette"),
                ),
        )
        .subcommand(Command::new("history").about("List recent and pinned results"))
        .subcommand(Command::new("pin").about("Pin or unpin a result").arg(id()))
        .subcommand(
            Command::new("restore")
                .about("Show a cached result and load its hotbar")
                .arg(id()),
        )
        .subcommand(
            Command::new("export")
                .about("Write a result's PNG to a file")
                .arg(
                    Arg::new("path")
                        .value_name("PATH")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("id")
                        .long("id")
                        .value_parser(value_parser!(u64))
                        .help("Result to export [default: active]"),
                ),
        )
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let mut stdout = std::io::stdout().lock();
    match commands::run(&matches, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn global_options_follow_subcommands() {
        let matches = cli()
            .try_get_matches_from(["hotbar", "show", "--state-dir", "/tmp/x", "--seed", "4"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("state-dir"),
            Some(&PathBuf::from("/tmp/x"))
        );
        assert_eq!(matches.get_one::<u64>("seed"), Some(&4));
    }

    #[test]
    fn mode_values_are_restricted() {
        assert!(cli().try_get_matches_from(["hotbar", "mode", "auto"]).is_err());
        assert!(cli().try_get_matches_from(["hotbar", "mode", "count"]).is_ok());
    }
}
