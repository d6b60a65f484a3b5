//! aimbridge - replay driver
//!
//! Runs a scripted scenario through the bridge and prints every host callback,
//! resolved direction and suppression flag, frame by frame.

use aimbridge::config::BridgeConfig;
use aimbridge::logging::init_logging;
use aimbridge::replay::{self, Scenario};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("aimbridge")
        .version(aimbridge::VERSION)
        .about("VR aim resolution and ability slot arbitration bridge")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("replay")
                .about("Replay a scenario file and print the host callback trace")
                .arg(
                    Arg::new("scenario")
                        .help("Path to the scenario TOML file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Bridge config file (defaults to the platform config dir)"),
                )
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .short('v')
                        .action(ArgAction::SetTrue)
                        .help("Enable debug logging"),
                ),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let Some(("replay", args)) = matches.subcommand() else {
        anyhow::bail!("unknown subcommand");
    };

    init_logging(args.get_flag("verbose"));

    let Some(scenario_path) = args.get_one::<String>("scenario").map(PathBuf::from) else {
        anyhow::bail!("scenario path is required");
    };
    let config_path = args.get_one::<String>("config").map(PathBuf::from);

    let config = BridgeConfig::load_or_default(config_path.as_deref())
        .context("Failed to load bridge config")?;
    let scenario = Scenario::load(&scenario_path)
        .with_context(|| format!("Failed to load scenario {}", scenario_path.display()))?;

    log::info!(
        "replaying {} frame(s) from {}",
        scenario.frames.len(),
        scenario_path.display()
    );

    let (reports, _) = replay::run(config, &scenario);
    for report in reports {
        println!("{report}");
    }

    Ok(())
}
