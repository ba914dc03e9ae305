#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

mod network;
mod server_config;
mod server_main;

use clap::{arg, Command};

use crate::server_config::ServerConfig;

fn main() {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let matches = Command::new("Duel")
        .version(clap::crate_version!())
        .about("Two-player chess web app server")
        .subcommand_required(true)
        .subcommand(
            Command::new("server").about("Run the game server").arg(arg!(
                [config_file] "Path to the configuration file: yaml-serialized ServerConfig."
            )),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("server", sub_matches)) => {
            let config = match sub_matches.get_one::<String>("config_file") {
                Some(filename) => read_config_file(filename),
                None => ServerConfig::default(),
            };
            server_main::run(config);
        }
        _ => unreachable!("Exhausted list of subcommands and subcommand_required prevents `None`"),
    }
}

fn read_config_file(filename: &str) -> ServerConfig {
    let contents = std::fs::read_to_string(filename).expect("Reading config file");
    serde_yaml::from_str(&contents).expect("Parsing config file")
}
