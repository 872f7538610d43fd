#![forbid(unsafe_code)]

use crate::config::NetlevelAction;
use clap::Parser;
use config::Args;

mod app;
mod config;
mod decode;
mod print;
mod report;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    match NetlevelAction::from(args)? {
        NetlevelAction::Decode(cfg) => app::run_netlevel(&cfg)?,
        NetlevelAction::PrintConfigTemplate => print::print_config_template(),
    }
    Ok(())
}
