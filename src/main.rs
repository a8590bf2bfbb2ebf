mod build;
mod cli;
mod config;
mod utils;

use anyhow::Result;
use build::{build_site, clean_site, copy_site};
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use config::SiteConfig;
use std::process;
use utils::log::Reporter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = {
        let config_file = cli.root.join(&cli.config);
        let mut config =
            if config_file.exists() { SiteConfig::from_path(&config_file)? }
            else { SiteConfig::default() };
        config.update_with_cli(&cli);
        config.validate()?;
        config
    };

    ctrlc::set_handler(|| {
        eprintln!("{} build interrupted by user", "[error]".bright_red().bold());
        process::exit(1);
    })?;

    let mut report = Reporter::new();
    report.header("typlog");

    let result = if cli.command_is_clean() {
        clean_site(&config, &mut report)
    } else if cli.command_is_copy() {
        copy_site(&config, &mut report)
    } else {
        build_site(&config, &mut report)
    };

    if let Err(err) = result {
        report.fatal(&format!("{err:#}"));
    }

    report.summary();
    process::exit(report.exit_code());
}
