// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Export | Import | Rebase | Drop | Switch | Apply | Convert
//!   Options | Inis | Version
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rpmpq::cli::{self, Cli, Command};
use rpmpq::cmd::config::{run_inis_command, run_options_command};
use rpmpq::cmd::pq::run_pq_command;
use rpmpq::config::Config;
use rpmpq::config::loader::ConfigLoader;
use rpmpq::config::types::GlobalConfig;
use rpmpq::git::Repository;
use rpmpq::logging::{LogConfig, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Name of the repository-level configuration file.
const CONFIG_FILE: &str = "rpmpq.toml";

fn main() -> ExitCode {
    let cli = cli::parse();
    let workdir = cli
        .global
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let (config_files, config) = match build_config_loader(&cli, &workdir) {
        Ok(loader) => {
            let files = loader.format_loaded_files();
            (files, loader.build())
        }
        Err(e) => (Vec::new(), Err(e)),
    };

    let log_config = config
        .as_ref()
        .map_or_else(|_| LogConfig::default(), |c| build_log_config(&c.global));
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli, config, &config_files, &workdir)
}

fn build_log_config(global: &GlobalConfig) -> LogConfig {
    LogConfig::builder()
        .with_console_level(global.output_log_level)
        .with_file_level(global.file_log_level)
        .maybe_with_log_file(global.log_file.as_ref().map(|p| p.display().to_string()))
        .with_file_format(global.log_format)
        .build()
}

fn dispatch_command(
    cli: &Cli,
    config: rpmpq::error::Result<Config>,
    config_files: &[String],
    workdir: &Path,
) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            Ok(())
        }
        Some(Command::Options) => config.map(|config| run_options_command(&config)),
        Some(Command::Inis) => {
            run_inis_command(config_files);
            Ok(())
        }
        Some(Command::Pq(command)) => {
            config.and_then(|config| run_pq_command(command, config, workdir))
        }
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

/// Layers `rpmpq.toml` of the enclosing repository, `--config` files,
/// `RPMPQ_*` variables and command-line overrides.
fn build_config_loader(cli: &Cli, workdir: &Path) -> rpmpq::error::Result<ConfigLoader> {
    let mut loader = ConfigLoader::new();
    if let Ok(repo) = Repository::open(workdir) {
        loader = loader.add_toml_file_optional(repo.path().join(CONFIG_FILE));
    }
    for path in &cli.global.configs {
        loader = loader.add_toml_file(path);
    }
    loader
        .with_env_prefix("RPMPQ")
        .apply_overrides(cli.to_config_overrides())
}
