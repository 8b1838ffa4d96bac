//! # CLI Module / 命令行模块
//!
//! The command-line surface of Coverage Runner: a `coverage` command that
//! prints the coverage map, and a `run` command that submits a test
//! execution and polls it to completion.
//!
//! Coverage Runner 的命令行界面：`coverage` 命令打印覆盖率映射，
//! `run` 命令提交一次测试执行并轮询至完成。

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::{env, path::PathBuf};

use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> String {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        if let Some(lang) = args.get(pos + 1) {
            return lang.clone();
        }
    }
    // Fallback to system language detection
    sys_locale::get_locale().unwrap_or_else(|| "en".to_string())
}

fn build_cli(locale: &str) -> Command {
    Command::new("coverage-runner")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("coverage")
                .about(t!("cmd_coverage_about", locale = locale).to_string())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .default_value("CoverageRunner.toml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .help(t!("arg_project_dir", locale = locale).to_string())
                        .value_name("PROJECT_DIR")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("service")
                        .short('s')
                        .long("service")
                        .help(t!("arg_service", locale = locale).to_string())
                        .value_name("SERVICE")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .default_value("CoverageRunner.toml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .help(t!("arg_project_dir", locale = locale).to_string())
                        .value_name("PROJECT_DIR")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("service")
                        .short('s')
                        .long("service")
                        .help(t!("arg_service", locale = locale).to_string())
                        .value_name("SERVICE")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("method")
                        .short('m')
                        .long("method")
                        .help(t!("arg_method", locale = locale).to_string())
                        .value_name("METHOD")
                        .requires("service")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("test")
                        .short('t')
                        .long("test")
                        .help(t!("arg_test", locale = locale).to_string())
                        .value_name("TEST")
                        .requires("service")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .help(t!("arg_all", locale = locale).to_string())
                        .conflicts_with_all(["service", "method", "test"])
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let language = pre_parse_language();
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("coverage", coverage_matches)) => {
            let config = coverage_matches
                .get_one::<PathBuf>("config")
                .unwrap() // Has default
                .clone();
            let project_dir = coverage_matches
                .get_one::<PathBuf>("project-dir")
                .unwrap() // Has default
                .clone();
            let service = coverage_matches.get_one::<String>("service").cloned();
            let json = coverage_matches.get_flag("json");

            commands::coverage::execute(config, project_dir, service, json).await?;
        }
        Some(("run", run_matches)) => {
            let config = run_matches
                .get_one::<PathBuf>("config")
                .unwrap() // Has default
                .clone();
            let project_dir = run_matches
                .get_one::<PathBuf>("project-dir")
                .unwrap() // Has default
                .clone();
            let service = run_matches.get_one::<String>("service").cloned();
            let method = run_matches.get_one::<String>("method").cloned();
            let tests: Vec<String> = run_matches
                .get_many::<String>("test")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            let all = run_matches.get_flag("all");
            let json = run_matches.get_flag("json");

            commands::run::execute(config, project_dir, service, method, tests, all, json).await?;
        }
        _ => {
            // This case handles when no subcommand is given.
            // Clap will have already printed help info.
        }
    }
    Ok(())
}
