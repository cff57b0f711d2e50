// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Keystone - script runner and REPL
//!
//! This is the main entry point for the keystone CLI/REPL.

mod repl;

use anyhow::Context;
use clap::{Parser, Subcommand};
use keystone_modules::{LoaderConfig, ModuleLoader, Resolved};
use keystone_script::Engine;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "keystone", about = "Keystone script runner", version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Extra module directory, searched after the configured ones
    #[arg(short = 'I', long = "include", value_name = "DIR", global = true)]
    include: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a script as the main module
    Run {
        /// Script file
        file: PathBuf,
    },

    /// Evaluate code and print the result
    #[command(alias = "e")]
    Eval {
        /// Keystone source
        code: String,
    },

    /// Show where module identifiers resolve to
    Resolve {
        /// Identifiers, as passed to require()
        #[arg(required = true)]
        identifiers: Vec<String>,
    },

    /// Print the module search path
    Paths,

    /// Start the interactive REPL (default)
    Repl,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "keystone=debug,keystone_modules=debug"
    } else {
        "keystone=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = LoaderConfig::load().context("failed to load configuration")?;
    config.search_paths.extend(cli.include);
    debug!("Loader configuration: {:?}", config);

    let mut loader = keystone_script::loader_from_config(&config);

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Run { file } => Ok(run_file(&mut loader, file)),
        Commands::Eval { code } => Ok(run_eval(&mut loader, &code)),
        Commands::Resolve { identifiers } => Ok(resolve(&loader, &identifiers)),
        Commands::Paths => {
            print_paths(&loader);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Repl => {
            repl::Repl::new(loader)?.run()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Execute a script file as the main module.
fn run_file(loader: &mut ModuleLoader, path: PathBuf) -> ExitCode {
    let mut engine = Engine::new();

    match engine.run_file(loader, &path) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            repl::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Evaluate code from the command line.
fn run_eval(loader: &mut ModuleLoader, code: &str) -> ExitCode {
    let mut engine = Engine::new();

    match engine.eval(loader, code) {
        Ok(value) => {
            if !value.is_nil() {
                println!("{}", value);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            repl::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn resolve(loader: &ModuleLoader, identifiers: &[String]) -> ExitCode {
    let mut code = ExitCode::SUCCESS;

    for identifier in identifiers {
        match loader.resolve(identifier) {
            Ok(Resolved::Native(name)) => {
                println!("{} {} {}", name.cyan(), "->".dimmed(), "native".magenta())
            }
            Ok(Resolved::File(path)) => {
                println!("{} {} {}", identifier.cyan(), "->".dimmed(), path.display())
            }
            Err(e) => {
                eprintln!("{} {} {}", identifier.cyan(), "->".dimmed(), e.red());
                code = ExitCode::FAILURE;
            }
        }
    }

    code
}

fn print_paths(loader: &ModuleLoader) {
    println!("{}", "SEARCH PATH:".white().bold());
    if loader.search_path().is_empty() {
        println!("    {}", "(empty)".dimmed());
    }
    for (i, dir) in loader.search_path().iter().enumerate() {
        let marker = if dir.is_dir() { "" } else { " (missing)" };
        println!("    {:>2}. {}{}", i + 1, dir.display(), marker.dimmed());
    }
    println!();

    let probes = loader.probes();
    println!("{}", "PROBES:".white().bold());
    println!("    {:14} {}", "extensions".cyan(), probes.extensions.join(", "));
    println!("    {:14} {}", "entry files".cyan(), probes.entry_files.join(", "));
    println!();

    println!("{}", "NATIVE MODULES:".white().bold());
    println!("    {}", loader.native_names().collect::<Vec<_>>().join(", "));
}
