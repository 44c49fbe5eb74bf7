// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Actgraph CLI - breadth-first explorer for associated-acts graphs

use actgraph::commands::{self, App};
use actgraph::output::Printer;
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "actgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress and non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "ACTGRAPH_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Data directory override
    #[arg(long, env = "ACTGRAPH_DATA_DIR", global = true)]
    data_dir: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the next breadth-first layer of associated acts
    Extract {
        /// Band to review, e.g. "Arctic Monkeys"
        #[arg(required = true)]
        name: Vec<String>,

        /// Number of layers to extract
        #[arg(short, long, default_value_t = 1)]
        layers: usize,
    },

    /// Print the stored entity table
    Show {
        /// Band to review
        #[arg(required = true)]
        name: Vec<String>,

        /// Also print the link table
        #[arg(long)]
        links: bool,
    },

    /// Export a graph to various formats
    Export {
        /// Band to review
        #[arg(required = true)]
        name: Vec<String>,

        /// Output format (dot, json)
        #[arg(short, long, default_value = "dot")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Shortest chain of associations from the seed to another act
    Path {
        /// Band to review
        #[arg(required = true)]
        name: Vec<String>,

        /// Target act: index, page URL or name
        #[arg(long)]
        to: String,
    },

    /// Browse the entity table interactively
    View {
        /// Band to review
        #[arg(required = true)]
        name: Vec<String>,
    },

    /// Print the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn log_level(verbose: u8, quiet: bool) -> tracing::Level {
    match verbose {
        0 if quiet => tracing::Level::ERROR,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = log_level(cli.verbose, cli.quiet);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.as_str())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = actgraph::config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let app = App {
        config,
        printer: Printer::new(!cli.no_color && std::io::stdout().is_terminal()),
        quiet: cli.quiet,
    };

    // Execute command
    match cli.command {
        Commands::Extract { name, layers } => commands::extract::run(&app, &name, layers),
        Commands::Show { name, links } => commands::show::run(&app, &name, links),
        Commands::Export { name, format, output } => {
            commands::export::run(&app, &name, &format, output)
        }
        Commands::Path { name, to } => commands::path::run(&app, &name, &to),
        Commands::View { name } => commands::view::run(&app, &name),
        Commands::Config => commands::config::run(&app),
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
