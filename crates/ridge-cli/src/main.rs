#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod logging;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use ridge_core::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ridge")]
#[command(author, version, about = "Inspect dev-server module resolution", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory (project root)
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve a module specifier the way the dev server would
    Resolve {
        /// Specifier as written in source (e.g. "react", "./app", "/src/main.ts")
        specifier: String,

        /// Path of the importing module
        #[arg(long, value_name = "PATH")]
        importer: Option<String>,

        /// Resolve for a production build
        #[arg(long)]
        build: bool,

        /// Resolve for a server-rendering target
        #[arg(long)]
        ssr: bool,

        /// Treat the importer as served source (enables optimized-dep shortcuts)
        #[arg(long)]
        src: bool,

        /// Packages always resolved from the project root
        #[arg(long, value_delimiter = ',', value_name = "PKG")]
        dedupe: Vec<String>,

        /// Dev cache directory holding optimized-deps metadata
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },

    /// Load .env files for a mode and print the exposed variables
    Env {
        /// Mode name selecting `.env.<mode>` files
        #[arg(long, default_value = "development")]
        mode: String,

        /// Directory holding the env files (defaults to the project root)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Variable prefixes to expose (repeatable)
        #[arg(long = "prefix", value_name = "PREFIX")]
        prefixes: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::load(&cwd)
        .into_diagnostic()?
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Resolve {
            specifier,
            importer,
            build,
            ssr,
            src,
            dedupe,
            cache_dir,
        }) => {
            let span = tracing::info_span!("resolve", cmd = "resolve", cwd = %cwd.display());
            let _guard = span.enter();
            let action = commands::resolve::ResolveAction {
                specifier,
                importer,
                build,
                ssr,
                src,
                dedupe,
                cache_dir,
            };
            commands::resolve::run(&config, action, cli.json)
        }
        Some(Commands::Env {
            mode,
            dir,
            prefixes,
        }) => {
            let span = tracing::info_span!("env", cmd = "env", cwd = %cwd.display());
            let _guard = span.enter();
            let dir = dir.unwrap_or_else(|| config.resolve.root.clone());
            commands::env::run(&mode, &dir, &prefixes, cli.json)
        }
    }
}
