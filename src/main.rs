use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rust_sqldiff::{generate_migration, project, DiffOptions, ScriptParser, TracingLogger};

#[derive(Parser)]
#[command(name = "rust-sqldiff")]
#[command(author, version, about = "Migration scripts from two SQL Server script snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the scripts that turn the current snapshot into the desired one
    Diff {
        /// Directory with the scripts of the desired database
        #[arg(short, long)]
        desired: PathBuf,

        /// Directory with the scripts of the current database (defaults to an empty database)
        #[arg(short, long)]
        current: Option<PathBuf>,

        /// Output file for the migration (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave out scripts that insert or delete rows
        #[arg(long)]
        no_data: bool,

        /// Glob pattern of script files to skip, relative to each directory
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Report the scripts of a directory that cannot be compared
    Check {
        /// Directory with the scripts to check
        #[arg(short, long)]
        scripts: PathBuf,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Diff {
            desired,
            current,
            output,
            no_data,
            exclude,
            verbose,
        } => {
            init_tracing(verbose);
            let options = DiffOptions {
                desired_dir: desired,
                current_dir: current,
                output_path: output,
                include_data: !no_data,
                excludes: exclude,
                verbose,
            };

            let scripts = generate_migration(&options, &mut TracingLogger)?;
            let sql = scripts.to_sql();
            match &options.output_path {
                Some(path) => {
                    std::fs::write(path, format!("{}\n", sql))
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("Wrote {} scripts to {}", scripts.len(), path.display());
                }
                None => println!("{}", sql),
            }
        }
        Commands::Check { scripts, verbose } => {
            init_tracing(verbose);
            let mut set = project::load_scripts(&scripts)?;
            let total = set.len();
            let database = ScriptParser::retrieve_parsable_objects(&mut set, &mut TracingLogger);
            for script in &set {
                println!("{} {}", script.name, script.script_type);
            }
            tracing::info!(
                "{} of {} scripts recognized ({} tables, {} routines)",
                total - set.len(),
                total,
                database.tables.len(),
                database.all_routines().count()
            );
        }
    }

    Ok(())
}
