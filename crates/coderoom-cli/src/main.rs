//! Coderoom CLI
//!
//! A command-line tool and HTTP service for compiling and running code.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use coderoom::{Config, EXAMPLE_CONFIG, ExecutionRequest, Executor, Limits};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

mod server;

#[derive(Parser)]
#[command(name = "coderoom")]
#[command(about = "A tool for compiling and running code snippets")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: coderoom.toml)
        #[arg(short, long, default_value = "coderoom.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run a program (compile if needed, then execute)
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID (e.g., cpp, python, latex)
        #[arg(short, long)]
        language: String,

        /// Input file fed to the program's stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write a rendered document (default: FILE with .pdf extension)
        #[arg(short, long)]
        artifact: Option<PathBuf>,
    },

    /// List available languages
    Languages,

    /// Show configuration summary
    ShowConfig,

    /// Serve the HTTP compile API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 5000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Run {
            source,
            language,
            input,
            artifact,
        } => {
            run_execute(
                config,
                &source,
                &language,
                input.as_deref(),
                artifact.as_deref(),
            )
            .await
        }
        Commands::Languages => {
            list_languages(&config);
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
        Commands::Serve { host, port } => {
            let executor = Executor::new(config).context("failed to prepare workspace root")?;
            let app = server::create_app(executor);
            server::run_server(app, SocketAddr::new(host, port)).await
        }
    }
}

async fn run_execute(
    config: Config,
    source: &Path,
    language: &str,
    input: Option<&Path>,
    artifact: Option<&Path>,
) -> Result<()> {
    let code = tokio::fs::read_to_string(source)
        .await
        .context("failed to read source file")?;

    let input = if let Some(input_path) = input {
        Some(
            tokio::fs::read_to_string(input_path)
                .await
                .context("failed to read input file")?,
        )
    } else {
        None
    };

    let executor = Executor::new(config).context("failed to prepare workspace root")?;
    let request = ExecutionRequest {
        code,
        language: language.to_owned(),
        input,
    };

    info!(language, "running program");
    let result = executor
        .execute(&request)
        .await
        .context("execution failed")?;

    if !result.output.is_empty() {
        print!("{}", result.output);
    }
    if !result.error.is_empty() {
        eprint!("{}", result.error);
    }

    if let Some(ref encoded) = result.pdf_artifact {
        let path = artifact
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source.with_extension("pdf"));
        let bytes = STANDARD
            .decode(encoded)
            .context("document artifact is not valid base64")?;
        tokio::fs::write(&path, bytes)
            .await
            .context("failed to write document artifact")?;
        println!("Wrote document to '{}'", path.display());
    }

    // Log timing via tracing (stderr), keeping stdout clean for piping
    info!(execution_time = %result.execution_time, "execution result");

    if result.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}

fn list_languages(config: &Config) {
    println!("Available languages:\n");

    let mut languages: Vec<_> = config.languages.iter().collect();
    languages.sort_by_key(|(id, _)| *id);

    for (id, lang) in languages {
        if lang.aliases.is_empty() {
            println!("  {:<12} {} ({})", id, lang.name, lang.kind());
        } else {
            println!(
                "  {:<12} {} ({}) aliases: {}",
                id,
                lang.name,
                lang.kind(),
                lang.aliases.join(", ")
            );
        }
    }
}

fn show_config(config: &Config) {
    let limits = Limits::default().with_overrides(&config.default_limits);
    println!("Default limits:");
    println!("  Compile time limit: {:?} s", limits.compile_time_limit);
    println!("  Run time limit: {:?} s", limits.run_time_limit);
    println!("  Max output: {:?} KB", limits.max_output);
    println!();
    println!("Workspace root: {}", config.temp_dir.display());
    println!("Shell: {}", config.shell.display());
    println!();
    println!("Languages configured: {}", config.languages.len());
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
