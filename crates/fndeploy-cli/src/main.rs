mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{ComposeArgs, EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_RUNTIME_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "fndeploy",
    version,
    about = "Compile serverless manifests into deployable entity plans"
)]
struct Cli {
    /// Path to a configuration file (defaults to ~/.config/fndeploy/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compose a manifest (and optional deployment file) into a deployment plan.
    Compose(ComposeArgs),
    /// Check that a manifest composes cleanly without printing the plan.
    Validate(ComposeArgs),
    /// List the supported runtime kinds.
    Runtimes,
    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("FNDEPLOY_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Compose(args) => commands::compose::run(&args, config_path, json_output),
        Commands::Validate(args) => commands::validate::run(&args, config_path, json_output),
        Commands::Runtimes => commands::runtimes::run(json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("manifest error:")
        || msg.starts_with("deployment error:")
        || msg.starts_with("config error:")
    {
        EXIT_MANIFEST_ERROR
    } else if msg.starts_with("runtime error:") {
        EXIT_RUNTIME_ERROR
    } else {
        EXIT_FAILURE
    }
}
