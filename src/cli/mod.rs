use crate::{SecretResolver, is_secret_reference, options};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use colored::Colorize;
use envsecret_core::{CancellationToken, MapLookuper, Processor};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Main CLI structure for the envsecret application.
#[derive(Parser)]
#[command(name = "envsecret")]
#[command(about = "Resolve SECRET_ environment variables from AWS Secrets Manager", long_about = None)]
#[command(version)]
struct Cli {
    /// AWS region of the secret store (defaults to the AWS configuration chain)
    #[arg(long, global = true, env = "ENVSECRET_REGION")]
    region: Option<String>,
    /// Secrets Manager endpoint to use instead of the regional one
    #[arg(long, global = true, env = "ENVSECRET_ENDPOINT_URL", value_parser = parse_endpoint)]
    endpoint_url: Option<Url>,
    /// A .env file whose entries overlay the process environment
    #[arg(long, global = true, env = "ENVSECRET_ENV_FILE")]
    env_file: Option<PathBuf>,
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for the envsecret CLI.
#[derive(Subcommand)]
enum Commands {
    /// Resolve every SECRET_ variable and report which ones resolved
    Check,
    /// Resolve a single variable and print its value
    Get {
        /// Name of the variable
        name: String,
    },
    /// Run a command with secret references replaced by their values
    Run {
        /// Command and arguments to run
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },
}

fn parse_endpoint(s: &str) -> std::result::Result<Url, String> {
    let url = Url::parse(s).map_err(|e| format!("invalid endpoint url '{}': {}", s, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(format!(
            "invalid endpoint url '{}': unsupported scheme '{}'",
            s, scheme
        )),
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("ENVSECRET_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point of the `envsecret` binary.
pub fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("Failed to start async runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut lookuper = MapLookuper::from_env();
    if let Some(path) = &cli.env_file {
        let file = MapLookuper::from_dotenv(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        lookuper = lookuper.overlay(file);
    }

    let mut client_options = Vec::new();
    if let Some(region) = cli.region {
        client_options.push(options::region(region));
    }
    if let Some(url) = &cli.endpoint_url {
        client_options.push(options::endpoint_url(url.as_str().trim_end_matches('/')));
    }
    let resolver = SecretResolver::new(client_options)
        .await
        .wrap_err("Failed to set up the secret store client")?;

    let ctx = CancellationToken::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling secret lookups");
            canceller.cancel();
        }
    });

    let processor = Processor::with_lookuper(lookuper).mutator(resolver);

    match cli.command {
        // Resolve everything without printing any value
        Commands::Check => {
            let resolved = resolve_secrets(&processor, &ctx).await?;
            for key in resolved.keys() {
                println!("{} {}", "✓".green(), key);
            }
            println!(
                "\n{} {} secret references resolved",
                "✓".green(),
                resolved.len()
            );
            Ok(())
        }
        Commands::Get { name } => {
            let mut resolved = processor
                .resolve_keys(&ctx, [name.as_str()])
                .await
                .wrap_err("Failed to resolve variable")?;
            let value = resolved
                .remove(&name)
                .ok_or_else(|| eyre!("Variable '{}' is not set", name))?;
            println!("{}", value);
            Ok(())
        }
        Commands::Run { command } => {
            let Some((program, args)) = command.split_first() else {
                bail!("No command specified. Usage: envsecret run -- <command> [args...]");
            };
            let resolved = resolve_secrets(&processor, &ctx).await?;

            let mut env_vars: BTreeMap<String, String> = processor
                .lookuper()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            env_vars.extend(resolved);

            let status = tokio::process::Command::new(program)
                .args(args)
                .env_clear()
                .envs(&env_vars)
                .status()
                .await
                .wrap_err_with(|| format!("Failed to run '{}'", program))?;
            std::process::exit(status.code().unwrap_or(1));
        }
    }
}

/// Resolves every secret reference known to the processor's lookuper.
async fn resolve_secrets(
    processor: &Processor<MapLookuper>,
    ctx: &CancellationToken,
) -> Result<BTreeMap<String, String>> {
    let mut keys: Vec<&str> = processor
        .lookuper()
        .keys()
        .filter(|key| is_secret_reference(key))
        .collect();
    keys.sort_unstable();
    if keys.is_empty() {
        tracing::info!("no secret references found");
    }

    processor
        .resolve_keys(ctx, keys)
        .await
        .wrap_err("Failed to resolve secret references")
}
