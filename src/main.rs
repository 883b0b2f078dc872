use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "speedjob",
    about = "Job-driven HTTP bandwidth measurement",
    version,
    long_about = None
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every URL of every job and report timing and bandwidth
    Run {
        /// Job list (JSON array)
        #[arg(long, default_value = "job.json")]
        job: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Proxy URL for all requests (e.g. socks5://localhost:1080)
        #[arg(long)]
        proxy: Option<String>,

        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,

        /// Keep idle connections alive between requests
        #[arg(long)]
        keep_alive: bool,

        /// Do not negotiate compressed responses
        #[arg(long)]
        no_compression: bool,

        /// One JSON object per line instead of text
        #[arg(long)]
        json: bool,
    },

    /// Parse a job list and print what would run, without fetching
    Check {
        /// Job list (JSON array)
        #[arg(long, default_value = "job.json")]
        job: PathBuf,
    },
}

/// Log filter used when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,speedjob=debug"
    } else {
        "warn,speedjob=info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            job,
            config,
            proxy,
            insecure,
            keep_alive,
            no_compression,
            json,
        } => {
            let mut cfg = speedjob::config::Config::resolve(config.as_deref())?;
            if proxy.is_some() {
                cfg.transport.proxy = proxy;
            }
            cfg.transport.insecure |= insecure;
            cfg.transport.keep_alive |= keep_alive;
            if no_compression {
                cfg.transport.compression = false;
            }
            cfg.output.json |= json;

            tracing::debug!(?cfg, job = %job.display(), "starting run");
            let summary = speedjob::run(&job, &cfg).await?;
            let failed: usize = summary.jobs.iter().map(|j| j.failed).sum();
            if failed > 0 {
                tracing::warn!(failed, "some fetches failed");
            }
        }
        Commands::Check { job } => {
            let jobs = speedjob::job::load_jobs(&job)?;
            println!("{:<20} | {:<6} | {:>8} | URLs", "Job", "Mode", "Delay");
            println!("{:-<20}-|-{:-<6}-|-{:->8}-|-{:-<5}", "", "", "", "");
            for j in &jobs {
                println!(
                    "{:<20} | {:<6} | {:>6}ms | {}",
                    j.id(),
                    j.mode().to_string(),
                    j.delay().as_millis(),
                    j.urls().len()
                );
            }
            println!("\n{} job(s) OK", jobs.len());
        }
    }

    Ok(())
}
