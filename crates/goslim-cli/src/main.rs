use clap::Parser;

mod bootstrap;
mod cli;
mod context;
mod output;
mod pipeline;
mod progress;
mod shutdown;
mod ui;
mod write_lock;

/// Exit status when the run never started: bad flags, config, or client setup.
const EXIT_BOOTSTRAP: i32 = 2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("goslim-refresh error: {error:#}");
            std::process::exit(EXIT_BOOTSTRAP);
        }
    }
}

async fn run() -> anyhow::Result<i32> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    ui::init(&flags);

    let config = bootstrap::load_config(&flags)?;
    context::warn_unconfigured(&config);

    let pipeline = pipeline::RefreshPipeline::new(
        config,
        pipeline::RefreshOptions {
            no_notify: flags.no_notify,
        },
    )?;
    let summary = pipeline.run().await;

    output::output(&summary, flags.format)?;
    Ok(summary.exit_code)
}

/// Logs go to stderr; stdout carries only the run summary.
fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("GOSLIM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
