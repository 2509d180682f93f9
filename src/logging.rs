use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stderr so `ranking --json` output stays clean on stdout.
/// `RUST_LOG` or `WEEKLY_RANKING_LOG` override the level chosen on the CLI.
pub fn init_tracing(verbose: bool, log_json: bool) -> anyhow::Result<()> {
    let level = if verbose {
        "weekly_ranking=debug"
    } else {
        "weekly_ranking=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("WEEKLY_RANKING_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr).with_ansi(false))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }
    Ok(())
}
