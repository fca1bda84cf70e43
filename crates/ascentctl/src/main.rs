//! Ascent Control - CLI for the progression engine
//!
//! Operates on a JSON snapshot of athletes, challenges, submissions and
//! levels. See `ascentctl --help`.

use anyhow::{Context as _, Result};
use ascent_shared::EngineConfig;
use clap::Parser;
use tracing::debug;

use ascentctl::cli::Cli;
use ascentctl::commands::{self, Context};
use ascentctl::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = logging::bootstrap(|| EngineConfig::load(cli.config.as_deref())).context("failed to load config")?;
    logging::init(&config.log.level);
    debug!("ascentctl v{}", env!("CARGO_PKG_VERSION"));

    let ctx = Context {
        config,
        snapshot_path: cli.snapshot,
        today: cli.today.unwrap_or_else(|| chrono::Local::now().date_naive()),
        json: cli.json,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&ctx, cli.command, &mut out)
}
