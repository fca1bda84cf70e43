//! Command line surface.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "ascentctl")]
#[command(about = "Ascent - athletic progression engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to $ASCENT_CONFIG, then /etc/ascent/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot file holding athletes, challenges, submissions and levels
    #[arg(long, global = true, default_value = ascent_shared::SNAPSHOT_PATH)]
    pub snapshot: PathBuf,

    /// Evaluate ages and divisions as of this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Resolve the tier a measurement earns on a challenge (read-only)
    Grade {
        #[arg(long)]
        challenge: Uuid,

        /// Measured value (reps, seconds, kg...)
        #[arg(long, allow_negative_numbers = true)]
        value: f64,

        /// Athlete whose division bars apply
        #[arg(long)]
        athlete: Option<Uuid>,
    },

    /// Approve a submission and pay out newly claimed tiers
    Award {
        #[arg(long)]
        submission: Uuid,
    },

    /// Take back a submission's XP and mark it rejected
    Reverse {
        #[arg(long)]
        submission: Uuid,
    },

    /// Rebuild levels from approved submission history
    Reconcile {
        /// Only this athlete (default: everyone)
        #[arg(long)]
        athlete: Option<Uuid>,

        /// Show the plan without writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Attempt a rank breakthrough in one domain
    Breakthrough {
        #[arg(long)]
        athlete: Uuid,

        #[arg(long)]
        domain: String,
    },

    /// Check whether a reviewer may review a submission
    CanReview {
        #[arg(long)]
        reviewer: Uuid,

        #[arg(long)]
        submission: Uuid,
    },

    /// List pending submissions a reviewer may act on
    ReviewQueue {
        #[arg(long)]
        reviewer: Uuid,
    },

    /// Show an athlete's levels and ledger
    Show {
        #[arg(long)]
        athlete: Uuid,
    },

    /// Print the configured rank scale
    Scale,
}
