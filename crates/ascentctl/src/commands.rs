//! Command handlers for ascentctl.
//!
//! Each handler loads the snapshot, runs one engine operation and, for
//! mutating commands, writes the snapshot back only after the operation
//! succeeded.

use anyhow::{Context as _, Result};
use ascent_shared::grading::resolve_tier;
use ascent_shared::{claim_tiers, BreakthroughOutcome, ClaimedTiers, Domain, EngineConfig, Snapshot};
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

use crate::cli::Commands;
use crate::output;

/// Everything a handler needs besides its own arguments
#[derive(Debug, Clone)]
pub struct Context {
    pub config: EngineConfig,
    pub snapshot_path: PathBuf,
    pub today: NaiveDate,
    pub json: bool,
}

impl Context {
    fn load(&self) -> Result<Snapshot> {
        Snapshot::load(&self.snapshot_path)
            .with_context(|| format!("failed to load snapshot {}", self.snapshot_path.display()))
    }

    fn store(&self, snapshot: &Snapshot) -> Result<()> {
        snapshot
            .save(&self.snapshot_path)
            .with_context(|| format!("failed to write snapshot {}", self.snapshot_path.display()))
    }
}

/// Dispatch one parsed command
pub fn run(ctx: &Context, command: Commands, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Grade { challenge, value, athlete } => grade(ctx, challenge, value, athlete, out),
        Commands::Award { submission } => award(ctx, submission, out),
        Commands::Reverse { submission } => reverse(ctx, submission, out),
        Commands::Reconcile { athlete, dry_run } => reconcile(ctx, athlete, dry_run, out),
        Commands::Breakthrough { athlete, domain } => breakthrough(ctx, athlete, &domain, out),
        Commands::CanReview { reviewer, submission } => can_review(ctx, reviewer, submission, out),
        Commands::ReviewQueue { reviewer } => review_queue(ctx, reviewer, out),
        Commands::Show { athlete } => show(ctx, athlete, out),
        Commands::Scale => scale(ctx, out),
    }
}

fn emit(out: &mut dyn Write, lines: &[String]) -> Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn emit_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Handle grade command (read-only)
pub fn grade(ctx: &Context, challenge_id: Uuid, value: f64, athlete_id: Option<Uuid>, out: &mut dyn Write) -> Result<()> {
    let snapshot = ctx.load()?;
    let challenge = snapshot.challenge(challenge_id)?;
    let (gender, age) = match athlete_id {
        Some(id) => {
            let athlete = snapshot.athlete(id)?;
            (athlete.gender, athlete.age_on(ctx.today))
        }
        None => (None, None),
    };
    let division = challenge.division_for(gender, age).map(|d| d.name.clone());
    let achieved = resolve_tier(value, &challenge.bars_for(gender, age), challenge.lower_is_better);
    let potential = claim_tiers(
        &ctx.config.scale,
        achieved,
        challenge.min_rank,
        challenge.max_rank,
        &ClaimedTiers::new(),
    );

    if ctx.json {
        return emit_json(
            out,
            &json!({
                "challenge": challenge.id,
                "division": division,
                "achieved_rank": achieved,
                "tiers": potential.new_tiers,
                "xp": potential.xp,
            }),
        );
    }

    let tier = achieved
        .map(|r| r.to_string().bold().to_string())
        .unwrap_or_else(|| "none".dimmed().to_string());
    emit(
        out,
        &[
            format!("[GRADE] {}  value {}", challenge.name, value),
            format!("  division {}", division.as_deref().unwrap_or("-")),
            format!("  tier     {}", tier),
            format!("  worth    {} xp on a first claim", potential.xp),
        ],
    )
}

/// Handle award command
pub fn award(ctx: &Context, submission: Uuid, out: &mut dyn Write) -> Result<()> {
    let mut snapshot = ctx.load()?;
    let outcome = snapshot.approve_and_award(&ctx.config.scale, submission, ctx.today)?;
    ctx.store(&snapshot)?;

    if ctx.json {
        return emit_json(out, &outcome);
    }
    emit(out, &output::award_lines(&outcome))
}

/// Handle reverse command
pub fn reverse(ctx: &Context, submission: Uuid, out: &mut dyn Write) -> Result<()> {
    let mut snapshot = ctx.load()?;
    let outcome = snapshot.reverse(&ctx.config.scale, submission)?;
    ctx.store(&snapshot)?;

    if ctx.json {
        return emit_json(out, &outcome);
    }
    emit(out, &output::reversal_lines(&outcome))
}

/// Handle reconcile command
pub fn reconcile(ctx: &Context, athlete: Option<Uuid>, dry_run: bool, out: &mut dyn Write) -> Result<()> {
    let mut snapshot = ctx.load()?;
    let plans = match athlete {
        Some(id) => vec![snapshot.reconcile(&ctx.config.scale, id)?],
        None => snapshot.reconcile_all(&ctx.config.scale),
    };
    if dry_run {
        tracing::info!(plans = plans.len(), "dry run, snapshot not written");
    } else if plans.iter().any(|p| !p.is_empty()) {
        ctx.store(&snapshot)?;
    }

    if ctx.json {
        return emit_json(out, &plans);
    }
    for plan in &plans {
        emit(out, &output::plan_lines(plan))?;
    }
    if dry_run {
        writeln!(out, "{}", "(dry run: nothing written)".dimmed())?;
    }
    Ok(())
}

/// Handle breakthrough command
pub fn breakthrough(ctx: &Context, athlete: Uuid, domain: &str, out: &mut dyn Write) -> Result<()> {
    let mut snapshot = ctx.load()?;
    let attempt = snapshot.breakthrough(athlete, &Domain::new(domain), ctx.today)?;
    if matches!(attempt.outcome, BreakthroughOutcome::Promoted { .. }) {
        ctx.store(&snapshot)?;
    }

    if ctx.json {
        return emit_json(out, &attempt);
    }
    emit(out, &output::breakthrough_lines(&attempt))
}

/// Handle can-review command
pub fn can_review(ctx: &Context, reviewer: Uuid, submission: Uuid, out: &mut dyn Write) -> Result<()> {
    let snapshot = ctx.load()?;
    let decision = snapshot.can_review(&ctx.config.review, reviewer, submission, ctx.today)?;

    if ctx.json {
        return emit_json(out, &decision);
    }
    emit(out, &[output::decision_line(&decision)])
}

/// Handle review-queue command
pub fn review_queue(ctx: &Context, reviewer: Uuid, out: &mut dyn Write) -> Result<()> {
    let snapshot = ctx.load()?;
    let queue = snapshot.review_queue(&ctx.config.review, reviewer, ctx.today)?;

    if ctx.json {
        return emit_json(out, &queue);
    }
    let mut lines = vec![format!("[QUEUE] {} reviewable submissions", queue.len())];
    for submission in &queue {
        let name = snapshot
            .challenge(submission.challenge_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        lines.push(output::submission_line(submission, name));
    }
    emit(out, &lines)
}

/// Handle show command
pub fn show(ctx: &Context, athlete_id: Uuid, out: &mut dyn Write) -> Result<()> {
    let snapshot = ctx.load()?;
    let athlete = snapshot.athlete(athlete_id)?;
    let mut levels: Vec<_> = snapshot.levels_for(athlete_id).collect();
    levels.sort_by(|a, b| a.domain.cmp(&b.domain));
    let summary = snapshot.ledger.summary(athlete_id);

    if ctx.json {
        return emit_json(
            out,
            &json!({
                "athlete": athlete,
                "levels": levels,
                "ledger": summary,
            }),
        );
    }

    let mut lines = vec![
        format!("{} ({})", athlete.display_name.bold(), athlete.id),
        output::SEPARATOR.dimmed().to_string(),
    ];
    if levels.is_empty() {
        lines.push(format!("  {}", "no levels yet".dimmed()));
    }
    for level in &levels {
        lines.push(output::level_line(&level.domain, &level.state, &ctx.config.scale));
    }
    lines.push(output::SEPARATOR.dimmed().to_string());
    lines.push(format!(
        "  ledger: {} rows ({} challenge, {} adjustment), {} xp",
        summary.total, summary.challenge, summary.adjustment, summary.xp
    ));
    emit(out, &lines)
}

/// Handle scale command
pub fn scale(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    if ctx.json {
        return emit_json(out, &ctx.config.scale);
    }
    emit(out, &output::scale_table(&ctx.config.scale))
}
