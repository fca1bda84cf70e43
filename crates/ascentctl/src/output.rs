//! Terminal formatting. ASCII only; color via owo-colors.

use ascent_shared::{
    AwardOutcome, BreakthroughAttempt, BreakthroughOutcome, ChallengeSubmission, Domain, LevelState, Rank, RankScale,
    ReconcilePlan, ReversalOutcome, ReviewDecision, MAX_SUBLEVEL,
};
use owo_colors::OwoColorize;

pub const SEPARATOR: &str = "------------------------------------------------------------";

const BAR_WIDTH: usize = 20;

/// `[########------------]`
pub fn progress_bar(fraction: f64) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round()) as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn level_line(domain: &Domain, state: &LevelState, scale: &RankScale) -> String {
    let mut line = format!(
        "  {:<12} {:<4} {} {:>8} xp",
        domain.as_str(),
        state.label().bold(),
        progress_bar(state.progress_to_next(scale)),
        state.current_xp
    );
    if state.banked_xp > 0 {
        line.push_str(&format!("  banked {}", state.banked_xp).yellow().to_string());
    }
    if state.breakthrough_ready {
        if state.rank.is_top() {
            line.push_str(&format!("  {}", "[MAX]".bright_magenta()));
        } else {
            line.push_str(&format!("  {}", "[BREAKTHROUGH READY]".bright_green()));
        }
    }
    line
}

pub fn scale_table(scale: &RankScale) -> Vec<String> {
    let mut lines = vec![format!(
        "  {:<4} {:>10} {:>10} {:>10} {:>8}",
        "rank", "xp/sub", "reach", "cap", "tier"
    )];
    for rank in Rank::ALL {
        lines.push(format!(
            "  {:<4} {:>10} {:>10} {:>10} {:>8}",
            rank,
            scale.xp_per_sublevel(rank),
            scale.reach(rank),
            scale.cap(rank),
            scale.tier_reward(rank)
        ));
    }
    lines.push(format!("  sublevels per rank: {}", MAX_SUBLEVEL + 1).dimmed().to_string());
    lines
}

pub fn award_lines(outcome: &AwardOutcome) -> Vec<String> {
    let achieved = outcome
        .achieved_rank
        .map(|r| r.to_string())
        .unwrap_or_else(|| "none".to_string());
    let mut lines = vec![format!(
        "[AWARD] submission {}  achieved {}  division {}",
        outcome.submission_id,
        achieved.bold(),
        outcome.division.as_deref().unwrap_or("-")
    )];
    if outcome.is_noop() {
        lines.push(format!("  {}", "no new tiers to claim".dimmed()));
        return lines;
    }
    let tiers: Vec<String> = outcome.claim.new_tiers.iter().map(|r| r.to_string()).collect();
    lines.push(format!(
        "  claimed {}  +{} xp{}",
        tiers.join(",").green(),
        outcome.xp_granted,
        if outcome.bonus_xp > 0 {
            format!(" (bonus {})", outcome.bonus_xp)
        } else {
            String::new()
        }
    ));
    for d in &outcome.domains {
        let note = if d.transition.newly_ready() {
            format!("  {}", "breakthrough ready".bright_green())
        } else {
            String::new()
        };
        lines.push(format!(
            "  {:<12} +{:<6} {} -> {}{}",
            d.domain.as_str(),
            d.xp,
            d.transition.before.label(),
            d.transition.after.label(),
            note
        ));
    }
    lines
}

pub fn reversal_lines(outcome: &ReversalOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "[REVERSE] submission {}  -{} xp",
        outcome.submission_id, outcome.amount
    )];
    for d in &outcome.domains {
        lines.push(format!(
            "  {:<12} -{:<6} {} -> {}",
            d.domain.as_str(),
            d.share,
            d.transition.before.label(),
            d.transition.after.label()
        ));
    }
    for domain in &outcome.skipped {
        lines.push(format!("  {:<12} {}", domain.as_str(), "no level, skipped".dimmed()));
    }
    lines.push(format!("  ledger rows removed: {}", outcome.ledger_removals.len()));
    lines
}

pub fn plan_lines(plan: &ReconcilePlan) -> Vec<String> {
    let status = if plan.is_empty() {
        "[OK]".bright_green().to_string()
    } else {
        "[FIXED]".yellow().to_string()
    };
    let mut lines = vec![format!("{} athlete {}  writes {}", status, plan.athlete_id, plan.write_count())];
    for level in &plan.upserts {
        lines.push(format!(
            "  upsert {:<12} {} ({} xp)",
            level.domain.as_str(),
            level.state.label(),
            level.state.current_xp
        ));
    }
    for domain in &plan.deletions {
        lines.push(format!("  delete {}", domain.as_str()));
    }
    if !plan.ledger_removals.is_empty() {
        lines.push(format!("  prune {} orphaned ledger rows", plan.ledger_removals.len()));
    }
    lines
}

pub fn breakthrough_lines(attempt: &BreakthroughAttempt) -> Vec<String> {
    let headline = match &attempt.outcome {
        BreakthroughOutcome::Promoted { from, to, carried_xp, .. } => format!(
            "{} {} {} -> {}  carried {} xp",
            "[PROMOTED]".bright_green(),
            attempt.domain.as_str(),
            from,
            to,
            carried_xp
        ),
        BreakthroughOutcome::NotReady => format!(
            "{} {} is not at sublevel 9 with a full rank",
            "[NOT READY]".yellow(),
            attempt.domain.as_str()
        ),
        BreakthroughOutcome::NotQualified { reason } => {
            format!("{} {}", "[NOT QUALIFIED]".bright_red(), reason)
        }
        BreakthroughOutcome::NoHigherRank => {
            format!("{} already at the top rank", "[MAX]".bright_magenta())
        }
    };
    vec![headline, format!("  gate: {}", attempt.qualification.describe())]
}

pub fn decision_line(decision: &ReviewDecision) -> String {
    if decision.allowed {
        format!("{} reviewer may review this submission", "[ALLOWED]".bright_green())
    } else {
        format!(
            "{} {}",
            "[DENIED]".bright_red(),
            decision.reason.as_deref().unwrap_or("not allowed")
        )
    }
}

pub fn submission_line(submission: &ChallengeSubmission, challenge_name: &str) -> String {
    let tier = submission
        .achieved_rank
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "  {}  {:<20} tier {:<2} value {}",
        submission.id,
        challenge_name,
        tier,
        submission.achieved_value
    )
}
