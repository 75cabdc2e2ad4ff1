use crate::cli::StorageArgs;
use crate::infra::build_pool_service;
use clap::Args;
use division_pool::config::AppConfig;
use division_pool::error::AppError;
use division_pool::pool::{Choice, LeaderboardEntry, LeaderboardView, LoadSummary};
use std::fmt::Write as _;

#[derive(Args, Debug, Default)]
pub(crate) struct LeaderboardArgs {
    #[command(flatten)]
    pub(crate) storage: StorageArgs,
    /// Number of entries in the best and worst slices
    #[arg(long)]
    pub(crate) size: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct ConfirmArgs {
    #[command(flatten)]
    pub(crate) storage: StorageArgs,
    /// Roster id of the subject being assigned
    pub(crate) subject_id: i64,
    /// Division name, exactly as configured
    pub(crate) category: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ResetArgs {
    #[command(flatten)]
    pub(crate) storage: StorageArgs,
}

fn load_config(storage: StorageArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    storage.apply(&mut config.pool);
    Ok(config)
}

pub(crate) fn run_leaderboard(args: LeaderboardArgs) -> Result<(), AppError> {
    let config = load_config(args.storage)?;
    let service = build_pool_service(&config.pool)?;
    service.bootstrap()?;

    // A one-shot process has no earlier ranking, so movement is meaningless here.
    let view = service.leaderboard(args.size)?;
    print!("{}", render_leaderboard(&view, false));
    Ok(())
}

pub(crate) fn run_confirm(args: ConfirmArgs) -> Result<(), AppError> {
    let config = load_config(args.storage)?;
    let service = build_pool_service(&config.pool)?;
    service.bootstrap()?;

    if !service.accepts_category(&args.category) {
        eprintln!("Known categories: {}", service.categories().join(", "));
        return Err(AppError::UnknownCategory(args.category));
    }

    let choice = service.confirm(args.subject_id, &args.category)?;
    println!("{}", render_choice(&choice));
    print!("{}", render_leaderboard(&service.leaderboard(None)?, true));
    Ok(())
}

pub(crate) fn run_reset(args: ResetArgs) -> Result<(), AppError> {
    let config = load_config(args.storage)?;
    let service = build_pool_service(&config.pool)?;
    let summary = service.reset()?;
    println!("{}", render_summary(&summary));
    Ok(())
}

pub(crate) fn render_choice(choice: &Choice) -> String {
    format!(
        "Saved: {} (#{}) -> {} at {}",
        choice.subject_name,
        choice.subject_id,
        choice.category,
        choice.timestamp.to_rfc3339()
    )
}

pub(crate) fn render_summary(summary: &LoadSummary) -> String {
    format!(
        "Reset complete: {} people, {} predictors, {} choices",
        summary.people, summary.predictors, summary.choices
    )
}

/// Movement labels are only shown when the view was taken right after a mutation.
pub(crate) fn render_leaderboard(view: &LeaderboardView, show_movement: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Progress: {}/{} chosen", view.chosen, view.roster);
    let _ = writeln!(out, "Predictors: {}", view.predictors);

    let _ = writeln!(out, "\nBest");
    render_slice(&mut out, &view.top, show_movement);
    let _ = writeln!(out, "\nWorst");
    render_slice(&mut out, &view.bottom, show_movement);
    out
}

fn render_slice(out: &mut String, entries: &[LeaderboardEntry], show_movement: bool) {
    if entries.is_empty() {
        let _ = writeln!(out, "  (no predictors)");
        return;
    }

    for entry in entries {
        let _ = write!(
            out,
            "  {:>2}. {:<28} {:>3} pts",
            entry.entry.rank + 1,
            entry.entry.predictor_name,
            entry.entry.points
        );
        if show_movement {
            let _ = write!(out, "  [{}]", entry.movement.label());
        }
        out.push('\n');
    }
}
