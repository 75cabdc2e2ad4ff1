use super::common::*;
use crate::pool::domain::Movement;
use crate::pool::ingest::{CsvFileSource, InlineSource};
use crate::pool::service::{PoolService, PoolServiceError};
use crate::pool::store::{InMemoryGateway, PoolGateway};
use std::sync::Arc;

#[test]
fn bootstrap_loads_sources_into_storage() {
    let (service, gateway) = build_service();

    assert_eq!(gateway.read_people().expect("people").len(), 3);
    assert_eq!(gateway.read_predictions().expect("predictions").len(), 3);

    let board = service.leaderboard(None).expect("leaderboard");
    assert_eq!(board.predictors, 3);
    assert_eq!(board.roster, 3);
    assert_eq!(board.chosen, 0);
    assert!(board
        .top
        .iter()
        .all(|entry| entry.entry.points == 0 && entry.movement == Movement::New));
}

#[test]
fn bootstrap_picks_up_saved_choices() {
    let gateway = Arc::new(InMemoryGateway::default());
    gateway
        .upsert_choice(draft(1, "Ana Silva", "DCD", 0))
        .expect("seed choice");

    let service = PoolService::new(gateway, Arc::new(source()), settings());
    let summary = service.bootstrap().expect("bootstrap");
    assert_eq!(summary.choices, 1);

    let ranking = service.ranking().expect("ranking");
    assert_eq!(ranking[0].entry.predictor_name, "Bob");
    assert_eq!(ranking[0].entry.points, 1);
}

#[test]
fn ingestion_failure_degrades_to_empty_pool() {
    let gateway = Arc::new(InMemoryGateway::default());
    let source = Arc::new(CsvFileSource::new("./missing-roster.csv", "./missing.csv"));
    let service = PoolService::new(gateway, source, settings());

    let summary = service.bootstrap().expect("bootstrap never fails on ingestion");
    assert_eq!(summary.people, 0);
    assert_eq!(summary.predictors, 0);
    assert!(service.leaderboard(None).expect("leaderboard").top.is_empty());
}

#[test]
fn confirmed_choice_scores_matching_predictors() {
    let single = InlineSource {
        roster_csv: "id,name,department\n1,Ana Silva,Auditoria\n".to_string(),
        predictions_csv: "NOME COMPLETO,ANA SILVA\nBob,DCD\n".to_string(),
    };
    let service = PoolService::new(
        Arc::new(InMemoryGateway::default()),
        Arc::new(single),
        settings(),
    );
    service.bootstrap().expect("bootstrap");

    service.confirm(1, "DCD").expect("confirm");
    let ranking = service.ranking().expect("ranking");
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].entry.points, 1);

    service.confirm(1, "DCI").expect("re-confirm");
    let ranking = service.ranking().expect("ranking");
    assert_eq!(ranking[0].entry.points, 0);
}

#[test]
fn confirm_tracks_movement_between_mutations() {
    let (service, _) = build_service();

    // Bob and Dani both guessed DCD for Ana; Carol guessed DCI.
    service.confirm(1, "DCD").expect("confirm ana");
    let ranking = service.ranking().expect("ranking");
    let names: Vec<_> = ranking
        .iter()
        .map(|entry| entry.entry.predictor_name.as_str())
        .collect();
    assert_eq!(names, vec!["Bob", "Dani", "Carol"]);
    assert_eq!(ranking[2].movement, Movement::Down);

    // Re-assign Ana to DCI: only Carol scores, moving to the top.
    service.confirm(1, "DCI").expect("update ana");
    let ranking = service.ranking().expect("ranking");
    assert_eq!(ranking[0].entry.predictor_name, "Carol");
    assert_eq!(ranking[0].movement, Movement::Up);
    assert_eq!(ranking[1].entry.predictor_name, "Bob");
    assert_eq!(ranking[1].movement, Movement::Down);

    let choices = service.choices().expect("choices");
    assert_eq!(choices.len(), 1);
    assert_eq!(choices[0].category, "DCI");
}

#[test]
fn reading_the_leaderboard_does_not_shift_movement() {
    let (service, _) = build_service();
    service.confirm(2, "DTI").expect("confirm caio");

    let first = service.leaderboard(None).expect("leaderboard");
    let second = service.leaderboard(None).expect("leaderboard");
    let movements = |view: &crate::pool::views::LeaderboardView| {
        view.top.iter().map(|entry| entry.movement).collect::<Vec<_>>()
    };
    assert_eq!(movements(&first), movements(&second));
}

#[test]
fn leaderboard_slices_respect_requested_size() {
    let (service, _) = build_service();
    service.confirm(3, "DIE").expect("confirm duda");

    let view = service.leaderboard(Some(2)).expect("leaderboard");
    assert_eq!(view.top.len(), 2);
    assert_eq!(view.bottom.len(), 2);
    assert_eq!(view.bottom[0].entry.predictor_name, "Carol");
    assert_eq!(view.bottom[0].entry.rank, 2);

    let overlapping = service.leaderboard(Some(3)).expect("leaderboard");
    assert_eq!(overlapping.top.len(), 3);
    assert_eq!(overlapping.bottom.len(), 3);
}

#[test]
fn confirm_rejects_unknown_subjects() {
    let (service, gateway) = build_service();
    match service.confirm(99, "DCD") {
        Err(PoolServiceError::UnknownSubject(99)) => {}
        other => panic!("expected unknown subject, got {other:?}"),
    }
    assert!(gateway.read_choices().expect("choices").is_empty());
}

#[test]
fn failed_save_leaves_snapshot_untouched() {
    let gateway = Arc::new(FlakyGateway::default());
    let service = PoolService::new(gateway.clone(), Arc::new(source()), settings());
    service.bootstrap().expect("bootstrap");
    service.confirm(1, "DCD").expect("confirm");
    let before = service.ranking().expect("ranking");

    gateway.failing(true);
    match service.confirm(1, "DCI") {
        Err(PoolServiceError::SaveFailed(1)) => {}
        other => panic!("expected save failure, got {other:?}"),
    }
    assert_eq!(service.ranking().expect("ranking"), before);
    assert_eq!(service.choices().expect("choices")[0].category, "DCD");

    assert!(matches!(service.reset(), Err(PoolServiceError::ResetFailed)));
    assert_eq!(service.choices().expect("choices").len(), 1);
}

#[test]
fn reset_clears_choices_and_reloads_sources() {
    let (service, gateway) = build_service();
    service.confirm(1, "DCD").expect("confirm");
    service.confirm(2, "DTI").expect("confirm");

    let summary = service.reset().expect("reset");
    assert_eq!(summary.people, 3);
    assert_eq!(summary.predictors, 3);
    assert_eq!(summary.choices, 0);

    assert!(gateway.read_choices().expect("choices").is_empty());
    assert_eq!(gateway.read_people().expect("people").len(), 3);
    assert_eq!(gateway.read_predictions().expect("predictions").len(), 3);
    assert!(service.choices().expect("choices").is_empty());
    assert!(service
        .ranking()
        .expect("ranking")
        .iter()
        .all(|entry| entry.entry.points == 0));
}

#[test]
fn reset_fails_when_reference_data_cannot_be_written() {
    let gateway = Arc::new(FlakyGateway::default());
    let service = PoolService::new(gateway.clone(), Arc::new(source()), settings());
    service.bootstrap().expect("bootstrap");
    service.confirm(1, "DCD").expect("confirm");
    let before = service.ranking().expect("ranking");

    gateway.failing_reference_writes(true);
    assert!(matches!(service.reset(), Err(PoolServiceError::Store(_))));
    assert_eq!(service.choices().expect("choices").len(), 1);
    assert_eq!(service.ranking().expect("ranking"), before);
    assert_eq!(service.roster(None).expect("roster").len(), 3);
}

#[test]
fn bootstrap_serves_sources_when_reference_writes_fail() {
    let gateway = Arc::new(FlakyGateway::default());
    gateway.failing_reference_writes(true);
    let service = PoolService::new(gateway.clone(), Arc::new(source()), settings());

    let summary = service.bootstrap().expect("bootstrap degrades");
    assert_eq!(summary.people, 3);
    assert_eq!(summary.predictors, 3);
    assert!(gateway.read_people().expect("people").is_empty());
}

#[test]
fn roster_search_is_case_insensitive_and_reports_choice() {
    let (service, _) = build_service();
    service.confirm(2, "DTI").expect("confirm");

    let matches = service.roster(Some("  caio ")).expect("roster");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].person.name, "Caio Lima");
    assert_eq!(matches[0].chosen_category.as_deref(), Some("DTI"));

    assert_eq!(service.roster(None).expect("roster").len(), 3);
    assert_eq!(service.roster(Some("")).expect("roster").len(), 3);
    assert!(service.roster(Some("zzz")).expect("roster").is_empty());
}
