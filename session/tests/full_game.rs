//! End-to-end games over the fixture taxonomy.

use std::sync::Arc;

use clade_quest_core::{EngineError, SeedContext, TaxonId};
use clade_quest_session::{Engine, RankTitleTable};
use clade_quest_store::fixtures;

fn engine() -> Engine {
    let (store, index) = fixtures::store();
    Engine::new(
        Arc::new(store),
        Arc::new(index),
        fixtures::config(),
        RankTitleTable::default(),
    )
}

/// Kingdom-to-species lineage of the domestic cat fixture.
fn cat_path() -> [TaxonId; 7] {
    [
        fixtures::ANIMALIA,
        fixtures::CHORDATA,
        fixtures::MAMMALIA,
        fixtures::CARNIVORA,
        fixtures::FELIDAE,
        fixtures::FELIS,
        fixtures::FELIS_CATUS,
    ]
}

fn seeded() -> SeedContext {
    SeedContext::new("fixture-game", 1)
}

#[test]
fn perfect_run_scores_zero_and_earns_the_top_title() {
    let engine = engine();
    let start = engine.start("easy", Some(&seeded())).expect("start");
    assert_eq!(start.progress, "0/7");
    assert_eq!(start.rank, clade_quest_core::Rank::Kingdom);
    assert_eq!(start.guesses_left, fixtures::config().guess_cap());
    assert_eq!(start.score, 0);
    assert_eq!(start.description.lines_visible, 3);
    let kingdom_ids: Vec<TaxonId> = start.choices.iter().map(|choice| choice.id).collect();
    assert!(kingdom_ids.contains(&fixtures::ANIMALIA));
    assert!(kingdom_ids.contains(&fixtures::PLANTAE));
    // The opening excerpt must not leak the lineage.
    assert!(start.description.text.contains("█████"));
    assert!(!start.description.text.contains("Felidae"));
    assert!(!start.description.text.contains("mammal"));

    let mut last = None;
    for step in cat_path() {
        let outcome = engine.guess(start.session, step).expect("guess");
        assert!(outcome.correct);
        assert!(!outcome.forced);
        let revealed = outcome.revealed.as_ref().expect("reveal on correct guess");
        assert_eq!(revealed.id, step);
        last = Some(outcome);
    }
    let finish = last.expect("seven guesses");
    assert!(finish.complete);
    assert_eq!(finish.score, 0);
    assert_eq!(finish.progress, "7/7");
    assert_eq!(finish.title.as_deref(), Some("Master Taxonomist"));
    assert!(finish.choices.is_empty());
    let path = finish.final_path.as_ref().expect("full path on completion");
    assert_eq!(path.len(), 7);
    assert_eq!(path[0].id, fixtures::ANIMALIA);
    assert_eq!(path[6].name, "Felis catus");
    assert_eq!(path[6].vernacular.as_deref(), Some("cat"));
    // Completion reveals the full unmasked description.
    assert_eq!(finish.description.lines_visible, finish.description.total_lines);
    assert!(finish.description.text.contains("cat"));
    assert!(!finish.description.text.contains("█████"));
}

#[test]
fn exhausting_the_guess_cap_forces_the_rank_open() {
    let engine = engine();
    let start = engine.start("easy", Some(&seeded())).expect("start");
    let config = fixtures::config();

    let mut outcome = None;
    for attempt in 1..=config.guess_cap() {
        let result = engine
            .guess(start.session, fixtures::PLANTAE)
            .expect("wrong guess");
        assert!(!result.correct);
        if attempt < config.guess_cap() {
            assert!(!result.forced);
            assert_eq!(result.guesses_left, config.guess_cap() - attempt);
            assert_eq!(result.progress, "0/7");
        }
        outcome = Some(result);
    }
    let forced = outcome.expect("cap reached");
    assert!(forced.forced);
    assert_eq!(
        forced.score,
        config.guess_cap() * config.wrong_guess_penalty() + config.guess_cap_penalty()
    );
    let revealed = forced.revealed.expect("forced reveal");
    assert_eq!(revealed.id, fixtures::ANIMALIA);
    assert_eq!(forced.progress, "1/7");
    assert_eq!(forced.guesses_left, config.guess_cap());
    let phylum_ids: Vec<TaxonId> = forced.choices.iter().map(|choice| choice.id).collect();
    assert!(phylum_ids.contains(&fixtures::CHORDATA));
}

#[test]
fn every_guess_reveals_one_more_line() {
    let engine = engine();
    let start = engine.start("easy", Some(&seeded())).expect("start");
    let mut visible = start.description.lines_visible;
    let total = start.description.total_lines;
    for step in cat_path() {
        let outcome = engine.guess(start.session, step).expect("guess");
        if outcome.complete {
            assert_eq!(outcome.description.lines_visible, total);
        } else {
            assert_eq!(outcome.description.lines_visible, (visible + 1).min(total));
        }
        assert!(outcome.description.lines_visible >= visible);
        visible = outcome.description.lines_visible;
    }
}

#[test]
fn candidate_info_shows_metadata_but_never_species() {
    let engine = engine();
    let start = engine.start("easy", Some(&seeded())).expect("start");

    let info = engine
        .info(start.session, fixtures::ANIMALIA)
        .expect("kingdom info");
    assert_eq!(info.name, "Animalia");
    assert_eq!(info.descendant_count, 7);

    // Not among the current kingdom-level choices.
    assert_eq!(
        engine.info(start.session, fixtures::CHORDATA),
        Err(EngineError::UnknownChoice(fixtures::CHORDATA))
    );

    // Walk down to the species rank; info must refuse there.
    for step in &cat_path()[..6] {
        let _ = engine.guess(start.session, *step).expect("guess");
    }
    assert_eq!(
        engine.info(start.session, fixtures::FELIS_CATUS),
        Err(EngineError::NotAvailableForSpecies)
    );
}

#[test]
fn invalid_requests_leave_the_session_untouched() {
    let engine = engine();
    let start = engine.start("easy", Some(&seeded())).expect("start");

    assert_eq!(
        engine.guess(start.session, fixtures::FELIS),
        Err(EngineError::InvalidChoice(fixtures::FELIS))
    );
    let view = engine.view(start.session).expect("view");
    assert_eq!(view.progress, "0/7");
    assert_eq!(view.score, 0);
    assert_eq!(view.description.lines_visible, 3);

    let ghost = clade_quest_core::SessionId::new(404);
    assert_eq!(
        engine.guess(ghost, fixtures::ANIMALIA),
        Err(EngineError::UnknownSession(ghost))
    );
}

#[test]
fn finished_sessions_refuse_further_guesses() {
    let engine = engine();
    let start = engine.start("easy", Some(&seeded())).expect("start");
    for step in cat_path() {
        let _ = engine.guess(start.session, step).expect("guess");
    }
    assert_eq!(
        engine.guess(start.session, fixtures::ANIMALIA),
        Err(EngineError::SessionComplete)
    );
    let view = engine.view(start.session).expect("view");
    assert!(view.complete);
    assert_eq!(view.revealed_path.len(), 7);
    assert_eq!(view.revealed_path[0].id, fixtures::ANIMALIA);
}

#[test]
fn sessions_are_independent_and_removable() {
    let engine = engine();
    let first = engine.start("easy", Some(&seeded())).expect("start");
    let second = engine.start("expert", Some(&seeded())).expect("start");
    assert_ne!(first.session, second.session);
    assert_eq!(engine.session_count(), 2);

    let _ = engine
        .guess(first.session, fixtures::ANIMALIA)
        .expect("guess");
    let view = engine.view(second.session).expect("view");
    assert_eq!(view.progress, "0/7");

    engine.end(first.session).expect("end");
    assert_eq!(engine.session_count(), 1);
    assert_eq!(
        engine.view(first.session),
        Err(EngineError::UnknownSession(first.session))
    );
    assert_eq!(
        engine.end(first.session),
        Err(EngineError::UnknownSession(first.session))
    );
}

#[test]
fn bad_difficulty_labels_are_rejected() {
    let engine = engine();
    assert!(matches!(
        engine.start("impossible", None),
        Err(EngineError::InvalidDifficulty(_))
    ));
}

#[test]
fn outcomes_round_trip_through_json() {
    let engine = engine();
    let start = engine.start("easy", Some(&seeded())).expect("start");
    let encoded = serde_json::to_string(&start).expect("serialize");
    let decoded: clade_quest_session::StartOutcome =
        serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(start, decoded);
}
