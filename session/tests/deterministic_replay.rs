//! Seeded games replay identically across freshly built engines.

use std::sync::Arc;

use clade_quest_core::SeedContext;
use clade_quest_session::{Engine, GuessOutcome, RankTitleTable};
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

/// Plays one full game with a fixed policy: always guess the lowest
/// candidate identifier. Wrong guesses repeat until the cap forces the rank
/// open, so the game always terminates.
fn play_transcript(engine: &Engine, seed: &SeedContext) -> Vec<GuessOutcome> {
    let start = engine.start("expert", Some(seed)).expect("start");
    let mut transcript = Vec::new();
    let mut choices = start.choices;
    loop {
        let lowest = choices.first().expect("incomplete session has choices").id;
        let outcome = engine.guess(start.session, lowest).expect("guess");
        let complete = outcome.complete;
        choices = outcome.choices.clone();
        transcript.push(outcome);
        if complete {
            return transcript;
        }
    }
}

#[test]
fn seeded_games_replay_move_for_move() {
    let seed = SeedContext::new("replay", 5);
    let first = play_transcript(&engine(), &seed);
    let second = play_transcript(&engine(), &seed);
    assert_eq!(first, second);
}

#[test]
fn different_rounds_change_the_game() {
    let transcripts: Vec<Vec<GuessOutcome>> = (1..=12)
        .map(|round| play_transcript(&engine(), &SeedContext::new("replay", round)))
        .collect();
    assert!(
        transcripts.iter().any(|t| t != &transcripts[0]),
        "twelve seeded rounds over six candidate species should diverge"
    );
}

#[test]
fn fixed_policy_games_always_terminate() {
    let seed = SeedContext::new("terminate", 2);
    let transcript = play_transcript(&engine(), &seed);
    let cap = fixtures::config().guess_cap() as usize;
    assert!(transcript.len() <= 7 * cap);
    let finish = transcript.last().expect("at least one guess");
    assert!(finish.complete);
    assert_eq!(finish.progress, "7/7");
}
