#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game sessions and the engine service surface.
//!
//! [`Engine`] owns the shared immutable state (taxon store, description
//! index, popularity tiers) behind `Arc`s and a registry of independent
//! sessions, each behind its own lock. Every operation is a single request
//! against one session; a failed request leaves all state untouched.
//!
//! A session walks the target's lineage kingdom first. Each guess reveals
//! one more description line; wrong guesses cost score points, and
//! exhausting the guess cap at a rank force-reveals the correct answer with
//! an extra penalty so a game always terminates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use clade_quest_core::{
    ChoiceView, DescriptionView, Difficulty, EngineError, GameConfig, PathEntry, Rank, SeedContext,
    SessionId, TaxonId,
};
use clade_quest_popularity::TierTable;
use clade_quest_redaction::{TermSet, TermSource};
use clade_quest_selection::select_target;
use clade_quest_store::{query, DescriptionIndex, TaxonStore};
use serde::{Deserialize, Serialize};

/// Maps final scores to flavor titles, lowest score first.
///
/// Scores accumulate penalties, so lower is better and zero is a perfect
/// game. The table is plain data so hosts can swap their own flavor in.
#[derive(Clone, Debug)]
pub struct RankTitleTable {
    tiers: Vec<(u32, String)>,
    fallback: String,
}

impl RankTitleTable {
    /// Builds a table from `(max_score, title)` tiers and a fallback for
    /// scores beyond every tier.
    #[must_use]
    pub fn new(mut tiers: Vec<(u32, String)>, fallback: impl Into<String>) -> Self {
        tiers.sort_by_key(|(threshold, _)| *threshold);
        Self {
            tiers,
            fallback: fallback.into(),
        }
    }

    /// Title earned by a final score.
    #[must_use]
    pub fn title_for(&self, score: u32) -> &str {
        for (threshold, title) in &self.tiers {
            if score <= *threshold {
                return title;
            }
        }
        &self.fallback
    }
}

impl Default for RankTitleTable {
    fn default() -> Self {
        Self::new(
            vec![
                (0, "Master Taxonomist".to_string()),
                (7, "Field Biologist".to_string()),
                (14, "Amateur Naturalist".to_string()),
            ],
            "Curious Beginner",
        )
    }
}

/// Response to a successful session start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOutcome {
    /// Identifier for all follow-up requests.
    pub session: SessionId,
    /// Difficulty the session runs at.
    pub difficulty: Difficulty,
    /// Rank being guessed first.
    pub rank: Rank,
    /// Wrong guesses allowed at each rank.
    pub guesses_left: u32,
    /// Starting score, always zero.
    pub score: u32,
    /// Progress string, `confirmed/total` ranks.
    pub progress: String,
    /// Initial redacted description excerpt.
    pub description: DescriptionView,
    /// Kingdom-level candidates.
    pub choices: Vec<ChoiceView>,
}

/// Response to a guess.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessOutcome {
    /// Whether the guessed candidate was the target's lineage step.
    pub correct: bool,
    /// Whether the guess cap forced the rank open instead.
    pub forced: bool,
    /// The lineage step confirmed by this guess, if any.
    pub revealed: Option<PathEntry>,
    /// Whether the session reached species rank and finished.
    pub complete: bool,
    /// Accumulated penalty score, lower is better.
    pub score: u32,
    /// Flavor title, present only on completion.
    pub title: Option<String>,
    /// Full lineage kingdom to species, present only on completion.
    pub final_path: Option<Vec<PathEntry>>,
    /// Progress string, `confirmed/total` ranks.
    pub progress: String,
    /// Wrong guesses left at the current rank.
    pub guesses_left: u32,
    /// Redacted description after the reveal step.
    pub description: DescriptionView,
    /// Candidates at the new current rank, empty when complete.
    pub choices: Vec<ChoiceView>,
}

/// Read-only snapshot of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    /// Difficulty the session runs at.
    pub difficulty: Difficulty,
    /// Progress string, `confirmed/total` ranks.
    pub progress: String,
    /// Accumulated penalty score.
    pub score: u32,
    /// Whether the session finished.
    pub complete: bool,
    /// Lineage steps confirmed so far, kingdom first.
    pub revealed_path: Vec<PathEntry>,
    /// Redacted description at the current reveal level.
    pub description: DescriptionView,
    /// Candidates at the current rank, empty when complete.
    pub choices: Vec<ChoiceView>,
}

/// Metadata about one candidate, safe to show before it is guessed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInfo {
    /// The candidate's identifier.
    pub id: TaxonId,
    /// Scientific name.
    pub name: String,
    /// Rank of the candidate.
    pub rank: Rank,
    /// Preferred vernacular name, if any.
    pub vernacular: Option<String>,
    /// Species leaves beneath the candidate.
    pub descendant_count: u64,
}

/// One running game.
struct GameSession {
    difficulty: Difficulty,
    target_path: Vec<PathEntry>,
    terms: TermSet,
    lines: Vec<String>,
    confirmed: usize,
    lines_visible: usize,
    guesses_at_rank: u32,
    score: u32,
    complete: bool,
}

impl GameSession {
    fn progress(&self) -> String {
        format!("{}/{}", self.confirmed, Rank::ALL.len())
    }

    /// Rank currently being guessed. Only meaningful while incomplete.
    fn current_rank(&self) -> Option<Rank> {
        Rank::ALL.get(self.confirmed).copied()
    }

    fn current_parent(&self) -> Option<TaxonId> {
        match self.confirmed {
            0 => None,
            depth => Some(self.target_path[depth - 1].id),
        }
    }

    fn description_view(&self) -> DescriptionView {
        let visible = self.lines_visible.min(self.lines.len());
        let joined = self.lines[..visible].join("\n");
        let text = self.terms.mask(&joined, self.current_rank());
        DescriptionView {
            text,
            lines_visible: visible,
            total_lines: self.lines.len(),
        }
    }

    fn choices(&self, store: &TaxonStore) -> Vec<ChoiceView> {
        if self.complete {
            return Vec::new();
        }
        let candidates = match self.current_parent() {
            Some(parent) => query::children_of(store, parent).unwrap_or(&[]),
            None => query::roots(store),
        };
        candidates
            .iter()
            .filter_map(|id| query::taxon(store, *id).ok())
            .filter(|taxon| taxon.descendant_count() > 0)
            .map(|taxon| ChoiceView {
                id: taxon.id(),
                name: taxon.scientific_name().to_string(),
                vernacular: taxon.primary_vernacular().map(String::from),
                rank: taxon.rank(),
                descendant_count: taxon.descendant_count(),
            })
            .collect()
    }

    fn is_valid_choice(&self, store: &TaxonStore, choice: TaxonId) -> bool {
        self.choices(store).iter().any(|view| view.id == choice)
    }

    /// Applies one guess. The caller has already validated the choice.
    fn apply_guess(&mut self, config: &GameConfig, choice: TaxonId) -> (bool, bool) {
        // Every guess, right or wrong, earns one more description line.
        self.lines_visible = (self.lines_visible + 1).min(self.lines.len());

        let expected = self.target_path[self.confirmed].id;
        if choice == expected {
            self.advance();
            return (true, false);
        }

        self.score += config.wrong_guess_penalty();
        self.guesses_at_rank += 1;
        if self.guesses_at_rank >= config.guess_cap() {
            self.score += config.guess_cap_penalty();
            self.advance();
            return (false, true);
        }
        (false, false)
    }

    fn advance(&mut self) {
        self.confirmed += 1;
        self.guesses_at_rank = 0;
        if self.confirmed == self.target_path.len() {
            self.complete = true;
            self.lines_visible = self.lines.len();
        }
    }
}

/// Shared engine hosting many concurrent sessions over one dataset.
pub struct Engine {
    store: Arc<TaxonStore>,
    index: Arc<DescriptionIndex>,
    tiers: TierTable,
    config: GameConfig,
    titles: RankTitleTable,
    sessions: Mutex<HashMap<SessionId, Arc<Mutex<GameSession>>>>,
    next_session: AtomicU64,
}

impl Engine {
    /// Creates an engine over a fully loaded store and description index.
    ///
    /// The popularity ranking is fixed here, once, so every session started
    /// later sees identical difficulty tiers.
    #[must_use]
    pub fn new(
        store: Arc<TaxonStore>,
        index: Arc<DescriptionIndex>,
        config: GameConfig,
        titles: RankTitleTable,
    ) -> Self {
        let tiers = TierTable::build(&index, &config);
        log::info!(
            "engine ready: {} taxa, {} selectable species",
            store.len(),
            tiers.len(),
        );
        Self {
            store,
            index,
            tiers,
            config,
            titles,
            sessions: Mutex::new(HashMap::new()),
            next_session: AtomicU64::new(1),
        }
    }

    fn build_session(
        &self,
        difficulty: Difficulty,
        seed: Option<&SeedContext>,
    ) -> Result<GameSession, EngineError> {
        let target = select_target(&self.tiers, difficulty, seed)?;
        let lines = self
            .index
            .description_of(target)
            .map(|description| description.lines().to_vec())
            .ok_or(clade_quest_core::SelectError::NoEligibleSpecies)?;
        let mut path = query::path_to_root(&self.store, target)
            .ok()
            .unwrap_or_default();
        path.reverse();
        let mut target_path = Vec::with_capacity(path.len());
        let mut sources = Vec::with_capacity(path.len());
        for id in path {
            if let Ok(taxon) = query::taxon(&self.store, id) {
                target_path.push(PathEntry {
                    id: taxon.id(),
                    name: taxon.scientific_name().to_string(),
                    rank: taxon.rank(),
                    vernacular: taxon.primary_vernacular().map(String::from),
                });
                sources.push(TermSource {
                    rank: taxon.rank(),
                    scientific_name: taxon.scientific_name().to_string(),
                    vernacular_names: taxon
                        .vernacular_names()
                        .iter()
                        .map(|name| name.name().to_string())
                        .collect(),
                });
            }
        }
        let terms = TermSet::build(sources);
        let lines_visible = self.config.initial_lines().min(lines.len());
        Ok(GameSession {
            difficulty,
            target_path,
            terms,
            lines,
            confirmed: 0,
            lines_visible,
            guesses_at_rank: 0,
            score: 0,
            complete: false,
        })
    }

    /// Starts a session at the given difficulty label.
    ///
    /// With a seed context the mystery species is reproducible; without one
    /// it is drawn fresh. The difficulty string is parsed here so transport
    /// adapters can pass player input straight through.
    pub fn start(
        &self,
        difficulty: &str,
        seed: Option<&SeedContext>,
    ) -> Result<StartOutcome, EngineError> {
        let difficulty: Difficulty = difficulty.parse()?;
        let session = self.build_session(difficulty, seed)?;
        let id = SessionId::new(self.next_session.fetch_add(1, Ordering::Relaxed));
        let outcome = StartOutcome {
            session: id,
            difficulty,
            rank: session.current_rank().unwrap_or(Rank::Kingdom),
            guesses_left: self.config.guess_cap(),
            score: 0,
            progress: session.progress(),
            description: session.description_view(),
            choices: session.choices(&self.store),
        };
        log::info!("session {} started at {difficulty}", id.get());
        let mut sessions = lock(&self.sessions);
        let _ = sessions.insert(id, Arc::new(Mutex::new(session)));
        Ok(outcome)
    }

    /// Submits a guess for the session's current rank.
    pub fn guess(&self, session: SessionId, choice: TaxonId) -> Result<GuessOutcome, EngineError> {
        let handle = self.session(session)?;
        let mut game = lock(&handle);
        if game.complete {
            return Err(EngineError::SessionComplete);
        }
        if !game.is_valid_choice(&self.store, choice) {
            return Err(EngineError::InvalidChoice(choice));
        }
        let depth_before = game.confirmed;
        let (correct, forced) = game.apply_guess(&self.config, choice);
        let revealed = if game.confirmed > depth_before {
            Some(game.target_path[depth_before].clone())
        } else {
            None
        };
        let (title, final_path) = if game.complete {
            (
                Some(self.titles.title_for(game.score).to_string()),
                Some(game.target_path.clone()),
            )
        } else {
            (None, None)
        };
        log::debug!(
            "session {} guess {:?}: correct={correct} forced={forced} score={}",
            session.get(),
            choice,
            game.score,
        );
        Ok(GuessOutcome {
            correct,
            forced,
            revealed,
            complete: game.complete,
            score: game.score,
            title,
            final_path,
            progress: game.progress(),
            guesses_left: self.config.guess_cap() - game.guesses_at_rank,
            description: game.description_view(),
            choices: game.choices(&self.store),
        })
    }

    /// Metadata for one candidate at the session's current rank.
    ///
    /// Never available for species-rank candidates; their metadata is the
    /// answer.
    pub fn info(&self, session: SessionId, choice: TaxonId) -> Result<CandidateInfo, EngineError> {
        let handle = self.session(session)?;
        let game = lock(&handle);
        if game.complete {
            return Err(EngineError::SessionComplete);
        }
        if !game.is_valid_choice(&self.store, choice) {
            return Err(EngineError::UnknownChoice(choice));
        }
        let taxon =
            query::taxon(&self.store, choice).map_err(|_| EngineError::UnknownChoice(choice))?;
        if taxon.rank() == Rank::Species {
            return Err(EngineError::NotAvailableForSpecies);
        }
        Ok(CandidateInfo {
            id: taxon.id(),
            name: taxon.scientific_name().to_string(),
            rank: taxon.rank(),
            vernacular: taxon.primary_vernacular().map(String::from),
            descendant_count: taxon.descendant_count(),
        })
    }

    /// Read-only snapshot of a session.
    pub fn view(&self, session: SessionId) -> Result<SessionView, EngineError> {
        let handle = self.session(session)?;
        let game = lock(&handle);
        Ok(SessionView {
            difficulty: game.difficulty,
            progress: game.progress(),
            score: game.score,
            complete: game.complete,
            revealed_path: game.target_path[..game.confirmed].to_vec(),
            description: game.description_view(),
            choices: game.choices(&self.store),
        })
    }

    /// Removes a session, finished or not.
    pub fn end(&self, session: SessionId) -> Result<(), EngineError> {
        let mut sessions = lock(&self.sessions);
        match sessions.remove(&session) {
            Some(_) => Ok(()),
            None => Err(EngineError::UnknownSession(session)),
        }
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    fn session(&self, id: SessionId) -> Result<Arc<Mutex<GameSession>>, EngineError> {
        let sessions = lock(&self.sessions);
        sessions
            .get(&id)
            .cloned()
            .ok_or(EngineError::UnknownSession(id))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
