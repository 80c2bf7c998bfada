#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Clade Quest engine.
//!
//! This crate defines the vocabulary that connects adapters, the immutable
//! taxon store, and the pure gameplay systems: identifiers, the rank
//! ordering, difficulty tiers, the ingest record contracts that dataset
//! adapters produce, the view structs returned to clients, and the error
//! kinds every operation can surface. Nothing in this crate holds state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Clade Quest.";

/// Unique identifier assigned to a taxon by the source dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxonId(u64);

impl TaxonId {
    /// Creates a new taxon identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Unique identifier assigned to a game session by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a new session identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Major taxonomic ranks in hierarchical order, kingdom first.
///
/// Intermediate source ranks (suborder, tribe, subgenus, ...) are collapsed
/// when the store is built, so every stored taxon carries one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    /// Highest rank used by the game.
    Kingdom,
    /// Second rank, directly below kingdom.
    Phylum,
    /// Third rank, directly below phylum.
    Class,
    /// Fourth rank, directly below class.
    Order,
    /// Fifth rank, directly below order.
    Family,
    /// Sixth rank, directly below family.
    Genus,
    /// Terminal rank; reaching it completes a session.
    Species,
}

impl Rank {
    /// All ranks in play order, kingdom first.
    pub const ALL: [Rank; 7] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
    ];

    /// Zero-based position of the rank within [`Rank::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the rank directly below this one, or `None` for species.
    #[must_use]
    pub const fn next(self) -> Option<Rank> {
        match self {
            Rank::Kingdom => Some(Rank::Phylum),
            Rank::Phylum => Some(Rank::Class),
            Rank::Class => Some(Rank::Order),
            Rank::Order => Some(Rank::Family),
            Rank::Family => Some(Rank::Genus),
            Rank::Genus => Some(Rank::Species),
            Rank::Species => None,
        }
    }

    /// Returns the rank directly above this one, or `None` for kingdom.
    #[must_use]
    pub const fn previous(self) -> Option<Rank> {
        match self {
            Rank::Kingdom => None,
            Rank::Phylum => Some(Rank::Kingdom),
            Rank::Class => Some(Rank::Phylum),
            Rank::Order => Some(Rank::Class),
            Rank::Family => Some(Rank::Order),
            Rank::Genus => Some(Rank::Family),
            Rank::Species => Some(Rank::Genus),
        }
    }

    /// Lowercase label used in progress strings and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Rank::Kingdom => "kingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
        }
    }

    /// Parses a source rank string, accepting only major ranks.
    ///
    /// Intermediate ranks ("suborder", "tribe", ...) return `None` so that
    /// the store build can collapse them.
    #[must_use]
    pub fn parse(value: &str) -> Option<Rank> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kingdom" => Some(Rank::Kingdom),
            "phylum" => Some(Rank::Phylum),
            "class" => Some(Rank::Class),
            "order" => Some(Rank::Order),
            "family" => Some(Rank::Family),
            "genus" => Some(Rank::Genus),
            "species" => Some(Rank::Species),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Difficulty tiers bounding which species may become the mystery target.
///
/// Tiers are cumulative percentile prefixes of the popularity ranking, so a
/// species eligible under an easier tier is always eligible under a harder
/// one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Top 1% most popular describable species.
    Easy,
    /// Top 5% most popular describable species.
    Medium,
    /// Top 25% most popular describable species.
    Hard,
    /// Every describable species.
    Expert,
}

impl Difficulty {
    /// All difficulty tiers, easiest first.
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Fraction of the popularity ranking eligible under this tier.
    #[must_use]
    pub const fn percentile(self) -> f64 {
        match self {
            Difficulty::Easy => 0.01,
            Difficulty::Medium => 0.05,
            Difficulty::Hard => 0.25,
            Difficulty::Expert => 1.0,
        }
    }

    /// Lowercase label used in requests, seeds, and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = InvalidDifficultyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            _ => Err(InvalidDifficultyError(value.to_owned())),
        }
    }
}

/// Raised when a difficulty label cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("'{0}' is not a difficulty (expected easy, medium, hard or expert)")]
pub struct InvalidDifficultyError(pub String);

/// Seed context making target selection reproducible across rounds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedContext {
    seed: String,
    round: u32,
}

impl SeedContext {
    /// Creates a seed context from a player-supplied seed string and round.
    #[must_use]
    pub fn new(seed: impl Into<String>, round: u32) -> Self {
        Self {
            seed: seed.into(),
            round,
        }
    }

    /// Player-supplied seed string.
    #[must_use]
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// One-based round number within the seeded sequence.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }
}

/// Gameplay policy constants, configurable rather than hard-coded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConfig {
    guess_cap: u32,
    wrong_guess_penalty: u32,
    guess_cap_penalty: u32,
    initial_lines: usize,
    line_width: usize,
    min_description_chars: usize,
    min_description_lines: usize,
}

impl GameConfig {
    /// Creates a configuration with explicit policy values.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        guess_cap: u32,
        wrong_guess_penalty: u32,
        guess_cap_penalty: u32,
        initial_lines: usize,
        line_width: usize,
        min_description_chars: usize,
        min_description_lines: usize,
    ) -> Self {
        Self {
            guess_cap,
            wrong_guess_penalty,
            guess_cap_penalty,
            initial_lines,
            line_width,
            min_description_chars,
            min_description_lines,
        }
    }

    /// Wrong guesses permitted at one rank before forced advancement.
    #[must_use]
    pub const fn guess_cap(&self) -> u32 {
        self.guess_cap
    }

    /// Score penalty charged for a single wrong guess.
    #[must_use]
    pub const fn wrong_guess_penalty(&self) -> u32 {
        self.wrong_guess_penalty
    }

    /// Additional score penalty charged when the guess cap forces an advance.
    #[must_use]
    pub const fn guess_cap_penalty(&self) -> u32 {
        self.guess_cap_penalty
    }

    /// Description lines revealed when a session starts.
    #[must_use]
    pub const fn initial_lines(&self) -> usize {
        self.initial_lines
    }

    /// Column width descriptions are wrapped to at build time.
    #[must_use]
    pub const fn line_width(&self) -> usize {
        self.line_width
    }

    /// Minimum description length (characters) for a playable target.
    #[must_use]
    pub const fn min_description_chars(&self) -> usize {
        self.min_description_chars
    }

    /// Minimum wrapped line count for a playable target.
    #[must_use]
    pub const fn min_description_lines(&self) -> usize {
        self.min_description_lines
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(5, 1, 3, 3, 90, 400, 12)
    }
}

/// Flat taxon record as ingested from an upstream dataset.
///
/// The exact column layout of the source is an adapter concern; the engine
/// only requires these fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaxonRecord {
    /// Source-assigned identifier, stable across process runs.
    pub id: TaxonId,
    /// Identifier of the parent record, or `None` for top-level taxa.
    pub parent_id: Option<TaxonId>,
    /// Source rank string; intermediate ranks are collapsed at build time.
    pub rank: String,
    /// Canonical Latin name.
    pub scientific_name: String,
    /// Whether the record is an accepted name rather than a synonym.
    pub accepted: bool,
}

/// Vernacular (common) name record attached to a taxon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VernacularRecord {
    /// Taxon the name belongs to.
    pub taxon_id: TaxonId,
    /// The common name itself.
    pub name: String,
    /// Language code, empty when unknown.
    pub language: String,
}

/// Free-text description section for a species.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptionRecord {
    /// Taxon the section describes, when the source carried a usable
    /// identifier. `None` leaves only the name join.
    pub taxon_id: Option<TaxonId>,
    /// Scientific name carried by the description dataset, used as a join
    /// fallback when the identifier spaces differ.
    pub scientific_name: String,
    /// Section label, e.g. "Abstract" or "Behavior".
    pub section: String,
    /// Section body text.
    pub text: String,
}

/// Multimedia attachment marker for a taxon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultimediaRecord {
    /// Taxon the attachment belongs to.
    pub taxon_id: TaxonId,
}

/// One selectable candidate at the session's current rank.
///
/// Delivered as an unordered set; sorting and pagination are client concerns.
/// `descendant_count` is the precomputed species-leaf count, exact at query
/// time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceView {
    /// Identifier to submit back through `guess` or `info`.
    pub id: TaxonId,
    /// Scientific name of the candidate.
    pub name: String,
    /// Preferred vernacular name, if any.
    pub vernacular: Option<String>,
    /// Rank of the candidate.
    pub rank: Rank,
    /// Number of species leaves beneath the candidate.
    pub descendant_count: u64,
}

/// Redacted description text shown to the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionView {
    /// Masked text covering the visible lines, newline separated.
    pub text: String,
    /// Number of lines currently revealed.
    pub lines_visible: usize,
    /// Total lines in the full description.
    pub total_lines: usize,
}

/// One correctly identified (or force-revealed) step of the taxonomic path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    /// Identifier of the revealed taxon.
    pub id: TaxonId,
    /// Scientific name of the revealed taxon.
    pub name: String,
    /// Rank of the revealed taxon.
    pub rank: Rank,
    /// Preferred vernacular name, if any.
    pub vernacular: Option<String>,
}

/// Failures raised by read-only taxon store lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested identifier does not exist in the store.
    ///
    /// Distinct from an empty child set, which is a successful lookup.
    #[error("taxon {0:?} is not present in the store")]
    UnknownTaxon(TaxonId),
}

/// Failures raised by mystery species selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SelectError {
    /// The requested difficulty tier contains no describable species.
    #[error("no eligible species in the requested difficulty tier")]
    NoEligibleSpecies,
}

/// Failures raised by engine session operations.
///
/// Every failure is local to a single request; shared state and other
/// sessions are never affected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The difficulty label in a start request did not parse.
    #[error(transparent)]
    InvalidDifficulty(#[from] InvalidDifficultyError),
    /// The selector found no species for the requested tier.
    #[error(transparent)]
    NoEligibleSpecies(#[from] SelectError),
    /// No session with the provided identifier exists.
    #[error("session {0:?} does not exist")]
    UnknownSession(SessionId),
    /// The guessed identifier is not in the current candidate set.
    #[error("taxon {0:?} is not among the current choices")]
    InvalidChoice(TaxonId),
    /// The session already finished; no further mutation is allowed.
    #[error("session is already complete")]
    SessionComplete,
    /// Candidate info is not available at species rank.
    #[error("candidate info is not available for species-rank taxa")]
    NotAvailableForSpecies,
    /// The info request named an identifier the store does not know.
    #[error("taxon {0:?} is not a known candidate")]
    UnknownChoice(TaxonId),
}

#[cfg(test)]
mod tests {
    use super::{Difficulty, GameConfig, Rank, SeedContext, TaxonId};

    #[test]
    fn rank_ordering_walks_kingdom_to_species() {
        let mut rank = Rank::Kingdom;
        let mut walked = vec![rank];
        while let Some(next) = rank.next() {
            walked.push(next);
            rank = next;
        }
        assert_eq!(walked, Rank::ALL);
        assert_eq!(rank, Rank::Species);
    }

    #[test]
    fn rank_previous_inverts_next() {
        for rank in Rank::ALL {
            if let Some(next) = rank.next() {
                assert_eq!(next.previous(), Some(rank));
            }
        }
        assert_eq!(Rank::Kingdom.previous(), None);
    }

    #[test]
    fn rank_parse_accepts_major_ranks_only() {
        assert_eq!(Rank::parse("Species"), Some(Rank::Species));
        assert_eq!(Rank::parse(" kingdom "), Some(Rank::Kingdom));
        assert_eq!(Rank::parse("suborder"), None);
        assert_eq!(Rank::parse("tribe"), None);
        assert_eq!(Rank::parse(""), None);
    }

    #[test]
    fn difficulty_percentiles_widen_monotonically() {
        let mut previous = 0.0;
        for difficulty in Difficulty::ALL {
            assert!(difficulty.percentile() > previous);
            previous = difficulty.percentile();
        }
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Medium".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert!("brutal".parse::<Difficulty>().is_err());
    }

    #[test]
    fn default_config_matches_reference_policy() {
        let config = GameConfig::default();
        assert_eq!(config.guess_cap(), 5);
        assert_eq!(config.wrong_guess_penalty(), 1);
        assert_eq!(config.guess_cap_penalty(), 3);
        assert_eq!(config.initial_lines(), 3);
        assert_eq!(config.line_width(), 90);
    }

    #[test]
    fn seed_context_round_trips_through_json() {
        let context = SeedContext::new("abc", 2);
        let json = serde_json::to_string(&context).expect("serialize");
        let restored: SeedContext = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(context, restored);
    }

    #[test]
    fn taxon_id_preserves_value() {
        assert_eq!(TaxonId::new(42).get(), 42);
    }
}
