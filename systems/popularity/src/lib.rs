#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Popularity scoring and difficulty tiering.
//!
//! Every described species gets a deterministic score from its description
//! signals; ranking the scores descending and cutting cumulative percentile
//! prefixes yields one candidate list per difficulty. Easier tiers are
//! prefixes of harder ones, so eligibility under an easy tier implies
//! eligibility under every harder tier by construction.

use clade_quest_core::{Difficulty, GameConfig, TaxonId};
use clade_quest_store::{DescriptionIndex, DescriptionSignals};

/// Points per order of magnitude of description length.
const TEXT_WEIGHT: f64 = 13.0;
/// Cap on points earned from description length.
const TEXT_CAP: f64 = 40.0;
/// Points per description section.
const SECTION_WEIGHT: f64 = 2.0;
/// Cap on points earned from section count.
const SECTION_CAP: f64 = 20.0;
/// Flat bonus for carrying a common name.
const VERNACULAR_BONUS: f64 = 25.0;
/// Flat bonus for carrying multimedia.
const MULTIMEDIA_BONUS: f64 = 15.0;

/// Computes the popularity score for one species from its signals.
///
/// Longer, better-sectioned descriptions with common names and imagery score
/// higher; the result is a pure function of the signals.
#[must_use]
pub fn score(signals: &DescriptionSignals) -> f64 {
    let text = if signals.text_chars() > 0 {
        (TEXT_WEIGHT * (signals.text_chars() as f64).log10()).min(TEXT_CAP)
    } else {
        0.0
    };
    let sections = (SECTION_WEIGHT * signals.section_count() as f64).min(SECTION_CAP);
    let vernacular = if signals.has_vernacular() {
        VERNACULAR_BONUS
    } else {
        0.0
    };
    let multimedia = if signals.has_multimedia() {
        MULTIMEDIA_BONUS
    } else {
        0.0
    };
    text + sections + vernacular + multimedia
}

/// Candidate lists per difficulty, ranked most popular first.
#[derive(Clone, Debug)]
pub struct TierTable {
    ranked: Vec<TaxonId>,
    cutoffs: [usize; 4],
}

impl TierTable {
    /// Ranks every playable described species and fixes the tier cutoffs.
    ///
    /// Species whose descriptions fall below the playability minimums never
    /// enter the ranking. Ties break on identifier so the ranking is stable
    /// across runs and input orders.
    #[must_use]
    pub fn build(index: &DescriptionIndex, config: &GameConfig) -> Self {
        let mut scored: Vec<(TaxonId, f64)> = index
            .iter()
            .filter(|(_, description)| description.is_playable(config))
            .map(|(id, description)| (id, score(description.signals())))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        let ranked: Vec<TaxonId> = scored.into_iter().map(|(id, _)| id).collect();
        let mut cutoffs = [0; 4];
        for difficulty in Difficulty::ALL {
            cutoffs[tier_slot(difficulty)] = cutoff(ranked.len(), difficulty.percentile());
        }
        Self { ranked, cutoffs }
    }

    /// Candidates eligible at the given difficulty, most popular first.
    #[must_use]
    pub fn candidates(&self, difficulty: Difficulty) -> &[TaxonId] {
        &self.ranked[..self.cutoffs[tier_slot(difficulty)]]
    }

    /// Total number of ranked playable species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    /// Whether no species qualified for ranking at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

const fn tier_slot(difficulty: Difficulty) -> usize {
    match difficulty {
        Difficulty::Easy => 0,
        Difficulty::Medium => 1,
        Difficulty::Hard => 2,
        Difficulty::Expert => 3,
    }
}

/// Prefix length for a percentile, never empty while the ranking has entries.
fn cutoff(len: usize, percentile: f64) -> usize {
    if len == 0 {
        return 0;
    }
    let raw = (len as f64 * percentile).ceil() as usize;
    raw.clamp(1, len)
}
