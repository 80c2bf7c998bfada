#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Mystery target selection.
//!
//! Draws one species uniformly from the difficulty's candidate list. With a
//! seed context the draw is a pure function of the seed string, the round
//! number, and the candidate list, so two processes given the same inputs
//! pick the same target. Without one the draw comes from the thread RNG.

use clade_quest_core::{Difficulty, SeedContext, SelectError, TaxonId};
use clade_quest_popularity::TierTable;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Domain label mixed into the seed digest.
const RNG_STREAM_TARGET: &str = "target";

/// Picks the mystery species for one round.
///
/// Fails only when the difficulty's candidate list is empty, which means the
/// dataset has no playable described species inside the tier.
pub fn select_target(
    table: &TierTable,
    difficulty: Difficulty,
    seed: Option<&SeedContext>,
) -> Result<TaxonId, SelectError> {
    let candidates = table.candidates(difficulty);
    if candidates.is_empty() {
        return Err(SelectError::NoEligibleSpecies);
    }
    let index = match seed {
        Some(context) => {
            let mut rng = SplitMix64::new(derive_target_seed(context));
            (rng.next_u64() % candidates.len() as u64) as usize
        }
        None => rand::thread_rng().gen_range(0..candidates.len()),
    };
    Ok(candidates[index])
}

/// Collapses a seed context into one 64-bit stream seed.
fn derive_target_seed(context: &SeedContext) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(context.seed().as_bytes());
    hasher.update(context.round().to_le_bytes());
    hasher.update(RNG_STREAM_TARGET.as_bytes());
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

#[derive(Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clade_quest_store::fixtures;

    fn table() -> TierTable {
        let (_, index) = fixtures::store();
        TierTable::build(&index, &fixtures::config())
    }

    #[test]
    fn seeded_selection_replays() {
        let table = table();
        let context = SeedContext::new("october-quiz", 3);
        let first = select_target(&table, Difficulty::Expert, Some(&context)).expect("candidates");
        let second = select_target(&table, Difficulty::Expert, Some(&context)).expect("candidates");
        assert_eq!(first, second);
    }

    #[test]
    fn rounds_advance_the_draw() {
        let table = table();
        let targets: Vec<TaxonId> = (0..8)
            .map(|round| {
                let context = SeedContext::new("october-quiz", round);
                select_target(&table, Difficulty::Expert, Some(&context)).expect("candidates")
            })
            .collect();
        assert!(
            targets.iter().any(|target| *target != targets[0]),
            "eight rounds over six candidates should not all collide"
        );
    }

    #[test]
    fn target_stays_inside_the_tier() {
        let table = table();
        for difficulty in Difficulty::ALL {
            let context = SeedContext::new("containment", 1);
            let target = select_target(&table, difficulty, Some(&context)).expect("candidates");
            assert!(table.candidates(difficulty).contains(&target));
        }
    }

    #[test]
    fn easy_tier_narrows_to_the_most_popular() {
        let table = table();
        for round in 0..16 {
            let context = SeedContext::new("narrow", round);
            let target = select_target(&table, Difficulty::Easy, Some(&context)).expect("candidates");
            assert_eq!(target, fixtures::FELIS_CATUS);
        }
    }

    #[test]
    fn unseeded_selection_stays_inside_the_tier() {
        let table = table();
        let target = select_target(&table, Difficulty::Hard, None).expect("candidates");
        assert!(table.candidates(Difficulty::Hard).contains(&target));
    }

    #[test]
    fn empty_tier_is_an_error() {
        let index = clade_quest_store::DescriptionIndex::default();
        let empty = TierTable::build(&index, &fixtures::config());
        assert_eq!(
            select_target(&empty, Difficulty::Expert, None),
            Err(SelectError::NoEligibleSpecies)
        );
    }
}
