//! Description join and popularity signal extraction.

use std::collections::HashMap;

use clade_quest_core::{DescriptionRecord, GameConfig, MultimediaRecord, Rank, TaxonId};

use crate::TaxonStore;

/// Precomputed per-species inputs to the popularity score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DescriptionSignals {
    text_chars: usize,
    section_count: usize,
    has_vernacular: bool,
    has_multimedia: bool,
}

impl DescriptionSignals {
    /// Creates signals directly, bypassing a join.
    ///
    /// The join produces these during [`DescriptionIndex::build`]; direct
    /// construction exists for scoring code that wants synthetic inputs.
    #[must_use]
    pub const fn new(
        text_chars: usize,
        section_count: usize,
        has_vernacular: bool,
        has_multimedia: bool,
    ) -> Self {
        Self {
            text_chars,
            section_count,
            has_vernacular,
            has_multimedia,
        }
    }

    /// Total characters across all joined sections.
    #[must_use]
    pub const fn text_chars(&self) -> usize {
        self.text_chars
    }

    /// Number of distinct description sections.
    #[must_use]
    pub const fn section_count(&self) -> usize {
        self.section_count
    }

    /// Whether the species carries at least one common name.
    #[must_use]
    pub const fn has_vernacular(&self) -> bool {
        self.has_vernacular
    }

    /// Whether the species carries at least one multimedia attachment.
    #[must_use]
    pub const fn has_multimedia(&self) -> bool {
        self.has_multimedia
    }
}

/// Joined, wrapped description text for one species.
#[derive(Clone, Debug)]
pub struct Description {
    lines: Vec<String>,
    signals: DescriptionSignals,
}

impl Description {
    /// Wrapped lines of the full description, in section order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Popularity signals extracted during the join.
    #[must_use]
    pub const fn signals(&self) -> &DescriptionSignals {
        &self.signals
    }

    /// Whether the description is substantial enough to host a full game.
    #[must_use]
    pub fn is_playable(&self, config: &GameConfig) -> bool {
        self.signals.text_chars >= config.min_description_chars()
            && self.lines.len() >= config.min_description_lines()
    }
}

/// Counters describing the outcome of the description join.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JoinReport {
    /// Total description records offered to the join.
    pub records_seen: u64,
    /// Records joined onto a stored species.
    pub joined: u64,
    /// Joined records that matched by scientific name rather than id.
    pub matched_by_name: u64,
    /// Records whose taxon resolved to a non-species rank.
    pub non_species: u64,
    /// Records that matched nothing in the store.
    pub unmatched: u64,
}

/// Species descriptions indexed by taxon identifier.
///
/// Records may arrive with identifiers from a different namespace than the
/// taxonomy itself, so the join tries the identifier first and falls back to
/// a case-insensitive scientific-name match against stored species.
#[derive(Debug, Default)]
pub struct DescriptionIndex {
    entries: HashMap<TaxonId, Description>,
}

impl DescriptionIndex {
    /// Joins description records onto stored species and wraps their text.
    ///
    /// Vernacular signals are read from the store, so vernacular names must
    /// be attached before the index is built.
    pub fn build(
        store: &TaxonStore,
        config: &GameConfig,
        records: impl IntoIterator<Item = DescriptionRecord>,
    ) -> (Self, JoinReport) {
        let mut by_name: HashMap<String, TaxonId> = HashMap::new();
        for taxon in store.taxa() {
            if taxon.rank() == Rank::Species {
                let _ = by_name.insert(taxon.scientific_name().to_ascii_lowercase(), taxon.id());
            }
        }

        let mut report = JoinReport::default();
        let mut sections: HashMap<TaxonId, Vec<String>> = HashMap::new();
        let mut order: Vec<TaxonId> = Vec::new();
        for record in records {
            report.records_seen += 1;
            let direct = record
                .taxon_id
                .and_then(|id| crate::query::taxon(store, id).ok());
            let id = match direct {
                Some(taxon) if taxon.rank() == Rank::Species => taxon.id(),
                Some(_) => {
                    report.non_species += 1;
                    continue;
                }
                None => {
                    match by_name.get(&record.scientific_name.to_ascii_lowercase()) {
                        Some(id) => {
                            report.matched_by_name += 1;
                            *id
                        }
                        None => {
                            report.unmatched += 1;
                            continue;
                        }
                    }
                }
            };
            report.joined += 1;
            let bucket = sections.entry(id).or_default();
            if bucket.is_empty() {
                order.push(id);
            }
            bucket.push(record.text);
        }

        let mut entries = HashMap::new();
        for id in order {
            let parts = match sections.remove(&id) {
                Some(parts) => parts,
                None => continue,
            };
            let text_chars = parts.iter().map(|part| part.chars().count()).sum();
            let section_count = parts.len();
            let has_vernacular = crate::query::taxon(store, id)
                .map(|taxon| !taxon.vernacular_names().is_empty())
                .unwrap_or(false);
            let lines = wrap_text(&parts.join("\n"), config.line_width());
            let _ = entries.insert(
                id,
                Description {
                    lines,
                    signals: DescriptionSignals {
                        text_chars,
                        section_count,
                        has_vernacular,
                        has_multimedia: false,
                    },
                },
            );
        }

        log::info!(
            "description join: {} of {} records joined onto {} species ({} by name, {} unmatched, {} non-species)",
            report.joined,
            report.records_seen,
            entries.len(),
            report.matched_by_name,
            report.unmatched,
            report.non_species,
        );
        (Self { entries }, report)
    }

    /// Flags described species that carry multimedia attachments.
    ///
    /// Returns how many attachments landed on a described species.
    pub fn mark_multimedia(
        &mut self,
        records: impl IntoIterator<Item = MultimediaRecord>,
    ) -> usize {
        let mut marked = 0;
        for record in records {
            if let Some(description) = self.entries.get_mut(&record.taxon_id) {
                description.signals.has_multimedia = true;
                marked += 1;
            }
        }
        marked
    }

    /// Looks up the description for a species, if one was joined.
    #[must_use]
    pub fn description_of(&self, id: TaxonId) -> Option<&Description> {
        self.entries.get(&id)
    }

    /// Iterates over all described species in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (TaxonId, &Description)> {
        self.entries.iter().map(|(id, description)| (*id, description))
    }

    /// Number of described species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no species has a description at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Greedily wraps text into lines at most `width` characters wide.
///
/// Words longer than the width occupy a line of their own; widths are
/// measured in characters, not bytes, so masked text wraps the same way as
/// its source.
#[must_use]
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for word in text.split_whitespace() {
        let word_width = word.chars().count();
        if current_width == 0 {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use clade_quest_core::TaxonRecord;

    fn store() -> TaxonStore {
        let records = vec![
            taxon(1, None, "kingdom", "Animalia"),
            taxon(10, Some(1), "phylum", "Chordata"),
            taxon(100, Some(10), "class", "Mammalia"),
            taxon(1000, Some(100), "order", "Carnivora"),
            taxon(1100, Some(1000), "family", "Felidae"),
            taxon(1110, Some(1100), "genus", "Felis"),
            taxon(1111, Some(1110), "species", "Felis catus"),
            taxon(1112, Some(1110), "species", "Felis silvestris"),
        ];
        let (store, _) = TaxonStore::build(records);
        store
    }

    fn taxon(id: u64, parent: Option<u64>, rank: &str, name: &str) -> TaxonRecord {
        TaxonRecord {
            id: TaxonId::new(id),
            parent_id: parent.map(TaxonId::new),
            rank: rank.to_string(),
            scientific_name: name.to_string(),
            accepted: true,
        }
    }

    fn desc(taxon_id: u64, name: &str, section: &str, text: &str) -> DescriptionRecord {
        DescriptionRecord {
            taxon_id: Some(TaxonId::new(taxon_id)),
            scientific_name: name.to_string(),
            section: section.to_string(),
            text: text.to_string(),
        }
    }

    fn unidentified(name: &str, text: &str) -> DescriptionRecord {
        DescriptionRecord {
            taxon_id: None,
            scientific_name: name.to_string(),
            section: "Abstract".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn join_matches_by_id_then_name() {
        let store = store();
        let config = GameConfig::default();
        let records = vec![
            desc(1111, "Felis catus", "Abstract", "The cat is a small mammal."),
            // Foreign id namespace; only the name matches.
            desc(90909, "FELIS SILVESTRIS", "Abstract", "The wildcat."),
            desc(80808, "Nothing known", "Abstract", "Unmatched."),
        ];
        let (index, report) = DescriptionIndex::build(&store, &config, records);
        assert_eq!(report.joined, 2);
        assert_eq!(report.matched_by_name, 1);
        assert_eq!(report.unmatched, 1);
        assert!(index.description_of(TaxonId::new(1111)).is_some());
        assert!(index.description_of(TaxonId::new(1112)).is_some());
    }

    #[test]
    fn records_without_ids_join_by_name_only() {
        // A species legitimately carrying id 0 must never attract records
        // whose own identifier was missing from the source.
        let records = vec![
            taxon(1, None, "kingdom", "Animalia"),
            taxon(10, Some(1), "phylum", "Chordata"),
            taxon(100, Some(10), "class", "Mammalia"),
            taxon(1000, Some(100), "order", "Carnivora"),
            taxon(1100, Some(1000), "family", "Felidae"),
            taxon(1110, Some(1100), "genus", "Felis"),
            taxon(0, Some(1110), "species", "Felis catus"),
            taxon(1112, Some(1110), "species", "Felis silvestris"),
        ];
        let (store, _) = TaxonStore::build(records);
        let config = GameConfig::default();
        let (index, report) = DescriptionIndex::build(
            &store,
            &config,
            vec![
                unidentified("Felis silvestris", "The wildcat."),
                unidentified("Nothing known", "Unmatched."),
            ],
        );
        assert_eq!(report.matched_by_name, 1);
        assert_eq!(report.unmatched, 1);
        assert!(index.description_of(TaxonId::new(0)).is_none());
        assert!(index.description_of(TaxonId::new(1112)).is_some());
    }

    #[test]
    fn join_refuses_non_species_targets() {
        let store = store();
        let config = GameConfig::default();
        let records = vec![desc(1110, "Felis", "Abstract", "A genus of cats.")];
        let (index, report) = DescriptionIndex::build(&store, &config, records);
        assert_eq!(report.non_species, 1);
        assert!(index.is_empty());
    }

    #[test]
    fn sections_concatenate_and_feed_signals() {
        let store = store();
        let config = GameConfig::default();
        let records = vec![
            desc(1111, "Felis catus", "Abstract", "First part."),
            desc(1111, "Felis catus", "Behavior", "Second part."),
        ];
        let (index, _) = DescriptionIndex::build(&store, &config, records);
        let description = index.description_of(TaxonId::new(1111)).expect("joined");
        assert_eq!(description.signals().section_count(), 2);
        assert_eq!(
            description.signals().text_chars(),
            "First part.".len() + "Second part.".len()
        );
        assert_eq!(description.lines(), ["First part. Second part."]);
    }

    #[test]
    fn multimedia_marks_only_described_species() {
        let store = store();
        let config = GameConfig::default();
        let records = vec![desc(1111, "Felis catus", "Abstract", "The cat.")];
        let (mut index, _) = DescriptionIndex::build(&store, &config, records);
        let marked = index.mark_multimedia(vec![
            MultimediaRecord {
                taxon_id: TaxonId::new(1111),
            },
            MultimediaRecord {
                taxon_id: TaxonId::new(1112),
            },
        ]);
        assert_eq!(marked, 1);
        let signals = index
            .description_of(TaxonId::new(1111))
            .expect("joined")
            .signals();
        assert!(signals.has_multimedia());
    }

    #[test]
    fn wrapping_is_greedy_and_char_based() {
        let lines = wrap_text("alpha beta gamma delta", 11);
        assert_eq!(lines, ["alpha beta", "gamma delta"]);
        let masked = wrap_text("█████ █████ █████", 11);
        assert_eq!(masked, ["█████ █████", "█████"]);
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn playability_requires_both_minimums() {
        let store = store();
        let config = GameConfig::new(5, 1, 3, 3, 10, 30, 3);
        let long = "one two three four five six seven eight nine ten";
        let (index, _) = DescriptionIndex::build(
            &store,
            &config,
            vec![
                desc(1111, "Felis catus", "Abstract", long),
                desc(1112, "Felis silvestris", "Abstract", "too short"),
            ],
        );
        assert!(index
            .description_of(TaxonId::new(1111))
            .expect("joined")
            .is_playable(&config));
        assert!(!index
            .description_of(TaxonId::new(1112))
            .expect("joined")
            .is_playable(&config));
    }
}
