#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Immutable indexed taxonomy state.
//!
//! [`TaxonStore`] is built once from ingest records and never mutated during
//! play: sessions share it behind an `Arc` and read it through the [`query`]
//! module. The build collapses intermediate source ranks so that every stored
//! parent link spans exactly one major rank, which is what lets the gameplay
//! layer walk kingdom to species without per-query completeness checks.
//!
//! [`DescriptionIndex`] joins free-text description records onto stored
//! species and precomputes the popularity signals the tiering system reads.

use std::collections::HashMap;

use clade_quest_core::{Rank, StoreError, TaxonId, TaxonRecord, VernacularRecord};

mod description;
#[cfg(feature = "fixtures")]
pub mod fixtures;

pub use description::{
    wrap_text, Description, DescriptionIndex, DescriptionSignals, JoinReport,
};

/// Upper bound on raw parent-link hops when collapsing intermediate ranks.
///
/// Source taxonomies nest at most a handful of infra-ranks between two major
/// ranks; a walk longer than this is treated as a cycle.
const MAX_COLLAPSE_WALK: usize = 32;

/// How many records to ingest between progress log lines.
const PROGRESS_INTERVAL: u64 = 500_000;

/// A single retained taxon with its resolved major-rank parent link.
#[derive(Clone, Debug)]
pub struct Taxon {
    id: TaxonId,
    scientific_name: String,
    rank: Rank,
    parent: Option<TaxonId>,
    descendant_count: u64,
    vernacular_names: Vec<VernacularName>,
}

impl Taxon {
    /// Source-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> TaxonId {
        self.id
    }

    /// Canonical Latin name.
    #[must_use]
    pub fn scientific_name(&self) -> &str {
        &self.scientific_name
    }

    /// Major rank of the taxon.
    #[must_use]
    pub const fn rank(&self) -> Rank {
        self.rank
    }

    /// Parent taxon, exactly one major rank above, or `None` for kingdoms.
    #[must_use]
    pub const fn parent(&self) -> Option<TaxonId> {
        self.parent
    }

    /// Number of species leaves at or below this taxon.
    ///
    /// A species counts itself, so the value is zero only for interior taxa
    /// with no described lineage beneath them.
    #[must_use]
    pub const fn descendant_count(&self) -> u64 {
        self.descendant_count
    }

    /// Common names attached to the taxon, English entries first.
    #[must_use]
    pub fn vernacular_names(&self) -> &[VernacularName] {
        &self.vernacular_names
    }

    /// Preferred common name, if any were attached.
    #[must_use]
    pub fn primary_vernacular(&self) -> Option<&str> {
        self.vernacular_names.first().map(VernacularName::name)
    }
}

/// A common name in a specific language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VernacularName {
    name: String,
    language: String,
}

impl VernacularName {
    /// The common name itself.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Language code as supplied by the source, empty when unknown.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }
}

/// Counters describing what the store build kept and what it excluded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Total records offered to the build.
    pub records_seen: u64,
    /// Records retained as major-rank taxa.
    pub retained: u64,
    /// Records skipped because they were not accepted names.
    pub synonyms_skipped: u64,
    /// Records sharing an identifier with an earlier record; first one wins.
    pub duplicates: u64,
    /// Intermediate-rank records consumed by parent collapsing.
    pub collapsed: u64,
    /// Records whose parent chain left the dataset or whose parent was
    /// itself excluded.
    pub orphans: u64,
    /// Records whose parent chain looped back on itself.
    pub cycles: u64,
    /// Records whose nearest major-rank ancestor skipped a level.
    pub rank_gaps: u64,
}

impl LoadReport {
    /// Total records excluded for structural reasons.
    #[must_use]
    pub const fn excluded(&self) -> u64 {
        self.duplicates + self.orphans + self.cycles + self.rank_gaps
    }
}

/// Raw parent link kept for every accepted record during the build, whether
/// or not the record itself becomes a stored taxon.
struct RawLink {
    parent: Option<TaxonId>,
    rank: Option<Rank>,
}

/// Outcome of resolving a record's effective major-rank parent.
enum ParentResolution {
    Found(TaxonId),
    Orphan,
    Cycle,
    RankGap,
}

/// Arena of retained taxa with an adjacency index from parent to children.
#[derive(Debug)]
pub struct TaxonStore {
    taxa: Vec<Taxon>,
    slots: HashMap<TaxonId, usize>,
    children: Vec<Vec<TaxonId>>,
    roots: Vec<TaxonId>,
}

impl TaxonStore {
    /// Builds the store from ingest records.
    ///
    /// Processing runs one major rank at a time, kingdom first, so a record's
    /// effective parent is always resolvable by the time the record is
    /// considered. Records excluded for any reason are counted in the
    /// returned [`LoadReport`]; an exclusion cascades to all descendants of
    /// the excluded record.
    pub fn build(records: impl IntoIterator<Item = TaxonRecord>) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let mut raw: HashMap<TaxonId, RawLink> = HashMap::new();
        let mut by_rank: [Vec<(TaxonId, String)>; 7] = Default::default();

        for record in records {
            report.records_seen += 1;
            if report.records_seen % PROGRESS_INTERVAL == 0 {
                log::info!("ingested {} taxon records", report.records_seen);
            }
            if !record.accepted {
                report.synonyms_skipped += 1;
                continue;
            }
            if raw.contains_key(&record.id) {
                report.duplicates += 1;
                continue;
            }
            let rank = Rank::parse(&record.rank);
            if rank.is_none() {
                report.collapsed += 1;
            }
            let _ = raw.insert(
                record.id,
                RawLink {
                    parent: record.parent_id,
                    rank,
                },
            );
            if let Some(rank) = rank {
                by_rank[rank.index()].push((record.id, record.scientific_name));
            }
        }

        let mut store = TaxonStore {
            taxa: Vec::new(),
            slots: HashMap::new(),
            children: Vec::new(),
            roots: Vec::new(),
        };

        for (rank, bucket) in Rank::ALL.into_iter().zip(by_rank) {
            for (id, name) in bucket {
                let parent = if rank == Rank::Kingdom {
                    None
                } else {
                    match resolve_parent(&raw, &store.slots, id, rank) {
                        ParentResolution::Found(parent) => Some(parent),
                        ParentResolution::Orphan => {
                            report.orphans += 1;
                            continue;
                        }
                        ParentResolution::Cycle => {
                            report.cycles += 1;
                            continue;
                        }
                        ParentResolution::RankGap => {
                            report.rank_gaps += 1;
                            continue;
                        }
                    }
                };
                store.insert(id, name, rank, parent);
                report.retained += 1;
            }
        }

        store.freeze();
        if report.excluded() > 0 {
            log::warn!(
                "taxon build excluded {} records ({} duplicate, {} orphaned, {} cyclic, {} rank gaps)",
                report.excluded(),
                report.duplicates,
                report.orphans,
                report.cycles,
                report.rank_gaps,
            );
        }
        log::info!(
            "taxon store ready: {} taxa retained of {} records, {} roots",
            report.retained,
            report.records_seen,
            store.roots.len(),
        );
        (store, report)
    }

    fn insert(&mut self, id: TaxonId, name: String, rank: Rank, parent: Option<TaxonId>) {
        let slot = self.taxa.len();
        let _ = self.slots.insert(id, slot);
        self.taxa.push(Taxon {
            id,
            scientific_name: name,
            rank,
            parent,
            descendant_count: 0,
            vernacular_names: Vec::new(),
        });
        self.children.push(Vec::new());
        match parent {
            Some(parent) => {
                // Parent slot exists: ranks are processed top-down.
                if let Some(parent_slot) = self.slots.get(&parent).copied() {
                    self.children[parent_slot].push(id);
                }
            }
            None => self.roots.push(id),
        }
    }

    /// Sorts adjacency deterministically and aggregates descendant counts.
    ///
    /// Children always occupy higher slots than their parents, so a single
    /// reverse sweep sees every child before its parent.
    fn freeze(&mut self) {
        self.roots.sort_unstable();
        for list in &mut self.children {
            list.sort_unstable();
        }
        for slot in (0..self.taxa.len()).rev() {
            let count = if self.taxa[slot].rank == Rank::Species {
                1
            } else {
                self.children[slot]
                    .iter()
                    .map(|child| self.taxa[self.slots[child]].descendant_count)
                    .sum()
            };
            self.taxa[slot].descendant_count = count;
        }
    }

    /// Attaches vernacular names to retained taxa, English entries first.
    ///
    /// Names referencing unknown taxa are dropped. Returns how many names
    /// were attached. Must run before the store is shared, like the build
    /// itself.
    pub fn attach_vernacular_names(
        &mut self,
        records: impl IntoIterator<Item = VernacularRecord>,
    ) -> usize {
        let mut attached = 0;
        for record in records {
            if let Some(slot) = self.slots.get(&record.taxon_id).copied() {
                self.taxa[slot].vernacular_names.push(VernacularName {
                    name: record.name,
                    language: record.language,
                });
                attached += 1;
            }
        }
        for taxon in &mut self.taxa {
            taxon
                .vernacular_names
                .sort_by_key(|name| !matches!(name.language(), "en" | "eng"));
        }
        log::info!("attached {attached} vernacular names");
        attached
    }

    /// Number of retained taxa.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    /// Whether the store holds no taxa at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    /// Iterates over every retained taxon in build order.
    pub fn taxa(&self) -> impl Iterator<Item = &Taxon> {
        self.taxa.iter()
    }

    fn slot_of(&self, id: TaxonId) -> Result<usize, StoreError> {
        self.slots
            .get(&id)
            .copied()
            .ok_or(StoreError::UnknownTaxon(id))
    }
}

/// Walks raw parent links upward until the nearest major-rank ancestor.
fn resolve_parent(
    raw: &HashMap<TaxonId, RawLink>,
    retained: &HashMap<TaxonId, usize>,
    id: TaxonId,
    rank: Rank,
) -> ParentResolution {
    let expected = match rank.previous() {
        Some(previous) => previous,
        None => return ParentResolution::Orphan,
    };
    let mut cursor = match raw.get(&id).and_then(|link| link.parent) {
        Some(parent) => parent,
        None => return ParentResolution::Orphan,
    };
    for _ in 0..MAX_COLLAPSE_WALK {
        if cursor == id {
            return ParentResolution::Cycle;
        }
        let link = match raw.get(&cursor) {
            Some(link) => link,
            None => return ParentResolution::Orphan,
        };
        match link.rank {
            Some(ancestor_rank) if ancestor_rank == expected => {
                return if retained.contains_key(&cursor) {
                    ParentResolution::Found(cursor)
                } else {
                    // Parent itself was excluded; the exclusion cascades.
                    ParentResolution::Orphan
                };
            }
            Some(_) => return ParentResolution::RankGap,
            None => match link.parent {
                Some(parent) => cursor = parent,
                None => return ParentResolution::Orphan,
            },
        }
    }
    ParentResolution::Cycle
}

/// Read-only lookups against a built [`TaxonStore`].
pub mod query {
    use super::{StoreError, Taxon, TaxonId, TaxonStore};

    /// Looks up a taxon by identifier.
    pub fn taxon(store: &TaxonStore, id: TaxonId) -> Result<&Taxon, StoreError> {
        let slot = store.slot_of(id)?;
        Ok(&store.taxa[slot])
    }

    /// Children of a taxon, sorted by identifier.
    ///
    /// An empty slice is a successful answer; only unknown identifiers fail.
    pub fn children_of(store: &TaxonStore, id: TaxonId) -> Result<&[TaxonId], StoreError> {
        let slot = store.slot_of(id)?;
        Ok(&store.children[slot])
    }

    /// Kingdom-level taxa, sorted by identifier.
    #[must_use]
    pub fn roots(store: &TaxonStore) -> &[TaxonId] {
        &store.roots
    }

    /// Taxa sharing the node's rank and parent, the node itself excluded.
    ///
    /// Kingdoms are siblings of the other kingdoms.
    pub fn siblings_of(store: &TaxonStore, id: TaxonId) -> Result<Vec<TaxonId>, StoreError> {
        let node = taxon(store, id)?;
        let peers = match node.parent() {
            Some(parent) => children_of(store, parent)?,
            None => roots(store),
        };
        Ok(peers.iter().copied().filter(|peer| *peer != id).collect())
    }

    /// Path from the given taxon up to its kingdom, the taxon itself first.
    pub fn path_to_root(store: &TaxonStore, id: TaxonId) -> Result<Vec<TaxonId>, StoreError> {
        let mut path = Vec::new();
        let mut cursor = taxon(store, id)?;
        path.push(cursor.id());
        while let Some(parent) = cursor.parent() {
            cursor = taxon(store, parent)?;
            path.push(cursor.id());
        }
        Ok(path)
    }
}
