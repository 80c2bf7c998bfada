#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Description redaction.
//!
//! A [`TermSet`] collects, per rank of the target's lineage, every term that
//! would give the answer away: scientific names and their parts, attached
//! common names, and well-known vernacular equivalents. Masking replaces
//! occurrences of terms from still-hidden ranks with an opaque marker.
//!
//! Matching is case-insensitive substring matching without word boundaries,
//! so compounds like "housecat" are caught when "cat" is hidden. The
//! occasional over-mask ("cat" inside "catch") is accepted; leaking the
//! answer is worse than smudging a word.

use clade_quest_core::Rank;

/// Opaque marker substituted for hidden terms.
pub const REDACTION_MARKER: &str = "█████";

/// Terms shorter than this never mask, to avoid shredding prose.
const MIN_TERM_CHARS: usize = 3;

/// One lineage step feeding term collection.
#[derive(Clone, Debug)]
pub struct TermSource {
    /// Rank of the lineage step.
    pub rank: Rank,
    /// Scientific name at this step.
    pub scientific_name: String,
    /// Common names attached to this step.
    pub vernacular_names: Vec<String>,
}

/// Redaction terms for one target lineage, grouped by rank.
#[derive(Clone, Debug, Default)]
pub struct TermSet {
    terms_by_rank: [Vec<String>; 7],
}

impl TermSet {
    /// Collects terms from every step of the target's lineage.
    #[must_use]
    pub fn build(sources: impl IntoIterator<Item = TermSource>) -> Self {
        let mut set = TermSet::default();
        for source in sources {
            let bucket = source.rank.index();
            set.add_with_parts(bucket, &source.scientific_name);
            for name in &source.vernacular_names {
                set.add_with_parts(bucket, name);
            }
            for equivalent in vernacular_equivalents(&source.scientific_name) {
                set.add_with_parts(bucket, equivalent);
            }
        }
        for bucket in &mut set.terms_by_rank {
            bucket.sort_by(|a, b| {
                b.chars()
                    .count()
                    .cmp(&a.chars().count())
                    .then_with(|| a.cmp(b))
            });
        }
        set
    }

    /// Adds a term and each of its long-enough whitespace-separated parts.
    fn add_with_parts(&mut self, bucket: usize, term: &str) {
        self.add(bucket, term);
        for part in term.split_whitespace() {
            self.add(bucket, part);
        }
    }

    fn add(&mut self, bucket: usize, term: &str) {
        let term = term.trim();
        if term.chars().count() < MIN_TERM_CHARS {
            return;
        }
        let duplicate = self.terms_by_rank[bucket]
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(term));
        if !duplicate {
            self.terms_by_rank[bucket].push(term.to_string());
        }
    }

    /// Terms collected for one rank, longest first.
    #[must_use]
    pub fn terms_for(&self, rank: Rank) -> &[String] {
        &self.terms_by_rank[rank.index()]
    }

    /// Masks all terms belonging to `hidden_from` and every deeper rank.
    ///
    /// `None` means the whole lineage is revealed and the text passes
    /// through untouched. Longer terms mask before their own parts, so
    /// "domestic cat" collapses to a single marker instead of leaving
    /// "domestic" beside a masked "cat".
    #[must_use]
    pub fn mask(&self, text: &str, hidden_from: Option<Rank>) -> String {
        let hidden_from = match hidden_from {
            Some(rank) => rank,
            None => return text.to_string(),
        };
        let mut hidden: Vec<&str> = Rank::ALL[hidden_from.index()..]
            .iter()
            .flat_map(|rank| self.terms_for(*rank))
            .map(String::as_str)
            .collect();
        hidden.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        hidden.dedup();
        let mut result = text.to_string();
        for term in hidden {
            result = mask_term(&result, term, REDACTION_MARKER);
        }
        result
    }
}

/// Replaces every case-insensitive occurrence of `term` with `marker`.
fn mask_term(text: &str, term: &str, marker: &str) -> String {
    let text_chars: Vec<char> = text.chars().collect();
    let term_chars: Vec<char> = term.chars().collect();
    if term_chars.is_empty() {
        return text.to_string();
    }
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    while cursor < text_chars.len() {
        if matches_at(&text_chars, cursor, &term_chars) {
            result.push_str(marker);
            cursor += term_chars.len();
        } else {
            result.push(text_chars[cursor]);
            cursor += 1;
        }
    }
    result
}

fn matches_at(text: &[char], at: usize, term: &[char]) -> bool {
    text.len() - at >= term.len()
        && text[at..at + term.len()]
            .iter()
            .zip(term)
            .all(|(a, b)| chars_eq_fold(*a, *b))
}

fn chars_eq_fold(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Well-known common-name equivalents for scientific names.
///
/// Curated from the ranks players actually reach; names without an entry
/// simply contribute nothing extra.
fn vernacular_equivalents(scientific_name: &str) -> &'static [&'static str] {
    match scientific_name {
        // Kingdoms
        "Animalia" => &["animal", "animals"],
        "Plantae" => &["plant", "plants"],
        "Fungi" => &["fungus", "fungi", "mushroom", "mushrooms"],
        "Bacteria" => &["bacterium", "bacteria"],
        "Archaea" => &["archaea", "archaeon"],
        "Chromista" => &["chromist", "chromists"],
        "Protozoa" => &["protozoan", "protozoans", "protozoa"],
        "Viruses" => &["virus", "viruses", "viral"],
        // Phyla
        "Chordata" => &["chordate", "chordates", "vertebrate", "vertebrates"],
        "Arthropoda" => &["arthropod", "arthropods"],
        "Mollusca" => &["mollusk", "mollusks", "mollusc", "molluscs"],
        "Annelida" => &["annelid", "annelids", "worm", "worms"],
        "Cnidaria" => &["cnidarian", "cnidarians"],
        "Echinodermata" => &["echinoderm", "echinoderms"],
        "Nematoda" => &["nematode", "nematodes", "roundworm", "roundworms"],
        "Platyhelminthes" => &["flatworm", "flatworms"],
        // Classes
        "Mammalia" => &["mammal", "mammals", "mammalian"],
        "Aves" => &["bird", "birds", "avian"],
        "Reptilia" => &["reptile", "reptiles", "reptilian"],
        "Amphibia" => &["amphibian", "amphibians"],
        "Actinopterygii" => &["fish", "fishes", "ray-finned fish"],
        "Chondrichthyes" => &["shark", "sharks", "ray", "rays", "cartilaginous fish"],
        "Insecta" => &["insect", "insects"],
        "Arachnida" => &["arachnid", "arachnids", "spider", "spiders"],
        "Crustacea" => &["crustacean", "crustaceans"],
        "Gastropoda" => &["snail", "snails", "slug", "slugs"],
        "Bivalvia" => &["bivalve", "bivalves", "clam", "clams", "mussel", "mussels"],
        // Orders
        "Carnivora" => &["carnivore", "carnivores", "carnivoran", "carnivorans"],
        "Primates" => &["primate", "primates"],
        "Rodentia" => &["rodent", "rodents"],
        "Chiroptera" => &["bat", "bats"],
        "Cetacea" => &["whale", "whales", "dolphin", "dolphins", "cetacean", "cetaceans"],
        "Artiodactyla" => &["ungulate", "ungulates", "even-toed ungulate"],
        "Perissodactyla" => &["odd-toed ungulate"],
        "Proboscidea" => &["elephant", "elephants"],
        "Lagomorpha" => &["rabbit", "rabbits", "hare", "hares"],
        "Squamata" => &["lizard", "lizards", "snake", "snakes"],
        "Testudines" => &["turtle", "turtles", "tortoise", "tortoises"],
        "Crocodilia" => &[
            "crocodile",
            "crocodiles",
            "alligator",
            "alligators",
            "crocodilian",
            "crocodilians",
        ],
        "Passeriformes" => &["songbird", "songbirds", "passerine", "passerines"],
        "Coleoptera" => &["beetle", "beetles"],
        "Lepidoptera" => &["butterfly", "butterflies", "moth", "moths"],
        "Hymenoptera" => &["ant", "ants", "bee", "bees", "wasp", "wasps"],
        "Diptera" => &["fly", "flies"],
        // Families
        "Felidae" => &["feline", "felines", "felid", "felids", "cat family"],
        "Canidae" => &["canine", "canines", "canid", "canids", "dog family"],
        "Ursidae" => &["bear", "bears", "ursid", "ursids"],
        "Hominidae" => &["great ape", "great apes", "hominid", "hominids"],
        "Bovidae" => &["bovid", "bovids"],
        "Equidae" => &["equid", "equids", "horse family"],
        "Cervidae" => &["deer", "cervid", "cervids"],
        "Elephantidae" => &["elephant", "elephants"],
        "Delphinidae" => &["dolphin", "dolphins"],
        "Accipitridae" => &["hawk", "hawks", "eagle", "eagles"],
        "Strigidae" => &["owl", "owls"],
        "Corvidae" => &["crow", "crows", "raven", "ravens", "corvid", "corvids"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(rank: Rank, name: &str, vernaculars: &[&str]) -> TermSource {
        TermSource {
            rank,
            scientific_name: name.to_string(),
            vernacular_names: vernaculars.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn cat_terms() -> TermSet {
        TermSet::build(vec![
            source(Rank::Kingdom, "Animalia", &[]),
            source(Rank::Phylum, "Chordata", &[]),
            source(Rank::Class, "Mammalia", &[]),
            source(Rank::Order, "Carnivora", &[]),
            source(Rank::Family, "Felidae", &[]),
            source(Rank::Genus, "Felis", &[]),
            source(Rank::Species, "Felis catus", &["cat", "domestic cat"]),
        ])
    }

    #[test]
    fn collects_names_parts_and_equivalents() {
        let terms = cat_terms();
        let family: Vec<&str> = terms.terms_for(Rank::Family).iter().map(String::as_str).collect();
        assert!(family.contains(&"Felidae"));
        assert!(family.contains(&"feline"));
        let species: Vec<&str> = terms
            .terms_for(Rank::Species)
            .iter()
            .map(String::as_str)
            .collect();
        assert!(species.contains(&"Felis catus"));
        assert!(species.contains(&"catus"));
        assert!(species.contains(&"cat"));
    }

    #[test]
    fn masking_is_case_insensitive_and_catches_compounds() {
        let terms = cat_terms();
        let masked = terms.mask("The CAT is a housecat.", Some(Rank::Kingdom));
        assert_eq!(masked, "The █████ is a house█████.");
    }

    #[test]
    fn longer_terms_mask_before_their_parts() {
        let terms = cat_terms();
        let masked = terms.mask("Often called the domestic cat.", Some(Rank::Kingdom));
        assert_eq!(masked, "Often called the █████.");
    }

    #[test]
    fn revealed_ranks_pass_through() {
        let terms = cat_terms();
        // Kingdom through class revealed; order and deeper still hidden.
        // "family" itself masks because the "cat family" equivalent
        // contributes its parts, exactly like the compound rule intends.
        let masked = terms.mask("A mammal of the family Felidae.", Some(Rank::Order));
        assert_eq!(masked, "A mammal of the █████ █████.");
        let revealed = terms.mask("A mammal, plainly an animal.", Some(Rank::Order));
        assert_eq!(revealed, "A mammal, plainly an animal.");
    }

    #[test]
    fn fully_revealed_text_is_untouched() {
        let terms = cat_terms();
        let text = "Felis catus is a feline.";
        assert_eq!(terms.mask(text, None), text);
    }

    #[test]
    fn masking_is_idempotent() {
        let terms = cat_terms();
        let once = terms.mask("The cat sat on the mat.", Some(Rank::Kingdom));
        let twice = terms.mask(&once, Some(Rank::Kingdom));
        assert_eq!(once, twice);
    }

    #[test]
    fn short_terms_never_mask() {
        let terms = TermSet::build(vec![source(Rank::Genus, "Io", &["io"])]);
        assert!(terms.terms_for(Rank::Genus).is_empty());
        assert_eq!(terms.mask("Io appears here.", Some(Rank::Kingdom)), "Io appears here.");
    }

    #[test]
    fn punctuation_survives_masking() {
        let terms = cat_terms();
        let masked = terms.mask("Cats, cats; and \"cats\"!", Some(Rank::Kingdom));
        assert_eq!(masked, "█████s, █████s; and \"█████s\"!");
    }
}
