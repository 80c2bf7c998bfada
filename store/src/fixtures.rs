//! Hand-built miniature taxonomy for downstream tests.
//!
//! The dataset spans two kingdoms with complete kingdom-to-species lineages,
//! one intermediate-rank link to exercise collapsing, and a spread of
//! description quality so popularity tiers separate. Enabled through the
//! `fixtures` cargo feature and consumed by other crates as a
//! dev-dependency.

use clade_quest_core::{
    DescriptionRecord, GameConfig, MultimediaRecord, TaxonId, TaxonRecord, VernacularRecord,
};

use crate::{DescriptionIndex, TaxonStore};

/// Kingdom Animalia.
pub const ANIMALIA: TaxonId = TaxonId::new(1);
/// Kingdom Plantae.
pub const PLANTAE: TaxonId = TaxonId::new(2);
/// Phylum Chordata, under Animalia.
pub const CHORDATA: TaxonId = TaxonId::new(10);
/// Phylum Arthropoda, under Animalia.
pub const ARTHROPODA: TaxonId = TaxonId::new(11);
/// Class Mammalia, under Chordata.
pub const MAMMALIA: TaxonId = TaxonId::new(100);
/// Class Aves, under Chordata.
pub const AVES: TaxonId = TaxonId::new(101);
/// Order Carnivora, under Mammalia.
pub const CARNIVORA: TaxonId = TaxonId::new(1000);
/// Order Primates, under Mammalia.
pub const PRIMATES: TaxonId = TaxonId::new(1001);
/// Family Felidae, under Carnivora via a suborder link.
pub const FELIDAE: TaxonId = TaxonId::new(1100);
/// Family Canidae, under Carnivora.
pub const CANIDAE: TaxonId = TaxonId::new(1200);
/// Genus Felis, under Felidae.
pub const FELIS: TaxonId = TaxonId::new(1110);
/// Genus Panthera, under Felidae.
pub const PANTHERA: TaxonId = TaxonId::new(1120);
/// The domestic cat, the most richly described fixture species.
pub const FELIS_CATUS: TaxonId = TaxonId::new(1111);
/// The wildcat; retained but never described.
pub const FELIS_SILVESTRIS: TaxonId = TaxonId::new(1112);
/// The lion.
pub const PANTHERA_LEO: TaxonId = TaxonId::new(1121);
/// The wolf.
pub const CANIS_LUPUS: TaxonId = TaxonId::new(1211);
/// The human.
pub const HOMO_SAPIENS: TaxonId = TaxonId::new(1511);
/// The common raven.
pub const CORVUS_CORAX: TaxonId = TaxonId::new(1311);
/// The golden ground beetle; described below the playability minimums.
pub const CARABUS_AURATUS: TaxonId = TaxonId::new(1411);
/// The sweet briar rose, the only described plant.
pub const ROSA_RUBIGINOSA: TaxonId = TaxonId::new(2111);

/// Gameplay configuration sized for the miniature dataset.
///
/// Narrow lines and low description minimums keep the fixture texts short
/// while still wrapping into several revealable lines.
#[must_use]
pub fn config() -> GameConfig {
    GameConfig::new(5, 1, 3, 3, 40, 120, 3)
}

fn taxon(id: u64, parent: Option<TaxonId>, rank: &str, name: &str) -> TaxonRecord {
    TaxonRecord {
        id: TaxonId::new(id),
        parent_id: parent,
        rank: rank.to_string(),
        scientific_name: name.to_string(),
        accepted: true,
    }
}

/// Taxon records for the full fixture tree.
#[must_use]
pub fn taxon_records() -> Vec<TaxonRecord> {
    vec![
        taxon(1, None, "kingdom", "Animalia"),
        taxon(2, None, "kingdom", "Plantae"),
        taxon(10, Some(ANIMALIA), "phylum", "Chordata"),
        taxon(11, Some(ANIMALIA), "phylum", "Arthropoda"),
        taxon(20, Some(PLANTAE), "phylum", "Tracheophyta"),
        taxon(100, Some(CHORDATA), "class", "Mammalia"),
        taxon(101, Some(CHORDATA), "class", "Aves"),
        taxon(110, Some(ARTHROPODA), "class", "Insecta"),
        taxon(200, Some(TaxonId::new(20)), "class", "Magnoliopsida"),
        taxon(1000, Some(MAMMALIA), "order", "Carnivora"),
        taxon(1001, Some(MAMMALIA), "order", "Primates"),
        taxon(1010, Some(AVES), "order", "Passeriformes"),
        taxon(1020, Some(TaxonId::new(110)), "order", "Coleoptera"),
        taxon(2000, Some(TaxonId::new(200)), "order", "Rosales"),
        // Suborder between Carnivora and Felidae collapses at build time.
        taxon(1050, Some(CARNIVORA), "suborder", "Feliformia"),
        taxon(1100, Some(TaxonId::new(1050)), "family", "Felidae"),
        taxon(1200, Some(CARNIVORA), "family", "Canidae"),
        taxon(1500, Some(PRIMATES), "family", "Hominidae"),
        taxon(1300, Some(TaxonId::new(1010)), "family", "Corvidae"),
        taxon(1400, Some(TaxonId::new(1020)), "family", "Carabidae"),
        taxon(2100, Some(TaxonId::new(2000)), "family", "Rosaceae"),
        taxon(1110, Some(FELIDAE), "genus", "Felis"),
        taxon(1120, Some(FELIDAE), "genus", "Panthera"),
        taxon(1210, Some(CANIDAE), "genus", "Canis"),
        taxon(1510, Some(TaxonId::new(1500)), "genus", "Homo"),
        taxon(1310, Some(TaxonId::new(1300)), "genus", "Corvus"),
        taxon(1410, Some(TaxonId::new(1400)), "genus", "Carabus"),
        taxon(2110, Some(TaxonId::new(2100)), "genus", "Rosa"),
        taxon(1111, Some(FELIS), "species", "Felis catus"),
        taxon(1112, Some(FELIS), "species", "Felis silvestris"),
        taxon(1121, Some(PANTHERA), "species", "Panthera leo"),
        taxon(1211, Some(TaxonId::new(1210)), "species", "Canis lupus"),
        taxon(1511, Some(TaxonId::new(1510)), "species", "Homo sapiens"),
        taxon(1311, Some(TaxonId::new(1310)), "species", "Corvus corax"),
        taxon(1411, Some(TaxonId::new(1410)), "species", "Carabus auratus"),
        taxon(2111, Some(TaxonId::new(2110)), "species", "Rosa rubiginosa"),
    ]
}

fn vernacular(taxon_id: TaxonId, name: &str, language: &str) -> VernacularRecord {
    VernacularRecord {
        taxon_id,
        name: name.to_string(),
        language: language.to_string(),
    }
}

/// Vernacular name records for the fixture tree.
#[must_use]
pub fn vernacular_records() -> Vec<VernacularRecord> {
    vec![
        vernacular(FELIS_CATUS, "Hauskatze", "de"),
        vernacular(FELIS_CATUS, "cat", "en"),
        vernacular(FELIS_CATUS, "domestic cat", "en"),
        vernacular(PANTHERA_LEO, "lion", "en"),
        vernacular(CANIS_LUPUS, "wolf", "en"),
        vernacular(HOMO_SAPIENS, "human", "en"),
        vernacular(CORVUS_CORAX, "common raven", "en"),
        vernacular(ROSA_RUBIGINOSA, "sweet briar", "en"),
    ]
}

fn description(taxon_id: TaxonId, name: &str, section: &str, text: &str) -> DescriptionRecord {
    DescriptionRecord {
        taxon_id: Some(taxon_id),
        scientific_name: name.to_string(),
        section: section.to_string(),
        text: text.to_string(),
    }
}

/// Description records for the fixture species.
///
/// Felis catus carries the richest entry so it tops every popularity
/// ranking; Carabus auratus is deliberately below the playability minimums.
#[must_use]
pub fn description_records() -> Vec<DescriptionRecord> {
    vec![
        description(
            FELIS_CATUS,
            "Felis catus",
            "Abstract",
            "The cat is a small domesticated carnivorous mammal. It is the only \
             domesticated species in the family Felidae and is often called the \
             domestic cat or housecat to distinguish it from its wild relatives.",
        ),
        description(
            FELIS_CATUS,
            "Felis catus",
            "Behavior",
            "Cats are crepuscular hunters that communicate through meowing, \
             purring, trilling and body language. A feline retains strong hunting \
             instincts even when kept indoors and fed by people.",
        ),
        description(
            FELIS_CATUS,
            "Felis catus",
            "Anatomy",
            "The animal has a strong flexible body, quick reflexes, sharp \
             retractable claws and teeth adapted to killing small prey.",
        ),
        description(
            PANTHERA_LEO,
            "Panthera leo",
            "Abstract",
            "The lion is a large cat of the genus Panthera native to Africa and \
             India. It has a muscular broad-chested body and a short rounded head.",
        ),
        description(
            PANTHERA_LEO,
            "Panthera leo",
            "Behavior",
            "Lions live in groups called prides and hunt cooperatively, mostly \
             preying on large ungulates across grasslands and savannas.",
        ),
        description(
            CANIS_LUPUS,
            "Canis lupus",
            "Abstract",
            "The wolf is a large canine native to Eurasia and North America. It \
             travels in nuclear families and is the largest extant member of the \
             dog family, with pointed ears and a bushy tail.",
        ),
        description(
            HOMO_SAPIENS,
            "Homo sapiens",
            "Abstract",
            "Humans are the most common and widespread species of primate, \
             characterised by bipedalism, large complex brains, language and the \
             formation of intricate social structures across every continent.",
        ),
        description(
            CORVUS_CORAX,
            "Corvus corax",
            "Abstract",
            "The common raven is a large all-black passerine bird found across \
             the Northern Hemisphere. It is among the most intelligent birds, \
             known for problem solving and aerial acrobatics.",
        ),
        description(
            ROSA_RUBIGINOSA,
            "Rosa rubiginosa",
            "Abstract",
            "The sweet briar is a dense deciduous shrub with fragrant foliage, \
             pink flowers and oval red hips, native to Europe and western Asia \
             and widely naturalised elsewhere.",
        ),
        description(
            CARABUS_AURATUS,
            "Carabus auratus",
            "Abstract",
            "A golden-green ground beetle of European fields.",
        ),
    ]
}

/// Multimedia records for the fixture species.
#[must_use]
pub fn multimedia_records() -> Vec<MultimediaRecord> {
    vec![
        MultimediaRecord {
            taxon_id: FELIS_CATUS,
        },
        MultimediaRecord {
            taxon_id: PANTHERA_LEO,
        },
    ]
}

/// Builds the fixture store and description index, fully loaded.
#[must_use]
pub fn store() -> (TaxonStore, DescriptionIndex) {
    let (mut store, _) = TaxonStore::build(taxon_records());
    let _ = store.attach_vernacular_names(vernacular_records());
    let config = config();
    let (mut index, _) = DescriptionIndex::build(&store, &config, description_records());
    let _ = index.mark_multimedia(multimedia_records());
    (store, index)
}
