#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Dataset readers producing ingest records.
//!
//! Two source archives feed the engine: a backbone taxonomy export with
//! header-labelled TSV files (`Taxon.tsv`, `VernacularName.tsv`,
//! `Multimedia.tsv`) and a species-description export with positional TSV
//! files (`taxon.txt`, `description.txt`). Readers never fail on a bad row;
//! they skip it, count it, and keep going, because multi-gigabyte exports
//! always contain a few mangled lines. Only missing files and absent
//! required columns are fatal.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use clade_quest_core::{DescriptionRecord, MultimediaRecord, TaxonId, TaxonRecord, VernacularRecord};
use thiserror::Error;

/// How many rows to read between progress log lines.
const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Status value marking an accepted (non-synonym) backbone record.
const STATUS_ACCEPTED: &str = "accepted";

/// Suffix marking synonym entries in the description export's taxon file.
const SYNONYM_ID_MARKER: &str = "-syn";

/// Failures opening or shaping a dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A dataset file could not be opened or read.
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying io failure.
        #[source]
        source: io::Error,
    },
    /// A header-labelled file lacked a required column.
    #[error("column '{column}' missing from {path:?}")]
    MissingColumn {
        /// File with the malformed header.
        path: PathBuf,
        /// The column the reader needs.
        column: &'static str,
    },
}

/// Counters describing one reader pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// Data rows seen, excluding the header.
    pub rows_seen: u64,
    /// Rows converted into records.
    pub records: u64,
    /// Rows skipped as unparsable or filtered out.
    pub skipped: u64,
}

/// Reads backbone taxon records from a `Taxon.tsv` file.
pub fn read_taxa(path: &Path) -> Result<(Vec<TaxonRecord>, ReadReport), DatasetError> {
    let reader = open(path)?;
    parse_taxa(reader, path)
}

fn parse_taxa(
    reader: impl BufRead,
    path: &Path,
) -> Result<(Vec<TaxonRecord>, ReadReport), DatasetError> {
    let mut lines = reader.lines();
    let header = Header::read(&mut lines, path)?;
    let id_col = header.require("taxonID", path)?;
    let parent_col = header.require("parentNameUsageID", path)?;
    let rank_col = header.require("taxonRank", path)?;
    let status_col = header.require("taxonomicStatus", path)?;
    let scientific_col = header.require("scientificName", path)?;
    let canonical_col = header.column("canonicalName");

    let mut records = Vec::new();
    let mut report = ReadReport::default();
    for line in lines {
        let line = line.map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        report.rows_seen += 1;
        if report.rows_seen % PROGRESS_INTERVAL == 0 {
            log::info!("{}: {} rows read", path.display(), report.rows_seen);
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let id = match field(&fields, id_col).parse::<u64>() {
            Ok(id) => TaxonId::new(id),
            Err(_) => {
                report.skipped += 1;
                continue;
            }
        };
        let parent_id = field(&fields, parent_col).parse::<u64>().ok().map(TaxonId::new);
        let canonical = canonical_col.map(|col| field(&fields, col)).unwrap_or("");
        let scientific = field(&fields, scientific_col);
        let name = if canonical.is_empty() { scientific } else { canonical };
        if name.is_empty() {
            report.skipped += 1;
            continue;
        }
        records.push(TaxonRecord {
            id,
            parent_id,
            rank: field(&fields, rank_col).to_string(),
            scientific_name: name.to_string(),
            accepted: field(&fields, status_col).eq_ignore_ascii_case(STATUS_ACCEPTED),
        });
        report.records += 1;
    }
    log::info!(
        "{}: {} taxon records from {} rows ({} skipped)",
        path.display(),
        report.records,
        report.rows_seen,
        report.skipped,
    );
    Ok((records, report))
}

/// Reads vernacular name records from a `VernacularName.tsv` file.
pub fn read_vernacular_names(
    path: &Path,
) -> Result<(Vec<VernacularRecord>, ReadReport), DatasetError> {
    let reader = open(path)?;
    parse_vernacular_names(reader, path)
}

fn parse_vernacular_names(
    reader: impl BufRead,
    path: &Path,
) -> Result<(Vec<VernacularRecord>, ReadReport), DatasetError> {
    let mut lines = reader.lines();
    let header = Header::read(&mut lines, path)?;
    let id_col = header.require("taxonID", path)?;
    let name_col = header.require("vernacularName", path)?;
    let language_col = header.column("language");

    let mut records = Vec::new();
    let mut report = ReadReport::default();
    for line in lines {
        let line = line.map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        report.rows_seen += 1;
        let fields: Vec<&str> = line.split('\t').collect();
        let id = match field(&fields, id_col).parse::<u64>() {
            Ok(id) => TaxonId::new(id),
            Err(_) => {
                report.skipped += 1;
                continue;
            }
        };
        let name = field(&fields, name_col);
        if name.is_empty() {
            report.skipped += 1;
            continue;
        }
        records.push(VernacularRecord {
            taxon_id: id,
            name: name.to_string(),
            language: language_col
                .map(|col| field(&fields, col))
                .unwrap_or("")
                .to_string(),
        });
        report.records += 1;
    }
    Ok((records, report))
}

/// Reads multimedia markers from a `Multimedia.tsv` file.
pub fn read_multimedia(path: &Path) -> Result<(Vec<MultimediaRecord>, ReadReport), DatasetError> {
    let reader = open(path)?;
    parse_multimedia(reader, path)
}

fn parse_multimedia(
    reader: impl BufRead,
    path: &Path,
) -> Result<(Vec<MultimediaRecord>, ReadReport), DatasetError> {
    let mut lines = reader.lines();
    let header = Header::read(&mut lines, path)?;
    let id_col = header.require("taxonID", path)?;

    let mut records = Vec::new();
    let mut report = ReadReport::default();
    for line in lines {
        let line = line.map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        report.rows_seen += 1;
        let fields: Vec<&str> = line.split('\t').collect();
        match field(&fields, id_col).parse::<u64>() {
            Ok(id) => {
                records.push(MultimediaRecord {
                    taxon_id: TaxonId::new(id),
                });
                report.records += 1;
            }
            Err(_) => report.skipped += 1,
        }
    }
    Ok((records, report))
}

/// Reads description records from a description export directory.
///
/// The export pairs a positional `taxon.txt` (identifier, URL, date,
/// scientific name, ...) with a positional `description.txt` (identifier,
/// language, section, text). Synonym identifiers and non-English sections
/// are skipped; each kept section becomes one record carrying the resolved
/// scientific name so the store can join by name when identifier spaces
/// differ.
pub fn read_descriptions(dir: &Path) -> Result<(Vec<DescriptionRecord>, ReadReport), DatasetError> {
    let taxon_path = dir.join("taxon.txt");
    let names = parse_description_names(open(&taxon_path)?, &taxon_path)?;
    let description_path = dir.join("description.txt");
    parse_descriptions(open(&description_path)?, &description_path, &names)
}

fn parse_description_names(
    reader: impl BufRead,
    path: &Path,
) -> Result<HashMap<String, String>, DatasetError> {
    let mut names = HashMap::new();
    for line in reader.lines() {
        let line = line.map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            continue;
        }
        let id = fields[0].trim();
        if id.is_empty() || id.contains(SYNONYM_ID_MARKER) {
            continue;
        }
        let name = fields[3].trim();
        if !name.is_empty() {
            let _ = names.insert(id.to_string(), name.to_string());
        }
    }
    Ok(names)
}

fn parse_descriptions(
    reader: impl BufRead,
    path: &Path,
    names: &HashMap<String, String>,
) -> Result<(Vec<DescriptionRecord>, ReadReport), DatasetError> {
    let mut records = Vec::new();
    let mut report = ReadReport::default();
    for line in reader.lines() {
        let line = line.map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        report.rows_seen += 1;
        if report.rows_seen % PROGRESS_INTERVAL == 0 {
            log::info!("{}: {} rows read", path.display(), report.rows_seen);
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            report.skipped += 1;
            continue;
        }
        let raw_id = fields[0].trim();
        let language = fields[1].trim();
        let section = fields[2].trim();
        let text = strip_markup(fields[3]);
        if raw_id.is_empty() || text.is_empty() {
            report.skipped += 1;
            continue;
        }
        if !language.is_empty() && !language.eq_ignore_ascii_case("en") {
            report.skipped += 1;
            continue;
        }
        let scientific_name = match names.get(raw_id) {
            Some(name) => name.clone(),
            None => {
                report.skipped += 1;
                continue;
            }
        };
        // Description exports use their own identifier space; keep the raw
        // value when numeric so direct joins still work, otherwise leave
        // only the name join.
        let taxon_id = raw_id.parse::<u64>().ok().map(TaxonId::new);
        records.push(DescriptionRecord {
            taxon_id,
            scientific_name,
            section: section.to_string(),
            text,
        });
        report.records += 1;
    }
    log::info!(
        "{}: {} description sections from {} rows ({} skipped)",
        path.display(),
        report.records,
        report.rows_seen,
        report.skipped,
    );
    Ok((records, report))
}

/// Drops HTML markup, turning explicit breaks into newlines.
fn strip_markup(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        result.push_str(&rest[..start]);
        match rest[start..].find('>') {
            Some(end) => {
                let tag = &rest[start + 1..start + end];
                if tag.trim_end_matches('/').trim().eq_ignore_ascii_case("br") {
                    result.push('\n');
                }
                rest = &rest[start + end + 1..];
            }
            None => {
                // Unterminated tag; keep the text as-is.
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result.trim().to_string()
}

/// Column positions keyed by header label.
struct Header {
    columns: HashMap<String, usize>,
}

impl Header {
    fn read(
        lines: &mut io::Lines<impl BufRead>,
        path: &Path,
    ) -> Result<Self, DatasetError> {
        let line = match lines.next() {
            Some(line) => line.map_err(|source| DatasetError::Io {
                path: path.to_path_buf(),
                source,
            })?,
            None => String::new(),
        };
        let columns = line
            .split('\t')
            .enumerate()
            .map(|(index, label)| (label.trim().to_string(), index))
            .collect();
        Ok(Self { columns })
    }

    fn column(&self, label: &str) -> Option<usize> {
        self.columns.get(label).copied()
    }

    fn require(&self, label: &'static str, path: &Path) -> Result<usize, DatasetError> {
        self.column(label).ok_or(DatasetError::MissingColumn {
            path: path.to_path_buf(),
            column: label,
        })
    }
}

fn field<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).map_or("", |value| value.trim())
}

fn open(path: &Path) -> Result<BufReader<File>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("test.tsv")
    }

    #[test]
    fn taxa_parse_with_status_and_canonical_name() {
        let data = "taxonID\tparentNameUsageID\tscientificName\tcanonicalName\ttaxonRank\ttaxonomicStatus\n\
                    1\t\tAnimalia\tAnimalia\tkingdom\taccepted\n\
                    2312\t1\tFelis catus Linnaeus, 1758\tFelis catus\tspecies\taccepted\n\
                    999\t1\tFelis domesticus\tFelis domesticus\tspecies\tsynonym\n\
                    bogus\t1\tBroken\tBroken\tspecies\taccepted\n";
        let (records, report) = parse_taxa(Cursor::new(data), &path()).expect("parse");
        assert_eq!(report.rows_seen, 4);
        assert_eq!(report.records, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(records[0].id, TaxonId::new(1));
        assert_eq!(records[0].parent_id, None);
        assert!(records[0].accepted);
        assert_eq!(records[1].scientific_name, "Felis catus");
        assert_eq!(records[1].parent_id, Some(TaxonId::new(1)));
        assert!(!records[2].accepted);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let data = "taxonID\tparentNameUsageID\tscientificName\ttaxonRank\n1\t\tAnimalia\tkingdom\n";
        let result = parse_taxa(Cursor::new(data), &path());
        assert!(matches!(
            result,
            Err(DatasetError::MissingColumn {
                column: "taxonomicStatus",
                ..
            })
        ));
    }

    #[test]
    fn vernacular_names_keep_language() {
        let data = "taxonID\tvernacularName\tlanguage\n\
                    2312\tcat\ten\n\
                    2312\tHauskatze\tde\n\
                    \t\t\n";
        let (records, report) =
            parse_vernacular_names(Cursor::new(data), &path()).expect("parse");
        assert_eq!(report.records, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(records[0].name, "cat");
        assert_eq!(records[0].language, "en");
    }

    #[test]
    fn multimedia_keeps_only_parsable_ids() {
        let data = "taxonID\tidentifier\n2312\thttp://example.org/cat.jpg\nnope\tx\n";
        let (records, report) = parse_multimedia(Cursor::new(data), &path()).expect("parse");
        assert_eq!(report.records, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(records[0].taxon_id, TaxonId::new(2312));
    }

    #[test]
    fn descriptions_resolve_names_and_filter_synonyms() {
        let taxa = "77\thttp://en.wikipedia.org/wiki/Cat\t2024-01-01\tFelis catus\t\tspecies\n\
                    77-syn\thttp://en.wikipedia.org/wiki/Cat\t2024-01-01\tFelis domesticus\t\tspecies\n";
        let names = parse_description_names(Cursor::new(taxa), &path()).expect("parse");
        assert_eq!(names.len(), 1);

        let sections = "77\ten\tAbstract\tThe <b>cat</b> is small.<br/>It purrs.\n\
                        77\tde\tAbstract\tDie Katze.\n\
                        88\ten\tAbstract\tNo taxon entry.\n";
        let (records, report) =
            parse_descriptions(Cursor::new(sections), &path(), &names).expect("parse");
        assert_eq!(report.records, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(records[0].scientific_name, "Felis catus");
        assert_eq!(records[0].section, "Abstract");
        assert_eq!(records[0].text, "The cat is small.\nIt purrs.");
        assert_eq!(records[0].taxon_id, Some(TaxonId::new(77)));
    }

    #[test]
    fn non_numeric_description_ids_carry_no_taxon_id() {
        let taxa = "Q777\thttp://en.wikipedia.org/wiki/Lion\t2024-01-01\tPanthera leo\t\tspecies\n";
        let names = parse_description_names(Cursor::new(taxa), &path()).expect("parse");

        let sections = "Q777\ten\tAbstract\tThe lion is a large cat.\n";
        let (records, report) =
            parse_descriptions(Cursor::new(sections), &path(), &names).expect("parse");
        assert_eq!(report.records, 1);
        assert_eq!(records[0].taxon_id, None);
        assert_eq!(records[0].scientific_name, "Panthera leo");
    }

    #[test]
    fn markup_stripping_handles_breaks_and_unterminated_tags() {
        assert_eq!(strip_markup("a<br>b"), "a\nb");
        assert_eq!(strip_markup("a<br />b"), "a\nb");
        assert_eq!(strip_markup("<i>Felis</i> catus"), "Felis catus");
        assert_eq!(strip_markup("broken <tag"), "broken <tag");
    }
}
