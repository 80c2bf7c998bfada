#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Clade Quest in a terminal.
//!
//! Loads the taxonomy and description archives, builds the engine once, and
//! runs one interactive session: the player picks numbered candidates rank
//! by rank, can peek at candidate metadata with `?N`, and watches the
//! redacted description grow with every guess.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;

use clade_quest_core::{ChoiceView, DescriptionView, GameConfig, SeedContext, WELCOME_BANNER};
use clade_quest_datasets as datasets;
use clade_quest_session::{Engine, GuessOutcome, RankTitleTable};
use clade_quest_store::{DescriptionIndex, TaxonStore};

/// Taxonomy guessing game over a local dataset.
#[derive(Parser)]
#[command(name = "clade-quest", version, about)]
struct Args {
    /// Directory holding the backbone taxonomy export (Taxon.tsv, ...).
    #[arg(long)]
    data_dir: PathBuf,

    /// Directory holding the description export (taxon.txt, description.txt).
    #[arg(long)]
    descriptions_dir: PathBuf,

    /// Difficulty tier: easy, medium, hard or expert.
    #[arg(long, default_value = "medium")]
    difficulty: String,

    /// Seed string making the mystery species reproducible.
    #[arg(long)]
    seed: Option<String>,

    /// Round number within a seeded sequence.
    #[arg(long, default_value_t = 1)]
    round: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let engine = load_engine(&args)?;
    let seed = args
        .seed
        .as_ref()
        .map(|seed| SeedContext::new(seed.clone(), args.round));
    play(&engine, &args.difficulty, seed.as_ref())
}

fn load_engine(args: &Args) -> anyhow::Result<Engine> {
    let config = GameConfig::default();

    let (taxa, read) = datasets::read_taxa(&args.data_dir.join("Taxon.tsv"))
        .context("loading taxonomy")?;
    let (mut store, load) = TaxonStore::build(taxa);
    log::info!(
        "taxonomy: {} taxa from {} rows ({} rows skipped, {} records excluded)",
        store.len(),
        read.rows_seen,
        read.skipped,
        load.excluded(),
    );

    let vernacular_path = args.data_dir.join("VernacularName.tsv");
    if vernacular_path.exists() {
        let (names, _) =
            datasets::read_vernacular_names(&vernacular_path).context("loading vernaculars")?;
        let _ = store.attach_vernacular_names(names);
    }

    let (sections, _) =
        datasets::read_descriptions(&args.descriptions_dir).context("loading descriptions")?;
    let (mut index, join) = DescriptionIndex::build(&store, &config, sections);
    if join.unmatched > 0 {
        log::warn!(
            "descriptions: {} of {} records matched nothing in the taxonomy",
            join.unmatched,
            join.records_seen,
        );
    }

    let multimedia_path = args.data_dir.join("Multimedia.tsv");
    if multimedia_path.exists() {
        let (media, _) =
            datasets::read_multimedia(&multimedia_path).context("loading multimedia")?;
        let _ = index.mark_multimedia(media);
    }

    Ok(Engine::new(
        Arc::new(store),
        Arc::new(index),
        config,
        RankTitleTable::default(),
    ))
}

fn play(engine: &Engine, difficulty: &str, seed: Option<&SeedContext>) -> anyhow::Result<()> {
    let start = engine.start(difficulty, seed)?;
    println!("{WELCOME_BANNER}");
    println!("Difficulty: {}. Identify the mystery species.", start.difficulty);
    print_round(&start.description, &start.choices, &start.progress);
    prompt()?;

    let stdin = io::stdin();
    let mut choices = start.choices;
    for line in stdin.lock().lines() {
        let line = line.context("reading input")?;
        let input = line.trim();
        if input.is_empty() {
            prompt()?;
            continue;
        }
        if matches!(input, "q" | "quit" | "exit") {
            engine.end(start.session)?;
            println!("Goodbye.");
            return Ok(());
        }
        if let Some(rest) = input.strip_prefix('?') {
            show_info(engine, &choices, rest, start.session);
            prompt()?;
            continue;
        }
        let Some(choice) = pick(&choices, input) else {
            println!("Enter a choice number, ?N for details, or quit.");
            prompt()?;
            continue;
        };
        match engine.guess(start.session, choice.id) {
            Ok(outcome) => {
                report_guess(&outcome);
                if outcome.complete {
                    engine.end(start.session)?;
                    return Ok(());
                }
                print_round(&outcome.description, &outcome.choices, &outcome.progress);
                choices = outcome.choices;
            }
            Err(error) => println!("{error}"),
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> anyhow::Result<()> {
    print!("> ");
    io::stdout().flush().context("flushing prompt")
}

fn pick<'a>(choices: &'a [ChoiceView], input: &str) -> Option<&'a ChoiceView> {
    let number: usize = input.parse().ok()?;
    choices.get(number.checked_sub(1)?)
}

fn print_round(description: &DescriptionView, choices: &[ChoiceView], progress: &str) {
    println!();
    println!(
        "--- description ({} of {} lines) ---",
        description.lines_visible, description.total_lines
    );
    println!("{}", description.text);
    println!("--- progress {progress} ---");
    if let Some(first) = choices.first() {
        println!("Pick the {}:", first.rank);
    }
    for (number, choice) in choices.iter().enumerate() {
        let vernacular = choice
            .vernacular
            .as_deref()
            .map(|name| format!(" ({name})"))
            .unwrap_or_default();
        println!(
            "  {}. {}{} [{} species]",
            number + 1,
            choice.name,
            vernacular,
            choice.descendant_count
        );
    }
}

fn show_info(
    engine: &Engine,
    choices: &[ChoiceView],
    input: &str,
    session: clade_quest_core::SessionId,
) {
    let Some(choice) = pick(choices, input.trim()) else {
        println!("Use ?N with a choice number.");
        return;
    };
    match engine.info(session, choice.id) {
        Ok(info) => {
            let vernacular = info.vernacular.as_deref().unwrap_or("no common name");
            println!(
                "{} ({}), {}: {} species beneath it.",
                info.name, vernacular, info.rank, info.descendant_count
            );
        }
        Err(error) => println!("{error}"),
    }
}

fn report_guess(outcome: &GuessOutcome) {
    if outcome.correct {
        if let Some(entry) = &outcome.revealed {
            println!("Correct! The {} is {}.", entry.rank, entry.name);
        }
    } else if outcome.forced {
        if let Some(entry) = &outcome.revealed {
            println!(
                "Out of guesses. The {} was {}. Moving on.",
                entry.rank, entry.name
            );
        }
    } else {
        println!(
            "Not quite. {} guesses left at this rank.",
            outcome.guesses_left
        );
    }
    if outcome.complete {
        println!();
        println!("--- the full description ---");
        println!("{}", outcome.description.text);
        println!();
        if let Some(path) = &outcome.final_path {
            let lineage: Vec<&str> = path.iter().map(|entry| entry.name.as_str()).collect();
            println!("Lineage: {}", lineage.join(" > "));
        }
        println!(
            "Finished with score {}: {}.",
            outcome.score,
            outcome.title.as_deref().unwrap_or("unranked")
        );
    }
}
