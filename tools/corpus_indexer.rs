/// Corpus Indexer: builds forward/backward transition tables from a text
/// corpus and saves them as a RON index.
///
/// Usage: corpus_indexer --input <corpus.txt> --output <index.ron> [--gram <n>] [--weighted]
use std::env;
use std::process;

use markov_pastiche::core::index::{save_index, CorpusIndex};

const USAGE: &str =
    "Usage: corpus_indexer --input <corpus.txt> --output <index.ron> [--gram <n>] [--weighted]";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut output = None;
    let mut gram = 3usize;
    let mut weighted = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" if i + 1 < args.len() => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--output" if i + 1 < args.len() => {
                i += 1;
                output = Some(args[i].clone());
            }
            "--gram" if i + 1 < args.len() => {
                i += 1;
                gram = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("Error: --gram must be a positive integer");
                    process::exit(1);
                });
            }
            "--weighted" => weighted = true,
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{}", USAGE);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let output_path = output.unwrap_or_else(|| {
        eprintln!("Error: --output is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    println!("Indexing '{}' with gram size {}...", input_path, gram);
    let index = CorpusIndex::from_path(std::path::Path::new(&input_path), gram)
        .unwrap_or_else(|e| {
            eprintln!("Error indexing '{}': {}", input_path, e);
            process::exit(1);
        });

    println!(
        "Indexed {} sentences, {} tokens, {} unique words",
        index.stats.num_sentences, index.stats.num_tokens, index.stats.unique_words
    );
    println!(
        "Forward: {} keys, {} transitions",
        index.forward.len(),
        index.forward.transition_count()
    );
    println!(
        "Backward: {} keys, {} transitions",
        index.backward.len(),
        index.backward.transition_count()
    );

    if weighted {
        let forward = index.forward.to_weighted();
        let backward = index.backward.to_weighted();
        println!(
            "Weighted: {} forward and {} backward distinct transitions",
            forward.distinct_transitions(),
            backward.distinct_transitions()
        );
    }

    save_index(&index, std::path::Path::new(&output_path)).unwrap_or_else(|e| {
        eprintln!("Error saving index to '{}': {}", output_path, e);
        process::exit(1);
    });

    println!("Index saved to '{}'", output_path);
}
