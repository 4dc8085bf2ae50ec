/// Preview: interactive generation shell for trying phrases against a corpus.
///
/// Usage: preview (--corpus <file.txt> | --index <index.ron>) [--config <config.ron>]
///                [--neighbors <neighbors.ron>] [--seed <n>] [--weighted]
///
/// Commands:
///   <phrase>              generate a sentence for the phrase
///   gram <key> <value>    set key/value gram sizes
///   bulk <n> <phrase>     generate n sentences for the phrase
///   truecase <text>       true-case arbitrary text against the corpus
///   stats                 corpus statistics
///   help                  list commands
///   quit                  exit
use markov_pastiche::core::pipeline::PasticheEngine;
use markov_pastiche::core::truecase::TrueCaser;
use std::io::{self, BufRead, Write};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut builder = PasticheEngine::builder();
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--corpus" if i + 1 < args.len() => {
                i += 1;
                builder = builder.corpus_path(&args[i]);
            }
            "--index" if i + 1 < args.len() => {
                i += 1;
                builder = builder.index_path(&args[i]);
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                builder = builder.config_path(&args[i]);
            }
            "--neighbors" if i + 1 < args.len() => {
                i += 1;
                builder = builder.neighbors_path(&args[i]);
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--weighted" => {
                builder = builder.weighted(true);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut engine = match builder.seed(seed).build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut key_gram = engine.config().key_gram_size;
    let mut value_gram = engine.config().value_gram_size;

    println!(
        "Loaded {} sentences ({} unique words), chain length {}",
        engine.index().stats.num_sentences,
        engine.index().stats.unique_words,
        engine.index().gram_size
    );
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
            None => (line.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "gram" => {
                let sizes: Vec<usize> = rest
                    .split_whitespace()
                    .filter_map(|s| s.parse().ok())
                    .collect();
                if sizes.len() != 2 {
                    println!("Usage: gram <key> <value>");
                    println!("  Current: key={} value={}", key_gram, value_gram);
                    continue;
                }
                key_gram = sizes[0];
                value_gram = sizes[1];
                println!("Gram sizes set to key={} value={}", key_gram, value_gram);
            }
            "bulk" => {
                let Some((count, phrase)) = rest.split_once(char::is_whitespace) else {
                    println!("Usage: bulk <n> <phrase>");
                    continue;
                };
                let count: usize = count.parse().unwrap_or(5);
                let mut outputs = Vec::with_capacity(count);
                for _ in 0..count {
                    match engine.generate(phrase, key_gram, value_gram) {
                        Ok(text) => outputs.push(text),
                        Err(e) => {
                            println!("ERROR: {}", e);
                            break;
                        }
                    }
                }
                for (n, text) in outputs.iter().enumerate() {
                    println!("{:>3}. {}", n + 1, text);
                }
                print_variety(&outputs);
            }
            "truecase" => {
                let caser = TrueCaser::from_index(engine.index());
                println!("{}", caser.truecase_str(rest));
            }
            "stats" => {
                let index = engine.index();
                println!("Sentences:     {}", index.stats.num_sentences);
                println!("Tokens:        {}", index.stats.num_tokens);
                println!("Unique words:  {}", index.stats.unique_words);
                println!(
                    "Forward keys:  {} ({} transitions)",
                    index.forward.len(),
                    index.forward.transition_count()
                );
                println!(
                    "Backward keys: {} ({} transitions)",
                    index.backward.len(),
                    index.backward.transition_count()
                );
            }
            _ => match engine.generate(line, key_gram, value_gram) {
                Ok(text) => println!("{}", text),
                Err(e) => println!("ERROR: {}", e),
            },
        }
    }
}

/// Report how many of the generated sentences were distinct.
fn print_variety(outputs: &[String]) {
    if outputs.is_empty() {
        return;
    }
    let mut unique: Vec<&String> = outputs.iter().collect();
    unique.sort();
    unique.dedup();
    let avg_words = outputs
        .iter()
        .map(|s| s.split_whitespace().count())
        .sum::<usize>() as f64
        / outputs.len() as f64;
    println!(
        "--- {} of {} unique, {:.1} words on average ---",
        unique.len(),
        outputs.len(),
        avg_words
    );
}

fn print_usage() {
    println!("Usage: preview (--corpus <file.txt> | --index <index.ron>) [options]");
    println!();
    println!("Options:");
    println!("  --config <path>     Generator config (RON)");
    println!("  --neighbors <path>  Neighbor map (RON)");
    println!("  --seed <n>          RNG seed (default: 42)");
    println!("  --weighted          Sample from explicit-count tables");
}

fn print_help() {
    println!("Commands:");
    println!("  <phrase>             Generate a sentence for the phrase");
    println!("  gram <key> <value>   Set key/value gram sizes");
    println!("  bulk <n> <phrase>    Generate n sentences with variety stats");
    println!("  truecase <text>      True-case text against the corpus");
    println!("  stats                Corpus statistics");
    println!("  help                 Show this help");
    println!("  quit                 Exit");
}
