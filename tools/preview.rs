/// Preview — interactive generation shell for testing grammars.
///
/// Usage: preview --grammar <file> [--config <file>] [--seed <n>]
///
/// Commands:
///   gen [symbol]  — generate from $s or the given symbol
///   trace         — generate once and print every symbol visit
///   bulk <n>      — generate n sentences with variety stats
///   seed <n>      — restart the RNG from a seed
///   symbols       — list the compiled table
///   reload        — recompile the grammar file
///   help          — list commands
///   quit          — exit

use polygen::core::pipeline::Polygen;
use rustc_hash::{FxHashMap, FxHashSet};
use std::io::{self, BufRead, Write};

/// Where the engine comes from; kept for `reload`.
struct Sources {
    grammar: Option<String>,
    config: Option<String>,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut sources = Sources {
        grammar: None,
        config: None,
    };
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--grammar" if i + 1 < args.len() => {
                i += 1;
                sources.grammar = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                sources.config = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                match args[i].parse() {
                    Ok(n) => seed = Some(n),
                    Err(_) => {
                        eprintln!("Invalid seed: {}", args[i]);
                        std::process::exit(1);
                    }
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut engine = match build_engine(&sources, seed) {
        Some(engine) => engine,
        None => std::process::exit(1),
    };

    println!("Loaded {} symbols", engine.grammar().table().len());
    print_seed(&engine);
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

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "gen" | "g" => {
                let result = match parts.get(1) {
                    Some(symbol) => engine.generate_from(symbol),
                    None => engine.generate(),
                };
                match result {
                    Ok(text) => println!("{}", text),
                    Err(e) => eprintln!("ERROR: {}", e),
                }
            }
            "trace" => match engine.generate_traced() {
                Ok((text, steps)) => {
                    println!("\n--- Generated Text ---");
                    println!("{}", text);
                    println!("--- End ---\n");
                    for step in &steps {
                        println!(
                            "[Trace] {}{} -> alternative {} of {}",
                            "  ".repeat(step.depth),
                            step.symbol,
                            step.choice + 1,
                            step.alternatives,
                        );
                    }
                    println!();
                }
                Err(e) => eprintln!("ERROR: {}", e),
            },
            "seed" => {
                if parts.len() < 2 {
                    print_seed(&engine);
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(s) => {
                        engine.reseed(s);
                        println!("Seed set to {}", s);
                    }
                    Err(_) => {
                        println!("Invalid seed: {}", parts[1]);
                    }
                }
            }
            "symbols" => {
                for (symbol, production) in engine.grammar().table().iter() {
                    let marker = if symbol.is_synthetic() { " (group)" } else { "" };
                    println!(
                        "  {}{}: {} alternatives",
                        symbol,
                        marker,
                        production.len()
                    );
                }
            }
            "reload" => {
                // Keep the session's current seed across the rebuild.
                match build_engine(&sources, engine.seed().or(seed)) {
                    Some(rebuilt) => {
                        engine = rebuilt;
                        println!("Reloaded {} symbols", engine.grammar().table().len());
                    }
                    None => println!("Keeping the previous grammar."),
                }
            }
            "bulk" => {
                if parts.len() < 2 {
                    println!("Usage: bulk <n>");
                    continue;
                }
                let count: usize = match parts[1].parse() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        println!("Invalid count: {}", parts[1]);
                        continue;
                    }
                };
                print_bulk_stats(&mut engine, count);
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for available commands.", cmd);
            }
        }
    }
}

fn print_bulk_stats(engine: &mut Polygen, count: usize) {
    let mut sentences = Vec::with_capacity(count);
    let mut errors = 0;
    for _ in 0..count {
        match engine.generate() {
            Ok(text) => sentences.push(text),
            Err(_) => errors += 1,
        }
    }

    println!("\n=== Bulk Generation: {} sentences ({} errors) ===\n", sentences.len(), errors);

    let unique: FxHashSet<&String> = sentences.iter().collect();
    println!("Unique sentences: {} / {}", unique.len(), sentences.len());

    let avg_len: f64 = if sentences.is_empty() {
        0.0
    } else {
        sentences.iter().map(|s| s.len() as f64).sum::<f64>() / sentences.len() as f64
    };
    println!("Average length: {:.0} chars", avg_len);

    let mut word_counts: FxHashMap<String, u32> = FxHashMap::default();
    for sentence in &sentences {
        for word in sentence.split_whitespace() {
            let clean = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if clean.len() > 3 {
                *word_counts.entry(clean).or_insert(0) += 1;
            }
        }
    }
    let mut word_freq: Vec<(String, u32)> = word_counts.into_iter().collect();
    word_freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    println!("\nTop 10 words:");
    for (word, count) in word_freq.iter().take(10) {
        println!("  {}: {}", word, count);
    }

    if let Some(first) = sentences.first() {
        println!("\nSample sentence:");
        println!("  {}", first);
    }
    println!();
}

fn build_engine(sources: &Sources, seed: Option<u64>) -> Option<Polygen> {
    let mut builder = Polygen::builder();
    if let Some(ref path) = sources.config {
        builder = builder.config_file(path);
    }
    if let Some(ref path) = sources.grammar {
        builder = builder.grammar_file(path);
    }
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }

    match builder.build() {
        Ok(engine) => {
            if let Some(ref path) = sources.config {
                println!("Loaded config: {}", path);
            }
            if let Some(ref path) = sources.grammar {
                println!("Loaded grammar: {}", path);
            }
            Some(engine)
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            None
        }
    }
}

fn print_seed(engine: &Polygen) {
    match engine.seed() {
        Some(seed) => println!("Seed: {}", seed),
        None => println!("Seed: none (entropy)"),
    }
}

fn print_usage() {
    println!("Preview — interactive generation shell for testing grammars.");
    println!();
    println!("Usage: preview --grammar <file> [--config <file>] [--seed <n>]");
    println!();
    println!("  --grammar <file>  Grammar source file (.pg)");
    println!("  --config <file>   RON engine config; may name the grammar itself");
    println!("  --seed <n>        Initial RNG seed (default: from config, else entropy)");
}

fn print_help() {
    println!("Commands:");
    println!("  gen [symbol]  Generate from $s, or from the given symbol");
    println!("  trace         Generate once and show every symbol visit");
    println!("  bulk <n>      Generate n sentences with variety statistics");
    println!("  seed <n>      Restart the RNG from a seed");
    println!("  symbols       List symbols and their alternative counts");
    println!("  reload        Recompile the grammar from disk");
    println!("  help          Show this help");
    println!("  quit          Exit");
    println!();
    println!("Grammar syntax:");
    println!("  $sym = a | b;   alternatives      [x]   optional group");
    println!("  (x|y)           plain group       >$c   forced substitution");
    println!("  a ^ b           join              \\x    capitalize");
}
