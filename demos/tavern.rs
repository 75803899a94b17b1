/// Tavern example — a night of overheard chatter from the sample grammar.
///
/// Generates a handful of sentences, a few picks from individual symbols,
/// and one traced expansion.
///
/// Run with: cargo run --example tavern

use polygen::core::pipeline::Polygen;

fn main() {
    let mut engine = Polygen::builder()
        .grammar_file("grammar_data/tavern.pg")
        .seed(1887)
        .build()
        .expect("Failed to build engine");

    println!("========================================");
    println!("   THE DROWNED LANTERN");
    println!("   [overheard at the bar]");
    println!("========================================");
    println!();

    for i in 1..=6 {
        print_generation(&format!("Round {}", i), engine.generate());
    }

    println!("--- Regulars tonight ---");
    for _ in 0..3 {
        match engine.generate_from("$regular") {
            Ok(name) => println!("  {}", name),
            Err(e) => println!("  [Generation error: {}]", e),
        }
    }
    println!();

    println!("--- How a line is built ---");
    match engine.generate_traced() {
        Ok((text, steps)) => {
            println!("{}", text);
            for step in steps {
                println!(
                    "  {}{} [{}/{}]",
                    "  ".repeat(step.depth),
                    step.symbol,
                    step.choice + 1,
                    step.alternatives
                );
            }
        }
        Err(e) => println!("[Generation error: {}]", e),
    }
    println!();

    println!("========================================");
    println!("   [LAST CALL]");
    println!("========================================");
}

fn print_generation<E: std::fmt::Display>(title: &str, result: Result<String, E>) {
    println!("--- {} ---", title);
    match result {
        Ok(text) => println!("{}", text),
        Err(e) => println!("[Generation error: {}]", e),
    }
    println!();
}
