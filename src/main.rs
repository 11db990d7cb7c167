//! A thin harness for exercising the tokenizer/assembler pipeline by hand.
//!
//! Not a product surface: CLI, rule selection, fix application and the rest
//! of a real host application are explicitly out of scope. This binary exists only because the corpus this crate is
//! modeled on ships a `[[bin]]` alongside its `[lib]`, and a library with no
//! runnable surface at all is not how that corpus ships code.
//!
//! It reads a file (or stdin), feeds it through [`mdflow_lib::Tokenizer`] in
//! fixed-size chunks to simulate token-by-token streaming, applies each
//! chunk's events to an [`mdflow_lib::Assembler`], and prints the resulting
//! diff as one JSON line per chunk.

use clap::Parser;
use mdflow_lib::config::{AssemblerConfig, TokenizerConfig};
use mdflow_lib::{Assembler, Tokenizer};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mdflow", version, about = "Stream a Markdown document through the mdflow tokenizer and assembler")]
struct Cli {
    /// Markdown file to read. Reads stdin if omitted.
    path: Option<PathBuf>,

    /// Character count per simulated streaming chunk.
    #[arg(long, default_value_t = 48)]
    chunk_size: usize,

    /// Pretty-print each diff instead of one compact JSON object per line.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
    }

    let cli = Cli::parse();
    let content = match read_input(cli.path.as_deref()) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("mdflow: {err}");
            std::process::exit(1);
        }
    };

    let chunk_size = cli.chunk_size.max(1);
    let mut tokenizer = Tokenizer::new(TokenizerConfig::default());
    let mut assembler = Assembler::new(AssemblerConfig::default());

    for chunk in chunk_chars(&content, chunk_size) {
        let result = tokenizer.feed(&chunk);
        print_diff(&assembler.apply(result), cli.pretty);
    }
    let tail = tokenizer.finish();
    print_diff(&assembler.apply(tail), cli.pretty);
}

fn read_input(path: Option<&std::path::Path>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Split `content` into chunks of at most `chunk_size` chars, respecting
/// char boundaries (never splitting a multi-byte UTF-8 scalar).
fn chunk_chars(content: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|slice| slice.iter().collect())
        .collect()
}

fn print_diff(diff: &mdflow_lib::AssemblerDiff, pretty: bool) {
    if diff.changes.is_empty() {
        return;
    }
    let json = if pretty {
        serde_json::to_string_pretty(diff)
    } else {
        serde_json::to_string(diff)
    };
    match json {
        Ok(line) => println!("{line}"),
        Err(err) => log::error!("failed to serialize diff: {err}"),
    }
}
