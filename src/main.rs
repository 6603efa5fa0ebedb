use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use protocol_playground::init_tracing;
use protocol_playground::repl::{rl_editor, Repl};

/// A small lisp for playing with protocols, records and retroactive
/// extension.
#[derive(Parser)]
#[command(name = "main", about = "Polymorphism playground REPL")]
struct Args {
    /// Script to evaluate before the prompt starts
    script: Option<PathBuf>,

    /// Exit after running the script instead of starting the prompt
    #[arg(long)]
    no_repl: bool,

    /// Tab width of the line editor
    #[arg(long, default_value_t = 2)]
    tab_stop: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut repl = Repl::new();

    if let Some(path) = &args.script {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let result = repl.eval_text(&text)?;
        println!("{result}");
    }

    if args.no_repl {
        return Ok(());
    }

    // start reading lines
    let mut rl = rl_editor(args.tab_stop)?;
    loop {
        // get user input
        let Ok(input) = rl.readline(">> ") else {
            break;
        };
        if input == "exit" || input == "quit" {
            break;
        }

        // read, eval, print
        match repl.eval_text(&input) {
            Ok(result) => println!("{result}"),
            Err(err) => println!("{err}"),
        }
    }

    Ok(())
}
