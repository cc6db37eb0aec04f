//! Command line driver for the Curry frontend.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "curry-frontend")]
#[command(about = "Curry frontend (lexer, layout and parser)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and print the surface syntax tree
    Parse {
        /// Input file (.curry or .lcurry)
        file: PathBuf,
        /// Show the raw token stream instead of the syntax tree
        #[arg(long)]
        tokens: bool,
    },
    /// Strip the markers from a literate source file
    Unlit {
        /// Input file (.lcurry)
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Parse { file, tokens } => cmd_parse(file, tokens),
        Commands::Unlit { file } => cmd_unlit(file),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn read_source(file: &PathBuf) -> Result<(String, String), String> {
    let name = file.to_string_lossy().into_owned();
    let source = std::fs::read_to_string(file).map_err(|e| format!("{name}: {e}"))?;
    Ok((name, source))
}

fn cmd_parse(file: PathBuf, tokens: bool) -> Result<(), String> {
    let (name, source) = read_source(&file)?;

    if tokens {
        let tokens = curry_parser::lex_source(&name, &source).map_err(|m| m.to_string())?;
        for (i, token) in tokens.iter().enumerate() {
            println!("{i:4}: {:?} @ {}", token.kind, token.position);
        }
        return Ok(());
    }

    let (module, warnings) =
        curry_parser::parse_module(&name, &source).map_err(|m| m.to_string())?;
    for warning in &warnings {
        eprintln!("Warning: {warning}");
    }
    println!("{module:#?}");
    Ok(())
}

fn cmd_unlit(file: PathBuf) -> Result<(), String> {
    let (name, source) = read_source(&file)?;
    let program = curry_preprocess::preprocess(&name, &source).map_err(|e| e.message().to_string())?;
    print!("{program}");
    if !program.ends_with('\n') {
        println!();
    }
    Ok(())
}
