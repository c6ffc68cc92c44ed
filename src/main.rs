use std::fs;
use std::path::PathBuf;

use clap::Parser as ClapParser;
use clap::Subcommand;

use quill::parser::Parser;
use quill::reporter::{Phase, Reporter};
use quill::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes the provided input from a given valid filepath
    Tokenize { filename: Option<PathBuf> },

    /// Parses the provided input from a given valid filepath
    Parse { filename: Option<PathBuf> },

    /// Runs the provided input from a given valid filepath
    Run { filename: Option<PathBuf> },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.commands {
        Commands::Tokenize { filename } => match filename {
            Some(filename) => {
                let source: String = fs::read_to_string(filename)?;

                let mut reporter: Reporter = Reporter::new();

                for token in Scanner::new(&source).scan_tokens(&mut reporter) {
                    println!("{}", token);
                }

                if reporter.had_error() {
                    for diagnostic in reporter.diagnostics() {
                        eprintln!("{}", diagnostic);
                    }

                    std::process::exit(65);
                }
            }

            None => {
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => {
                let source: String = fs::read_to_string(filename)?;

                let mut reporter: Reporter = Reporter::new();

                let tokens = Scanner::new(&source).scan_tokens(&mut reporter);

                if reporter.had_error() {
                    for diagnostic in reporter.diagnostics() {
                        eprintln!("{}", diagnostic);
                    }

                    std::process::exit(65);
                }

                match Parser::new(tokens).parse() {
                    Ok(statements) => {
                        println!("{:#?}", statements);
                    }

                    Err(e) => {
                        eprintln!("{}", e);
                        std::process::exit(65);
                    }
                }
            }

            None => {
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                let source: String = fs::read_to_string(filename)?;

                let result = quill::run(&source);

                for line in &result.output {
                    println!("{}", line);
                }

                if !result.succeeded {
                    let mut runtime_failure: bool = false;

                    for diagnostic in &result.errors {
                        if diagnostic.phase == Phase::Runtime {
                            runtime_failure = true;
                        }

                        eprintln!("{}", diagnostic);
                    }

                    std::process::exit(if runtime_failure { 70 } else { 65 });
                }
            }

            None => {
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },
    }

    Ok(())
}
