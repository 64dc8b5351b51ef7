//! Intcode runner CLI.
//!
//! Loads a program file and runs it once, as a feedback ring, or as a phase
//! search. Outputs go to stdout; diagnostics go to stderr.
//!
//! # Usage
//! ```text
//! intcode <program> [OPTIONS]
//! ```
//!
//! # Arguments
//! - `program`: File holding comma-separated Intcode words
//!
//! # Options
//! - `-i, --input <csv>`: Inputs for a batch run (default: none)
//! - `-r, --ring <csv>`: Run a feedback ring with these phase settings
//! - `-s, --search <csv>`: Find the phase ordering with the largest signal
//! - `--serial`: Wire `--ring`/`--search` amplifiers serially instead of in a ring
//! - `--signal <n>`: Initial signal for `--ring`/`--search` (default 0)
//! - `--bounded`: Use the bounded memory model
//! - `-v, --verbose`: Show debug logs
//! - `--no-timestamp`: Omit timestamps from logs
//!
//! # Examples
//! ```text
//! intcode diagnostic.txt -i 5
//! intcode amplifier.txt -r 9,8,7,6,5
//! intcode amplifier.txt -s 0,1,2,3,4 --serial
//! ```

use intcode::orchestration::batch::{run_batch_with, run_chain_with};
use intcode::orchestration::phases::{Wiring, search};
use intcode::orchestration::ring::FeedbackRing;
use intcode::utils::log::{Level, SHOW_TIMESTAMP, set_min_level};
use intcode::virtual_machine::Word;
use intcode::virtual_machine::program::Program;
use intcode::virtual_machine::vm::MemoryModel;
use intcode::{error, info, warn};
use std::env;
use std::path::Path;
use std::process;
use std::sync::atomic::Ordering;

enum Mode {
    Batch(Vec<Word>),
    Ring(Vec<Word>),
    Search(Vec<Word>),
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let program_path = &args[1];
    let mut mode = Mode::Batch(Vec::new());
    let mut wiring = Wiring::Feedback;
    let mut model = MemoryModel::Extended;
    let mut signal: Word = 0;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--input" | "-i" | "--ring" | "-r" | "--search" | "-s" | "--signal") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                let value = &args[i];
                match k {
                    "--signal" => {
                        signal = value.trim().parse().unwrap_or_else(|_| {
                            error!("Invalid signal: '{value}' is not an integer");
                            process::exit(1);
                        });
                    }
                    _ => {
                        let words = parse_words(value);
                        mode = match k {
                            "--input" | "-i" => Mode::Batch(words),
                            "--ring" | "-r" => Mode::Ring(words),
                            _ => Mode::Search(words),
                        };
                    }
                }
                i += 1;
            }
            "--serial" => {
                wiring = Wiring::Serial;
                i += 1;
            }
            "--bounded" => {
                model = MemoryModel::Bounded;
                i += 1;
            }
            "--verbose" | "-v" => {
                set_min_level(Level::Debug);
                i += 1;
            }
            "--no-timestamp" => {
                SHOW_TIMESTAMP.store(false, Ordering::Relaxed);
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    if !Path::new(program_path).exists() {
        error!("Program file does not exist: {}", program_path);
        process::exit(1);
    }

    let program = Program::from_file(program_path).unwrap_or_else(|e| {
        error!("Failed to load {program_path}: {e}");
        process::exit(1)
    });
    info!("Loaded {} ({} words)", program_path, program.len());

    match mode {
        Mode::Batch(inputs) => {
            if wiring == Wiring::Serial {
                warn!("--serial has no effect on a batch run");
            }
            let run = run_batch_with(program, model, &inputs).unwrap_or_else(|e| {
                error!("{e}");
                process::exit(1)
            });
            info!("Halted after {} steps", run.steps);
            println!("{}", join(&run.outputs));
        }
        Mode::Ring(phases) => {
            let result = if wiring == Wiring::Feedback {
                FeedbackRing::with_memory_model(&program, &phases, model).run(signal)
            } else {
                run_chain_with(&program, model, &phases, signal)
            };
            match result {
                Ok(Some(value)) => println!("{value}"),
                Ok(None) => {
                    warn!("No signal produced");
                    process::exit(2);
                }
                Err(e) => {
                    error!("{e}");
                    process::exit(1);
                }
            }
        }
        Mode::Search(phases) => {
            if model == MemoryModel::Bounded {
                warn!("--bounded is ignored by --search");
            }
            match search(&program, &phases, wiring, signal) {
                Ok(Some(best)) => {
                    info!("Best phases: {}", join(&best.phases));
                    println!("{}", best.signal);
                }
                Ok(None) => {
                    warn!("No ordering produced a signal");
                    process::exit(2);
                }
                Err(e) => {
                    error!("{e}");
                    process::exit(1);
                }
            }
        }
    }
}

fn parse_words(csv: &str) -> Vec<Word> {
    csv.parse::<Program>()
        .map(Program::into_words)
        .unwrap_or_else(|e| {
            error!("Invalid list '{csv}': {e}");
            process::exit(1)
        })
}

fn join(words: &[Word]) -> String {
    words
        .iter()
        .map(Word::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <program> [OPTIONS]", program);
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <program>            File of comma-separated Intcode words");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -i, --input <csv>    Inputs for a batch run");
    eprintln!("  -r, --ring <csv>     Run a feedback ring with these phases");
    eprintln!("  -s, --search <csv>   Search phase orderings for the largest signal");
    eprintln!("      --serial         Wire amplifiers serially instead of in a ring");
    eprintln!("      --signal <n>     Initial signal (default 0)");
    eprintln!("      --bounded        Use the bounded memory model");
    eprintln!("  -v, --verbose        Show debug logs");
    eprintln!("      --no-timestamp   Omit timestamps from logs");
    eprintln!("  -h, --help           Show this help");
}
