//! Line-oriented prompt loop over a loaded predictor.

use std::io::{BufRead, Write};

use symcheck_ai::Predictor;
use symcheck_core::split_symptom_line;

use crate::render;

/// What one input line asks for.
#[derive(Debug, PartialEq)]
enum Command {
    Quit,
    List,
    Check(Vec<String>),
}

fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" | "quit" | "exit" | "q" => Command::Quit,
        "list" => Command::List,
        _ => Command::Check(split_symptom_line(trimmed)),
    }
}

/// Read comma-separated symptom lines from `input` until a quit word, a
/// blank line or EOF, writing a result card for each to `out`.
pub fn run(predictor: &Predictor, mut input: impl BufRead, mut out: impl Write) -> anyhow::Result<()> {
    writeln!(out, "{}", render::banner())?;

    let mut line = String::new();
    loop {
        write!(out, "\nSymptoms: ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        match parse(&line) {
            Command::Quit => break,
            Command::List => {
                writeln!(out, "\nAvailable symptoms (features):")?;
                let names: Vec<_> = predictor.symptoms().iter().collect();
                writeln!(out, "{}", names.join(", "))?;
            }
            Command::Check(symptoms) if symptoms.is_empty() => {
                writeln!(out, "Please enter at least one symptom.")?;
            }
            Command::Check(symptoms) => match predictor.predict(symptoms.as_slice()) {
                Ok(ranking) => write!(out, "\n{}", render::card(&ranking))?,
                Err(e) => writeln!(out, "Error: {e}")?,
            },
        }
    }

    writeln!(out, "Goodbye!")?;
    Ok(())
}
