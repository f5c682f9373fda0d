//! Terminal prompts and the client-side list filter.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use edge_collections_core::Record;

/// Keeps the records whose `"<title>\n <id>"` label contains `needle`.
///
/// Matching is case-sensitive. `None` keeps everything.
pub fn filter_records<T: Record>(mut records: Vec<T>, needle: Option<&str>) -> Vec<T> {
    if let Some(needle) = needle {
        records.retain(|r| r.display_name().contains(needle));
    }
    records
}

/// Asks a yes/no question on stderr and reads the answer from `input`.
///
/// Only `y` or `yes` (any case) confirms; end of input declines.
pub fn confirm(question: &str, input: &mut impl BufRead) -> Result<bool, String> {
    let answer = ask(&format!("{question} [y/N] "), input)?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Asks for a file path; an empty answer yields `None`.
pub fn ask_path(question: &str, input: &mut impl BufRead) -> Result<Option<PathBuf>, String> {
    let answer = ask(question, input)?;
    let answer = answer.trim_matches(|c| c == '"' || c == '\'');
    Ok((!answer.is_empty()).then(|| PathBuf::from(answer)))
}

fn ask(question: &str, input: &mut impl BufRead) -> Result<String, String> {
    let mut stderr = io::stderr();
    write!(stderr, "{question}")
        .and_then(|()| stderr.flush())
        .map_err(|err| format!("Failed to write prompt: {err}"))?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|err| format!("Failed to read answer: {err}"))?;
    Ok(line.trim().to_string())
}
