//! Selection syntax for picking files from the numbered listing
//!
//! Accepted input (case-insensitive, surrounding whitespace ignored):
//! - empty, `all` or `a`: every file, in listing order
//! - `e`, `exit`, `q` or `quit`: leave without merging
//! - indices and ranges separated by commas and/or spaces, e.g. `2, 1` or `1-3 5`
//!
//! Explicit indices keep the order they were typed in. An index given twice is
//! only used at its first position.

use thiserror::Error;

use crate::pipeline::KmlFile;
use crate::utils::format_size;

/// Tokens that leave the prompt without producing output
pub const EXIT_TOKENS: &[&str] = &["e", "exit", "q", "quit"];

const ALL_TOKENS: &[&str] = &["all", "a"];

/// Parsed user selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every discovered file in discovery order
    All,
    /// Zero-based indices in the order given
    Indices(Vec<usize>),
    /// User asked to exit
    Exit,
}

impl Selection {
    /// Resolve to zero-based indices for a listing of `file_count` files
    pub fn resolve(&self, file_count: usize) -> Vec<usize> {
        match self {
            Selection::All => (0..file_count).collect(),
            Selection::Indices(indices) => indices.clone(),
            Selection::Exit => Vec::new(),
        }
    }
}

/// Reasons a selection line is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("'{0}' is not a file number")]
    NotANumber(String),

    #[error("{index} is out of range (valid: 1-{max})")]
    OutOfRange { index: usize, max: usize },

    #[error("'{0}' is not a valid range")]
    InvalidRange(String),

    #[error("at least {required} file(s) must be selected, got {selected}")]
    TooFew { required: usize, selected: usize },
}

/// Parse one line of selection input against a listing of `file_count` files.
pub fn parse_selection(input: &str, file_count: usize) -> Result<Selection, SelectionError> {
    let input = input.trim().to_lowercase();

    if input.is_empty() || ALL_TOKENS.contains(&input.as_str()) {
        return Ok(Selection::All);
    }
    if EXIT_TOKENS.contains(&input.as_str()) {
        return Ok(Selection::Exit);
    }

    let mut indices: Vec<usize> = Vec::new();
    let tokens = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());

    for token in tokens {
        for number in expand_token(token, file_count)? {
            let index = number - 1;
            if !indices.contains(&index) {
                indices.push(index);
            }
        }
    }

    Ok(Selection::Indices(indices))
}

/// Expand `n` or `a-b` into one-based numbers, all within `1..=file_count`.
///
/// Bounds are checked before a range is expanded.
fn expand_token(token: &str, file_count: usize) -> Result<Vec<usize>, SelectionError> {
    let (start, end) = match token.split_once('-') {
        Some((start, end)) => {
            let start = parse_number(start).map_err(|_| SelectionError::InvalidRange(token.to_string()))?;
            let end = parse_number(end).map_err(|_| SelectionError::InvalidRange(token.to_string()))?;
            if start > end {
                return Err(SelectionError::InvalidRange(token.to_string()));
            }
            (start, end)
        }
        None => {
            let number = parse_number(token)?;
            (number, number)
        }
    };

    for number in [start, end] {
        if number == 0 || number > file_count {
            return Err(SelectionError::OutOfRange {
                index: number,
                max: file_count,
            });
        }
    }

    Ok((start..=end).collect())
}

fn parse_number(token: &str) -> Result<usize, SelectionError> {
    token
        .trim()
        .parse::<usize>()
        .map_err(|_| SelectionError::NotANumber(token.to_string()))
}

/// Check that a resolved selection has at least `min_files` entries
pub fn check_minimum(indices: &[usize], min_files: usize) -> Result<(), SelectionError> {
    if indices.len() < min_files {
        Err(SelectionError::TooFew {
            required: min_files,
            selected: indices.len(),
        })
    } else {
        Ok(())
    }
}

/// Render the numbered file listing shown above the prompt
pub fn render_file_list(files: &[KmlFile]) -> String {
    let mut out = String::new();
    for (idx, file) in files.iter().enumerate() {
        let count = match file.placemarks {
            Some(n) => format!("{} placemarks", n),
            None => "unknown placemarks".to_string(),
        };
        out.push_str(&format!(
            "{:>3}. {:<40} {:>10}    {}\n",
            idx + 1,
            file.name,
            format_size(file.size_bytes),
            count
        ));
    }
    out.push_str("  e. Exit\n");
    out
}
