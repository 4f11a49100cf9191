//! Interactive prompts using dialoguer
//!
//! Prompts read through the [`LineInput`] trait so the selection loop can be
//! driven from a script in tests instead of a terminal.

use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::Result;
use dialoguer::{Confirm, Input};

use super::selection::{check_minimum, parse_selection, render_file_list, Selection};
use crate::pipeline::KmlFile;

/// Source of user answers
pub trait LineInput {
    /// Read one line; `None` means the input is closed
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Ask a yes/no question
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
}

/// Reads answers from the terminal.
///
/// With an interactive terminal the dialoguer widgets are used. When stdin is
/// piped or closed, answers are read line by line from stdin and end of input
/// is reported as `None`.
#[derive(Debug, Default)]
pub struct TerminalInput;

impl TerminalInput {
    fn is_attended() -> bool {
        console::user_attended_stderr() && io::stdin().is_terminal()
    }
}

impl LineInput for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        if !Self::is_attended() {
            return read_piped_line(prompt);
        }

        match Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => Ok(Some(line)),
            Err(dialoguer::Error::IO(e)) if is_closed_input(&e) => {
                log::info!("Terminal input closed: {}", e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        if !Self::is_attended() {
            let answer = read_piped_line(prompt)?.unwrap_or_default();
            return Ok(parse_confirm(&answer, default));
        }

        match Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
        {
            Ok(confirmed) => Ok(confirmed),
            Err(dialoguer::Error::IO(e)) if is_closed_input(&e) => Ok(default),
            Err(e) => Err(e.into()),
        }
    }
}

/// Plain line read from stdin; `None` at end of input
fn read_piped_line(prompt: &str) -> Result<Option<String>> {
    print!("{}: ", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn is_closed_input(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotConnected | io::ErrorKind::UnexpectedEof
    )
}

/// `y`/`yes` and `n`/`no`; anything else gives `default`
fn parse_confirm(answer: &str, default: bool) -> bool {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}

/// Replays a fixed list of answers
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineInput for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    fn confirm(&mut self, _prompt: &str, default: bool) -> Result<bool> {
        let answer = self.lines.pop_front().unwrap_or_default();
        Ok(parse_confirm(&answer, default))
    }
}

/// Result of the selection prompt loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Zero-based indices in merge order
    Selected(Vec<usize>),
    /// User typed an exit token (or input closed)
    Exit,
    /// Every attempt was rejected
    Exhausted,
}

/// Show the file listing and ask which files to merge.
///
/// Invalid answers are reported on `out` and the question is repeated, up to
/// `max_attempts` times in total.
pub fn prompt_selection(
    files: &[KmlFile],
    input: &mut dyn LineInput,
    out: &mut dyn Write,
    max_attempts: usize,
    min_files: usize,
) -> Result<SelectionOutcome> {
    for attempt in 1..=max_attempts {
        writeln!(out, "Found KML files:")?;
        write!(out, "{}", render_file_list(files))?;
        writeln!(out)?;

        let Some(line) = input.read_line(
            "Enter numbers of files to merge (e.g., 1, 2, 5) or Enter to merge all",
        )?
        else {
            log::info!("Input closed at selection prompt");
            return Ok(SelectionOutcome::Exit);
        };

        let selection = parse_selection(&line, files.len()).and_then(|selection| {
            let indices = selection.resolve(files.len());
            if selection != Selection::Exit {
                check_minimum(&indices, min_files)?;
            }
            Ok((selection, indices))
        });

        match selection {
            Ok((Selection::Exit, _)) => {
                log::info!("User chose to exit");
                return Ok(SelectionOutcome::Exit);
            }
            Ok((selection, indices)) => {
                if selection == Selection::All {
                    log::info!("No specific files selected, merging all");
                }
                log::info!("{} files selected for merging", indices.len());
                return Ok(SelectionOutcome::Selected(indices));
            }
            Err(e) => {
                log::warn!("Invalid selection {:?}: {}", line.trim(), e);
                writeln!(
                    out,
                    "Invalid selection: {}. Please try again or enter 'e' to exit. ({}/{})",
                    e, attempt, max_attempts
                )?;
                writeln!(out)?;
            }
        }
    }

    log::warn!("No valid selection after {} attempts", max_attempts);
    Ok(SelectionOutcome::Exhausted)
}

/// Ask for an optional label to put in the output file name
pub fn prompt_label(input: &mut dyn LineInput) -> Result<Option<String>> {
    let line = input
        .read_line("Optional label for the output file (Enter to skip)")?
        .unwrap_or_default();
    Ok(sanitize_label(&line))
}

/// Ask whether to write the run report
pub fn confirm_report(input: &mut dyn LineInput) -> Result<bool> {
    input.confirm("Save a report of this run?", false)
}

/// Reduce a label to characters safe in a file name.
///
/// ASCII letters, digits, `-` and `_` are kept; every other run of characters
/// becomes a single `_`. Returns `None` if nothing usable remains.
pub fn sanitize_label(raw: &str) -> Option<String> {
    let mut label = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            if pending_separator && !label.is_empty() {
                label.push('_');
            }
            pending_separator = false;
            label.push(c);
        } else {
            pending_separator = true;
        }
    }

    let label = label.trim_matches('_').to_string();
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}
