//! Line-oriented input prompts.
//!
//! Every prompt re-asks until it gets acceptable input. End of input is
//! reported as [`io::ErrorKind::UnexpectedEof`] so callers can exit cleanly.

use crate::output::Palette;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Reads answers from `R` and writes prompts to `W`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    palette: Palette,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W, palette: Palette) -> Self {
        Self {
            input,
            output,
            palette,
        }
    }

    /// Restyle subsequent prompts.
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Where prompts and error messages are written.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Ask once and return the line without its terminator.
    pub fn input(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", self.palette.highlight.apply_to(format!("{}: ", prompt)))?;
        self.output.flush()?;
        self.read_line()
    }

    /// Ask until `validate` accepts the answer.
    pub fn valid_input<F>(&mut self, prompt: &str, validate: F, error: &str) -> io::Result<String>
    where
        F: Fn(&str) -> bool,
    {
        loop {
            let answer = self.input(prompt)?;
            if validate(&answer) {
                return Ok(answer);
            }
            self.error(error)?;
        }
    }

    /// Ask for a number within `range`; empty input selects `default`.
    pub fn number<T>(&mut self, prompt: &str, range: RangeInclusive<T>, default: T) -> io::Result<T>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        loop {
            let answer = self.input(prompt)?;
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<T>() {
                Ok(n) if range.contains(&n) => return Ok(n),
                _ => self.error(&format!(
                    "Invalid input. Enter a number between {} and {}.",
                    range.start(),
                    range.end()
                ))?,
            }
        }
    }

    /// Ask a yes/no question.
    pub fn yes_no(&mut self, prompt: &str) -> io::Result<bool> {
        loop {
            let answer = self.input(&format!("{} (y/n)", prompt))?;
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.error("Please answer 'y' or 'n'.")?,
            }
        }
    }

    fn error(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.output, "{}", self.palette.error.apply_to(format!("✗ {}", msg)))
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(line)
    }
}
