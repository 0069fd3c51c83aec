//! Line-oriented prompts over any `BufRead`/`Write` pair

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

use super::{Console, ConsoleError, ConsoleResult};

impl<R: BufRead, W: Write> Console<R, W> {
    pub(crate) fn say(&mut self, text: impl Display) -> ConsoleResult<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Print `label: ` and read one trimmed line. End of input is `ConsoleError::Eof`.
    pub(crate) fn line(&mut self, label: &str) -> ConsoleResult<String> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;
        let mut buffer = String::new();
        if self.input.read_line(&mut buffer)? == 0 {
            return Err(ConsoleError::Eof);
        }
        Ok(buffer.trim().to_string())
    }

    /// Ask until a non-empty answer is given
    pub(crate) fn required(&mut self, label: &str) -> ConsoleResult<String> {
        loop {
            let answer = self.line(label)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            self.say("  A value is required.")?;
        }
    }

    /// Empty answer means "keep / none"
    pub(crate) fn optional(&mut self, label: &str) -> ConsoleResult<Option<String>> {
        let answer = self.line(&format!("{} (blank to skip)", label))?;
        Ok((!answer.is_empty()).then_some(answer))
    }

    pub(crate) fn parsed<T>(&mut self, label: &str) -> ConsoleResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        loop {
            let answer = self.required(label)?;
            match answer.parse::<T>() {
                Ok(value) => return Ok(value),
                Err(e) => self.say(format!("  Invalid value: {}", e))?,
            }
        }
    }

    pub(crate) fn optional_parsed<T>(&mut self, label: &str) -> ConsoleResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        loop {
            let Some(answer) = self.optional(label)? else {
                return Ok(None);
            };
            match answer.parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(e) => self.say(format!("  Invalid value: {}", e))?,
            }
        }
    }

    pub(crate) fn confirm(&mut self, label: &str) -> ConsoleResult<bool> {
        let answer = self.line(&format!("{} [y/N]", label))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes" | "o" | "oui"))
    }

    /// Print a titled menu and read the choice
    pub(crate) fn menu(&mut self, title: &str, entries: &[(&str, &str)]) -> ConsoleResult<String> {
        self.say("")?;
        self.say(format!("=== {} ===", title))?;
        for (key, label) in entries {
            self.say(format!("  {:>2}. {}", key, label))?;
        }
        self.line("Choice")
    }
}

/// Comma separated list, blanks dropped
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
