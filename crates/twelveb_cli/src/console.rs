//! Line-oriented terminal I/O shared by account flows and the shell.

use anyhow::{bail, Result};
use std::io::{BufRead, Write};

/// Prompting reader/writer pair.
///
/// Generic over the streams so flows can be driven from in-memory buffers.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `label` and reads one line. Returns `None` at end of input.
    pub fn next_line(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    /// Like [`Console::next_line`], but end of input is an error.
    pub fn ask(&mut self, label: &str) -> Result<String> {
        match self.next_line(label)? {
            Some(line) => Ok(line),
            None => bail!("input closed while waiting for `{}`", label.trim_end()),
        }
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.output
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}
