use std::io::{self, BufRead, Write};

use crate::db::Predicate;

/// Line-based y/n and free-text prompts over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", line.as_ref())
    }

    /// One line without the trailing newline. EOF reads as an empty line.
    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }


    pub fn ask_string(&mut self, label: &str, default: &str) -> io::Result<String> {
        write!(self.output, "{}: ({}) ", label, default)?;
        self.output.flush()?;
        let value = self.read_line()?;
        if value.trim().is_empty() {
            Ok(default.to_string())
        } else {
            Ok(value.trim().to_string())
        }
    }

    /// Like [`Self::ask_string`] but never echoes the default back.
    pub fn ask_secret(&mut self, label: &str, default: &str) -> io::Result<String> {
        write!(self.output, "{}: (unchanged) ", label)?;
        self.output.flush()?;
        let value = self.read_line()?;
        if value.trim().is_empty() {
            Ok(default.to_string())
        } else {
            Ok(value.trim().to_string())
        }
    }


    pub fn ask_bool(&mut self, label: &str, default: bool) -> io::Result<bool> {
        loop {
            write!(self.output, "{}: y/n ({}) ", label, if default { "y" } else { "n" })?;
            self.output.flush()?;
            let value = self.read_line()?;
            match value.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => self.say("Invalid value. Type y or n. Try again.")?,
            }
        }
    }

    /// Reads WHERE-clause lines until an empty line.
    pub fn read_where_clause(&mut self) -> io::Result<Predicate> {
        self.say("Please write your WHERE clause below. An empty line executes the query.")?;
        self.say("")?;
        self.say("DELETE FROM c WHERE")?;

        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            if line.trim().is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(Predicate::from_lines(lines))
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
