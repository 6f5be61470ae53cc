use std::io::{self, BufRead, IsTerminal, Write};

use crate::DutymeError;

#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    pub default: Option<String>,
    /// Keep asking until a non-empty answer is given.
    pub required: bool,
    /// Do not echo the answer.
    pub mask: bool,
}

impl AskOptions {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default.filter(|d| !d.is_empty());
        self
    }

    pub fn masked(mut self) -> Self {
        self.mask = true;
        self
    }
}

/// Interactive questions the coordinator needs answered.
pub trait Prompter {
    fn ask(&mut self, query: &str, options: &AskOptions) -> Result<String, DutymeError>;

    /// Pick one of `choices` and return its index. `default` is the index used
    /// for an empty answer.
    fn select(
        &mut self,
        query: &str,
        choices: &[String],
        default: usize,
    ) -> Result<usize, DutymeError>;

    fn confirm(&mut self, query: &str, default: bool) -> Result<bool, DutymeError> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let query = format!("{} {}", query, hint);
        loop {
            let answer = self.ask(&query, &AskOptions::default())?;
            match answer.trim() {
                "" => return Ok(default),
                "y" | "Y" | "yes" => return Ok(true),
                "n" | "N" | "no" => return Ok(false),
                _ => continue,
            }
        }
    }
}

/// Line-based prompter over any reader/writer pair.
pub struct LinePrompter<R, W> {
    reader: R,
    writer: W,
    terminal: bool,
}

impl LinePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        let stdin = io::stdin();
        let terminal = stdin.is_terminal();
        Self {
            reader: stdin.lock(),
            writer: io::stdout(),
            terminal,
        }
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            terminal: false,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn write(&mut self, text: &str) -> Result<(), DutymeError> {
        self.writer
            .write_all(text.as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(DutymeError::Prompt)
    }

    fn read_line(&mut self) -> Result<String, DutymeError> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(DutymeError::Prompt)?;
        if read == 0 {
            return Err(DutymeError::Prompt(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            )));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_answer(&mut self, prompt: &str, mask: bool) -> Result<String, DutymeError> {
        if mask && self.terminal {
            return rpassword::prompt_password(prompt).map_err(DutymeError::Prompt);
        }
        self.write(prompt)?;
        self.read_line()
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, query: &str, options: &AskOptions) -> Result<String, DutymeError> {
        let prompt = match &options.default {
            Some(default) if !options.mask => format!("{} (default: {}): ", query, default),
            _ => format!("{}: ", query),
        };

        loop {
            let answer = self.read_answer(&prompt, options.mask)?;
            let answer = answer.trim();
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
            if let Some(default) = &options.default {
                return Ok(default.clone());
            }
            if !options.required {
                return Ok(String::new());
            }
            self.write("Input must not be empty.\n")?;
        }
    }

    fn select(
        &mut self,
        query: &str,
        choices: &[String],
        default: usize,
    ) -> Result<usize, DutymeError> {
        if choices.is_empty() {
            return Err(DutymeError::validation("nothing to select from"));
        }
        let default = default.min(choices.len() - 1);

        let mut listing = format!("{}\n", query);
        for (i, choice) in choices.iter().enumerate() {
            listing.push_str(&format!("  {}. {}\n", i + 1, choice));
        }
        self.write(&listing)?;

        let prompt = format!("Enter a number (default: {}): ", default + 1);
        loop {
            let answer = self.read_answer(&prompt, false)?;
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(default);
            }
            if let Ok(n) = answer.parse::<usize>() {
                if (1..=choices.len()).contains(&n) {
                    return Ok(n - 1);
                }
            }
            if let Some(index) = choices.iter().position(|c| c.as_str() == answer) {
                return Ok(index);
            }
            self.write(&format!(
                "Please enter a number between 1 and {}.\n",
                choices.len()
            ))?;
        }
    }
}
