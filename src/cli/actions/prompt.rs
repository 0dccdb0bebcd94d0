//! Terminal interaction for the interactive actions.
//!
//! [`Console`] asks on the user's terminal through `dialoguer`, with hidden
//! password entry. [`Prompt`] reads answers line by line from any reader so the
//! same actions can be driven by scripted input.

use anyhow::{bail, Context, Result};
use dialoguer::{Confirm, Input, Password};
use secrecy::SecretString;
use std::fmt::Display;
use std::io::{BufRead, Write};

pub trait Terminal {
    /// Prints a line.
    ///
    /// # Errors
    /// Returns an error if the output cannot be written.
    fn say(&mut self, message: impl Display) -> Result<()>;

    /// Asks for one line of input, trimmed.
    ///
    /// # Errors
    /// Returns an error if the input is closed or cannot be read.
    fn ask(&mut self, label: &str) -> Result<String>;

    /// Asks for a secret without echoing it.
    ///
    /// # Errors
    /// See [`Terminal::ask`].
    fn ask_secret(&mut self, label: &str) -> Result<SecretString>;

    /// Yes/no question, defaulting to no.
    ///
    /// # Errors
    /// See [`Terminal::ask`].
    fn confirm(&mut self, label: &str) -> Result<bool>;
}

/// The user's terminal.
#[derive(Debug, Default)]
pub struct Console;

impl Terminal for Console {
    fn say(&mut self, message: impl Display) -> Result<()> {
        writeln!(std::io::stdout(), "{message}").context("failed to write to terminal")
    }

    fn ask(&mut self, label: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .context("failed to read input")?;
        Ok(answer.trim().to_string())
    }

    fn ask_secret(&mut self, label: &str) -> Result<SecretString> {
        Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
            .map(SecretString::from)
            .context("failed to read input")
    }

    fn confirm(&mut self, label: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(label)
            .default(false)
            .interact()
            .context("failed to read input")
    }
}

/// Line-oriented answers from `input`, with labels and messages written to `out`.
pub struct Prompt<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn answer(&mut self, label: &str) -> Result<String> {
        write!(self.out, "{label}: ").context("failed to write to terminal")?;
        self.out.flush().context("failed to write to terminal")?;

        let mut line = String::new();
        if self.input.read_line(&mut line).context("failed to read input")? == 0 {
            bail!("input closed");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> Terminal for Prompt<R, W> {
    fn say(&mut self, message: impl Display) -> Result<()> {
        writeln!(self.out, "{message}").context("failed to write to terminal")
    }

    fn ask(&mut self, label: &str) -> Result<String> {
        self.answer(label).map(|line| line.trim().to_string())
    }

    fn ask_secret(&mut self, label: &str) -> Result<SecretString> {
        self.answer(label).map(SecretString::from)
    }

    fn confirm(&mut self, label: &str) -> Result<bool> {
        let answer = self.ask(&format!("{label} [y/N]"))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }
}
