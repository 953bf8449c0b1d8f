use eyre::{bail, Result};
use std::io::{self, BufRead, Write};

use crate::config::PASSWORD_ENV;

/// Source of values the user did not supply on the command line or in the
/// config file.
pub trait Prompter {
    /// Ask for `label`; an empty answer yields `default` when there is one.
    fn ask(&mut self, label: &str, default: Option<&str>) -> Result<String>;
    /// Same as `ask`, but the default is never echoed.
    fn ask_secret(&mut self, label: &str) -> Result<String>;
}

/// Prompts on stderr and reads answers from stdin.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, label: &str, default: Option<&str>) -> Result<String> {
        let shown = match default {
            Some(default) => format!("{label} [{default}]: "),
            None => format!("{label}: "),
        };
        loop {
            let answer = read_answer(&shown)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            if let Some(default) = default {
                return Ok(default.to_string());
            }
        }
    }

    fn ask_secret(&mut self, label: &str) -> Result<String> {
        read_answer(&secret_prompt(label))
    }
}

/// Input is echoed, so the prompt points at the environment variable.
fn secret_prompt(label: &str) -> String {
    format!("{label} (shown as typed; set {PASSWORD_ENV} to skip): ")
}

fn read_answer(prompt: &str) -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt}")?;
    stderr.flush()?;

    let mut input = String::new();
    let read = io::stdin().lock().read_line(&mut input)?;
    if read == 0 {
        bail!("stdin closed while waiting for input");
    }
    Ok(input.trim().to_string())
}

/// Used with `--no-input`: defaults are taken, anything else is an error.
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn ask(&mut self, label: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(default) => Ok(default.to_string()),
            None => bail!("missing required value: {label} (pass it as a flag or in the config file)"),
        }
    }

    fn ask_secret(&mut self, label: &str) -> Result<String> {
        bail!("missing required value: {label} (set {PASSWORD_ENV}, --password or the config file)")
    }
}
