//! Confirmation gateway
//!
//! Every question the engine asks the operator goes through [`Gateway`]:
//! pick from a list, yes/no, validated free text, or a date/time inside a
//! window. Each prompt also understands three commands:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `exit`  | abort the session (`RescueError::OperatorAbort`) |
//! | `menu`  | leave the workflow (`RescueError::ReturnToMenu`) |
//! | `help`  | print the prompt's help text and ask again |
//!
//! [`ConsoleGateway`] implements it over any `BufRead`/`Write` pair, which is
//! how the tests script an operator.

use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use crossterm::style::Stylize;
use strum::EnumString;

use crate::error::{RescueError, Result};

/// Accepted date/time input formats (always UTC)
pub const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

const GENERAL_HELP: &str = "Type `exit` to quit, `menu` to return to the main menu, `help` for this text.";

/// A question plus its contextual help.
#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
    pub question: &'a str,
    pub help: &'a str,
}

impl<'a> Prompt<'a> {
    pub fn new(question: &'a str) -> Self {
        Self { question, help: "" }
    }

    pub fn with_help(mut self, help: &'a str) -> Self {
        self.help = help;
        self
    }
}

/// Severity of an operator-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Success,
    Warning,
    Error,
}

/// The operator-facing prompt surface.
pub trait Gateway {
    /// Pick one of `options`; returns its index.
    fn choose(&mut self, prompt: &Prompt<'_>, options: &[String]) -> Result<usize>;

    fn confirm(&mut self, prompt: &Prompt<'_>) -> Result<bool>;

    /// Free text accepted only once `validate` returns `Ok`.
    fn text(
        &mut self,
        prompt: &Prompt<'_>,
        validate: &dyn Fn(&str) -> std::result::Result<(), String>,
    ) -> Result<String>;

    /// A UTC date/time within `[earliest, latest]`.
    fn date_time(
        &mut self,
        prompt: &Prompt<'_>,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    ) -> Result<DateTime<Utc>>;

    fn notify(&mut self, notice: Notice, message: &str);
}

/// Commands honored at every prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum SideChannel {
    Exit,
    Menu,
    Help,
}

/// Parse a UTC date/time in one of [`DATE_TIME_FORMATS`].
pub fn parse_date_time(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim().trim_end_matches('Z');
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .map(|naive| naive.and_utc())
}

/// Line-oriented gateway over a reader and a writer.
pub struct ConsoleGateway<R, W> {
    input: R,
    output: W,
    color: bool,
}

impl ConsoleGateway<StdinLock<'static>, Stdout> {
    /// Gateway on the process's stdin/stdout.
    pub fn stdio(color: bool) -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout()).with_color(color)
    }
}

impl<R: BufRead, W: Write> ConsoleGateway<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Ask until a non-command answer arrives.
    fn ask(&mut self, prompt: &Prompt<'_>, hint: &str) -> Result<String> {
        loop {
            let question = if self.color {
                prompt.question.bold().to_string()
            } else {
                prompt.question.to_string()
            };
            if hint.is_empty() {
                write!(self.output, "{}\n> ", question)?;
            } else {
                write!(self.output, "{} [{}]\n> ", question, hint)?;
            }
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                // End of input: nobody left to answer
                writeln!(self.output)?;
                return Err(RescueError::OperatorAbort);
            }
            let answer = line.trim();

            match SideChannel::from_str(answer) {
                Ok(SideChannel::Exit) => return Err(RescueError::OperatorAbort),
                Ok(SideChannel::Menu) => return Err(RescueError::ReturnToMenu),
                Ok(SideChannel::Help) => {
                    if !prompt.help.is_empty() {
                        writeln!(self.output, "{}", prompt.help)?;
                    }
                    writeln!(self.output, "{}", GENERAL_HELP)?;
                }
                Err(_) => return Ok(answer.to_string()),
            }
        }
    }

    fn complain(&mut self, message: &str) -> Result<()> {
        let text = if self.color {
            message.yellow().to_string()
        } else {
            message.to_string()
        };
        writeln!(self.output, "{}", text)?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Gateway for ConsoleGateway<R, W> {
    fn choose(&mut self, prompt: &Prompt<'_>, options: &[String]) -> Result<usize> {
        if options.is_empty() {
            return Err(RescueError::validation(format!(
                "nothing to choose from for: {}",
                prompt.question
            )));
        }
        loop {
            for (i, option) in options.iter().enumerate() {
                writeln!(self.output, "  {:>2}) {}", i + 1, option)?;
            }
            let hint = format!("1-{}", options.len());
            let answer = self.ask(prompt, &hint)?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => self.complain(&format!(
                    "Please enter a number between 1 and {}.",
                    options.len()
                ))?,
            }
        }
    }

    fn confirm(&mut self, prompt: &Prompt<'_>) -> Result<bool> {
        loop {
            let answer = self.ask(prompt, "y/n")?;
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.complain("Please answer yes or no.")?,
            }
        }
    }

    fn text(
        &mut self,
        prompt: &Prompt<'_>,
        validate: &dyn Fn(&str) -> std::result::Result<(), String>,
    ) -> Result<String> {
        loop {
            let answer = self.ask(prompt, "")?;
            match validate(&answer) {
                Ok(()) => return Ok(answer),
                Err(reason) => self.complain(&reason)?,
            }
        }
    }

    fn date_time(
        &mut self,
        prompt: &Prompt<'_>,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let hint = format!(
            "UTC, {} .. {}",
            earliest.format("%Y-%m-%dT%H:%M:%S"),
            latest.format("%Y-%m-%dT%H:%M:%S")
        );
        loop {
            let answer = self.ask(prompt, &hint)?;
            match parse_date_time(&answer) {
                Some(at) if at >= earliest && at <= latest => return Ok(at),
                Some(_) => self.complain("That time is outside the restorable window.")?,
                None => self.complain("Use the format YYYY-MM-DDTHH:MM:SS.")?,
            }
        }
    }

    fn notify(&mut self, notice: Notice, message: &str) {
        let line = match (notice, self.color) {
            (Notice::Info, _) => message.to_string(),
            (Notice::Success, true) => format!("{} {}", "✓".green(), message),
            (Notice::Success, false) => format!("✓ {}", message),
            (Notice::Warning, true) => format!("{} {}", "!".yellow(), message.yellow()),
            (Notice::Warning, false) => format!("! {}", message),
            (Notice::Error, true) => format!("{} {}", "✗".red(), message.red()),
            (Notice::Error, false) => format!("✗ {}", message),
        };
        // Console output is best effort; a closed stdout must not mask the real error
        let _ = writeln!(self.output, "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Cursor;

    fn gateway(script: &str) -> ConsoleGateway<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleGateway::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    fn output(gateway: ConsoleGateway<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(gateway.into_output()).unwrap()
    }

    #[test]
    fn test_choose_reprompts_until_in_range() {
        let mut gw = gateway("0\nabc\n2\n");
        let options = vec!["parks".to_string(), "subareas".to_string()];
        let picked = gw.choose(&Prompt::new("Pick a table"), &options).unwrap();
        assert_eq!(picked, 1);
        assert!(output(gw).contains("between 1 and 2"));
    }

    #[test]
    fn test_confirm_accepts_yes_and_no() {
        let mut gw = gateway("maybe\nYES\nn\n");
        assert!(gw.confirm(&Prompt::new("Proceed?")).unwrap());
        assert!(!gw.confirm(&Prompt::new("Proceed?")).unwrap());
    }

    #[test]
    fn test_side_channel_commands() {
        let mut gw = gateway("exit\n");
        assert!(matches!(
            gw.confirm(&Prompt::new("Proceed?")),
            Err(RescueError::OperatorAbort)
        ));

        let mut gw = gateway("MENU\n");
        assert!(matches!(
            gw.confirm(&Prompt::new("Proceed?")),
            Err(RescueError::ReturnToMenu)
        ));
    }

    #[test]
    fn test_help_shows_context_then_reprompts() {
        let mut gw = gateway("help\ny\n");
        let prompt = Prompt::new("Delete?").with_help("Deleting is permanent.");
        assert!(gw.confirm(&prompt).unwrap());
        let out = output(gw);
        assert!(out.contains("Deleting is permanent."));
        assert!(out.contains("`menu`"));
    }

    #[test]
    fn test_end_of_input_aborts() {
        let mut gw = gateway("");
        assert!(matches!(
            gw.text(&Prompt::new("Name?"), &|_: &str| Ok(())),
            Err(RescueError::OperatorAbort)
        ));
    }

    #[test]
    fn test_text_validation_loop() {
        let mut gw = gateway("x\nparks_restored\n");
        let name = gw
            .text(&Prompt::new("Name?"), &|s: &str| {
                if s.len() >= 3 {
                    Ok(())
                } else {
                    Err("too short".to_string())
                }
            })
            .unwrap();
        assert_eq!(name, "parks_restored");
        assert!(output(gw).contains("too short"));
    }

    #[test]
    fn test_date_time_bounded() {
        let earliest = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let latest = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut gw = gateway("2023-12-31T23:59:59\nyesterday\n2024-03-15 12:00:00\n");
        let at = gw
            .date_time(&Prompt::new("Restore to?"), earliest, latest)
            .unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
        let out = output(gw);
        assert!(out.contains("outside the restorable window"));
        assert!(out.contains("YYYY-MM-DDTHH:MM:SS"));
    }

    #[test]
    fn test_parse_date_time_accepts_trailing_z() {
        assert_eq!(
            parse_date_time("2024-03-15T12:00:00Z"),
            Some(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap())
        );
        assert_eq!(parse_date_time("15/03/2024"), None);
    }
}
