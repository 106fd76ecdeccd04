//! Interactive prompts: filter selection, raw-row paging and restart.
//!
//! [`Prompter`] works over any `BufRead`/`Write` pair so the whole dialogue
//! can be driven from tests.

use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::debug;

use crate::filters::{City, DayFilter, FilterSelection, MonthFilter};
use crate::loader::TripDataset;
use crate::output::{SEPARATOR, render_rows};

pub const CITY_PROMPT: &str = "Enter the name of the city (chicago, new york city, washington): ";
pub const MONTH_PROMPT: &str =
    "Enter the name of the month to filter by (all, january, february, ..., june): ";
pub const DAY_PROMPT: &str =
    "Enter the name of the day of the week to filter by (all, monday, tuesday, ..., sunday): ";

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Writes text to the output as-is.
    pub fn say(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }

    /// Shows `prompt` and reads one line. `None` once input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.say(prompt)?;
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .context("failed to read from input")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Re-prompts until the answer parses as `T`.
    fn ask<T: FromStr>(&mut self, prompt: &str, rejection: &str) -> Result<T> {
        loop {
            let Some(answer) = self.read_line(prompt)? else {
                bail!("input closed while waiting for an answer to: {}", prompt.trim());
            };
            match answer.parse::<T>() {
                Ok(value) => return Ok(value),
                Err(_) => {
                    debug!(answer, "Rejected input");
                    self.say(rejection)?;
                    self.say("\n")?;
                }
            }
        }
    }

    /// Asks for city, month and day until each one is valid.
    pub fn get_filters(&mut self) -> Result<FilterSelection> {
        self.say("Hello! Let's explore some US bikeshare data!\n")?;
        let city: City = self.ask(CITY_PROMPT, "Invalid city. Please enter a valid city.")?;
        let month: MonthFilter =
            self.ask(MONTH_PROMPT, "Invalid month. Please enter a valid month.")?;
        let day: DayFilter = self.ask(
            DAY_PROMPT,
            "Invalid day of the week. Please enter a valid day.",
        )?;
        self.say(SEPARATOR)?;
        self.say("\n")?;
        Ok(FilterSelection::new(city, month, day))
    }

    /// `true` only for a "yes" answer (any case). End of input counts as no.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        Ok(self
            .read_line(question)?
            .is_some_and(|a| a.eq_ignore_ascii_case("yes")))
    }

    /// Shows `page_size` raw rows at a time for as long as the user keeps
    /// answering yes. Returns how many rows were shown.
    pub fn page_rows(&mut self, dataset: &TripDataset, page_size: usize) -> Result<usize> {
        let mut shown = 0;
        if dataset.is_empty() {
            self.say("No rows to display.\n")?;
            return Ok(shown);
        }
        let first = format!(
            "\nWould you like to view {page_size} rows of individual trip data? Enter yes or no\n"
        );
        let mut wants_more = self.confirm(&first)?;

        while wants_more && shown < dataset.len() {
            let page = render_rows(dataset, shown, page_size);
            self.say(&page)?;
            shown = (shown + page_size).min(dataset.len());
            if shown >= dataset.len() {
                self.say("No more rows to display.\n")?;
                break;
            }
            wants_more = self.confirm("Do you wish to continue? Enter yes or no: ")?;
        }
        Ok(shown)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
