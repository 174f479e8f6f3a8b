// src/batch/mod.rs

pub mod highest;

use anyhow::{Context, Result};
use chrono::Local;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::classify::{classify, Action, Observations, SkipReason};
use crate::config::Config;
use crate::gemini::Annotator;
use crate::sheets::RowStore;
use crate::util::{into_seconds, readable_date, readable_time};
pub use highest::{highest_row, HighestRow};

/// Column headers of the concepts sheet.
pub mod headers {
    pub const NUMBER: &str = "Número";
    pub const CONCEPT: &str = "Concepto";
    pub const ARGUMENT: &str = "Argumentos";
    pub const OBSERVATIONS: &str = "Observaciones";
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub prompt_template: String,
    pub row_limit: usize,
    /// Pause after each annotation request.
    pub rate_limit: Duration,
}

impl BatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prompt_template: config.prompt_template.clone(),
            row_limit: config.row_limit,
            rate_limit: config.rate_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_loaded: usize,
    pub annotated: usize,
    /// Annotation calls that came back empty (and were saved empty).
    pub empty_annotations: usize,
    pub cleaned: usize,
    pub skipped: usize,
    pub highest: HighestRow,
    pub elapsed: Duration,
}

/// One sequential pass over the sheet: classify, clear or annotate, save.
pub struct BatchDriver<'a, S: ?Sized, A: ?Sized> {
    settings: BatchSettings,
    store: &'a S,
    annotator: &'a A,
}

impl<'a, S, A> BatchDriver<'a, S, A>
where
    S: RowStore + ?Sized,
    A: Annotator + ?Sized,
{
    pub fn new(settings: BatchSettings, store: &'a S, annotator: &'a A) -> Self {
        Self {
            settings,
            store,
            annotator,
        }
    }

    /// Row save failures abort the run; rows already saved stay saved.
    pub async fn run(&self) -> Result<RunSummary> {
        let rows = self
            .store
            .get_rows(self.settings.row_limit)
            .await
            .context("loading rows")?;

        let highest = highest_row(&rows, headers::NUMBER);
        match highest.index.map(|i| &rows[i]) {
            Some(row) => info!(
                "Last populated row:[{}] {}, {}",
                highest.number,
                row.get(headers::NUMBER).unwrap_or_default(),
                row.get(headers::CONCEPT).unwrap_or_default()
            ),
            None => warn!(rows = rows.len(), "no numbered rows found"),
        }

        let started = Instant::now();
        info!(at = %readable_date(Local::now()), "Starting to process rows");

        let mut summary = RunSummary {
            rows_loaded: rows.len(),
            annotated: 0,
            empty_annotations: 0,
            cleaned: 0,
            skipped: 0,
            highest,
            elapsed: Duration::ZERO,
        };

        for mut row in rows {
            let n = row.row_number();
            let num = row.get(headers::NUMBER).unwrap_or_default().to_string();
            let concept = row.get(headers::CONCEPT).map(str::to_string);
            let argument = row.get(headers::ARGUMENT).map(str::to_string);
            let observations = Observations::from_cell(row.get(headers::OBSERVATIONS));

            match classify(concept.as_deref(), argument.as_deref(), &observations) {
                Action::Skip(reason) => {
                    let why = match reason {
                        SkipReason::CleanupMatched(_) => "of cleanup matchers",
                        SkipReason::MissingInput => "concept or argument is empty",
                        SkipReason::AlreadyAnnotated => "observations are present",
                    };
                    info!(
                        elapsed_secs = into_seconds(started.elapsed()),
                        "[{}] Skipping row {} because {}", num, n, why
                    );
                    summary.skipped += 1;
                }
                Action::Clear(matcher) => {
                    info!(
                        matcher,
                        elapsed_secs = into_seconds(started.elapsed()),
                        "[{}] Cleaning row {} because of cleanup matchers", num, n
                    );
                    row.set(headers::OBSERVATIONS, "")?;
                    self.store
                        .save_row(&row)
                        .await
                        .with_context(|| format!("saving cleaned row {}", n))?;
                    summary.cleaned += 1;
                }
                Action::Annotate => {
                    let concept = concept.unwrap_or_default();
                    let argument = argument.unwrap_or_default();
                    info!(
                        elapsed_secs = into_seconds(started.elapsed()),
                        "[{}] Processing row ({}, {}, {})",
                        num,
                        concept,
                        argument,
                        observations.as_str()
                    );

                    let conclusion = self
                        .annotator
                        .annotate(&self.settings.prompt_template, &concept, &argument)
                        .await;
                    if conclusion.is_empty() {
                        summary.empty_annotations += 1;
                    }

                    row.set(headers::OBSERVATIONS, conclusion.as_str())?;
                    self.store
                        .save_row(&row)
                        .await
                        .with_context(|| format!("saving annotated row {}", n))?;
                    info!(
                        elapsed_secs = into_seconds(started.elapsed()),
                        "[{}] Saved conclusion ({})", num, conclusion
                    );
                    summary.annotated += 1;

                    sleep(self.settings.rate_limit).await;
                }
            }
        }

        summary.elapsed = started.elapsed();
        info!(
            elapsed_secs = into_seconds(summary.elapsed),
            total = %readable_time(summary.elapsed),
            at = %readable_date(Local::now()),
            "Finished processing rows"
        );
        Ok(summary)
    }
}
