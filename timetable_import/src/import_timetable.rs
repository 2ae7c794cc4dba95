use crate::config::Settings;
use crate::errors::{ImportError, ImportFailure, OutputError};
use crate::extractor::{DatasetExtractor, ScriptVariableExtractor};
use crate::fetcher::{Fetcher, IdentityPool, ReqwestSessionFactory, SessionFactory};
use crate::room_mapping::{RoomMapping, RoomMappingSource};
use crate::row_emitter::{OutputRow, RowEmitter};
use crate::term_resolver::{ResolvedTerm, TermId, TermResolver};
use chrono::NaiveDate;
use std::time::{Duration, Instant};
use tracing::{error, info};
use url::Url;

/// Where the viewer lives and how hard to try reaching it.
#[derive(Debug, Clone)]
pub struct ImportTarget {
    pub base_url: Url,
    pub term_query_param: String,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl ImportTarget {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_url: settings.timetable.base_url.clone(),
            term_query_param: settings.timetable.term_query_param.clone(),
            max_attempts: settings.timetable.max_attempts,
            timeout: settings.timetable.timeout(),
        }
    }

    pub fn term_url(&self, id: &TermId) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.term_query_param, id.as_ref());
        url
    }
}

#[derive(Debug)]
pub struct TimetableRows {
    pub term: ResolvedTerm,
    pub rows: Vec<OutputRow>,
}

#[derive(Debug)]
pub struct ImportSummary {
    pub term: ResolvedTerm,
    pub rows: usize,
    pub elapsed: Duration,
}

/// One scrape of the timetable viewer, from the landing page to delivered rows.
pub struct TimetableImport<F: SessionFactory, E: DatasetExtractor = ScriptVariableExtractor> {
    fetcher: Fetcher<F>,
    resolver: TermResolver,
    extractor: E,
    target: ImportTarget,
}

impl TimetableImport<ReqwestSessionFactory, ScriptVariableExtractor> {
    pub fn from_settings(settings: &Settings) -> Result<Self, ImportError> {
        let target = ImportTarget::from_settings(settings);
        let fetcher = Fetcher::new(
            ReqwestSessionFactory,
            IdentityPool::for_site(&target.base_url),
            settings.pacing,
        )?;
        Ok(Self::new(
            fetcher,
            TermResolver::new(settings.timetable.term_fallback),
            ScriptVariableExtractor::new(),
            target,
        ))
    }
}

impl<F: SessionFactory, E: DatasetExtractor> TimetableImport<F, E> {
    pub fn new(fetcher: Fetcher<F>, resolver: TermResolver, extractor: E, target: ImportTarget) -> Self {
        Self {
            fetcher,
            resolver,
            extractor,
            target,
        }
    }

    /// Fetches, resolves and extracts; stops at the first fatal failure.
    #[tracing::instrument(skip(self, rooms), level = "info")]
    pub async fn collect_rows(
        &mut self,
        today: NaiveDate,
        rooms: &RoomMapping,
    ) -> Result<TimetableRows, ImportError> {
        info!(url = %self.target.base_url, "Fetching the base page");
        let base_page = self
            .fetcher
            .fetch(&self.target.base_url, self.target.max_attempts, self.target.timeout)
            .await?;

        let term = self.resolver.resolve(&base_page, today)?;

        let term_url = self.target.term_url(&term.term.id);
        info!(url = %term_url, "Fetching the timetable page");
        let term_page = self
            .fetcher
            .fetch(&term_url, self.target.max_attempts, self.target.timeout)
            .await?;

        let entries = self.extractor.extract_dataset(&term_page)?;
        let rows = RowEmitter::new(rooms).emit(&entries);
        Ok(TimetableRows { term, rows })
    }

    /// Full run: loads the room mapping, collects rows and hands them to `deliver`.
    /// Nothing is delivered unless every earlier step succeeded.
    pub async fn run<D>(
        &mut self,
        today: NaiveDate,
        rooms: &dyn RoomMappingSource,
        deliver: D,
    ) -> Result<ImportSummary, ImportFailure>
    where
        D: FnOnce(&[OutputRow]) -> Result<(), OutputError>,
    {
        info!("Starting timetable import");
        let started = Instant::now();

        let outcome = self.run_steps(today, rooms, deliver).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok((term, rows)) => {
                info!(
                    elapsed_secs = elapsed.as_secs_f64(),
                    rows,
                    term = %term.term.label,
                    "Import completed"
                );
                Ok(ImportSummary {
                    term,
                    rows,
                    elapsed,
                })
            }
            Err(err) => {
                error!(elapsed_secs = elapsed.as_secs_f64(), error = %err, "Import failed");
                Err(ImportFailure {
                    error: err,
                    elapsed,
                })
            }
        }
    }

    async fn run_steps<D>(
        &mut self,
        today: NaiveDate,
        rooms: &dyn RoomMappingSource,
        deliver: D,
    ) -> Result<(ResolvedTerm, usize), ImportError>
    where
        D: FnOnce(&[OutputRow]) -> Result<(), OutputError>,
    {
        let rooms = rooms.load().await.map_err(ImportError::RoomMapping)?;
        let TimetableRows { term, rows } = self.collect_rows(today, &rooms).await?;
        deliver(&rows)?;
        Ok((term, rows.len()))
    }
}
