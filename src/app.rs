use crate::export::{ExportError, ReportExporter};
use crate::state::nationality;
use log::info;
use premier_api::client::{ApiError, PremierApi};
use std::fmt;

/// Terminal failure of a run, tagged with the stage that failed.
#[derive(Debug)]
pub enum PipelineError {
    Fetch(ApiError),
    /// Every record was dropped, or the API returned none.
    Empty,
    Export(ExportError),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Empty => "validate",
            PipelineError::Export(_) => "export",
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Fetch(e) => write!(f, "Error scraping stats from API: {e}"),
            PipelineError::Empty => write!(f, "Nothing to export!"),
            PipelineError::Export(e) => write!(f, "Error exporting stats: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Fetch(e) => Some(e),
            PipelineError::Empty => None,
            PipelineError::Export(e) => Some(e),
        }
    }
}

impl From<ApiError> for PipelineError {
    fn from(e: ApiError) -> Self {
        PipelineError::Fetch(e)
    }
}

impl From<ExportError> for PipelineError {
    fn from(e: ExportError) -> Self {
        PipelineError::Export(e)
    }
}

/// What a successful run exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub players: usize,
    pub nationalities: usize,
}

/// One fetch → aggregate → export run. Holds no state between runs.
pub struct App<E> {
    api: PremierApi,
    exporter: E,
}

impl<E: ReportExporter> App<E> {
    pub fn new(api: PremierApi, exporter: E) -> Self {
        Self { api, exporter }
    }

    #[cfg(test)]
    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        info!("Starting Premier League player stats scraper...");
        let mut players = self.api.fetch_player_stats().await?;
        if players.is_empty() {
            return Err(PipelineError::Empty);
        }

        // Stable, so equal ranks keep API order.
        players.sort_by_key(|p| p.rank);
        let nationalities = nationality::aggregate(&players);
        info!(
            "Aggregated {} players into {} nationalities",
            players.len(),
            nationalities.len()
        );

        self.exporter.export(&players, &nationalities)?;

        Ok(RunSummary {
            players: players.len(),
            nationalities: nationalities.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
