//! Wire types for the reconciliation backend.

use serde::{Deserialize, Serialize};

use crate::{error::WorkflowError, jobs::JobId, rows::PreviewRow};

/// Fields shared by every JSON response.
pub trait Envelope {
    fn success(&self) -> bool;
    fn error_message(&mut self) -> Option<String>;

    /// Turn `success=false` into a backend failure.
    fn into_success(mut self) -> Result<Self, WorkflowError>
    where
        Self: Sized,
    {
        if self.success() {
            Ok(self)
        } else {
            Err(WorkflowError::backend(self.error_message()))
        }
    }
}

macro_rules! envelope {
    ($($ty:ty),+ $(,)?) => {
        $(impl Envelope for $ty {
            fn success(&self) -> bool {
                self.success
            }
            fn error_message(&mut self) -> Option<String> {
                self.error.take()
            }
        })+
    };
}

/// One selectable sample file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    pub filename: String,
    pub description: String,
}

/// `GET /api/sample-files`
#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files: Option<Vec<CatalogEntry>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CatalogResponse {
    /// Extract the catalog entries; a success without a file list is malformed.
    pub fn into_entries(self) -> Result<Vec<CatalogEntry>, WorkflowError> {
        let resp = self.into_success()?;
        resp.files
            .ok_or_else(|| WorkflowError::Transport("malformed response: files missing".into()))
    }
}

/// Body for the preset submission and preset preview endpoints.
#[derive(Debug, Serialize)]
pub struct SampleRequest<'a> {
    pub sample_name: &'a str,
}

/// Response shared by both submission endpoints.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SubmitResponse {
    /// Extract the issued job id; a success without one is malformed.
    pub fn into_job_id(self) -> Result<JobId, WorkflowError> {
        let resp = self.into_success()?;
        resp.job_id
            .and_then(JobId::parse)
            .ok_or_else(|| WorkflowError::Transport("malformed response: job_id missing".into()))
    }
}

/// `POST /api/preview-sample`
#[derive(Debug, Deserialize)]
pub struct PreviewResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub showing_rows: Option<u64>,
    #[serde(default)]
    pub preview_data: Vec<PreviewRow>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Summary statistics of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResultsSummary {
    pub total_encounters: u64,
    pub billed_count: u64,
    pub not_billed_count: u64,
    /// Percentage in `0.0..=100.0`.
    pub success_rate: f64,
    pub master_missing_added: u64,
    pub master_missing_updated: u64,
    pub master_missing_removed: u64,
    pub execution_date: String,
    pub input_file: String,
}

/// Server-side paths of the generated artifacts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputFiles {
    pub general_reconciliation: String,
    pub master_missing: String,
}

/// Stored results of one job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobResults {
    pub summary: ResultsSummary,
    #[serde(default)]
    pub preview_data: Vec<PreviewRow>,
    #[serde(default)]
    pub output_files: OutputFiles,
    /// Row count the backend claims to show, when it says so.
    #[serde(default)]
    pub showing_rows: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// `GET /api/results/{job_id}`
#[derive(Debug, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub results: Option<JobResults>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ResultsResponse {
    /// Extract the results payload.
    pub fn into_results(self) -> Result<JobResults, WorkflowError> {
        let resp = self.into_success()?;
        resp.results
            .ok_or_else(|| WorkflowError::Transport("malformed response: results missing".into()))
    }
}

/// Error body returned by the download endpoints when no file is sent.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

envelope!(CatalogResponse, SubmitResponse, PreviewResponse, ResultsResponse, ErrorResponse);

/// A downloaded artifact stream.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Name suggested by the server, if any.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}
