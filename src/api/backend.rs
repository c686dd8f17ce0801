//! The seam between the workflow and the reconciliation service.

use async_trait::async_trait;

use super::types::{
    Artifact, CatalogResponse, PreviewResponse, ResultsResponse, SubmitResponse,
};
use crate::{
    error::WorkflowError,
    jobs::{ArtifactKind, JobId, UploadedFile},
};

/// Where a download request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// `download-by-job/{job_id}/{kind}`
    Scoped { job_id: JobId, kind: ArtifactKind },
    /// `download/{kind}`, resolved by the server without a job.
    Legacy { kind: ArtifactKind },
}

impl DownloadTarget {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            DownloadTarget::Scoped { kind, .. } | DownloadTarget::Legacy { kind } => *kind,
        }
    }
}

/// One call per backend endpoint.
///
/// Implementations return the decoded envelope; `success=false` handling is left to
/// the caller so every endpoint shares the same policy.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_catalog(&self) -> Result<CatalogResponse, WorkflowError>;

    async fn submit_upload(&self, file: &UploadedFile) -> Result<SubmitResponse, WorkflowError>;

    async fn submit_preset(&self, sample_name: &str) -> Result<SubmitResponse, WorkflowError>;

    async fn preview_preset(&self, sample_name: &str) -> Result<PreviewResponse, WorkflowError>;

    async fn job_results(&self, job_id: &JobId) -> Result<ResultsResponse, WorkflowError>;

    async fn download(&self, target: &DownloadTarget) -> Result<Artifact, WorkflowError>;

    /// Absolute URL of a download target, for opening in a browser.
    fn artifact_url(&self, target: &DownloadTarget) -> String;
}
