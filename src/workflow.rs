//! Job lifecycle: catalog, preview, submission, results, downloads.

use std::{
    future::Future,
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{
        backend::{Backend, DownloadTarget},
        types::Envelope,
    },
    config::{DownloadMode, DownloadsCfg, Timeouts},
    error::WorkflowError,
    jobs::{ArtifactKind, JobSubmission, Session},
    view::{CatalogView, PreviewView, ResultsView},
};

/// What a download action ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Artifact written to disk.
    Saved(PathBuf),
    /// URL handed to the system browser.
    Opened(String),
}

/// Drives the backend calls of one client.
pub struct Controller<B> {
    backend: B,
    timeouts: Timeouts,
}

impl<B: Backend> Controller<B> {
    pub fn new(backend: B, timeouts: Timeouts) -> Self {
        Self { backend, timeouts }
    }

    /// Fetch the sample catalog. Failures collapse into the error placeholder.
    pub async fn load_catalog(&self, cancel: &CancellationToken) -> CatalogView {
        tracing::info!("catalog load start");
        let r = guarded("catalog", self.timeouts.catalog, cancel, async {
            self.backend.list_catalog().await?.into_entries()
        })
        .await;
        match r {
            Ok(files) => {
                tracing::info!("catalog loaded: {} files", files.len());
                CatalogView::from_entries(&files)
            }
            Err(e) => {
                tracing::error!("catalog load failed: {e}");
                CatalogView::failed()
            }
        }
    }

    /// Preview a catalog file. An empty selection returns `None` without a request.
    pub async fn preview(
        &self,
        sample_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<PreviewView>, WorkflowError> {
        if sample_name.is_empty() {
            return Ok(None);
        }
        tracing::info!("preview start: {sample_name}");
        let resp = guarded("preview", self.timeouts.preview, cancel, async {
            self.backend.preview_preset(sample_name).await?.into_success()
        })
        .await
        .inspect_err(|e| tracing::warn!("preview failed: {sample_name}: {e}"))?;
        let view = PreviewView::new(sample_name, &resp);
        tracing::info!(
            "preview loaded: {sample_name}: {} of {} rows",
            view.showing_rows,
            view.total_rows
        );
        Ok(Some(view))
    }

    /// Submit a job and return the session that owns its job id.
    pub async fn submit(
        &self,
        submission: &JobSubmission,
        cancel: &CancellationToken,
    ) -> Result<Session, WorkflowError> {
        // Invalid input never reaches the network.
        submission.validate()?;
        tracing::info!("submit start: {}", submission.describe());
        let job_id = guarded("submission", self.timeouts.submit, cancel, async {
            let resp = match submission {
                JobSubmission::Upload(file) => self.backend.submit_upload(file).await?,
                JobSubmission::Preset { sample_name } => {
                    self.backend.submit_preset(sample_name).await?
                }
            };
            resp.into_job_id()
        })
        .await
        .inspect_err(|e| tracing::error!("submit failed: {}: {e}", submission.describe()))?;
        tracing::info!("submit accepted: job {job_id}");
        Ok(Session::new(job_id))
    }

    /// Fetch and shape the results of a submitted job.
    pub async fn load_results(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<ResultsView, WorkflowError> {
        let job_id = &session.job_id;
        tracing::info!("results fetch start: job {job_id}");
        let results = guarded("results", self.timeouts.results, cancel, async {
            self.backend.job_results(job_id).await?.into_results()
        })
        .await
        .inspect_err(|e| tracing::error!("results fetch failed: job {job_id}: {e}"))?;
        tracing::info!(
            "results loaded: job {job_id}: {} encounters, {} preview rows",
            results.summary.total_encounters,
            results.preview_data.len()
        );
        Ok(ResultsView::new(&results))
    }

    /// Save or open one artifact.
    pub async fn download(
        &self,
        target: &DownloadTarget,
        downloads: &DownloadsCfg,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome, WorkflowError> {
        if downloads.mode == DownloadMode::Browser {
            let url = self.backend.artifact_url(target);
            tracing::info!("opening download in browser: {url}");
            webbrowser::open(&url)
                .map_err(|e| WorkflowError::Transport(format!("failed to open browser: {e}")))?;
            return Ok(DownloadOutcome::Opened(url));
        }

        let kind = target.kind();
        tracing::info!("download start: {target:?}");
        let artifact = guarded("download", self.timeouts.download, cancel, async {
            self.backend.download(target).await
        })
        .await
        .inspect_err(|e| tracing::error!("download failed: {target:?}: {e}"))?;

        let dir = Path::new(&downloads.dir);
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| WorkflowError::Transport(format!("failed to create {}: {e}", dir.display())))?;
        let name = artifact
            .filename
            .unwrap_or_else(|| default_artifact_name(kind, chrono::Local::now()));
        let path = write_new_file(dir, &name, &artifact.bytes)
            .await
            .map_err(|e| WorkflowError::Transport(format!("failed to write {name}: {e}")))?;
        tracing::info!("download saved: {} ({} bytes)", path.display(), artifact.bytes.len());
        Ok(DownloadOutcome::Saved(path))
    }
}

/// Pick the download path for a request.
///
/// An active session always wins. Without one, the job-agnostic path is only used when
/// explicitly allowed; otherwise the request is rejected.
pub fn resolve_download(
    session: Option<&Session>,
    kind: ArtifactKind,
    allow_legacy: bool,
) -> Result<DownloadTarget, WorkflowError> {
    match session {
        Some(s) => Ok(DownloadTarget::Scoped {
            job_id: s.job_id.clone(),
            kind,
        }),
        None if allow_legacy => {
            tracing::warn!("no active job; using legacy download path for {kind:?}");
            Ok(DownloadTarget::Legacy { kind })
        }
        None => Err(WorkflowError::NoActiveJob),
    }
}

/// Run one network call under a time budget and a cancellation token.
async fn guarded<T, F>(
    op: &'static str,
    limit: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, WorkflowError>
where
    F: Future<Output = Result<T, WorkflowError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WorkflowError::Cancelled),
        r = tokio::time::timeout(limit, fut) => match r {
            Ok(inner) => inner,
            Err(_) => Err(WorkflowError::Timeout { op, after: limit }),
        },
    }
}

fn default_artifact_name(kind: ArtifactKind, now: chrono::DateTime<chrono::Local>) -> String {
    format!(
        "{}_{}.xlsx",
        kind.as_path_segment(),
        now.format("%Y%m%d_%H%M%S")
    )
}

/// `dir/name`, then `dir/stem_N.ext` for N = 1, 2, ...
fn candidate_path(dir: &Path, name: &str, n: u32) -> PathBuf {
    if n == 0 {
        return dir.join(name);
    }
    let p = Path::new(name);
    let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    match p.extension().and_then(|s| s.to_str()) {
        Some(ext) => dir.join(format!("{stem}_{n}.{ext}")),
        None => dir.join(format!("{stem}_{n}")),
    }
}

/// Write `bytes` to the first candidate path that does not exist yet.
///
/// The file is created with `create_new`, so concurrent writers never share a path.
async fn write_new_file(dir: &Path, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    for n in 0..u32::MAX {
        let path = candidate_path(dir, name, n);
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        };
        file.write_all(bytes).await?;
        file.flush().await?;
        return Ok(path);
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {name}"),
    ))
}
