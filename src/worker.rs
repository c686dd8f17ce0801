//! Background worker running backend calls off the UI thread.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use reqwest::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    api::{
        backend::{Backend, DownloadTarget},
        client::HttpBackend,
    },
    config::{Config, Timeouts},
    error::WorkflowError,
    jobs::{ArtifactKind, JobSubmission, Session, UploadedFile, validate_upload_selection},
    view::{CatalogView, PreviewView, ResultsView},
    workflow::{Controller, DownloadOutcome},
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Fetch the sample catalog.
    LoadCatalog { ticket: Uuid },
    /// Preview a catalog file, replacing any preview in flight.
    Preview { ticket: Uuid, sample_name: String },
    /// Drop the preview in flight, if any.
    CancelPreview,
    /// Read a local file and submit it.
    SubmitUpload { ticket: Uuid, path: PathBuf },
    /// Submit a catalog file by name.
    SubmitPreset { ticket: Uuid, sample_name: String },
    /// Abort the submission in flight, including its results fetch.
    Cancel,
    /// Save or open one artifact.
    Download { target: DownloadTarget },
    /// Apply updated settings.
    SaveSettings(Config),
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    CatalogLoaded {
        ticket: Uuid,
        catalog: CatalogView,
    },
    PreviewReady {
        ticket: Uuid,
        view: PreviewView,
    },
    PreviewFailed {
        ticket: Uuid,
        error: WorkflowError,
    },
    /// The backend accepted the submission and issued a job id.
    Submitted {
        ticket: Uuid,
        session: Session,
    },
    SubmissionFailed {
        ticket: Uuid,
        error: WorkflowError,
    },
    ResultsReady {
        ticket: Uuid,
        view: ResultsView,
    },
    ResultsFailed {
        ticket: Uuid,
        error: WorkflowError,
    },
    Downloaded {
        kind: ArtifactKind,
        outcome: DownloadOutcome,
    },
    DownloadFailed {
        kind: ArtifactKind,
        error: WorkflowError,
    },
    /// Informational log message.
    Log(String),
}

/// Main worker loop over the HTTP backend.
pub async fn run(rx: mpsc::Receiver<WorkerCmd>, tx: mpsc::Sender<WorkerEvent>, cfg: Config) {
    // Shared HTTP client; rebuilt controllers reuse its connection pool.
    let http = Client::new();
    let build = move |cfg: &Config| {
        Controller::new(
            HttpBackend::new(http.clone(), &cfg.backend.base_url),
            Timeouts::from(&cfg.timeouts),
        )
    };
    serve(rx, tx, cfg, build).await;
}

/// Dispatch commands until the UI drops its sender.
///
/// Every network operation runs in its own task under a child of one root token.
async fn serve<B, F>(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    mut cfg: Config,
    build: F,
) where
    B: Backend + 'static,
    F: Fn(&Config) -> Controller<B>,
{
    let root = CancellationToken::new();
    let mut controller = Arc::new(build(&cfg));
    let mut preview: Option<CancellationToken> = None;
    let mut submission: Option<CancellationToken> = None;
    tracing::info!("worker started: backend {}", cfg.backend.base_url);

    while let Some(cmd) = rx.recv().await {
        match cmd {
            WorkerCmd::SaveSettings(new_cfg) => {
                tracing::info!("settings updated: backend {}", new_cfg.backend.base_url);
                // In-flight tasks finish against the controller they started with.
                controller = Arc::new(build(&new_cfg));
                cfg = new_cfg;
                let _ = tx.send(WorkerEvent::Log("settings updated".into())).await;
            }

            WorkerCmd::LoadCatalog { ticket } => {
                let (c, tx, cancel) = (controller.clone(), tx.clone(), root.child_token());
                tokio::spawn(async move {
                    let catalog = c.load_catalog(&cancel).await;
                    let _ = tx.send(WorkerEvent::CatalogLoaded { ticket, catalog }).await;
                });
            }

            WorkerCmd::Preview {
                ticket,
                sample_name,
            } => {
                let cancel = replace_token(&mut preview, &root);
                let (c, tx) = (controller.clone(), tx.clone());
                tokio::spawn(async move {
                    let ev = match c.preview(&sample_name, &cancel).await {
                        Ok(Some(view)) => WorkerEvent::PreviewReady { ticket, view },
                        Ok(None) => return,
                        Err(WorkflowError::Cancelled) => {
                            tracing::info!("preview superseded: {sample_name}");
                            return;
                        }
                        Err(error) => WorkerEvent::PreviewFailed { ticket, error },
                    };
                    let _ = tx.send(ev).await;
                });
            }

            WorkerCmd::CancelPreview => {
                if let Some(t) = preview.take() {
                    t.cancel();
                }
            }

            WorkerCmd::SubmitUpload { ticket, path } => {
                let cancel = replace_token(&mut submission, &root);
                let (c, tx) = (controller.clone(), tx.clone());
                tokio::spawn(async move {
                    match read_upload(&path).await {
                        Ok(job) => run_submission(&c, &tx, ticket, job, &cancel).await,
                        Err(error) => {
                            tracing::error!("upload read failed: {}: {error}", path.display());
                            let _ = tx
                                .send(WorkerEvent::SubmissionFailed { ticket, error })
                                .await;
                        }
                    }
                });
            }

            WorkerCmd::SubmitPreset {
                ticket,
                sample_name,
            } => {
                let cancel = replace_token(&mut submission, &root);
                let (c, tx) = (controller.clone(), tx.clone());
                tokio::spawn(async move {
                    let job = JobSubmission::Preset { sample_name };
                    run_submission(&c, &tx, ticket, job, &cancel).await;
                });
            }

            WorkerCmd::Cancel => {
                if let Some(t) = submission.take() {
                    tracing::info!("submission cancel requested");
                    t.cancel();
                }
            }

            WorkerCmd::Download { target } => {
                let (c, tx, cancel) = (controller.clone(), tx.clone(), root.child_token());
                let downloads = cfg.downloads.clone();
                tokio::spawn(async move {
                    let kind = target.kind();
                    let ev = match c.download(&target, &downloads, &cancel).await {
                        Ok(outcome) => WorkerEvent::Downloaded { kind, outcome },
                        Err(error) => WorkerEvent::DownloadFailed { kind, error },
                    };
                    let _ = tx.send(ev).await;
                });
            }
        }
    }

    root.cancel();
    tracing::info!("worker stopped");
}

/// Cancel the previous holder of `slot` and install a fresh child token.
fn replace_token(
    slot: &mut Option<CancellationToken>,
    root: &CancellationToken,
) -> CancellationToken {
    if let Some(prev) = slot.take() {
        prev.cancel();
    }
    let token = root.child_token();
    *slot = Some(token.clone());
    token
}

/// Validate the selected path, then read the file.
async fn read_upload(path: &Path) -> Result<JobSubmission, WorkflowError> {
    let filename = validate_upload_selection(Some(path))?;
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        WorkflowError::Transport(format!("failed to read {}: {e}", path.display()))
    })?;
    Ok(JobSubmission::Upload(UploadedFile { filename, bytes }))
}

/// Submit, then hand the issued job straight to the results fetch.
async fn run_submission<B: Backend>(
    c: &Controller<B>,
    tx: &mpsc::Sender<WorkerEvent>,
    ticket: Uuid,
    job: JobSubmission,
    cancel: &CancellationToken,
) {
    let session = match c.submit(&job, cancel).await {
        Ok(s) => s,
        Err(error) => {
            let _ = tx
                .send(WorkerEvent::SubmissionFailed { ticket, error })
                .await;
            return;
        }
    };
    let _ = tx
        .send(WorkerEvent::Submitted {
            ticket,
            session: session.clone(),
        })
        .await;

    let ev = match c.load_results(&session, cancel).await {
        Ok(view) => WorkerEvent::ResultsReady { ticket, view },
        Err(error) => WorkerEvent::ResultsFailed { ticket, error },
    };
    let _ = tx.send(ev).await;
}
