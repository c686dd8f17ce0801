//! In-memory [`Backend`] for tests.

use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    backend::{Backend, DownloadTarget},
    types::{Artifact, CatalogResponse, PreviewResponse, ResultsResponse, SubmitResponse},
};
use crate::{
    error::WorkflowError,
    jobs::{JobId, UploadedFile},
};

/// Backend double that records every call and answers from canned JSON.
///
/// An endpoint left as `None` fails like a refused connection.
#[derive(Default)]
pub struct FakeBackend {
    pub calls: Mutex<Vec<String>>,
    pub catalog: Option<Value>,
    pub submit: Option<Value>,
    pub preview: Option<Value>,
    pub results: Option<Value>,
    pub artifact: Option<(Option<String>, Vec<u8>)>,
    pub delay: Option<Duration>,
}

impl FakeBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer<T: DeserializeOwned>(
        &self,
        call: String,
        canned: &Option<Value>,
    ) -> Result<T, WorkflowError> {
        self.calls.lock().unwrap().push(call);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        match canned {
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| WorkflowError::Transport(format!("malformed response: {e}"))),
            None => Err(WorkflowError::Transport("connection refused".into())),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_catalog(&self) -> Result<CatalogResponse, WorkflowError> {
        self.answer("catalog".into(), &self.catalog).await
    }

    async fn submit_upload(&self, file: &UploadedFile) -> Result<SubmitResponse, WorkflowError> {
        self.answer(format!("upload:{}", file.filename), &self.submit)
            .await
    }

    async fn submit_preset(&self, sample_name: &str) -> Result<SubmitResponse, WorkflowError> {
        self.answer(format!("preset:{sample_name}"), &self.submit)
            .await
    }

    async fn preview_preset(&self, sample_name: &str) -> Result<PreviewResponse, WorkflowError> {
        self.answer(format!("preview:{sample_name}"), &self.preview)
            .await
    }

    async fn job_results(&self, job_id: &JobId) -> Result<ResultsResponse, WorkflowError> {
        self.answer(format!("results:{job_id}"), &self.results)
            .await
    }

    async fn download(&self, target: &DownloadTarget) -> Result<Artifact, WorkflowError> {
        self.calls.lock().unwrap().push(format!("download:{target:?}"));
        match &self.artifact {
            Some((filename, bytes)) => Ok(Artifact {
                filename: filename.clone(),
                bytes: bytes.clone(),
            }),
            None => Err(WorkflowError::Backend("File not found".into())),
        }
    }

    fn artifact_url(&self, _target: &DownloadTarget) -> String {
        "http://backend.test/download".into()
    }
}
