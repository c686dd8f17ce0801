//! reqwest implementation of [`Backend`].

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header::CONTENT_DISPOSITION};
use serde::de::DeserializeOwned;

use super::{
    backend::{Backend, DownloadTarget},
    types::{
        Artifact, CatalogResponse, Envelope, ErrorResponse, PreviewResponse, ResultsResponse,
        SampleRequest, SubmitResponse,
    },
};
use crate::{
    error::WorkflowError,
    jobs::{JobId, UploadedFile},
};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// HTTP client bound to one backend base URL.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client; a trailing slash on `base_url` is ignored.
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn target_path(target: &DownloadTarget) -> String {
        match target {
            DownloadTarget::Scoped { job_id, kind } => format!(
                "/api/download-by-job/{}/{}",
                urlencoding::encode(job_id.as_str()),
                kind.as_path_segment()
            ),
            DownloadTarget::Legacy { kind } => {
                format!("/api/download/{}", kind.as_path_segment())
            }
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_catalog(&self) -> Result<CatalogResponse, WorkflowError> {
        let resp = self.http.get(self.url("/api/sample-files")).send().await?;
        decode(resp).await
    }

    async fn submit_upload(&self, file: &UploadedFile) -> Result<SubmitResponse, WorkflowError> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(XLSX_MIME)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .http
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        decode(resp).await
    }

    async fn submit_preset(&self, sample_name: &str) -> Result<SubmitResponse, WorkflowError> {
        let resp = self
            .http
            .post(self.url("/api/process-sample"))
            .json(&SampleRequest { sample_name })
            .send()
            .await?;
        decode(resp).await
    }

    async fn preview_preset(&self, sample_name: &str) -> Result<PreviewResponse, WorkflowError> {
        let resp = self
            .http
            .post(self.url("/api/preview-sample"))
            .json(&SampleRequest { sample_name })
            .send()
            .await?;
        decode(resp).await
    }

    async fn job_results(&self, job_id: &JobId) -> Result<ResultsResponse, WorkflowError> {
        let path = format!("/api/results/{}", urlencoding::encode(job_id.as_str()));
        let resp = self.http.get(self.url(&path)).send().await?;
        decode(resp).await
    }

    async fn download(&self, target: &DownloadTarget) -> Result<Artifact, WorkflowError> {
        let resp = self
            .http
            .get(self.url(&Self::target_path(target)))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            // Failed downloads come back as a JSON envelope.
            let body = resp.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(env) => match env.into_success() {
                    Err(e) => e,
                    Ok(_) => http_error(status, &body),
                },
                Err(_) => http_error(status, &body),
            });
        }
        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename);
        let bytes = resp.bytes().await?;
        Ok(Artifact {
            filename,
            bytes: bytes.to_vec(),
        })
    }

    fn artifact_url(&self, target: &DownloadTarget) -> String {
        self.url(&Self::target_path(target))
    }
}

/// Parse a JSON envelope whatever the status; the backend reports failures in the body.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, WorkflowError> {
    let status = resp.status();
    let body = resp.text().await?;
    match serde_json::from_str::<T>(&body) {
        Ok(v) => Ok(v),
        Err(_) if !status.is_success() => Err(http_error(status, &body)),
        Err(e) => Err(WorkflowError::Transport(format!("malformed response: {e}"))),
    }
}

fn http_error(status: StatusCode, body: &str) -> WorkflowError {
    WorkflowError::Transport(format!("HTTP status {status} error: {body}"))
}

/// Pull `filename=` out of a Content-Disposition header value.
fn disposition_filename(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let v = part.strip_prefix("filename=")?;
        let v = v.trim_matches('"');
        // Only the final path component is kept.
        let name = v.rsplit(|c: char| c == '/' || c == '\\').next()?;
        if name.is_empty() || name == "." || name == ".." {
            None
        } else {
            Some(name.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::ArtifactKind;

    #[test]
    fn test_download_urls() {
        let b = HttpBackend::new(Client::new(), "http://localhost:5001/");
        let job_id = JobId::parse("job 42/x").unwrap();
        assert_eq!(
            b.artifact_url(&DownloadTarget::Scoped {
                job_id,
                kind: ArtifactKind::MasterMissing
            }),
            "http://localhost:5001/api/download-by-job/job%2042%2Fx/master_missing"
        );
        assert_eq!(
            b.artifact_url(&DownloadTarget::Legacy {
                kind: ArtifactKind::Reconciliation
            }),
            "http://localhost:5001/api/download/reconciliation"
        );
    }

    #[test]
    fn test_disposition_filename() {
        assert_eq!(
            disposition_filename("attachment; filename=General_Reconciliation_2026.xlsx").as_deref(),
            Some("General_Reconciliation_2026.xlsx")
        );
        assert_eq!(
            disposition_filename("attachment; filename=\"Master Missing.xlsx\"").as_deref(),
            Some("Master Missing.xlsx")
        );
        assert_eq!(
            disposition_filename("attachment; filename=\"../../etc/passwd\"").as_deref(),
            Some("passwd")
        );
        assert_eq!(disposition_filename("attachment"), None);
        assert_eq!(disposition_filename("attachment; filename=\"..\""), None);
    }
}
