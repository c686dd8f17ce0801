//! ジョブ投入の入力モデルとセッション。

use std::{fmt, path::Path};

use chrono::{DateTime, Local};

use crate::error::WorkflowError;

/// アップロードで受け付ける唯一の拡張子（大文字小文字を区別する）。
pub const ACCEPTED_EXTENSION: &str = ".xlsx";

/// バックエンドが発行する不透明なジョブID。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    /// 空でない文字列だけをジョブIDとして受け付ける。
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// 文字列として参照する。
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// アップロードするファイル本体。
#[derive(Clone)]
pub struct UploadedFile {
    /// 送信時のファイル名。
    pub filename: String,
    /// ファイルの中身。
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 中身はログに出さずサイズだけ表示する。
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// 1回の投入で送る入力（どちらか一方のみ）。
#[derive(Clone, Debug)]
pub enum JobSubmission {
    /// ユーザーが選んだファイルをそのまま送る。
    Upload(UploadedFile),
    /// カタログ上のサンプルファイル名を送る。
    Preset { sample_name: String },
}

impl JobSubmission {
    /// 送信前に不変条件を検証する（失敗時はネットワークに触れない）。
    pub fn validate(&self) -> Result<(), WorkflowError> {
        match self {
            JobSubmission::Upload(file) => check_extension(&file.filename),
            JobSubmission::Preset { sample_name } => check_preset(sample_name).map(|_| ()),
        }
    }

    /// ログ表示用の短い説明。
    pub fn describe(&self) -> String {
        match self {
            JobSubmission::Upload(file) => format!("upload {}", file.filename),
            JobSubmission::Preset { sample_name } => format!("sample {sample_name}"),
        }
    }
}

/// アップロード対象のパスを検証し、送信用のファイル名を返す。
pub fn validate_upload_selection(path: Option<&Path>) -> Result<String, WorkflowError> {
    // 未選択ならその場でエラーにする。
    let Some(path) = path else {
        return Err(WorkflowError::Validation("Please select a file".into()));
    };
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Err(WorkflowError::Validation("Please select a file".into()));
    };
    check_extension(name)?;
    Ok(name.to_string())
}

/// カタログ選択値を検証する。
pub fn check_preset(sample_name: &str) -> Result<&str, WorkflowError> {
    if sample_name.is_empty() {
        return Err(WorkflowError::Validation(
            "Please select a sample file".into(),
        ));
    }
    Ok(sample_name)
}

fn check_extension(filename: &str) -> Result<(), WorkflowError> {
    if filename.ends_with(ACCEPTED_EXTENSION) {
        Ok(())
    } else {
        Err(WorkflowError::Validation(
            "Please select an Excel file (.xlsx)".into(),
        ))
    }
}

/// バックエンドが生成する成果物の種類。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    /// 全件の突合結果。
    Reconciliation,
    /// 未請求マスター台帳。
    MasterMissing,
}

impl ArtifactKind {
    /// ダウンロードパスに埋め込む識別子。
    pub fn as_path_segment(self) -> &'static str {
        match self {
            ArtifactKind::Reconciliation => "reconciliation",
            ArtifactKind::MasterMissing => "master_missing",
        }
    }

    /// 画面表示用の名前。
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Reconciliation => "General Reconciliation",
            ArtifactKind::MasterMissing => "Master Missing",
        }
    }
}

/// 投入成功で得られるセッション。ダウンロードは必ずこれを経由する。
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// 対象ジョブ。
    pub job_id: JobId,
    /// 投入が受理された時刻。
    pub submitted_at: DateTime<Local>,
}

impl Session {
    /// 受理直後のセッションを作る。
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            submitted_at: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_upload_selection_requires_file() {
        // 未選択はファイル選択を促すエラーになる。
        assert_eq!(
            validate_upload_selection(None),
            Err(WorkflowError::Validation("Please select a file".into()))
        );
    }

    #[test]
    fn test_upload_selection_rejects_other_extensions() {
        // xlsx以外はすべて拒否する。
        for name in ["report.csv", "report.xls", "report.XLSX", "report.xlsx.bak", "xlsx"] {
            let p = PathBuf::from(format!("/tmp/{name}"));
            assert_eq!(
                validate_upload_selection(Some(p.as_path())),
                Err(WorkflowError::Validation(
                    "Please select an Excel file (.xlsx)".into()
                )),
                "{name}"
            );
        }
    }

    #[test]
    fn test_upload_selection_accepts_xlsx() {
        let p = PathBuf::from("/data/in/encounters_q1.xlsx");
        assert_eq!(
            validate_upload_selection(Some(p.as_path())).as_deref(),
            Ok("encounters_q1.xlsx")
        );
    }

    #[test]
    fn test_submission_validate() {
        // プリセットは空文字を拒否する。
        let empty = JobSubmission::Preset {
            sample_name: String::new(),
        };
        assert!(matches!(empty.validate(), Err(WorkflowError::Validation(_))));

        let upload = JobSubmission::Upload(UploadedFile {
            filename: "a.csv".into(),
            bytes: vec![1, 2, 3],
        });
        assert!(upload.validate().is_err());

        let ok = JobSubmission::Preset {
            sample_name: "sample_q1.xlsx".into(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_job_id_rejects_blank() {
        assert!(JobId::parse("").is_none());
        assert!(JobId::parse("   ").is_none());
        assert_eq!(JobId::parse("job-42").map(|j| j.to_string()), Some("job-42".into()));
    }
}
