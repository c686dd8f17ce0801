//! TUIのイベントループ、入力処理、状態管理。

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event};
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    config::{Config, DownloadMode},
    events::{StatusKind, Trigger, UiState},
    input::InputBoxState,
    jobs::{ArtifactKind, check_preset, validate_upload_selection},
    shortcuts::Shortcuts,
    ui::Tui,
    worker::{self, WorkerCmd, WorkerEvent},
    workflow::{DownloadOutcome, resolve_download},
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// 永続化された設定ファイルのパス。
    pub cfg_path: PathBuf,
    /// メモリ上の現在設定。
    pub cfg: Config,
    /// 画面状態とワークフローの状態。
    pub ui: UiState,
    /// Workerへのコマンド送信チャネル。
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Workerからのイベント受信チャネル。
    pub worker_rx: mpsc::Receiver<WorkerEvent>,

    /// アップロード対象として選んだファイル。
    pub upload_path: Option<PathBuf>,

    /// 設定画面で編集するバックエンドURL。
    pub base_url: String,
    /// 設定画面で編集するダウンロード先。
    pub download_dir: String,
    /// 設定画面で編集するダウンロード方式。
    pub download_mode: DownloadMode,

    /// 入力ボックスの状態（入力中はSome）。
    pub input_box: Option<InputBoxState>,

    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,

    /// 描画ごとに進むカウンタ（スピナー用）。
    pub tick: usize,
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    // 設定ファイルを読み込む（初回はデフォルトを生成）。
    let cfg_path = PathBuf::from("config.toml");
    let cfg = Config::load_or_default(&cfg_path)?;

    // ショートカット設定を読み込む（無ければデフォルト）。
    let shortcuts = Shortcuts::load_or_default("shortcut.toml")?;

    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);
    tokio::spawn(worker::run(rx_cmd, tx_ev, cfg.clone()));

    let mut app = App {
        cfg_path,
        base_url: cfg.backend.base_url.clone(),
        download_dir: cfg.downloads.dir.clone(),
        download_mode: cfg.downloads.mode,
        cfg,
        ui: UiState::default(),
        worker_tx: tx_cmd,
        worker_rx: rx_ev,
        upload_path: None,
        input_box: None,
        shortcuts,
        tick: 0,
    };

    // 起動時にサンプル一覧を1回だけ読み込む。
    request_catalog(&mut app).await?;

    loop {
        terminal.draw(|f| draw(f, &app))?;
        app.tick = app.tick.wrapping_add(1);

        // 入力処理の前にWorkerイベントを消化する。
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev);
        }

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(k) = event::read()?
        {
            if is_ctrl_c(&k) {
                break;
            }
            if handle_key(&mut app, k).await? {
                break;
            }
        }
    }
    Ok(())
}

/// WorkerイベントをUI状態へ反映する。チケットが古いものは捨てる。
fn handle_worker_event(app: &mut App, ev: WorkerEvent) {
    let applied = match ev {
        WorkerEvent::CatalogLoaded { ticket, catalog } => {
            app.ui.catalog_loaded(ticket, catalog)
        }
        WorkerEvent::PreviewReady { ticket, view } => app.ui.preview_ready(ticket, view),
        WorkerEvent::PreviewFailed { ticket, error } => app.ui.preview_failed(ticket, &error),
        WorkerEvent::Submitted { ticket, session } => {
            let message = match app.ui.pending.submission {
                Some((t, Trigger::Upload)) if t == ticket => "File processed successfully!",
                _ => "Sample file processed successfully!",
            };
            let job = session.job_id.to_string();
            let applied = app.ui.submission_accepted(ticket, session, message);
            if applied {
                app.ui.push_log(format!("job {job} accepted"));
            }
            applied
        }
        WorkerEvent::SubmissionFailed { ticket, error } => {
            app.ui.submission_failed(ticket, &error)
        }
        WorkerEvent::ResultsReady { ticket, view } => app.ui.results_ready(ticket, view),
        WorkerEvent::ResultsFailed { ticket, error } => {
            let applied = app.ui.results_failed(ticket);
            if applied {
                app.ui.push_log(format!("results: {error}"));
            }
            applied
        }
        WorkerEvent::Downloaded { kind, outcome } => {
            let message = match outcome {
                DownloadOutcome::Saved(path) => {
                    format!("Saved {} to {}", kind.label(), path.display())
                }
                DownloadOutcome::Opened(url) => format!("Opened {} in browser: {url}", kind.label()),
            };
            app.ui.push_log(message.clone());
            app.ui.set_status(StatusKind::Success, message);
            true
        }
        WorkerEvent::DownloadFailed { kind, error } => {
            app.ui.push_log(format!("{} download failed: {error}", kind.label()));
            app.ui.set_status(StatusKind::Error, format!("Error: {error}"));
            true
        }
        WorkerEvent::Log(s) => {
            app.ui.push_log(s);
            true
        }
    };
    if !applied {
        tracing::debug!("stale worker event ignored");
    }
}

/// サンプル一覧の読み込みをWorkerへ依頼する。
pub async fn request_catalog(app: &mut App) -> Result<()> {
    let ticket = Uuid::new_v4();
    app.ui.pending.catalog = Some(ticket);
    app.worker_tx.send(WorkerCmd::LoadCatalog { ticket }).await?;
    Ok(())
}

/// 現在の選択でプレビューを取り直す。空選択なら隠すだけ。
pub async fn request_preview(app: &mut App) -> Result<()> {
    let sample_name = app.ui.selected_sample().to_string();
    if sample_name.is_empty() {
        app.ui.hide_preview();
        app.worker_tx.send(WorkerCmd::CancelPreview).await?;
        return Ok(());
    }
    let ticket = Uuid::new_v4();
    app.ui.begin_preview(ticket);
    app.worker_tx
        .send(WorkerCmd::Preview {
            ticket,
            sample_name,
        })
        .await?;
    Ok(())
}

/// 選択中のファイルを投入する。検証に失敗したらWorkerへは送らない。
pub async fn start_upload(app: &mut App) -> Result<()> {
    if !app.ui.upload_control.enabled {
        return Ok(());
    }
    if let Err(e) = validate_upload_selection(app.upload_path.as_deref()) {
        tracing::warn!("upload rejected: {e}");
        app.ui.reject(&e);
        return Ok(());
    }
    let Some(path) = app.upload_path.clone() else {
        return Ok(());
    };
    let ticket = Uuid::new_v4();
    app.ui
        .begin_submission(ticket, Trigger::Upload, "Uploading and processing file...");
    app.worker_tx
        .send(WorkerCmd::SubmitUpload { ticket, path })
        .await?;
    Ok(())
}

/// 選択中のサンプルを投入する。
pub async fn start_preset(app: &mut App) -> Result<()> {
    if !app.ui.preset_control.enabled {
        return Ok(());
    }
    let sample_name = match check_preset(app.ui.selected_sample()) {
        Ok(name) => name.to_string(),
        Err(e) => {
            tracing::warn!("preset rejected: {e}");
            app.ui.reject(&e);
            return Ok(());
        }
    };
    let ticket = Uuid::new_v4();
    app.ui.begin_submission(
        ticket,
        Trigger::Preset,
        format!("Processing sample file: {sample_name}..."),
    );
    app.worker_tx
        .send(WorkerCmd::SubmitPreset {
            ticket,
            sample_name,
        })
        .await?;
    Ok(())
}

/// 有効なジョブの成果物を取得する。ジョブが無ければ警告を出す。
pub async fn request_download(app: &mut App, kind: ArtifactKind) -> Result<()> {
    match resolve_download(app.ui.session.as_ref(), kind, app.cfg.downloads.allow_legacy) {
        Ok(target) => {
            app.ui
                .set_status(StatusKind::Info, format!("Downloading {}...", kind.label()));
            app.worker_tx.send(WorkerCmd::Download { target }).await?;
        }
        Err(e) => {
            tracing::warn!("download refused: {e}");
            app.ui.show_alert(e.to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::Screen,
        jobs::{JobId, Session},
    };

    fn test_app() -> (App, mpsc::Receiver<WorkerCmd>) {
        let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(8);
        let (_tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(8);
        let cfg = Config::default();
        let app = App {
            cfg_path: PathBuf::from("config.toml"),
            base_url: cfg.backend.base_url.clone(),
            download_dir: cfg.downloads.dir.clone(),
            download_mode: cfg.downloads.mode,
            cfg,
            ui: UiState::default(),
            worker_tx: tx_cmd,
            worker_rx: rx_ev,
            upload_path: None,
            input_box: None,
            shortcuts: Shortcuts::default(),
            tick: 0,
        };
        (app, rx_cmd)
    }

    #[tokio::test]
    async fn test_download_without_job_raises_alert() {
        let (mut app, mut rx_cmd) = test_app();
        request_download(&mut app, ArtifactKind::Reconciliation)
            .await
            .unwrap();

        assert_eq!(
            app.ui.alert.as_deref(),
            Some("No results available. Please process a file first.")
        );
        assert_eq!(app.ui.screen, Screen::Submit);
        // Workerには何も送らない。
        assert!(rx_cmd.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_download_with_job_goes_to_worker() {
        let (mut app, mut rx_cmd) = test_app();
        app.ui.session = Some(Session::new(JobId::parse("job-42").unwrap()));
        request_download(&mut app, ArtifactKind::MasterMissing)
            .await
            .unwrap();

        assert!(app.ui.alert.is_none());
        match rx_cmd.try_recv().unwrap() {
            WorkerCmd::Download { target } => assert_eq!(
                target,
                crate::api::backend::DownloadTarget::Scoped {
                    job_id: JobId::parse("job-42").unwrap(),
                    kind: ArtifactKind::MasterMissing,
                }
            ),
            other => panic!("unexpected {other:?}"),
        }
    }
}
