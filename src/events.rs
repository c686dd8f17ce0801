//! 画面状態とワークフローの状態遷移。

use uuid::Uuid;

use crate::{
    error::WorkflowError,
    jobs::Session,
    view::{CatalogView, PreviewView, ResultsView},
};

/// TUIで現在表示中の画面。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// ファイル投入画面（アップロード・サンプル選択・プレビュー）。
    Submit,
    /// 処理結果画面。
    Results,
    /// 設定編集画面。
    Settings,
}

/// フォーカス中のペイン。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pane {
    Catalog,
    Preview,
    Results,
}

/// ステータスの種別。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Idle,
    Info,
    Success,
    Error,
}

/// 画面下部に出すステータス（常に1件だけ保持する）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiStatus {
    pub kind: StatusKind,
    pub message: String,
}

/// 投入を起動した操作。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Upload,
    Preset,
}

/// 投入ボタン相当の操作部品。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionControl {
    /// 押下可能かどうか。
    pub enabled: bool,
    /// 表示ラベル。
    pub label: String,
    idle_label: &'static str,
}

/// 処理中に表示するラベル。
pub const PROCESSING_LABEL: &str = "Processing...";

impl ActionControl {
    fn new(idle_label: &'static str) -> Self {
        Self {
            enabled: true,
            label: idle_label.into(),
            idle_label,
        }
    }

    /// 無効化して処理中ラベルにする。
    fn set_processing(&mut self) {
        self.enabled = false;
        self.label = PROCESSING_LABEL.into();
    }

    /// 元のラベルで再度有効化する。
    fn restore(&mut self) {
        self.enabled = true;
        self.label = self.idle_label.into();
    }
}

/// 実行中の操作を識別するチケット。古い操作の完了通知はこれで捨てる。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pending {
    pub catalog: Option<Uuid>,
    pub preview: Option<Uuid>,
    pub submission: Option<(Uuid, Trigger)>,
    pub results: Option<(Uuid, Trigger)>,
}

/// 描画側と共有するUI状態。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 現在の画面。
    pub screen: Screen,
    /// フォーカス中のペイン。
    pub focus: Pane,
    /// 現在のステータス。
    pub status: UiStatus,
    /// アップロード操作。
    pub upload_control: ActionControl,
    /// サンプル処理操作。
    pub preset_control: ActionControl,
    /// サンプル一覧。
    pub catalog: CatalogView,
    /// サンプル一覧の選択行。
    pub catalog_selected: usize,
    /// プレビュー（Someの間だけ表示）。
    pub preview: Option<PreviewView>,
    /// 結果（結果画面で表示）。
    pub results: Option<ResultsView>,
    /// 直近に受理された投入のセッション（有効なジョブ）。
    pub session: Option<Session>,
    /// 表のスクロール位置。
    pub scroll: usize,
    /// モーダル警告（表示中は他のキーを受け付けない）。
    pub alert: Option<String>,
    /// 実行中の操作。
    pub pending: Pending,
    /// 右側パネルに表示するログ。
    pub log: Vec<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::Submit,
            focus: Pane::Catalog,
            status: UiStatus {
                kind: StatusKind::Idle,
                message: "Ready".into(),
            },
            upload_control: ActionControl::new("Process File"),
            preset_control: ActionControl::new("Process Sample"),
            catalog: CatalogView::default(),
            catalog_selected: 0,
            preview: None,
            results: None,
            session: None,
            scroll: 0,
            alert: None,
            pending: Pending::default(),
            log: vec![],
        }
    }
}

impl UiState {
    /// ステータスを上書きする。
    pub fn set_status(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.status = UiStatus {
            kind,
            message: message.into(),
        };
    }

    /// 進捗表示の有無（投入中またはプレビュー取得中）。
    pub fn progress_visible(&self) -> bool {
        self.pending.preview.is_some() || self.pending.submission.is_some()
    }

    fn control_mut(&mut self, trigger: Trigger) -> &mut ActionControl {
        match trigger {
            Trigger::Upload => &mut self.upload_control,
            Trigger::Preset => &mut self.preset_control,
        }
    }

    /// 選択中のサンプル名（未選択なら空）。
    pub fn selected_sample(&self) -> &str {
        self.catalog.value_at(self.catalog_selected)
    }

    /// ログを追加する。
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    // ---- カタログ ----

    /// カタログを差し替え、選択を先頭へ戻す。
    pub fn catalog_loaded(&mut self, ticket: Uuid, catalog: CatalogView) -> bool {
        if self.pending.catalog != Some(ticket) {
            return false;
        }
        self.pending.catalog = None;
        self.catalog = catalog;
        self.catalog_selected = 0;
        // 選択が空に戻るのでプレビューも閉じる。
        self.hide_preview();
        true
    }

    // ---- 投入 ----

    /// クライアント側検証で弾いた（ネットワークには触れない）。
    pub fn reject(&mut self, err: &WorkflowError) {
        self.set_status(StatusKind::Error, err.to_string());
    }

    /// 投入を開始する。
    pub fn begin_submission(&mut self, ticket: Uuid, trigger: Trigger, message: impl Into<String>) {
        // 前の投入は取り消されるので、その操作部品を戻しておく。
        let superseded = [self.pending.submission.take(), self.pending.results.take()];
        for (_, prev) in superseded.into_iter().flatten() {
            self.control_mut(prev).restore();
        }
        self.control_mut(trigger).set_processing();
        self.set_status(StatusKind::Info, message);
        self.pending.submission = Some((ticket, trigger));
    }

    /// 投入が受理された。このジョブが有効なジョブになる。
    /// 結果取得へ進むので操作部品は処理中のまま。
    pub fn submission_accepted(
        &mut self,
        ticket: Uuid,
        session: Session,
        message: impl Into<String>,
    ) -> bool {
        let Some((t, trigger)) = self.pending.submission else {
            return false;
        };
        if t != ticket {
            return false;
        }
        self.pending.submission = None;
        self.pending.results = Some((ticket, trigger));
        self.session = Some(session);
        self.set_status(StatusKind::Success, message);
        true
    }

    /// 投入が失敗した。操作部品を元に戻して再試行できるようにする。
    pub fn submission_failed(&mut self, ticket: Uuid, err: &WorkflowError) -> bool {
        let Some((t, trigger)) = self.pending.submission else {
            return false;
        };
        if t != ticket {
            return false;
        }
        self.pending.submission = None;
        self.control_mut(trigger).restore();
        let message = match err {
            WorkflowError::Cancelled => err.to_string(),
            _ => format!("Error: {err}"),
        };
        self.set_status(StatusKind::Error, message);
        true
    }

    /// 結果画面へ切り替える。
    pub fn results_ready(&mut self, ticket: Uuid, view: ResultsView) -> bool {
        if !matches!(self.pending.results, Some((t, _)) if t == ticket) {
            return false;
        }
        self.pending.results = None;
        self.results = Some(view);
        self.screen = Screen::Results;
        self.focus = Pane::Results;
        self.scroll = 0;
        true
    }

    /// 結果の取得に失敗した。
    pub fn results_failed(&mut self, ticket: Uuid) -> bool {
        if !matches!(self.pending.results, Some((t, _)) if t == ticket) {
            return false;
        }
        self.pending.results = None;
        self.upload_control.restore();
        self.preset_control.restore();
        self.set_status(StatusKind::Error, "Error loading results");
        true
    }

    /// 結果画面から投入画面へ戻る（セッションは次の成功まで保持する）。
    pub fn back_to_submission(&mut self) {
        self.screen = Screen::Submit;
        self.focus = Pane::Catalog;
        self.scroll = 0;
        self.upload_control.restore();
        self.preset_control.restore();
    }

    // ---- プレビュー ----

    /// プレビュー取得を開始する。
    pub fn begin_preview(&mut self, ticket: Uuid) {
        self.pending.preview = Some(ticket);
        self.set_status(StatusKind::Info, "Loading file preview...");
    }

    /// 空選択になったのでプレビューを隠す（ステータスは変えない）。
    pub fn hide_preview(&mut self) {
        self.pending.preview = None;
        self.preview = None;
        if self.focus == Pane::Preview {
            self.focus = Pane::Catalog;
        }
    }

    /// プレビューを表示する。
    pub fn preview_ready(&mut self, ticket: Uuid, view: PreviewView) -> bool {
        if self.pending.preview != Some(ticket) {
            return false;
        }
        self.pending.preview = None;
        self.preview = Some(view);
        self.focus = Pane::Preview;
        self.scroll = 0;
        self.set_status(
            StatusKind::Success,
            "File loaded! Review data below, then click \"Process Sample\" to continue.",
        );
        true
    }

    /// プレビュー取得に失敗した。
    pub fn preview_failed(&mut self, ticket: Uuid, err: &WorkflowError) -> bool {
        if self.pending.preview != Some(ticket) {
            return false;
        }
        self.pending.preview = None;
        self.preview = None;
        if self.focus == Pane::Preview {
            self.focus = Pane::Catalog;
        }
        self.set_status(StatusKind::Error, format!("Error: {err}"));
        true
    }

    // ---- 警告 ----

    /// モーダル警告を出す。
    pub fn show_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::types::{JobResults, OutputFiles, ResultsSummary},
        jobs::JobId,
    };

    fn session(id: &str) -> Session {
        Session::new(JobId::parse(id).unwrap())
    }

    fn results_view() -> ResultsView {
        ResultsView::new(&JobResults {
            summary: ResultsSummary::default(),
            preview_data: vec![],
            output_files: OutputFiles::default(),
            showing_rows: None,
            timestamp: None,
        })
    }

    fn active_job(ui: &UiState) -> Option<&str> {
        ui.session.as_ref().map(|s| s.job_id.as_str())
    }

    #[test]
    fn test_rejected_upload_keeps_control_enabled() {
        // 拡張子違反はエラー表示のみで、ボタンは押せるまま。
        let mut ui = UiState::default();
        ui.reject(&WorkflowError::Validation(
            "Please select an Excel file (.xlsx)".into(),
        ));
        assert_eq!(ui.status.kind, StatusKind::Error);
        assert_eq!(ui.status.message, "Please select an Excel file (.xlsx)");
        assert!(ui.upload_control.enabled);
        assert_eq!(ui.upload_control.label, "Process File");
        assert!(!ui.progress_visible());
        assert_eq!(ui.pending, Pending::default());
    }

    #[test]
    fn test_submission_lifecycle_success() {
        // 投入→受理→結果表示の遷移を検証する。
        let mut ui = UiState::default();
        let t = Uuid::new_v4();
        ui.begin_submission(t, Trigger::Preset, "Processing sample file: sample_q1.xlsx...");
        assert!(!ui.preset_control.enabled);
        assert_eq!(ui.preset_control.label, PROCESSING_LABEL);
        assert!(ui.upload_control.enabled);
        assert_eq!(ui.status.kind, StatusKind::Info);
        assert!(ui.progress_visible());

        assert!(ui.submission_accepted(t, session("job-42"), "Sample file processed successfully!"));
        assert_eq!(ui.status.kind, StatusKind::Success);
        assert!(!ui.progress_visible());
        assert!(!ui.preset_control.enabled);
        assert_eq!(active_job(&ui), Some("job-42"));

        assert!(ui.results_ready(t, results_view()));
        assert_eq!(ui.screen, Screen::Results);
        assert_eq!(ui.focus, Pane::Results);
        assert_eq!(ui.scroll, 0);
    }

    #[test]
    fn test_submission_failure_restores_control() {
        let mut ui = UiState::default();
        let t = Uuid::new_v4();
        ui.begin_submission(t, Trigger::Upload, "Uploading and processing file...");
        assert!(ui.submission_failed(t, &WorkflowError::Backend("Processing failed".into())));
        assert!(ui.upload_control.enabled);
        assert_eq!(ui.upload_control.label, "Process File");
        assert_eq!(ui.status.message, "Error: Processing failed");
        assert!(!ui.progress_visible());
        assert_eq!(ui.screen, Screen::Submit);
        assert_eq!(active_job(&ui), None);
    }

    #[test]
    fn test_cancelled_submission() {
        let mut ui = UiState::default();
        let t = Uuid::new_v4();
        ui.begin_submission(t, Trigger::Preset, "preset");
        assert!(ui.submission_failed(t, &WorkflowError::Cancelled));
        assert_eq!(ui.status.message, "Cancelled");
        assert_eq!(ui.preset_control.label, "Process Sample");
    }

    #[test]
    fn test_active_session_is_latest_success() {
        // 投入種別に関係なく、最後に受理された投入のジョブが有効になる。
        let mut ui = UiState::default();
        let first = Uuid::new_v4();
        ui.begin_submission(first, Trigger::Upload, "upload");
        ui.submission_accepted(first, session("job-1"), "ok");
        ui.results_ready(first, results_view());
        ui.back_to_submission();
        assert_eq!(active_job(&ui), Some("job-1"));
        assert!(ui.upload_control.enabled);

        // 失敗した投入は有効なジョブを変えない。
        let failed = Uuid::new_v4();
        ui.begin_submission(failed, Trigger::Upload, "upload");
        ui.submission_failed(failed, &WorkflowError::Backend("bad".into()));
        assert_eq!(active_job(&ui), Some("job-1"));

        let second = Uuid::new_v4();
        ui.begin_submission(second, Trigger::Preset, "preset");
        ui.submission_accepted(second, session("job-2"), "ok");
        ui.results_ready(second, results_view());
        assert_eq!(active_job(&ui), Some("job-2"));
    }

    #[test]
    fn test_new_submission_supersedes_previous() {
        let mut ui = UiState::default();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        ui.begin_submission(first, Trigger::Preset, "preset");
        ui.begin_submission(second, Trigger::Upload, "upload");
        assert!(ui.preset_control.enabled);
        assert!(!ui.upload_control.enabled);
        assert!(!ui.submission_accepted(first, session("job-old"), "ok"));
        assert_eq!(active_job(&ui), None);
    }

    #[test]
    fn test_stale_completions_are_ignored() {
        // 取り消された操作の完了通知は状態を変えない。
        let mut ui = UiState::default();
        let stale = Uuid::new_v4();
        let current = Uuid::new_v4();
        ui.begin_submission(current, Trigger::Preset, "preset");
        assert!(!ui.submission_accepted(stale, session("job-old"), "ok"));
        assert!(!ui.results_ready(stale, results_view()));
        assert!(ui.session.is_none());
        assert_eq!(ui.pending.submission, Some((current, Trigger::Preset)));

        ui.begin_preview(current);
        ui.hide_preview();
        assert!(!ui.preview_ready(current, PreviewView {
            sample_name: "x".into(),
            total_rows: 0,
            showing_rows: 0,
            rows: vec![],
        }));
        assert!(ui.preview.is_none());
    }

    #[test]
    fn test_results_failure() {
        let mut ui = UiState::default();
        let t = Uuid::new_v4();
        ui.begin_submission(t, Trigger::Preset, "preset");
        ui.submission_accepted(t, session("job-9"), "ok");
        assert!(ui.results_failed(t));
        assert_eq!(ui.status.kind, StatusKind::Error);
        assert_eq!(ui.status.message, "Error loading results");
        assert_eq!(ui.screen, Screen::Submit);
        assert!(ui.results.is_none());
        // 受理済みのジョブは有効なまま。
        assert_eq!(active_job(&ui), Some("job-9"));
        assert!(ui.preset_control.enabled);
    }

    #[test]
    fn test_catalog_reload_closes_preview() {
        let mut ui = UiState::default();
        let t = Uuid::new_v4();
        ui.begin_preview(t);
        ui.preview_ready(t, PreviewView {
            sample_name: "sample_q1.xlsx".into(),
            total_rows: 1,
            showing_rows: 1,
            rows: vec![],
        });
        ui.catalog_selected = 2;
        let in_flight = Uuid::new_v4();
        ui.begin_preview(in_flight);

        let c = Uuid::new_v4();
        ui.pending.catalog = Some(c);
        assert!(ui.catalog_loaded(c, CatalogView::failed()));
        assert_eq!(ui.catalog_selected, 0);
        assert!(ui.preview.is_none());
        assert_eq!(ui.focus, Pane::Catalog);
        // 再読み込み前のプレビュー結果は捨てる。
        assert!(!ui.preview_ready(in_flight, PreviewView {
            sample_name: "sample_q1.xlsx".into(),
            total_rows: 1,
            showing_rows: 1,
            rows: vec![],
        }));
        assert!(ui.preview.is_none());
    }

    #[test]
    fn test_hide_preview_does_not_touch_status() {
        let mut ui = UiState::default();
        ui.set_status(StatusKind::Success, "previous");
        ui.hide_preview();
        assert_eq!(ui.status.message, "previous");
        assert!(ui.preview.is_none());
    }

    #[test]
    fn test_preview_ready_focuses_pane() {
        let mut ui = UiState::default();
        let t = Uuid::new_v4();
        ui.begin_preview(t);
        ui.scroll = 4;
        assert!(ui.preview_ready(t, PreviewView {
            sample_name: "sample_q1.xlsx".into(),
            total_rows: 3,
            showing_rows: 3,
            rows: vec![],
        }));
        assert_eq!(ui.focus, Pane::Preview);
        assert_eq!(ui.scroll, 0);
        assert_eq!(ui.status.kind, StatusKind::Success);
        assert!(!ui.progress_visible());
    }

    #[test]
    fn test_preview_failure_hides_pane() {
        let mut ui = UiState::default();
        let t = Uuid::new_v4();
        ui.begin_preview(t);
        assert!(ui.progress_visible());
        assert!(ui.preview_failed(t, &WorkflowError::Backend("Sample file not found".into())));
        assert!(ui.preview.is_none());
        assert!(!ui.progress_visible());
        assert_eq!(ui.status.message, "Error: Sample file not found");
    }
}
