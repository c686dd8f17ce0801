//! キー入力ハンドラー関数。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

use crate::{
    config::DownloadMode,
    events::{Pane, Screen, StatusKind},
    input::{InputBoxState, InputTarget},
    jobs::ArtifactKind,
    shortcuts,
    worker::WorkerCmd,
};

use super::{App, request_catalog, request_download, request_preview, start_preset, start_upload};

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 警告ポップアップは閉じるまで他の操作を受け付けない。
    if app.ui.alert.is_some() {
        if shortcuts::matches_shortcut(&k, &app.shortcuts.alert.dismiss) {
            app.ui.alert = None;
        }
        return Ok(false);
    }

    // 入力ボックスが開いていれば次に優先する。
    if app.input_box.is_some() {
        return handle_input_box_key(app, k).await;
    }

    match app.ui.screen {
        Screen::Submit => handle_submit_key(app, k).await,
        Screen::Results => handle_results_key(app, k).await,
        Screen::Settings => handle_settings_key(app, k).await,
    }
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// 投入画面のキー処理。
async fn handle_submit_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.submit;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.settings) {
        reload_settings_buffers(app);
        app.ui.screen = Screen::Settings;
    } else if shortcuts::matches_shortcut(&k, &sc.focus) {
        // プレビュー表示中のみペインを切り替えられる。
        app.ui.focus = match app.ui.focus {
            Pane::Catalog if app.ui.preview.is_some() => Pane::Preview,
            _ => Pane::Catalog,
        };
    } else if shortcuts::matches_shortcut(&k, &sc.down) {
        if app.ui.focus == Pane::Preview {
            scroll_down(app);
        } else if app.ui.catalog_selected + 1 < app.ui.catalog.options.len() {
            // 選択が変わったらプレビューを取り直す。
            app.ui.catalog_selected += 1;
            request_preview(app).await?;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.up) {
        if app.ui.focus == Pane::Preview {
            app.ui.scroll = app.ui.scroll.saturating_sub(1);
        } else if app.ui.catalog_selected > 0 {
            app.ui.catalog_selected -= 1;
            request_preview(app).await?;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.choose_file) {
        let current = app
            .upload_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        app.input_box = Some(InputBoxState::new(
            "Excel file to upload (.xlsx):",
            current,
            InputTarget::UploadPath,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.process_file) {
        start_upload(app).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.process_sample) {
        start_preset(app).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        if app.ui.pending.submission.is_some() || app.ui.pending.results.is_some() {
            app.worker_tx.send(WorkerCmd::Cancel).await?;
        }
    } else {
        handle_download_key(app, &k).await?;
    }

    Ok(false)
}

/// 結果画面のキー処理。
async fn handle_results_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.results;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.back) {
        // セッションは次の投入が成功するまで残す。
        app.ui.back_to_submission();
    } else if shortcuts::matches_shortcut(&k, &sc.down) {
        scroll_down(app);
    } else if shortcuts::matches_shortcut(&k, &sc.up) {
        app.ui.scroll = app.ui.scroll.saturating_sub(1);
    } else {
        handle_download_key(app, &k).await?;
    }

    Ok(false)
}

/// 成果物ダウンロードのキー（投入画面と結果画面で共通）。
async fn handle_download_key(app: &mut App, k: &KeyEvent) -> Result<()> {
    let sc = &app.shortcuts.results;
    if shortcuts::matches_shortcut(k, &sc.download_reconciliation) {
        request_download(app, ArtifactKind::Reconciliation).await?;
    } else if shortcuts::matches_shortcut(k, &sc.download_master_missing) {
        request_download(app, ArtifactKind::MasterMissing).await?;
    }
    Ok(())
}

/// 表示中の表の行数を超えないようにスクロールする。
fn scroll_down(app: &mut App) {
    let rows = match app.ui.screen {
        Screen::Results => app.ui.results.as_ref().map_or(0, |r| r.rows.len()),
        _ => app.ui.preview.as_ref().map_or(0, |p| p.rows.len()),
    };
    if app.ui.scroll + 1 < rows {
        app.ui.scroll += 1;
    }
}

/// 設定画面のキー処理。
async fn handle_settings_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.settings;

    if shortcuts::matches_shortcut(&k, &sc.cancel) {
        // 変更を破棄して投入画面へ戻る。
        reload_settings_buffers(app);
        app.ui.screen = Screen::Submit;
    } else if shortcuts::matches_shortcut(&k, &sc.save) {
        let base_url = app.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            app.ui.set_status(
                StatusKind::Error,
                "Backend URL must start with http:// or https://",
            );
            return Ok(false);
        }
        app.cfg.backend.base_url = base_url.to_string();
        app.cfg.downloads.dir = app.download_dir.trim().to_string();
        app.cfg.downloads.mode = app.download_mode;
        app.cfg.save(&app.cfg_path)?;
        tracing::info!("settings saved to {}", app.cfg_path.display());

        // Workerはバックエンドを作り直すので、一覧も読み直す。
        app.worker_tx
            .send(WorkerCmd::SaveSettings(app.cfg.clone()))
            .await?;
        app.ui.screen = Screen::Submit;
        app.ui.set_status(StatusKind::Success, "Saved settings");
        request_catalog(app).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.base_url) {
        app.input_box = Some(InputBoxState::new(
            "Backend URL:",
            app.base_url.clone(),
            InputTarget::SettingsBaseUrl,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.download_dir) {
        app.input_box = Some(InputBoxState::new(
            "Download directory:",
            app.download_dir.clone(),
            InputTarget::SettingsDownloadDir,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.download_mode) {
        app.download_mode = match app.download_mode {
            DownloadMode::Save => DownloadMode::Browser,
            DownloadMode::Browser => DownloadMode::Save,
        };
    }

    Ok(false)
}

/// 入力ボックスのキー処理。
async fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };
    let sc = &app.shortcuts.input_box;

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        let value = input_state.value.clone();
        let target = input_state.target;
        app.input_box = None;
        apply_input(app, target, value);
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        app.input_box = None;
    } else if shortcuts::matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if shortcuts::matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if shortcuts::matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if shortcuts::matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if shortcuts::matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if shortcuts::matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        input_state.insert_char(c);
    }

    Ok(false)
}

/// 確定した入力を反映先へ書き込む。
fn apply_input(app: &mut App, target: InputTarget, value: String) {
    match target {
        InputTarget::UploadPath => {
            // 空入力は選択解除として扱う。
            let value = value.trim();
            app.upload_path = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        InputTarget::SettingsBaseUrl => app.base_url = value,
        InputTarget::SettingsDownloadDir => app.download_dir = value,
    }
}

/// 設定画面用の編集バッファを設定値から再読み込みする。
fn reload_settings_buffers(app: &mut App) {
    app.base_url = app.cfg.backend.base_url.clone();
    app.download_dir = app.cfg.downloads.dir.clone();
    app.download_mode = app.cfg.downloads.mode;
}
