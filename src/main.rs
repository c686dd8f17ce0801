//! アプリケーションのエントリポイントとランタイム初期化。

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;

mod api;
mod app;
mod config;
mod error;
mod events;
mod input;
mod jobs;
mod layout;
mod rows;
mod shortcuts;
mod ui;
mod view;
mod worker;
mod workflow;

/// ログファイル名。
const LOG_FILE: &str = "recon_tui.log";

/// ファイルロギングを初期化し、非同期ガードを返す。
fn init_logging() -> Result<WorkerGuard> {
    // 標準出力はTUIが使うので、ファイルへ直接書き込む。
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    tracing::info!("logging to {LOG_FILE}");
    Ok(guard)
}

#[tokio::main]
/// エントリポイント：ログ初期化→UI開始→端末復元。
async fn main() -> Result<()> {
    // ガードは実行中ずっと保持する。
    let _log_guard = init_logging()?;
    tracing::info!("app starting");

    let res = {
        // ブロックを抜けると端末が元に戻る。
        let mut guard = ui::TerminalGuard::enter()?;
        app::run_app(&mut guard.terminal).await
    };
    if let Err(ref e) = res {
        tracing::error!("app error: {e:#}");
    }
    tracing::info!("app exiting");
    res
}
