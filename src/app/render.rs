//! TUI描画関連の関数。

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

use crate::{
    config::DownloadMode,
    events::{ActionControl, Pane, Screen, StatusKind},
    input, layout,
    shortcuts::Shortcuts,
    view::{PREVIEW_HEADER, RESULTS_HEADER, TableRow, Tone},
};

use super::App;

/// 進捗表示のスピナー。
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// 画面全体を描画する。
pub fn draw(f: &mut Frame, app: &App) {
    let main_layout = layout::create_main_layout(f.area());

    match app.ui.screen {
        Screen::Submit => draw_submit(f, app, main_layout.body),
        Screen::Results => draw_results(f, app, main_layout.body),
        Screen::Settings => draw_settings(f, app, main_layout.body),
    }

    let help_bar = Paragraph::new(get_help_text(app.ui.screen, &app.shortcuts))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);
    f.render_widget(build_status_bar(app), main_layout.status_bar);

    // ポップアップは最後に重ねる。
    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
    if let Some(message) = &app.ui.alert {
        draw_alert(f, message, &app.shortcuts);
    }
}

/// 投入画面：サンプル一覧、アップロード欄、プレビュー。
fn draw_submit(f: &mut Frame, app: &App, area: Rect) {
    let l = layout::create_submit_layout(area);

    // サンプル一覧（無効な項目は灰色）。
    let items: Vec<ListItem> = app
        .ui
        .catalog
        .options
        .iter()
        .map(|o| {
            let style = if o.enabled {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(o.label.clone()).style(style)
        })
        .collect();
    let list = List::new(items)
        .block(focused_block("SAMPLES", app.ui.focus == Pane::Catalog))
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(255, 140, 0))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
    let mut list_state = ListState::default();
    list_state.select(Some(app.ui.catalog_selected));
    f.render_stateful_widget(list, l.catalog, &mut list_state);

    // アップロード欄と2つの操作部品。
    let file = app
        .upload_path
        .as_ref()
        .map_or_else(
            || "Choose Excel file (.xlsx)".to_string(),
            |p| p.display().to_string(),
        );
    let upload = Paragraph::new(vec![
        Line::from(format!("File: {file}")),
        control_line(&app.ui.upload_control, &app.shortcuts.submit.process_file),
        control_line(&app.ui.preset_control, &app.shortcuts.submit.process_sample),
    ])
    .block(Block::default().borders(Borders::ALL).title("UPLOAD"))
    .wrap(Wrap { trim: true });
    f.render_widget(upload, l.upload);

    match &app.ui.preview {
        Some(preview) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1)])
                .split(l.preview);
            f.render_widget(
                Paragraph::new(preview.summary_line()).style(Style::default().fg(Color::Cyan)),
                rows[0],
            );
            let title = format!("PREVIEW: {}", preview.sample_name);
            f.render_widget(
                build_table(
                    &PREVIEW_HEADER,
                    &preview.rows,
                    app.ui.scroll,
                    focused_block(&title, app.ui.focus == Pane::Preview),
                ),
                rows[1],
            );
        }
        None => {
            let info = Paragraph::new(build_info_text(app))
                .block(Block::default().borders(Borders::ALL).title("INFO"))
                .wrap(Wrap { trim: true });
            f.render_widget(info, l.preview);
        }
    }
}

/// 結果画面：集計カード、マスター未登録の増減、出力ファイル、明細。
fn draw_results(f: &mut Frame, app: &App, area: Rect) {
    let Some(results) = &app.ui.results else {
        f.render_widget(
            Paragraph::new("No results available. Please process a file first.")
                .block(Block::default().borders(Borders::ALL).title("RESULTS")),
            area,
        );
        return;
    };
    let l = layout::create_results_layout(area);

    for (card, rect) in results.cards.iter().zip(l.cards) {
        let p = Paragraph::new(card.value.clone())
            .style(tone_style(card.tone).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(card.label));
        f.render_widget(p, rect);
    }

    let mm: Vec<Line> = results
        .master_missing
        .iter()
        .map(|(label, n)| Line::from(format!("{label}: {n}")))
        .collect();
    f.render_widget(
        Paragraph::new(mm).block(
            Block::default()
                .borders(Borders::ALL)
                .title("MASTER MISSING"),
        ),
        l.master_missing,
    );

    let job = app.ui.session.as_ref().map_or_else(
        || "-".to_string(),
        |s| format!("{} (submitted {})", s.job_id, s.submitted_at.format("%H:%M:%S")),
    );
    let run = results
        .timestamp
        .as_deref()
        .unwrap_or(results.execution_date.as_str());
    let outputs = vec![
        Line::from(format!("Job: {job}")),
        Line::from(format!("Input: {}  {run}", or_dash(&results.input_file))),
        Line::from(format!(
            "Reconciliation: {}",
            or_dash(&results.output_files.general_reconciliation)
        )),
        Line::from(format!(
            "Master Missing: {}",
            or_dash(&results.output_files.master_missing)
        )),
    ];
    f.render_widget(
        Paragraph::new(outputs)
            .block(Block::default().borders(Borders::ALL).title("OUTPUT FILES"))
            .wrap(Wrap { trim: true }),
        l.outputs,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title("ENCOUNTERS")
        .title_bottom(Line::from(results.footer.clone()).right_aligned());
    f.render_widget(
        build_table(&RESULTS_HEADER, &results.rows, app.ui.scroll, block),
        l.table,
    );
}

/// 設定画面。
fn draw_settings(f: &mut Frame, app: &App, area: Rect) {
    let mode = match app.download_mode {
        DownloadMode::Save => "save",
        DownloadMode::Browser => "browser",
    };
    let text = format!(
        "Backend URL:        {}\nDownload directory: {}\nDownload mode:      {}\n\nLegacy downloads:   {}\nConfig file:        {}",
        app.base_url,
        app.download_dir,
        mode,
        if app.cfg.downloads.allow_legacy {
            "allowed"
        } else {
            "disabled"
        },
        app.cfg_path.display(),
    );
    f.render_widget(
        Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("SETTINGS"))
            .wrap(Wrap { trim: false }),
        area,
    );
}

/// プレビュー非表示時の右パネル：接続先とログ。
fn build_info_text(app: &App) -> String {
    let job = app
        .ui
        .session
        .as_ref()
        .map_or_else(|| "-".to_string(), |s| s.job_id.to_string());
    format!(
        "Backend: {}\nActive job: {}\nDownloads: {}\n\nLog:\n{}",
        app.cfg.backend.base_url,
        job,
        app.cfg.downloads.dir,
        app.ui
            .log
            .iter()
            .rev()
            .take(8)
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// 表を組み立てる（`scroll` 行目から表示）。
fn build_table<'a>(
    header: &'a [&'a str],
    rows: &'a [TableRow],
    scroll: usize,
    block: Block<'a>,
) -> Table<'a> {
    let body = rows.iter().skip(scroll).map(|r| {
        Row::new(r.cells.iter().map(String::as_str)).style(tone_style(r.tone))
    });
    let widths = vec![Constraint::Ratio(1, header.len() as u32); header.len()];
    Table::new(body, widths)
        .header(Row::new(header.iter().copied()).bold())
        .block(block)
}

/// 操作部品の1行表示（無効時は灰色）。
fn control_line(control: &ActionControl, keys: &[String]) -> Line<'static> {
    let style = if control.enabled {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Line::styled(format!("[{}] {}", format_keys(keys), control.label), style)
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn focused_block(title: &str, focused: bool) -> Block<'static> {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string());
    if focused {
        block.border_style(Style::default().fg(Color::Yellow))
    } else {
        block
    }
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Neutral => Style::default(),
        Tone::Success => Style::default().fg(Color::Green),
        Tone::Error => Style::default().fg(Color::Red),
    }
}

/// ステータスバー：画面名、有効なジョブ、ステータス、進捗表示。
fn build_status_bar(app: &App) -> Paragraph<'static> {
    let screen_name = match app.ui.screen {
        Screen::Submit => "Submit",
        Screen::Results => "Results",
        Screen::Settings => "Settings",
    };
    let job = app
        .ui
        .session
        .as_ref()
        .map_or_else(|| "none".to_string(), |s| s.job_id.to_string());
    let spinner = if app.ui.progress_visible() {
        format!("{} ", SPINNER[(app.tick / 2) % SPINNER.len()])
    } else {
        String::new()
    };
    let text = format!(
        "[{screen_name}] job: {job} | {spinner}{}",
        app.ui.status.message
    );
    let style = match app.ui.status.kind {
        StatusKind::Idle => Style::default(),
        StatusKind::Info => Style::default().fg(Color::Cyan),
        StatusKind::Success => Style::default().fg(Color::Green),
        StatusKind::Error => Style::default().fg(Color::Red),
    };
    Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .style(style)
        .wrap(Wrap { trim: true })
}

/// 閉じるまで他の操作を止める警告ポップアップ。
fn draw_alert(f: &mut Frame, message: &str, shortcuts: &Shortcuts) {
    let area = input::centered_popup(f.area(), 60, 6);
    f.render_widget(Clear, area);
    let text = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(format!("{}: close", format_keys(&shortcuts.alert.dismiss)))
            .style(Style::default().fg(Color::Gray)),
    ];
    let popup = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("ALERT")
                .border_style(Style::default().fg(Color::Red)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(popup, area);
}

/// 現在画面に応じたヘルプ文字列を返す。
fn get_help_text(screen: Screen, shortcuts: &Shortcuts) -> String {
    let s = &shortcuts.submit;
    let r = &shortcuts.results;
    match screen {
        Screen::Submit => format!(
            "{}: quit | {}/{}: select | {}: focus | {}: choose file | {}: process file | {}: process sample | {}: cancel | {}/{}: download | {}: settings",
            format_keys(&s.quit),
            format_keys(&s.up),
            format_keys(&s.down),
            format_keys(&s.focus),
            format_keys(&s.choose_file),
            format_keys(&s.process_file),
            format_keys(&s.process_sample),
            format_keys(&s.cancel),
            format_keys(&r.download_reconciliation),
            format_keys(&r.download_master_missing),
            format_keys(&s.settings),
        ),
        Screen::Results => format!(
            "{}: quit | {}: new file | {}: reconciliation | {}: master missing | {}/{}: scroll",
            format_keys(&r.quit),
            format_keys(&r.back),
            format_keys(&r.download_reconciliation),
            format_keys(&r.download_master_missing),
            format_keys(&r.up),
            format_keys(&r.down),
        ),
        Screen::Settings => {
            let st = &shortcuts.settings;
            format!(
                "{}: backend URL | {}: download dir | {}: toggle mode | {}: save | {}: cancel",
                format_keys(&st.base_url),
                format_keys(&st.download_dir),
                format_keys(&st.download_mode),
                format_keys(&st.save),
                format_keys(&st.cancel),
            )
        }
    }
}

/// ショートカットキーの配列を表示用文字列に変換する。
fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}
