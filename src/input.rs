//! 1行テキスト入力のポップアップ（InputBox）。

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

/// 入力値の反映先。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputTarget {
    /// アップロードするファイルのパス。
    UploadPath,
    /// 設定画面のバックエンドURL。
    SettingsBaseUrl,
    /// 設定画面のダウンロード先ディレクトリ。
    SettingsDownloadDir,
}

/// InputBoxの入力状態。
#[derive(Clone, Debug)]
pub struct InputBoxState {
    /// プロンプト。
    pub prompt: String,
    /// 現在の入力値。
    pub value: String,
    /// カーソル位置（文字単位）。
    pub cursor: usize,
    /// 確定時の反映先。
    pub target: InputTarget,
}

impl InputBoxState {
    /// 初期値の末尾にカーソルを置いて開く。
    pub fn new(prompt: impl Into<String>, value: impl Into<String>, target: InputTarget) -> Self {
        let value = value.into();
        Self {
            prompt: prompt.into(),
            cursor: value.chars().count(),
            value,
            target,
        }
    }

    /// 文字位置をバイト位置へ変換する。
    fn byte_at(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map_or(self.value.len(), |(i, _)| i)
    }

    /// カーソル位置に1文字挿入する。
    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_at(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// カーソル直前の1文字を消す。
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_at(self.cursor);
        self.value.remove(at);
    }

    /// カーソル位置の1文字を消す。
    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// 入力をすべて消す。
    pub fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// 表示幅に収まる部分とカーソル記号を含む文字列。
    fn visible_with_cursor(&self, width: usize) -> String {
        // カーソルが右端を越えたら横にスクロールする。
        let offset = self.cursor.saturating_sub(width.saturating_sub(2));
        let chars: Vec<char> = self.value.chars().skip(offset).take(width).collect();
        let at = (self.cursor - offset).min(chars.len());
        let before: String = chars[..at].iter().collect();
        let after: String = chars[at..].iter().collect();
        format!("{before}|{after}")
    }
}

/// InputBoxをポップアップとして描画する。
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    let area = centered_popup(f.area(), 70, 7);
    f.render_widget(Clear, area);
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title("Input")
            .style(Style::default().bg(Color::DarkGray)),
        area,
    );

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // プロンプト
            Constraint::Length(1), // 入力欄
            Constraint::Length(1),
            Constraint::Length(1), // ヘルプ
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(state.prompt.clone()).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        rows[0],
    );
    f.render_widget(
        Paragraph::new(state.visible_with_cursor(rows[1].width as usize))
            .style(Style::default().fg(Color::Green)),
        rows[1],
    );
    f.render_widget(
        Paragraph::new("Enter=確定 | ESC=キャンセル | Ctrl+U=クリア")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center),
        rows[3],
    );
}

/// 画面中央のポップアップ領域を求める。
pub fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_multibyte_path() {
        // 日本語を含むパスでもカーソル単位で編集できる。
        let mut s = InputBoxState::new("File:", "請求/q1.xlsx", InputTarget::UploadPath);
        assert_eq!(s.cursor, 10);
        s.move_home();
        s.move_right();
        s.move_right();
        s.backspace();
        assert_eq!(s.value, "請/q1.xlsx");
        s.insert_char('求');
        s.delete();
        assert_eq!(s.value, "請求q1.xlsx");
        s.move_end();
        s.insert_char('x');
        assert_eq!(s.value, "請求q1.xlsxx");
    }

    #[test]
    fn test_cursor_bounds() {
        let mut s = InputBoxState::new("URL:", "", InputTarget::SettingsBaseUrl);
        s.backspace();
        s.delete();
        s.move_left();
        s.move_right();
        assert_eq!(s.cursor, 0);
        assert!(s.value.is_empty());
    }

    #[test]
    fn test_visible_text_scrolls_with_cursor() {
        let s = InputBoxState::new("Dir:", "abcdefghij", InputTarget::SettingsDownloadDir);
        assert_eq!(s.visible_with_cursor(6), "ghij|");
        let mut s = s;
        s.move_home();
        assert_eq!(s.visible_with_cursor(6), "|abcdef");
    }
}
