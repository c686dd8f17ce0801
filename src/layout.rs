//! レイアウト計算のヘルパー関数

use ratatui::prelude::*;

/// 全画面共通の3領域
pub struct MainLayout {
    /// 画面ごとの本体
    pub body: Rect,
    /// HELPバー
    pub help_bar: Rect,
    /// STATUSバー（ステータス + 進捗表示）
    pub status_bar: Rect,
}

/// 投入画面の本体
pub struct SubmitLayout {
    /// サンプル一覧
    pub catalog: Rect,
    /// アップロード欄
    pub upload: Rect,
    /// プレビュー（非表示時はINFO/ログ）
    pub preview: Rect,
}

/// 結果画面の本体
pub struct ResultsLayout {
    /// 集計カード4枚
    pub cards: [Rect; 4],
    /// マスター未登録リストの増減
    pub master_missing: Rect,
    /// 出力ファイル
    pub outputs: Rect,
    /// 明細テーブル
    pub table: Rect,
}

/// 画面を本体 + HELP + STATUS に分割
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3), // HELPバー
            Constraint::Length(3), // STATUSバー
        ])
        .split(area);

    MainLayout {
        body: chunks[0],
        help_bar: chunks[1],
        status_bar: chunks[2],
    }
}

/// 左にサンプル一覧とアップロード欄（35%）、右にプレビュー（65%）
pub fn create_submit_layout(area: Rect) -> SubmitLayout {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(6)])
        .split(cols[0]);

    SubmitLayout {
        catalog: left[0],
        upload: left[1],
        preview: cols[1],
    }
}

/// 上からカード行、増減と出力ファイルの行、明細テーブル
pub fn create_results_layout(area: Rect) -> ResultsLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // カード
            Constraint::Length(6), // 増減 + 出力ファイル
            Constraint::Min(3),    // 明細
        ])
        .split(area);
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[0]);
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    ResultsLayout {
        cards: [cards[0], cards[1], cards[2], cards[3]],
        master_missing: middle[0],
        outputs: middle[1],
        table: rows[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_layout_fills_body() {
        let area = Rect::new(0, 0, 120, 40);
        let l = create_results_layout(area);
        assert_eq!(l.cards.iter().map(|r| r.width).sum::<u16>(), 120);
        assert_eq!(l.table.y, 10);
        assert_eq!(l.table.height, 30);
    }

    #[test]
    fn test_submit_layout_keeps_upload_height() {
        let l = create_submit_layout(Rect::new(0, 0, 100, 30));
        assert_eq!(l.upload.height, 6);
        assert_eq!(l.catalog.height, 24);
        assert_eq!(l.preview.x, 35);
    }
}
