//! ショートカット設定の管理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// ショートカット設定の全体（`shortcut.toml`）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Shortcuts {
    pub submit: SubmitShortcuts,
    pub results: ResultsShortcuts,
    pub settings: SettingsShortcuts,
    pub input_box: InputBoxShortcuts,
    pub alert: AlertShortcuts,
}

/// 投入画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitShortcuts {
    pub quit: Vec<String>,
    pub settings: Vec<String>,
    pub down: Vec<String>,
    pub up: Vec<String>,
    /// カタログとプレビューのフォーカス切り替え。
    pub focus: Vec<String>,
    pub choose_file: Vec<String>,
    pub process_file: Vec<String>,
    pub process_sample: Vec<String>,
    /// 実行中の投入を中止する。
    pub cancel: Vec<String>,
}

/// 結果画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsShortcuts {
    pub quit: Vec<String>,
    /// 投入画面へ戻る。
    pub back: Vec<String>,
    pub download_reconciliation: Vec<String>,
    pub download_master_missing: Vec<String>,
    pub down: Vec<String>,
    pub up: Vec<String>,
}

/// 設定画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsShortcuts {
    pub cancel: Vec<String>,
    pub save: Vec<String>,
    pub base_url: Vec<String>,
    pub download_dir: Vec<String>,
    /// 保存/ブラウザの切り替え。
    pub download_mode: Vec<String>,
}

/// InputBoxのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

/// 警告ポップアップのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertShortcuts {
    pub dismiss: Vec<String>,
}

impl Shortcuts {
    /// TOMLから読み込み、無ければデフォルトを返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SubmitShortcuts {
    fn default() -> Self {
        Self {
            quit: keys(&["q"]),
            settings: keys(&["t"]),
            down: keys(&["Down", "j"]),
            up: keys(&["Up", "k"]),
            focus: keys(&["Tab"]),
            choose_file: keys(&["f"]),
            process_file: keys(&["u"]),
            process_sample: keys(&["p", "Enter"]),
            cancel: keys(&["c"]),
        }
    }
}

impl Default for ResultsShortcuts {
    fn default() -> Self {
        Self {
            quit: keys(&["q"]),
            back: keys(&["n", "Esc"]),
            download_reconciliation: keys(&["r"]),
            download_master_missing: keys(&["m"]),
            down: keys(&["Down", "j"]),
            up: keys(&["Up", "k"]),
        }
    }
}

impl Default for SettingsShortcuts {
    fn default() -> Self {
        Self {
            cancel: keys(&["Esc"]),
            save: keys(&["Enter"]),
            base_url: keys(&["b"]),
            download_dir: keys(&["d"]),
            download_mode: keys(&["m"]),
        }
    }
}

impl Default for InputBoxShortcuts {
    fn default() -> Self {
        Self {
            confirm: keys(&["Enter"]),
            cancel: keys(&["Esc"]),
            backspace: keys(&["Backspace"]),
            delete: keys(&["Delete"]),
            left: keys(&["Left"]),
            right: keys(&["Right"]),
            home: keys(&["Home"]),
            end: keys(&["End"]),
            clear_line: keys(&["Ctrl+u"]),
        }
    }
}

impl Default for AlertShortcuts {
    fn default() -> Self {
        Self {
            dismiss: keys(&["Enter", "Esc"]),
        }
    }
}

/// KeyEventがいずれかのショートカット文字列と一致するか判定する。
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts
        .iter()
        .filter_map(|s| parse_binding(s))
        .any(|(mods, code)| key.modifiers == mods && key.code == code)
}

/// "Ctrl+u" や "Enter" を修飾キーとキーコードに分解する。解釈できなければNone。
pub fn parse_binding(binding: &str) -> Option<(KeyModifiers, KeyCode)> {
    let (mods_part, key_part) = match binding.rsplit_once('+') {
        // "+" 単体や "Ctrl++" は末尾の "+" をキーとして扱う。
        Some((m, "")) => (m.strip_suffix('+').unwrap_or(m), "+"),
        Some((m, k)) => (m, k),
        None => ("", binding),
    };

    let mut mods = KeyModifiers::empty();
    for m in mods_part.split('+').filter(|m| !m.is_empty()) {
        mods |= match m.to_ascii_lowercase().as_str() {
            "ctrl" => KeyModifiers::CONTROL,
            "alt" => KeyModifiers::ALT,
            "shift" => KeyModifiers::SHIFT,
            _ => return None,
        };
    }

    let code = match key_part.to_ascii_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" => KeyCode::Delete,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        _ => {
            // 単一文字は大文字小文字を区別してCharとして扱う。
            let mut chars = key_part.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}
