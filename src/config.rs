//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Where the reconciliation service lives.
    pub backend: BackendCfg,
    /// Per-call time budgets.
    pub timeouts: TimeoutsCfg,
    /// How artifacts are fetched.
    pub downloads: DownloadsCfg,
}

/// Reconciliation service location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendCfg {
    /// Base URL the `/api/...` paths are appended to.
    pub base_url: String,
}

/// Time budget of each network call, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsCfg {
    pub catalog_secs: u64,
    /// Covers server-side processing, so it is the longest.
    pub submit_secs: u64,
    pub preview_secs: u64,
    pub results_secs: u64,
    pub download_secs: u64,
}

/// What a download action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Fetch the stream and write it under `dir`.
    Save,
    /// Open the download URL in the system browser.
    Browser,
}

/// Artifact download settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadsCfg {
    /// Directory downloaded artifacts are written to.
    pub dir: String,
    pub mode: DownloadMode,
    /// Permit the job-agnostic download path when no job is active.
    pub allow_legacy: bool,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }
}

impl Default for BackendCfg {
    /// The service listens on port 5001 when started locally.
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".into(),
        }
    }
}

impl Default for TimeoutsCfg {
    fn default() -> Self {
        Self {
            catalog_secs: 15,
            submit_secs: 300,
            preview_secs: 30,
            results_secs: 30,
            download_secs: 120,
        }
    }
}

impl Default for DownloadsCfg {
    fn default() -> Self {
        Self {
            dir: "downloads".into(),
            mode: DownloadMode::Save,
            allow_legacy: false,
        }
    }
}

/// Timeouts resolved into durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub catalog: Duration,
    pub submit: Duration,
    pub preview: Duration,
    pub results: Duration,
    pub download: Duration,
}

impl From<&TimeoutsCfg> for Timeouts {
    fn from(c: &TimeoutsCfg) -> Self {
        // Zero would fail every call immediately; treat it as one second.
        let secs = |s: u64| Duration::from_secs(s.max(1));
        Self {
            catalog: secs(c.catalog_secs),
            submit: secs(c.submit_secs),
            preview: secs(c.preview_secs),
            results: secs(c.results_secs),
            download: secs(c.download_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_or_default(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.backend.base_url, "http://localhost:5001");
        assert!(!cfg.downloads.allow_legacy);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[backend]\nbase_url = \"https://recon.example.test\"\n\n[downloads]\nmode = \"browser\"\n",
        )
        .unwrap();
        let cfg = Config::load_or_default(&path).unwrap();
        assert_eq!(cfg.backend.base_url, "https://recon.example.test");
        assert_eq!(cfg.downloads.mode, DownloadMode::Browser);
        assert_eq!(cfg.downloads.dir, "downloads");
        assert_eq!(cfg.timeouts, TimeoutsCfg::default());
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let t = Timeouts::from(&TimeoutsCfg {
            catalog_secs: 0,
            ..TimeoutsCfg::default()
        });
        assert_eq!(t.catalog, Duration::from_secs(1));
        assert_eq!(t.submit, Duration::from_secs(300));
    }
}
