use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "race_results";
const ENV_PREFIX: &str = "RACE";

/// Where fields sit in the results viewer's markup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub row: String,
    pub name: String,
    pub info: String,
    pub next_link_text: String,
    pub overall_place_column: usize,
    pub gender_place_column: usize,
    pub age_group_place_column: usize,
    pub finish_time_column: usize,
    pub pace_column: usize,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            row: "tr.cbResultSetDataRow".into(),
            name: "div[style*='font-weight:bold']".into(),
            info: "div[style*='font-size: 16px']".into(),
            next_link_text: "[Next >>]".into(),
            overall_place_column: 2,
            gender_place_column: 3,
            age_group_place_column: 4,
            finish_time_column: 5,
            pace_column: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub start_url: String,
    pub max_pages: u32,
    pub checkpoint_every: u32,
    pub wait_timeout_secs: u64,
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    /// File stem for raw artifacts: `<dataset>_final.csv`, `<dataset>_partial_p<N>.csv`.
    pub dataset: String,
    pub cleaned_file: String,
    pub dictionary_file: String,
    pub log_file: Option<PathBuf>,
    pub selectors: Selectors,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_url: "https://www.timingproductions.com/results-site/cherry-blossom".into(),
            max_pages: 787,
            checkpoint_every: 20,
            wait_timeout_secs: 10,
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            dataset: "CherryBlossom2025".into(),
            cleaned_file: "cherry_blossom_2025_cleaned.csv".into(),
            dictionary_file: "data_dictionary.csv".into(),
            log_file: None,
            selectors: Selectors::default(),
        }
    }
}

impl Settings {
    /// Defaults, then the config file (optional unless named explicitly),
    /// then `RACE_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn final_raw_path(&self) -> PathBuf {
        self.raw_dir.join(format!("{}_final.csv", self.dataset))
    }

    pub fn checkpoint_path(&self, page: u32) -> PathBuf {
        self.raw_dir
            .join(format!("{}_partial_p{}.csv", self.dataset, page))
    }

    pub fn cleaned_path(&self) -> PathBuf {
        self.processed_dir.join(&self.cleaned_file)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.processed_dir.join(&self.dictionary_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.processed_dir.join("run_summary.json")
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_results_site() {
        let s = Settings::default();
        assert_eq!(s.max_pages, 787);
        assert_eq!(s.checkpoint_every, 20);
        assert_eq!(s.wait_timeout(), Duration::from_secs(10));
        assert_eq!(s.selectors.finish_time_column, 5);
        assert_eq!(
            s.checkpoint_path(40),
            PathBuf::from("data/raw/CherryBlossom2025_partial_p40.csv")
        );
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "max_pages = 3\ndataset = \"Trial\"\n[selectors]\nrow = \"tr.row\"\n",
        )
        .unwrap();
        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.max_pages, 3);
        assert_eq!(s.dataset, "Trial");
        assert_eq!(s.selectors.row, "tr.row");
        assert_eq!(s.selectors.next_link_text, "[Next >>]");
        assert_eq!(s.checkpoint_every, 20);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/race.toml"))).is_err());
    }
}
