// src/config.rs
//! Runtime configuration for the digest job.
//!
//! Load order:
//! 1) `$DIGEST_CONFIG_PATH` (must exist if set)
//! 2) `config/digest.toml`
//! 3) built-in defaults
//!
//! Env vars are applied on top (see `apply_env`). `.env` is read by the binary
//! before calling [`DigestConfig::load`].

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::PipelineConfig;
use crate::rank::{DateWindow, RankSelector};

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";

fn default_api_url() -> String {
    "https://kudago.com/public-api/v1.4/news/".to_string()
}
fn default_location() -> String {
    "spb".to_string()
}
fn default_page_size() -> u32 {
    20
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_target_count() -> usize {
    50
}
fn default_workers() -> usize {
    4
}
fn default_max_empty_pages() -> Option<u32> {
    Some(3)
}
fn default_top_k() -> usize {
    20
}
fn default_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 10).unwrap_or_default()
}
fn default_to() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 18).unwrap_or_default()
}
fn default_all_news_path() -> PathBuf {
    PathBuf::from("data/all_news.jsonl")
}
fn default_most_rated_path() -> PathBuf {
    PathBuf::from("data/most_rated.jsonl")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            location: default_location(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Absent means 3; `0` in the file means unbounded.
    #[serde(default = "default_max_empty_pages")]
    pub max_empty_pages: Option<u32>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            workers: default_workers(),
            max_empty_pages: default_max_empty_pages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_from")]
    pub from: NaiveDate,
    #[serde(default = "default_to")]
    pub to: NaiveDate,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            from: default_from(),
            to: default_to(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_all_news_path")]
    pub all_news_path: PathBuf,
    #[serde(default = "default_most_rated_path")]
    pub most_rated_path: PathBuf,
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            all_news_path: default_all_news_path(),
            most_rated_path: default_most_rated_path(),
            metrics_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DigestConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub pipeline: IngestConfig,
    #[serde(default)]
    pub rank: RankConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log_json: bool,
}

impl DigestConfig {
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let default_p = Path::new(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from_file(default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env()?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg: DigestConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Env overrides. Unset vars leave the current value alone.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_str("NEWS_API_URL") {
            self.source.api_url = v;
        }
        if let Some(v) = env_str("NEWS_LOCATION") {
            self.source.location = v;
        }
        if let Some(v) = env_parse("NEWS_PAGE_SIZE")? {
            self.source.page_size = v;
        }
        if let Some(v) = env_parse("NEWS_TIMEOUT_SECS")? {
            self.source.timeout_secs = v;
        }
        if let Some(v) = env_parse("NEWS_TARGET_COUNT")? {
            self.pipeline.target_count = v;
        }
        if let Some(v) = env_parse("NEWS_WORKERS")? {
            self.pipeline.workers = v;
        }
        if let Some(v) = env_str("NEWS_MAX_EMPTY_PAGES") {
            self.pipeline.max_empty_pages = parse_limit(&v)?;
        }
        if let Some(v) = env_parse("RANK_TOP_K")? {
            self.rank.top_k = v;
        }
        if let Some(v) = env_str("RANK_FROM") {
            self.rank.from = parse_day("RANK_FROM", &v)?;
        }
        if let Some(v) = env_str("RANK_TO") {
            self.rank.to = parse_day("RANK_TO", &v)?;
        }
        if let Some(v) = env_str("ALL_NEWS_PATH") {
            self.output.all_news_path = PathBuf::from(v);
        }
        if let Some(v) = env_str("MOST_RATED_NEWS_PATH") {
            self.output.most_rated_path = PathBuf::from(v);
        }
        if let Some(v) = env_str("METRICS_PATH") {
            self.output.metrics_path = Some(PathBuf::from(v));
        }
        if let Some(v) = env_str("DIGEST_LOG_JSON") {
            self.log_json = v == "1" || v.eq_ignore_ascii_case("true");
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        self.pipeline.workers = self.pipeline.workers.max(1);
        self.source.page_size = self.source.page_size.max(1);
        if self.pipeline.max_empty_pages == Some(0) {
            self.pipeline.max_empty_pages = None;
        }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            target_count: self.pipeline.target_count,
            workers: self.pipeline.workers,
            max_empty_pages: self.pipeline.max_empty_pages,
        }
    }

    pub fn selector(&self) -> RankSelector {
        RankSelector::new(self.rank.top_k, DateWindow::new(self.rank.from, self.rank.to))
    }
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_str(key) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{key}={v:?}: {e}")),
        None => Ok(None),
    }
}

fn parse_limit(v: &str) -> Result<Option<u32>> {
    if v.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match v.parse::<u32>() {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(e) => bail!("NEWS_MAX_EMPTY_PAGES={v:?}: {e}"),
    }
}

fn parse_day(key: &str, v: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(v, "%Y-%m-%d").with_context(|| format!("{key}={v:?}"))
}
