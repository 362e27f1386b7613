// tests/config_env.rs
use chrono::NaiveDate;
use news_digest::DigestConfig;
use std::{env, fs, path::PathBuf};

const VARS: &[&str] = &[
    "DIGEST_CONFIG_PATH",
    "NEWS_API_URL",
    "NEWS_LOCATION",
    "NEWS_PAGE_SIZE",
    "NEWS_TIMEOUT_SECS",
    "NEWS_TARGET_COUNT",
    "NEWS_WORKERS",
    "NEWS_MAX_EMPTY_PAGES",
    "RANK_TOP_K",
    "RANK_FROM",
    "RANK_TO",
    "ALL_NEWS_PATH",
    "MOST_RATED_NEWS_PATH",
    "METRICS_PATH",
    "DIGEST_LOG_JSON",
];

fn clear_env() {
    for v in VARS {
        env::remove_var(v);
    }
}

#[serial_test::serial]
#[test]
fn file_then_env_overrides() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("digest.toml");
    fs::write(
        &p,
        r#"
log_json = true

[source]
location = "msk"
page_size = 50

[pipeline]
target_count = 200
workers = 8
max_empty_pages = 0

[rank]
top_k = 5
"#,
    )
    .unwrap();

    env::set_var("DIGEST_CONFIG_PATH", p.display().to_string());
    env::set_var("NEWS_WORKERS", "3");
    env::set_var("RANK_FROM", "2024-01-02");
    env::set_var("ALL_NEWS_PATH", "out/all.jsonl");

    let cfg = DigestConfig::load().unwrap();
    clear_env();

    assert_eq!(cfg.source.location, "msk");
    assert_eq!(cfg.source.page_size, 50);
    assert_eq!(cfg.pipeline.target_count, 200);
    assert_eq!(cfg.pipeline.workers, 3);
    assert_eq!(cfg.pipeline.max_empty_pages, None);
    assert_eq!(cfg.rank.top_k, 5);
    assert_eq!(cfg.rank.from, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    assert_eq!(cfg.output.all_news_path, PathBuf::from("out/all.jsonl"));
    assert!(cfg.log_json);

    let p = cfg.pipeline();
    assert_eq!(p.workers, 3);
    assert_eq!(p.target_count, 200);
}

#[serial_test::serial]
#[test]
fn missing_config_path_is_an_error() {
    clear_env();
    env::set_var("DIGEST_CONFIG_PATH", "/definitely/not/here/digest.toml");
    let res = DigestConfig::load();
    clear_env();
    assert!(res.is_err());
}

#[serial_test::serial]
#[test]
fn bad_env_values_are_rejected() {
    clear_env();
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::set_var("NEWS_TARGET_COUNT", "many");
    assert!(DigestConfig::load().is_err());
    env::remove_var("NEWS_TARGET_COUNT");

    env::set_var("RANK_TO", "18.10.2024");
    assert!(DigestConfig::load().is_err());
    env::remove_var("RANK_TO");

    // No file in CWD and nothing set → defaults.
    let cfg = DigestConfig::load().unwrap();
    assert_eq!(cfg, DigestConfig::default());

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn default_path_in_cwd_is_picked_up() {
    clear_env();
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/digest.toml"),
        "[pipeline]\ntarget_count = 7\n",
    )
    .unwrap();
    let cfg = DigestConfig::load().unwrap();
    assert_eq!(cfg.pipeline.target_count, 7);

    env::set_current_dir(&old).unwrap();
}
