use htmlpatch_core::config::{PatchConfig, RunParams};
use htmlpatch_core::presets::Preset;
use std::path::{Path, PathBuf};

#[test]
fn empty_yaml_gives_defaults() {
    let config: PatchConfig = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config, PatchConfig::default());
    assert_eq!(config.cache.key, "cb");
    assert_eq!(config.performance.core_script, "jquery.min");
}

#[test]
fn preload_entries_use_the_as_key() {
    let config: PatchConfig = serde_yaml::from_str(
        "performance:\n  preload:\n    - href: js/app.js\n      as: script\n",
    )
    .unwrap();
    assert_eq!(config.performance.preload[0].href, "js/app.js");
    assert_eq!(config.performance.preload[0].kind, "script");
    // Untouched fields of the section keep their defaults.
    assert_eq!(config.performance.migrate_script, "jquery-migrate");
}

#[test]
fn pipeline_presets_are_kebab_case() {
    let config: PatchConfig =
        serde_yaml::from_str("pipeline: [clean, cache-bust, finalize]\n").unwrap();
    assert_eq!(
        config.pipeline,
        vec![Preset::Clean, Preset::CacheBust, Preset::Finalize]
    );
}

#[test]
fn run_params_prefer_configured_values() {
    let mut config = PatchConfig::default();
    config.cache.token = Some("abc".to_string());
    config.inventory.root = Some(PathBuf::from("/srv/site"));

    let params = RunParams::resolve(&config, Path::new("out/index.html"));

    assert_eq!(params.cache_token, "abc");
    assert_eq!(params.site_root, PathBuf::from("/srv/site"));
}

#[test]
fn run_params_fall_back_to_timestamp_and_target_dir() {
    let config = PatchConfig::default();

    let nested = RunParams::resolve(&config, Path::new("site/index.html"));
    let bare = RunParams::resolve(&config, Path::new("index.html"));

    assert_eq!(nested.site_root, PathBuf::from("site"));
    assert_eq!(bare.site_root, PathBuf::from("."));
    assert!(!nested.cache_token.is_empty());
    assert!(nested.cache_token.chars().all(|c| c.is_ascii_digit()));
}
