//! Cache busting: every run gets a fresh token, and every place a client or
//! CDN could serve a stale copy from is tagged with it.

use super::assets::{CACHE_REFRESH, NO_CACHE_META};
use super::{attr_escape, PresetError};
use crate::config::{PatchConfig, RunParams};
use crate::executor::Pipeline;
use crate::rules::{Anchor, InjectRule, PatternRule, TokenAppend};

const NO_CACHE_MARKER: &str = "<!-- htmlpatch:no-cache -->";
const REFRESH_MARKER: &str = r#"id="htmlpatch-cache-refresh""#;

pub(super) fn pipeline(config: &PatchConfig, params: &RunParams) -> Result<Pipeline, PresetError> {
    let token = params.cache_token.trim();
    if token.is_empty() {
        return Err(PresetError::InvalidParameter {
            name: "cache.token",
            reason: "token is empty".to_string(),
        });
    }
    let key = config.cache.key.trim();
    if key.is_empty() {
        return Err(PresetError::InvalidParameter {
            name: "cache.key",
            reason: "query parameter name is empty".to_string(),
        });
    }

    let tokens = TokenAppend::new("append-cache-token", &config.cache.resources, key, token)?;
    let prefetch: Vec<String> = config
        .performance
        .prefetch
        .iter()
        .map(|href| tokens.tokenize(href))
        .collect();
    let refresh = CACHE_REFRESH
        .replace("{key}", &json_string(key))
        .replace("{prefetch}", &json_array(&prefetch));
    let no_cache = NO_CACHE_META.replace("{token}", &attr_escape(token));

    let ver_token = token.to_string();
    let meta_token = attr_escape(token);
    let style_token = attr_escape(token);

    Ok(Pipeline::new()
        .with(PatternRule::compute(
            "refresh-version-queries",
            r"([?&])ver=[\w.\-]+",
            move |caps| Ok(format!("{}ver={ver_token}", &caps[1])),
        )?)
        .with(tokens)
        .with(PatternRule::compute(
            "refresh-cache-version-meta",
            r#"(<meta name="cache-version" content=")[^"]*(")"#,
            move |caps| Ok(format!("{}{meta_token}{}", &caps[1], &caps[2])),
        )?)
        .with(
            InjectRule::new("inject-no-cache-meta", Anchor::after_first("</style>"), no_cache)
                .with_marker(NO_CACHE_MARKER),
        )
        .with(PatternRule::compute(
            "version-critical-style",
            r#"<style id="critical-above-fold(?:-v[^"]*)?">"#,
            move |_| Ok(format!(r#"<style id="critical-above-fold-v{style_token}">"#)),
        )?)
        .with(
            InjectRule::new("inject-cache-refresh", Anchor::before_last("</body>"), refresh)
                .with_marker(REFRESH_MARKER),
        ))
}

fn json_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn json_array(values: &[String]) -> String {
    serde_json::Value::from(values.to_vec()).to_string()
}
