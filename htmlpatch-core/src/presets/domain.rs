//! Domain independence: nothing in the document should point back at the
//! site the export was scraped from.

use regex::Captures;

use super::PresetError;
use crate::config::PatchConfig;
use crate::executor::Pipeline;
use crate::rules::PatternRule;

pub(super) fn pipeline(config: &PatchConfig) -> Result<Pipeline, PresetError> {
    let domain = config
        .domain
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .ok_or(PresetError::MissingParameter("domain"))?;
    let d = host_pattern(domain);

    let mut pipeline = Pipeline::new()
        .with(PatternRule::strip(
            "strip-alternate-links",
            &format!(
                r#"<link\b(?:[^>]*rel=["']alternate["'][^>]*{d}|[^>]*{d}[^>]*rel=["']alternate["'])[^>]*>"#
            ),
        )?)
        .with(PatternRule::strip(
            "strip-encoded-urls",
            &format!(r#"(?i)(?:url=)?https?%3A%2F%2F{d}[^"&\s]*"#),
        )?);
    pipeline.append(relative_urls(domain)?);
    Ok(pipeline)
}

/// Rules turning absolute URLs of `domain` into relative paths, for plain,
/// protocol-relative and JSON-escaped (`https:\/\/...`) spellings. The bare
/// root becomes `./`.
pub(super) fn relative_urls(domain: &str) -> Result<Pipeline, PresetError> {
    let d = host_pattern(domain);
    Ok(Pipeline::new()
        .with(PatternRule::strip(
            "strip-mirror-artifacts",
            &format!(r"index\.html(?:\\/|/){{2}}{d}(?:\\/|/)"),
        )?)
        .with(PatternRule::compute(
            "relativize-escaped-urls",
            &format!(r#"(?:https?:)?\\/\\/{d}(\\/[^"'\s<>]*|[^\w.\-]|$)"#),
            |caps| Ok(relative(caps, "\\/")),
        )?)
        .with(PatternRule::compute(
            "relativize-urls",
            &format!(r#"(?:https?:)?//{d}(/[^"'\s<>]*|[^\w.\-]|$)"#),
            |caps| Ok(relative(caps, "/")),
        )?))
}

/// How many times the site host still appears in `text` (case-insensitive).
/// `domain` is normalised the same way the rewrite rules normalise it, so
/// `https://www.example.com/` counts bare `example.com` remnants too.
pub fn remaining_mentions(text: &str, domain: &str) -> usize {
    let host = bare_host(domain);
    if host.is_empty() {
        return 0;
    }
    text.to_lowercase().matches(&host.to_lowercase()).count()
}

fn host_pattern(domain: &str) -> String {
    format!(r"(?:www\.)?{}", regex::escape(bare_host(domain)))
}

/// `domain` without scheme, `www.` or trailing slash.
fn bare_host(domain: &str) -> &str {
    domain
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_end_matches('/')
}

/// Path after the host, or `./` for the site root. A captured terminator
/// that is not a separator is kept.
fn relative(caps: &Captures<'_>, separator: &str) -> String {
    let tail = caps.get(1).map_or("", |m| m.as_str());
    match tail.strip_prefix(separator) {
        Some("") => "./".to_string(),
        Some(path) => path.to_string(),
        None => format!("./{tail}"),
    }
}
