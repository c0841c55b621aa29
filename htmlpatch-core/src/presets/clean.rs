use super::{domain, PresetError};
use crate::config::PatchConfig;
use crate::executor::Pipeline;
use crate::rules::PatternRule;

const STRIPPED: &[(&str, &str)] = &[
    (
        "strip-tag-manager",
        r"(?s)<!-- Google Tag Manager.*?<!-- End Google Tag Manager.*?-->",
    ),
    ("strip-gtag-scripts", r"(?s)<script[^>]*gtag[^>]*>.*?</script>"),
    (
        "strip-analytics-scripts",
        r"(?s)<script[^>]*google-analytics[^>]*>.*?</script>",
    ),
    (
        "strip-google-fonts",
        r"<link[^>]*fonts\.(?:googleapis|gstatic)\.com[^>]*>",
    ),
    ("strip-pingback", r#"<link rel=["']pingback["'][^>]*>"#),
    ("strip-dns-prefetch", r#"<link rel=["']dns-prefetch["'][^>]*>"#),
    ("strip-rss-feeds", r"<link[^>]*application/rss\+xml[^>]*>"),
    ("strip-rest-api", r#"<link rel=["']https://api\.w\.org/["'][^>]*>"#),
    ("strip-edit-uri", r#"<link rel=["']EditURI["'][^>]*>"#),
    ("strip-chat-scripts", r"(?s)<script[^>]*chaty[^>]*>.*?</script>"),
    ("strip-chat-settings", r"(?s)var chaty_settings = \{.*?\};"),
];

pub(super) fn pipeline(config: &PatchConfig) -> Result<Pipeline, PresetError> {
    let mut pipeline = Pipeline::new();
    for (name, pattern) in STRIPPED {
        pipeline.push(Box::new(PatternRule::strip(*name, pattern)?));
    }
    if let Some(domain) = config.domain.as_deref() {
        pipeline.append(domain::relative_urls(domain)?);
    }
    // Must stay last: earlier strips leave blank runs behind.
    pipeline.push(Box::new(PatternRule::replace(
        "collapse-blank-lines",
        r"\n\s*\n\s*\n",
        "\n\n",
    )?));
    Ok(pipeline)
}
