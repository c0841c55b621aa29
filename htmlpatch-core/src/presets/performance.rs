//! The four performance passes. They are meant to run in order
//! (`optimize`, `advanced`, `heavy`, `finalize`) but each one is safe to
//! re-run on its own output.

use regex::Regex;

use super::assets::{
    CRITICAL_ABOVE_FOLD, CRITICAL_ADVANCED, CRITICAL_INLINE, DEPS_INIT, LAZY_IMAGES,
    PROGRESSIVE_LOADING,
};
use super::{attr_escape, PresetError};
use crate::config::{PatchConfig, PerformanceSection};
use crate::executor::Pipeline;
use crate::rules::{
    Anchor, DeferScript, DeferStylesheet, InjectRule, PatternRule, RelocateRule, ScriptLoading,
};

const STYLESHEET_LINK: &str = r#"<link\b[^>]*\srel=["']stylesheet["'][^>]*>"#;
const HEAD_OPEN: &str = r"<head\b[^>]*>";

pub(super) fn optimize(config: &PatchConfig) -> Result<Pipeline, PresetError> {
    let perf = &config.performance;
    // Inlined before anything is deferred so the block lands ahead of the
    // first real stylesheet, not inside a <noscript> fallback.
    let mut pipeline = Pipeline::new().with(
        InjectRule::new(
            "inline-critical-css",
            Anchor::before_first_match(Regex::new(STYLESHEET_LINK)?),
            CRITICAL_INLINE,
        )
        .with_marker(r#"id="critical-inline""#),
    );
    pipeline.append(defer_styles("defer-style", &perf.defer_styles, false)?);
    for fragment in &perf.defer_scripts {
        pipeline.push(Box::new(DeferScript::new(
            format!("defer-script:{fragment}"),
            fragment,
            ScriptLoading::Defer,
        )?));
    }
    pipeline.push(Box::new(
        InjectRule::new(
            "inject-preload-links",
            Anchor::before_first("</head>"),
            preload_block(perf),
        )
        .with_marker("<!-- htmlpatch:preload -->"),
    ));
    pipeline.append(defer_styles("defer-icon-style", &perf.icon_styles, true)?);
    pipeline.push(Box::new(
        InjectRule::new(
            "inject-dns-prefetch",
            Anchor::before_first("</head>"),
            dns_prefetch_block(perf),
        )
        .with_marker("<!-- htmlpatch:dns-prefetch -->"),
    ));
    Ok(pipeline)
}

pub(super) fn advanced(config: &PatchConfig) -> Result<Pipeline, PresetError> {
    let perf = &config.performance;
    let advanced_css = CRITICAL_ADVANCED.trim().to_string();
    let mut pipeline = Pipeline::new()
        .with(PatternRule::compute(
            "upgrade-critical-css",
            r#"(?s)<style id="critical-inline"[^>]*>.*?</style>"#,
            move |_| Ok(advanced_css.clone()),
        )?)
        .with(DeferScript::new(
            "defer-core-script",
            &perf.core_script,
            ScriptLoading::Defer,
        )?)
        .with(
            InjectRule::new("inject-lazy-images", Anchor::before_last("</body>"), LAZY_IMAGES)
                .with_marker(r#"id="htmlpatch-lazy-images""#),
        );
    pipeline.append(defer_styles("defer-extra-style", &perf.extra_defer_styles, false)?);
    pipeline.push(Box::new(
        InjectRule::new(
            "inject-preconnect",
            Anchor::before_first("</head>"),
            preconnect_block(perf),
        )
        .with_marker("<!-- htmlpatch:preconnect -->"),
    ));
    Ok(pipeline)
}

pub(super) fn heavy(config: &PatchConfig) -> Result<Pipeline, PresetError> {
    let perf = &config.performance;
    let mut pipeline = Pipeline::new()
        .with(DeferScript::new(
            "defer-core-script",
            &perf.core_script,
            ScriptLoading::Defer,
        )?)
        .with(DeferScript::new(
            "defer-async-migrate-script",
            &perf.migrate_script,
            ScriptLoading::DeferAsync,
        )?);
    pipeline.append(defer_styles("defer-heavy-style", &perf.heavy_styles, false)?);
    pipeline.append(defer_styles("defer-icon-style", &perf.icon_styles, true)?);
    pipeline.push(Box::new(
        InjectRule::new(
            "inject-above-fold-css",
            Anchor::after_first_match(Regex::new(HEAD_OPEN)?),
            CRITICAL_ABOVE_FOLD.trim(),
        )
        .with_marker(r#"id="critical-above-fold"#),
    ));
    pipeline.push(Box::new(
        InjectRule::new(
            "inject-progressive-loading",
            Anchor::before_last("</body>"),
            PROGRESSIVE_LOADING.replace("{prefetch}", &json_array(&perf.prefetch)),
        )
        .with_marker(r#"id="htmlpatch-progressive-loading""#),
    ));
    Ok(pipeline)
}

pub(super) fn finalize(config: &PatchConfig) -> Result<Pipeline, PresetError> {
    let perf = &config.performance;
    let core_tag = Regex::new(&format!(
        r#"<script\b[^>]*\bsrc="[^"]*{}[^"]*"[^>]*>\s*</script>"#,
        regex::escape(&perf.core_script)
    ))?;

    // The above-fold block and the hints settle first so that the first
    // </style> and the text right after it are stable when jQuery moves.
    Ok(Pipeline::new()
        .with(RelocateRule::new(
            "move-above-fold-css",
            Regex::new(r#"(?s)<style id="critical-above-fold[^"]*">.*?</style>"#)?,
            Anchor::after_first_match(Regex::new(HEAD_OPEN)?),
        ))
        .with(
            InjectRule::new(
                "inject-resource-hints",
                Anchor::after_first("</style>"),
                resource_hints_block(perf),
            )
            .with_marker("<!-- htmlpatch:resource-hints -->"),
        )
        .with(RelocateRule::new(
            "move-core-script",
            core_tag.clone(),
            Anchor::after_first("</style>"),
        ))
        .with(DeferScript::new(
            "normalize-migrate-script",
            &perf.migrate_script,
            ScriptLoading::Normalize,
        )?)
        .with(
            InjectRule::new(
                "inject-deps-init",
                Anchor::after_first_match(core_tag),
                DEPS_INIT,
            )
            .with_marker(r#"id="htmlpatch-deps-init""#),
        ))
}

fn defer_styles(
    prefix: &str,
    fragments: &[String],
    crossorigin: bool,
) -> Result<Pipeline, PresetError> {
    let mut pipeline = Pipeline::new();
    for fragment in fragments {
        let rule = DeferStylesheet::new(format!("{prefix}:{fragment}"), fragment)?;
        let rule = if crossorigin {
            rule.with_crossorigin()
        } else {
            rule
        };
        pipeline.push(Box::new(rule));
    }
    Ok(pipeline)
}

fn preload_block(perf: &PerformanceSection) -> String {
    let mut block = String::from("<!-- htmlpatch:preload -->\n");
    for link in &perf.preload {
        block.push_str(&format!(
            "<link rel=\"preload\" href=\"{}\" as=\"{}\">\n",
            attr_escape(&link.href),
            attr_escape(&link.kind)
        ));
    }
    block
}

fn dns_prefetch_block(perf: &PerformanceSection) -> String {
    let mut block = String::from("<!-- htmlpatch:dns-prefetch -->\n");
    for host in &perf.dns_prefetch {
        block.push_str(&format!(
            "<link rel=\"dns-prefetch\" href=\"//{}\">\n",
            attr_escape(host)
        ));
    }
    block
}

fn preconnect_block(perf: &PerformanceSection) -> String {
    let mut block = String::from(
        "<!-- htmlpatch:preconnect -->\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    for host in &perf.dns_prefetch {
        block.push_str(&format!(
            "<link rel=\"preconnect\" href=\"https://{}\" crossorigin>\n",
            attr_escape(host)
        ));
    }
    block
}

fn resource_hints_block(perf: &PerformanceSection) -> String {
    let mut block = String::from("\n<!-- htmlpatch:resource-hints -->\n");
    for host in &perf.dns_prefetch {
        block.push_str(&format!(
            "<link rel=\"dns-prefetch\" href=\"//{host}\">\n\
             <link rel=\"preconnect\" href=\"https://{host}\" crossorigin>\n",
            host = attr_escape(host)
        ));
    }
    block.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\">\n",
    );
    block
}

fn json_array(values: &[String]) -> String {
    serde_json::Value::from(values.to_vec()).to_string()
}
