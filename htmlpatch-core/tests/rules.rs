use htmlpatch_core::contract::{Rule, RuleError};
use htmlpatch_core::rules::{
    Anchor, DeferScript, DeferStylesheet, InjectRule, PatternRule, RelocateRule, ScriptLoading,
    TokenAppend,
};
use regex::Regex;

const STYLE_TAG: &str =
    r#"<link rel="stylesheet" id="widget-css" href="wp-content/widget.min.css" media="all">"#;

#[test]
fn strip_is_idempotent() {
    let rule = PatternRule::strip(
        "strip-rss-feeds",
        r"<link[^>]*application/rss\+xml[^>]*>",
    )
    .unwrap();
    let input = r#"<head><link rel="alternate" type="application/rss+xml" href="/feed/"><title>x</title></head>"#;

    let first = rule.apply(input).unwrap();
    assert_eq!(first.substitutions, 1);
    assert_eq!(first.text, "<head><title>x</title></head>");

    let second = rule.apply(&first.text).unwrap();
    assert_eq!(second.substitutions, 0);
    assert_eq!(second.text, first.text);
}

#[test]
fn replace_expands_captures() {
    let rule = PatternRule::replace("swap", r"(\w+)@(\w+)", "$2@$1").unwrap();
    let rewrite = rule.apply("a@b c@d").unwrap();
    assert_eq!(rewrite.text, "b@a d@c");
    assert_eq!(rewrite.substitutions, 2);
}

#[test]
fn compute_failure_is_reported_as_rule_error() {
    let rule = PatternRule::compute("reject", r"\d+", |caps| {
        Err(RuleError::Malformed(format!("number {}", &caps[0])))
    })
    .unwrap();
    assert_eq!(
        rule.apply("x 12").unwrap_err(),
        RuleError::Malformed("number 12".to_string())
    );
}

#[test]
fn defer_stylesheet_keeps_original_tag_in_noscript() {
    let rule = DeferStylesheet::new("defer-style:widget", "widget").unwrap();
    let input = format!("<head>{STYLE_TAG}</head>");

    let rewrite = rule.apply(&input).unwrap();

    assert_eq!(rewrite.substitutions, 1);
    let expected = format!(
        "<head><link rel=\"preload\" as=\"style\" onload=\"this.onload=null;this.rel='stylesheet'\" \
         id=\"widget-css\" href=\"wp-content/widget.min.css\" media=\"all\"><noscript>{STYLE_TAG}</noscript></head>"
    );
    assert_eq!(rewrite.text, expected);

    let noscript = rewrite
        .text
        .split("<noscript>")
        .nth(1)
        .and_then(|rest| rest.split("</noscript>").next())
        .unwrap();
    assert_eq!(noscript, STYLE_TAG);
}

#[test]
fn defer_stylesheet_does_not_touch_its_own_output() {
    let rule = DeferStylesheet::new("defer-style:widget", "widget").unwrap();
    let once = rule.apply(STYLE_TAG).unwrap();

    let twice = rule.apply(&once.text).unwrap();

    assert_eq!(twice.substitutions, 0);
    assert_eq!(twice.text, once.text);
}

#[test]
fn defer_stylesheet_with_crossorigin() {
    let rule = DeferStylesheet::new("defer-icon-style", "fontawesome")
        .unwrap()
        .with_crossorigin();
    let input = r#"<link rel='stylesheet' href="css/fontawesome.min.css">"#;

    let rewrite = rule.apply(input).unwrap();

    assert!(rewrite.text.starts_with(
        r#"<link rel="preload" as="style" onload="this.onload=null;this.rel='stylesheet'" crossorigin href="css/fontawesome.min.css">"#
    ));
    assert!(rewrite.text.ends_with(&format!("<noscript>{input}</noscript>")));
}

#[test]
fn defer_stylesheet_ignores_non_stylesheet_links() {
    let rule = DeferStylesheet::new("defer-style:widget", "widget").unwrap();
    let input = r#"<link rel="icon" href="img/widget.png">"#;
    assert_eq!(rule.apply(input).unwrap().substitutions, 0);
}

#[test]
fn defer_script_inserts_defer_after_script() {
    let rule = DeferScript::new("defer-core-script", "jquery.min", ScriptLoading::Defer).unwrap();

    let rewrite = rule
        .apply(r#"<script src="https://cdn.example.com/jquery.min.js"></script>"#)
        .unwrap();

    assert_eq!(
        rewrite.text,
        r#"<script defer src="https://cdn.example.com/jquery.min.js"></script>"#
    );
    assert_eq!(rewrite.substitutions, 1);
}

#[test]
fn defer_script_leaves_async_and_deferred_tags_alone() {
    let rule = DeferScript::new("defer-core-script", "jquery.min", ScriptLoading::Defer).unwrap();
    let input = concat!(
        r#"<script async src="js/jquery.min.js"></script>"#,
        r#"<script type="text/javascript" defer src="js/jquery.min.js" id="jq"></script>"#
    );
    assert_eq!(rule.apply(input).unwrap().substitutions, 0);
}

#[test]
fn defer_script_keeps_other_attributes_in_order() {
    let rule = DeferScript::new("defer-script", "scrollBar", ScriptLoading::Defer).unwrap();
    let rewrite = rule
        .apply(r#"<script type="text/javascript" src="js/scrollBar.js?ver=2" id="sb-js"></script>"#)
        .unwrap();
    assert_eq!(
        rewrite.text,
        r#"<script defer type="text/javascript" src="js/scrollBar.js?ver=2" id="sb-js"></script>"#
    );
}

#[test]
fn defer_async_then_normalize() {
    let input = r#"<script src="js/jquery-migrate.min.js" id="migrate"></script>"#;
    let defer_async =
        DeferScript::new("defer-async", "jquery-migrate", ScriptLoading::DeferAsync).unwrap();
    let normalize =
        DeferScript::new("normalize", "jquery-migrate", ScriptLoading::Normalize).unwrap();

    let both = defer_async.apply(input).unwrap();
    assert_eq!(
        both.text,
        r#"<script defer async src="js/jquery-migrate.min.js" id="migrate"></script>"#
    );
    assert_eq!(defer_async.apply(&both.text).unwrap().substitutions, 0);

    let normalized = normalize.apply(&both.text).unwrap();
    assert_eq!(
        normalized.text,
        r#"<script defer src="js/jquery-migrate.min.js" id="migrate"></script>"#
    );
    assert_eq!(normalize.apply(&normalized.text).unwrap().substitutions, 0);
}

#[test]
fn inject_before_and_after_anchors() {
    let before = InjectRule::new("hint", Anchor::before_first("</head>"), "<meta x>");
    let after = InjectRule::new("css", Anchor::after_first("</style>"), "<meta y>");
    let last = InjectRule::new("js", Anchor::before_last("</body>"), "<script z></script>");

    let text = "<head><style></style></head><body></body><body></body>";
    let text = before.apply(text).unwrap().text;
    let text = after.apply(&text).unwrap().text;
    let text = last.apply(&text).unwrap().text;

    assert_eq!(
        text,
        "<head><style></style><meta y><meta x></head><body></body><body><script z></script></body>"
    );
}

#[test]
fn inject_without_anchor_leaves_document_unchanged() {
    let rule = InjectRule::new("hint", Anchor::before_first("</head>"), "<meta x>");
    let input = "<p>fragment without a head</p>";

    let rewrite = rule.apply(input).unwrap();

    assert_eq!(rewrite.substitutions, 0);
    assert_eq!(rewrite.text, input);
}

#[test]
fn inject_marker_prevents_duplicates() {
    let rule = InjectRule::new(
        "preload",
        Anchor::before_first("</head>"),
        "<!-- preload -->\n<link rel=\"preload\" href=\"a.css\">\n",
    )
    .with_marker("<!-- preload -->");

    let once = rule.apply("<head></head>").unwrap();
    let twice = rule.apply(&once.text).unwrap();

    assert_eq!(once.substitutions, 1);
    assert_eq!(twice.substitutions, 0);
    assert_eq!(twice.text.matches("<!-- preload -->").count(), 1);
}

#[test]
fn inject_after_regex_anchor() {
    let rule = InjectRule::new(
        "above-fold",
        Anchor::after_first_match(Regex::new(r"<head\b[^>]*>").unwrap()),
        "<style id=\"af\"></style>",
    );
    let rewrite = rule.apply(r#"<html><head lang="en"><title>t</title></head>"#).unwrap();
    assert_eq!(
        rewrite.text,
        r#"<html><head lang="en"><style id="af"></style><title>t</title></head>"#
    );
}

#[test]
fn relocate_moves_block_to_anchor() {
    let rule = RelocateRule::new(
        "move-core-script",
        Regex::new(r#"<script src="jq.js"></script>"#).unwrap(),
        Anchor::after_first("</style>"),
    );
    let input = r#"<head><script src="jq.js"></script><style>a{}</style><title>t</title></head>"#;

    let moved = rule.apply(input).unwrap();

    assert_eq!(
        moved.text,
        r#"<head><style>a{}</style><script src="jq.js"></script><title>t</title></head>"#
    );
    assert_eq!(moved.substitutions, 1);
    assert_eq!(rule.apply(&moved.text).unwrap().substitutions, 0);
}

#[test]
fn relocate_without_anchor_keeps_everything() {
    let rule = RelocateRule::new(
        "move-core-script",
        Regex::new(r#"<script src="jq.js"></script>"#).unwrap(),
        Anchor::after_first("</style>"),
    );
    let input = r#"<head><script src="jq.js"></script></head>"#;

    let rewrite = rule.apply(input).unwrap();

    assert_eq!(rewrite.text, input);
    assert_eq!(rewrite.substitutions, 0);
}

#[test]
fn token_append_uses_the_right_delimiter() {
    let plain = TokenAppend::new("token", ["foo.css"], "v", "42").unwrap();
    assert_eq!(plain.tokenize("foo.css"), "foo.css?v=42");

    let cb = TokenAppend::new("token", ["foo.css"], "cb", "42").unwrap();
    assert_eq!(cb.tokenize("foo.css?ver=1"), "foo.css?ver=1&cb=42");
    assert_eq!(cb.tokenize("foo.css?"), "foo.css?cb=42");
    assert_eq!(cb.tokenize("foo.css?cb=41&x=1"), "foo.css?cb=42&x=1");
    assert_eq!(cb.tokenize("foo.css#top"), "foo.css?cb=42#top");
}

#[test]
fn token_append_rewrites_matching_urls_only() {
    let rule = TokenAppend::new("token", ["base.min72ad.css"], "cb", "42").unwrap();
    let input = r#"<link href="css/base.min72ad.css?ver=6.1"><link href="css/other.css">"#;

    let once = rule.apply(input).unwrap();

    assert_eq!(
        once.text,
        r#"<link href="css/base.min72ad.css?ver=6.1&cb=42"><link href="css/other.css">"#
    );
    assert_eq!(rule.apply(&once.text).unwrap().substitutions, 0);
}

#[test]
fn token_append_without_resources_matches_nothing() {
    let rule = TokenAppend::new("token", Vec::<String>::new(), "cb", "42").unwrap();
    let input = r#"<link href="a.css">"#;
    assert_eq!(rule.apply(input).unwrap().text, input);
}

#[test]
fn token_append_ignores_ids_and_prose_that_mention_a_resource() {
    let rule = TokenAppend::new("token", ["protection.js"], "cb", "42").unwrap();
    let input = concat!(
        r#"<script id="protection.js-core" src="js/protection.js"></script>"#,
        "<p>Load protection.js first.</p>",
        r#"<script>var files = ['js/protection.js#init'];</script>"#
    );

    let rewrite = rule.apply(input).unwrap();

    assert_eq!(
        rewrite.text,
        concat!(
            r#"<script id="protection.js-core" src="js/protection.js?cb=42"></script>"#,
            "<p>Load protection.js first.</p>",
            r#"<script>var files = ['js/protection.js?cb=42#init'];</script>"#
        )
    );
    assert_eq!(rewrite.substitutions, 2);
}
