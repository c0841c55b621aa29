//! Defer-resource rules for `<link rel="stylesheet">` and `<script src>` tags.

use regex::Regex;

use super::{match_start, splice};
use crate::contract::{Rewrite, Rule, RuleError};

const PRELOAD_ATTRS: &str = r#"rel="preload" as="style" onload="this.onload=null;this.rel='stylesheet'""#;

/// Turns a blocking stylesheet link into a preload that swaps itself in on
/// load, followed by a `<noscript>` copy of the untouched original tag.
pub struct DeferStylesheet {
    name: String,
    pattern: Regex,
    rel: Regex,
    crossorigin: bool,
}

impl DeferStylesheet {
    /// Matches `<link>` tags whose `href` contains `fragment`.
    pub fn new(name: impl Into<String>, fragment: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r#"<link\b[^>]*\bhref="[^"]*{}[^"]*"[^>]*>"#,
            regex::escape(fragment)
        ))?;
        Ok(Self {
            name: name.into(),
            pattern,
            // Whitespace-led so the `this.rel='stylesheet'` handler never matches.
            rel: Regex::new(r#"(\s)rel=(?:"stylesheet"|'stylesheet')"#)?,
            crossorigin: false,
        })
    }

    /// Add a bare `crossorigin` attribute to the preload (icon fonts).
    pub fn with_crossorigin(mut self) -> Self {
        self.crossorigin = true;
        self
    }

    fn defer(&self, tag: &str) -> Option<String> {
        let caps = self.rel.captures(tag)?;
        let (whole, lead) = (caps.get(0)?, caps.get(1)?);
        let crossorigin = if self.crossorigin { " crossorigin" } else { "" };
        Some(format!(
            "{}{}{PRELOAD_ATTRS}{crossorigin}{}<noscript>{tag}</noscript>",
            &tag[..whole.start()],
            lead.as_str(),
            &tag[whole.end()..]
        ))
    }
}

impl Rule for DeferStylesheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: &str) -> Result<Rewrite, RuleError> {
        splice(&self.pattern, input, |caps| {
            // The fallback copy of an already deferred tag.
            if input[..match_start(caps)].trim_end().ends_with("<noscript>") {
                return Ok(None);
            }
            Ok(self.defer(&caps[0]))
        })
    }
}

/// How a [`DeferScript`] rewrites a matching script tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLoading {
    /// Insert `defer` unless the tag already has `defer` or `async`.
    Defer,
    /// Make the tag `defer async`.
    DeferAsync,
    /// Drop `async` from a tag that is also `defer`.
    Normalize,
}

/// Rewrites `<script src="...fragment...">` tags, keeping every other
/// attribute where it was.
pub struct DeferScript {
    name: String,
    pattern: Regex,
    loading: ScriptLoading,
    defer_attr: Regex,
    async_attr: Regex,
}

impl DeferScript {
    pub fn new(
        name: impl Into<String>,
        fragment: &str,
        loading: ScriptLoading,
    ) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r#"<script\b[^>]*\bsrc="[^"]*{}[^"]*"[^>]*>\s*</script>"#,
            regex::escape(fragment)
        ))?;
        Ok(Self {
            name: name.into(),
            pattern,
            loading,
            defer_attr: Regex::new(r#"\sdefer(?:=(?:"[^"]*"|'[^']*'|[^\s>]*))?(?:[\s/>]|$)"#)?,
            async_attr: Regex::new(r#"\sasync(?:=(?:"[^"]*"|'[^']*'|[^\s>]*))?(?:[\s/>]|$)"#)?,
        })
    }

    fn rewrite(&self, tag: &str) -> Option<String> {
        let open_end = tag.find('>').map_or(tag.len(), |i| i + 1);
        let (open, rest) = tag.split_at(open_end);
        let has_defer = self.defer_attr.is_match(open);
        let has_async = self.async_attr.is_match(open);

        match self.loading {
            ScriptLoading::Defer if has_defer || has_async => None,
            ScriptLoading::Defer => Some(tag.replacen("<script", "<script defer", 1)),
            ScriptLoading::DeferAsync if has_defer && has_async => None,
            ScriptLoading::DeferAsync => {
                let open = strip_attr(&self.defer_attr, open);
                let open = strip_attr(&self.async_attr, &open);
                Some(format!(
                    "{}{rest}",
                    open.replacen("<script", "<script defer async", 1)
                ))
            }
            ScriptLoading::Normalize if has_defer && has_async => {
                Some(format!("{}{rest}", strip_attr(&self.async_attr, open)))
            }
            ScriptLoading::Normalize => None,
        }
    }
}

/// Remove the first occurrence of a boolean attribute, keeping the character
/// that terminated it.
fn strip_attr(attr: &Regex, open: &str) -> String {
    match attr.find(open) {
        Some(m) => {
            let matched = m.as_str();
            let keep = matched
                .chars()
                .last()
                .filter(|c| c.is_whitespace() || *c == '/' || *c == '>')
                .map(String::from)
                .unwrap_or_default();
            format!("{}{keep}{}", &open[..m.start()], &open[m.end()..])
        }
        None => open.to_string(),
    }
}

impl Rule for DeferScript {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: &str) -> Result<Rewrite, RuleError> {
        splice(&self.pattern, input, |caps| Ok(self.rewrite(&caps[0])))
    }
}
