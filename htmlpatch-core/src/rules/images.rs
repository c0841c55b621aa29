//! Validate-against-inventory rule for `<img>` and `<source>` tags.

use regex::Regex;

use super::splice;
use crate::contract::{Rewrite, Rule, RuleError};
use crate::inventory::Inventory;

/// Drops `srcset` candidates that do not exist on disk and repairs broken
/// `src` references when exactly one plausible substitute exists.
///
/// Absolute references (`http:`, `https:`, `//`, `data:`) are never checked.
/// When several substitutes fit, the reference is left alone and a warning is
/// reported: picking one would be a guess.
pub struct InventoryRule {
    name: String,
    inventory: Inventory,
    tag: Regex,
    srcset: Regex,
    src: Regex,
}

impl InventoryRule {
    pub fn new(name: impl Into<String>, inventory: Inventory) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            inventory,
            tag: Regex::new(r"(?i)<(?:img|source)\b[^>]*>")?,
            srcset: Regex::new(r#"(\s+)srcset="([^"]*)""#)?,
            src: Regex::new(r#"(\s)src="([^"]*)""#)?,
        })
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Filter a comma-separated candidate list. `None` means nothing survived.
    pub fn filter_srcset(&self, value: &str) -> Option<String> {
        let (kept, _) = self.partition_srcset(value);
        if kept.is_empty() {
            None
        } else {
            Some(kept.join(", "))
        }
    }

    /// Surviving candidates and the total number of candidates.
    fn partition_srcset<'v>(&self, value: &'v str) -> (Vec<&'v str>, usize) {
        let candidates: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .collect();
        let total = candidates.len();
        let kept = candidates
            .into_iter()
            .filter(|candidate| {
                let url = candidate.split_whitespace().next().unwrap_or_default();
                is_absolute(url) || self.inventory.contains(&normalize(url))
            })
            .collect();
        (kept, total)
    }

    fn fix_srcset(&self, tag: &str) -> String {
        let Some(caps) = self.srcset.captures(tag) else {
            return tag.to_string();
        };
        let (Some(whole), Some(lead), Some(value)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            return tag.to_string();
        };
        let (kept, total) = self.partition_srcset(value.as_str());
        if kept.len() == total {
            return tag.to_string();
        }
        let replacement = if kept.is_empty() {
            String::new()
        } else {
            format!("{}srcset=\"{}\"", lead.as_str(), kept.join(", "))
        };
        format!("{}{replacement}{}", &tag[..whole.start()], &tag[whole.end()..])
    }

    fn fix_src(&self, tag: &str, warnings: &mut Vec<String>) -> String {
        let Some(caps) = self.src.captures(tag) else {
            return tag.to_string();
        };
        let Some(value) = caps.get(2) else {
            return tag.to_string();
        };
        let url = value.as_str();
        if url.is_empty() || is_absolute(url) {
            return tag.to_string();
        }
        let (path, suffix) = split_query(url);
        let key = normalize(path);
        if self.inventory.contains(&key) {
            return tag.to_string();
        }

        match self.inventory.substitutes(&key).as_slice() {
            [only] => format!(
                "{}{}{only}{suffix}{}",
                &tag[..value.start()],
                leading(path),
                &tag[value.end()..]
            ),
            [] => {
                warnings.push(format!("no substitute for missing image {url}"));
                tag.to_string()
            }
            many => {
                warnings.push(format!(
                    "ambiguous substitute for {url}: {} candidates ({})",
                    many.len(),
                    many.join(", ")
                ));
                tag.to_string()
            }
        }
    }
}

impl Rule for InventoryRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: &str) -> Result<Rewrite, RuleError> {
        let mut warnings = Vec::new();
        let rewrite = splice(&self.tag, input, |caps| {
            let tag = self.fix_srcset(&caps[0]);
            Ok(Some(self.fix_src(&tag, &mut warnings)))
        })?;
        Ok(rewrite.with_warnings(warnings))
    }
}

fn is_absolute(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("//")
        || lower.starts_with("data:")
}

/// Inventory key for a document reference.
fn normalize(url: &str) -> String {
    let (path, _) = split_query(url);
    path.trim_start_matches("./").trim_start_matches('/').to_string()
}

/// The `./` or `/` prefix that [`normalize`] strips from a reference.
fn leading(path: &str) -> &str {
    let rest = path.trim_start_matches("./").trim_start_matches('/');
    &path[..path.len() - rest.len()]
}

fn split_query(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(i) => url.split_at(i),
        None => (url, ""),
    }
}
