use regex::Regex;

use super::splice;
use crate::contract::{Rewrite, Rule, RuleError};

/// Appends `key=value` to the query string of every quoted URL whose path
/// ends with one of a set of resource names.
///
/// Only whole quoted values are considered (attribute values and string
/// literals), so ids or prose that merely mention a resource are untouched.
///
/// URLs without a query get `?key=value`, URLs with one get `&key=value`. A
/// URL already carrying `key` has its value replaced instead, so repeated
/// runs never stack tokens.
pub struct TokenAppend {
    name: String,
    pattern: Option<Regex>,
    key: String,
    value: String,
}

impl TokenAppend {
    pub fn new<I, S>(
        name: impl Into<String>,
        resources: I,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = resources
            .into_iter()
            .map(|r| regex::escape(r.as_ref()))
            .filter(|r| !r.is_empty())
            .collect();
        // An empty alternation would match every URL-ish run of characters.
        let pattern = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(
                r#"(["'])([^"'\s<>?#]*(?:{})(?:[?#][^"'\s<>]*)?)(["'])"#,
                alternatives.join("|")
            ))?)
        };
        Ok(Self {
            name: name.into(),
            pattern,
            key: key.into(),
            value: value.into(),
        })
    }

    /// `url` with the token set in its query string.
    pub fn tokenize(&self, url: &str) -> String {
        let (path, fragment) = match url.find('#') {
            Some(i) => url.split_at(i),
            None => (url, ""),
        };
        let token = format!("{}={}", self.key, self.value);
        let prefix = format!("{}=", self.key);

        let Some((base, query)) = path.split_once('?') else {
            return format!("{path}?{token}{fragment}");
        };
        if query.is_empty() {
            return format!("{base}?{token}{fragment}");
        }

        let mut replaced = false;
        let params: Vec<String> = query
            .split('&')
            .map(|param| {
                if param.starts_with(&prefix) || param == self.key {
                    replaced = true;
                    token.clone()
                } else {
                    param.to_string()
                }
            })
            .collect();
        let mut query = params.join("&");
        if !replaced {
            query.push('&');
            query.push_str(&token);
        }
        format!("{base}?{query}{fragment}")
    }
}

impl Rule for TokenAppend {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: &str) -> Result<Rewrite, RuleError> {
        match &self.pattern {
            Some(pattern) => splice(pattern, input, |caps| {
                Ok(Some(format!(
                    "{}{}{}",
                    &caps[1],
                    self.tokenize(&caps[2]),
                    &caps[3]
                )))
            }),
            None => Ok(Rewrite::unchanged(input)),
        }
    }
}
