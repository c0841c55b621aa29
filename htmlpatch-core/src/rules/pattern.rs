use regex::{Captures, Regex};

use super::splice;
use crate::contract::{Rewrite, Rule, RuleError};

/// Pure function from a match to its replacement.
pub type ComputeFn = Box<dyn Fn(&Captures<'_>) -> Result<String, RuleError>>;

/// What a [`PatternRule`] does with each match.
pub enum Action {
    /// Remove the match.
    Strip,
    /// Replace with a template; `$1` / `${name}` expand capture groups.
    Replace(String),
    Compute(ComputeFn),
}

/// Strip-by-pattern and rewrite-by-pattern rules.
pub struct PatternRule {
    name: String,
    pattern: Regex,
    action: Action,
}

impl PatternRule {
    pub fn new(name: impl Into<String>, pattern: Regex, action: Action) -> Self {
        Self {
            name: name.into(),
            pattern,
            action,
        }
    }

    pub fn strip(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::new(name, Regex::new(pattern)?, Action::Strip))
    }

    pub fn replace(
        name: impl Into<String>,
        pattern: &str,
        template: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self::new(
            name,
            Regex::new(pattern)?,
            Action::Replace(template.into()),
        ))
    }

    pub fn compute<F>(name: impl Into<String>, pattern: &str, f: F) -> Result<Self, regex::Error>
    where
        F: Fn(&Captures<'_>) -> Result<String, RuleError> + 'static,
    {
        Ok(Self::new(
            name,
            Regex::new(pattern)?,
            Action::Compute(Box::new(f)),
        ))
    }
}

impl Rule for PatternRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: &str) -> Result<Rewrite, RuleError> {
        splice(&self.pattern, input, |caps| {
            let replacement = match &self.action {
                Action::Strip => String::new(),
                Action::Replace(template) => {
                    let mut dst = String::new();
                    caps.expand(template, &mut dst);
                    dst
                }
                Action::Compute(f) => f(caps)?,
            };
            Ok(Some(replacement))
        })
    }
}

impl std::fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}
