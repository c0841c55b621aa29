//! Rule executor: folds an ordered rule list over a document.
//!
//! Rule i always sees the output of rule i-1. A rule that fails is skipped:
//! the document passes through unchanged, the failure is logged and reported,
//! and the next rule runs. Rules are independent by construction, so one bad
//! rule must not block the rest.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::contract::Rule;
use crate::document::Document;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    Applied { substitutions: usize },
    NoMatch,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub rule: String,
    pub outcome: RuleOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RuleReport {
    pub fn substitutions(&self) -> usize {
        match self.outcome {
            RuleOutcome::Applied { substitutions } => substitutions,
            _ => 0,
        }
    }
}

/// Per-rule accounting for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub rules: Vec<RuleReport>,
}

impl RunReport {
    pub fn total_substitutions(&self) -> usize {
        self.rules.iter().map(RuleReport::substitutions).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleReport> {
        self.rules
            .iter()
            .filter(|r| matches!(r.outcome, RuleOutcome::Failed { .. }))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .flat_map(|r| r.warnings.iter().map(String::as_str))
    }

    /// True when no rule changed anything.
    pub fn is_noop(&self) -> bool {
        self.total_substitutions() == 0
    }

    pub fn extend(&mut self, other: RunReport) {
        self.rules.extend(other.rules);
    }
}

/// Apply one rule to a document.
///
/// On failure the input document is returned untouched alongside a
/// [`RuleOutcome::Failed`] report.
pub fn apply_rule(document: Document, rule: &dyn Rule) -> (Document, RuleReport) {
    let name = rule.name().to_owned();
    match rule.apply(document.as_str()) {
        Ok(rewrite) if rewrite.substitutions == 0 => {
            debug!(rule = %name, "No references found");
            for warning in &rewrite.warnings {
                warn!(rule = %name, warning = %warning, "Rule reported a warning");
            }
            (
                document,
                RuleReport {
                    rule: name,
                    outcome: RuleOutcome::NoMatch,
                    warnings: rewrite.warnings,
                },
            )
        }
        Ok(rewrite) => {
            info!(rule = %name, substitutions = rewrite.substitutions, "Rule applied");
            for warning in &rewrite.warnings {
                warn!(rule = %name, warning = %warning, "Rule reported a warning");
            }
            (
                Document::new(rewrite.text),
                RuleReport {
                    rule: name,
                    outcome: RuleOutcome::Applied {
                        substitutions: rewrite.substitutions,
                    },
                    warnings: rewrite.warnings,
                },
            )
        }
        Err(e) => {
            warn!(rule = %name, error = %e, "Rule failed, skipping");
            (
                document,
                RuleReport {
                    rule: name,
                    outcome: RuleOutcome::Failed {
                        error: e.to_string(),
                    },
                    warnings: Vec::new(),
                },
            )
        }
    }
}

/// An ordered list of rules.
#[derive(Default)]
pub struct Pipeline {
    rules: Vec<Box<dyn Rule>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn push(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Append every rule of `other`, keeping order.
    pub fn append(&mut self, other: Pipeline) {
        self.rules.extend(other.rules);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn run(&self, document: Document) -> (Document, RunReport) {
        info!(rules = self.rules.len(), bytes = document.len(), "Running pipeline");
        let (document, rules) = self.rules.iter().fold(
            (document, Vec::with_capacity(self.rules.len())),
            |(document, mut reports), rule| {
                let (document, report) = apply_rule(document, rule.as_ref());
                reports.push(report);
                (document, reports)
            },
        );
        let report = RunReport { rules };
        info!(
            substitutions = report.total_substitutions(),
            failed = report.failures().count(),
            "Pipeline finished"
        );
        (document, report)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("rules", &self.rule_names())
            .finish()
    }
}

impl FromIterator<Box<dyn Rule>> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Box<dyn Rule>>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
