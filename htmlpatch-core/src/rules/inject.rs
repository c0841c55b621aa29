//! Inject-at-anchor and relocate-to-anchor rules.
//!
//! An anchor that cannot be found is a normal "document has no such anchor"
//! case: the rule reports no match and leaves the text alone.

use regex::Regex;

use crate::contract::{Rewrite, Rule, RuleError};

#[derive(Debug, Clone)]
pub enum Needle {
    Literal(String),
    Pattern(Regex),
}

impl Needle {
    /// Byte range of the first or last occurrence in `text`.
    fn find(&self, text: &str, occurrence: Occurrence) -> Option<(usize, usize)> {
        match (self, occurrence) {
            (Needle::Literal(s), Occurrence::First) => text.find(s.as_str()).map(|i| (i, i + s.len())),
            (Needle::Literal(s), Occurrence::Last) => text.rfind(s.as_str()).map(|i| (i, i + s.len())),
            (Needle::Pattern(re), Occurrence::First) => re.find(text).map(|m| (m.start(), m.end())),
            (Needle::Pattern(re), Occurrence::Last) => {
                re.find_iter(text).last().map(|m| (m.start(), m.end()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Before,
    After,
}

/// Where in the document a block goes.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub needle: Needle,
    pub occurrence: Occurrence,
    pub position: Position,
}

impl Anchor {
    pub fn after_first(marker: &str) -> Self {
        Self::literal(marker, Occurrence::First, Position::After)
    }

    pub fn before_first(marker: &str) -> Self {
        Self::literal(marker, Occurrence::First, Position::Before)
    }

    pub fn before_last(marker: &str) -> Self {
        Self::literal(marker, Occurrence::Last, Position::Before)
    }

    pub fn before_first_match(pattern: Regex) -> Self {
        Self {
            needle: Needle::Pattern(pattern),
            occurrence: Occurrence::First,
            position: Position::Before,
        }
    }

    pub fn after_first_match(pattern: Regex) -> Self {
        Self {
            needle: Needle::Pattern(pattern),
            occurrence: Occurrence::First,
            position: Position::After,
        }
    }

    fn literal(marker: &str, occurrence: Occurrence, position: Position) -> Self {
        Self {
            needle: Needle::Literal(marker.to_owned()),
            occurrence,
            position,
        }
    }

    /// Insertion offset in `text`, if the anchor exists.
    pub fn locate(&self, text: &str) -> Option<usize> {
        let (start, end) = self.needle.find(text, self.occurrence)?;
        Some(match self.position {
            Position::Before => start,
            Position::After => end,
        })
    }
}

/// Inserts a fixed block at an anchor, once.
///
/// The marker (by default the trimmed block itself) is looked up before
/// inserting; when it is already in the document the rule does nothing.
pub struct InjectRule {
    name: String,
    anchor: Anchor,
    block: String,
    marker: String,
}

impl InjectRule {
    pub fn new(name: impl Into<String>, anchor: Anchor, block: impl Into<String>) -> Self {
        let block = block.into();
        let marker = block.trim().to_owned();
        Self {
            name: name.into(),
            anchor,
            block,
            marker,
        }
    }

    /// Identify an earlier insertion by `marker` instead of the whole block.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }
}

impl Rule for InjectRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: &str) -> Result<Rewrite, RuleError> {
        if !self.marker.is_empty() && input.contains(&self.marker) {
            return Ok(Rewrite::unchanged(input));
        }
        let Some(at) = self.anchor.locate(input) else {
            return Ok(Rewrite::unchanged(input));
        };
        let mut out = String::with_capacity(input.len() + self.block.len());
        out.push_str(&input[..at]);
        out.push_str(&self.block);
        out.push_str(&input[at..]);
        Ok(Rewrite::changed(out, 1))
    }
}

/// Moves the first block matching a pattern to an anchor.
///
/// The anchor is located after the block has been cut out. Nothing is lost
/// when the anchor is missing: the document is returned as it was.
pub struct RelocateRule {
    name: String,
    block: Regex,
    anchor: Anchor,
}

impl RelocateRule {
    pub fn new(name: impl Into<String>, block: Regex, anchor: Anchor) -> Self {
        Self {
            name: name.into(),
            block,
            anchor,
        }
    }
}

impl Rule for RelocateRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, input: &str) -> Result<Rewrite, RuleError> {
        let Some(found) = self.block.find(input) else {
            return Ok(Rewrite::unchanged(input));
        };
        let block = found.as_str();
        let mut rest = String::with_capacity(input.len());
        rest.push_str(&input[..found.start()]);
        rest.push_str(&input[found.end()..]);

        let Some(at) = self.anchor.locate(&rest) else {
            return Ok(Rewrite::unchanged(input));
        };
        let mut out = String::with_capacity(input.len());
        out.push_str(&rest[..at]);
        out.push_str(block);
        out.push_str(&rest[at..]);

        if out == input {
            return Ok(Rewrite::unchanged(input));
        }
        Ok(Rewrite::changed(out, 1))
    }
}
