//! Concrete [`Rule`](crate::contract::Rule) kinds.
//!
//! Each kind is a reusable transformation shape; presets configure them with
//! patterns and run parameters. Guards the `regex` crate cannot express (no
//! look-around) are checked in Rust inside the match callbacks.

mod defer;
mod images;
mod inject;
mod pattern;
mod token;

pub use defer::{DeferScript, DeferStylesheet, ScriptLoading};
pub use images::InventoryRule;
pub use inject::{Anchor, InjectRule, Needle, Occurrence, Position, RelocateRule};
pub use pattern::{Action, PatternRule};
pub use token::TokenAppend;

use regex::{Captures, Regex};

use crate::contract::{Rewrite, RuleError};

/// Replace every match of `pattern` with whatever `replace` returns.
///
/// `None` keeps the match as it is. Only replacements that differ from the
/// matched text are spliced in and counted.
pub(crate) fn splice<F>(pattern: &Regex, input: &str, mut replace: F) -> Result<Rewrite, RuleError>
where
    F: FnMut(&Captures<'_>) -> Result<Option<String>, RuleError>,
{
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    let mut count = 0;

    for caps in pattern.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(replacement) = replace(&caps)? else {
            continue;
        };
        if replacement == whole.as_str() {
            continue;
        }
        out.push_str(&input[last..whole.start()]);
        out.push_str(&replacement);
        last = whole.end();
        count += 1;
    }

    if count == 0 {
        return Ok(Rewrite::unchanged(input));
    }
    out.push_str(&input[last..]);
    Ok(Rewrite::changed(out, count))
}

/// Byte offset where the match in `caps` starts.
pub(crate) fn match_start(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.start())
}
