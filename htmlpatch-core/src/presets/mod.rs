//! Named rule sets, one per CLI subcommand.
//!
//! A preset turns a [`PatchConfig`] and the per-run [`RunParams`] into a
//! [`Pipeline`]. Presets can be chained: `run` appends several pipelines and
//! applies them in one load/save.

mod assets;
mod cache;
mod clean;
mod domain;
mod images;
mod performance;
mod whatsapp;

pub use domain::remaining_mentions;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{PatchConfig, RunParams};
use crate::executor::Pipeline;
use crate::inventory::InventoryError;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error("missing parameter `{0}`: set it in the config file or on the command line")]
    MissingParameter(&'static str),
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown preset `{0}`")]
pub struct UnknownPreset(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Strip tracking, fonts, feeds and chat widgets.
    Clean,
    /// Make every reference to the site domain relative.
    Domain,
    /// Point WhatsApp links at one number and message.
    Whatsapp,
    /// Validate image references against the files on disk.
    Images,
    /// Force clients and CDNs to refetch resources.
    CacheBust,
    /// Inline basic critical CSS and defer non-critical resources.
    Optimize,
    /// Advanced critical CSS, lazy images, preconnects.
    Advanced,
    /// Defer the heaviest render-blocking resources.
    Heavy,
    /// Settle script order and resource hints.
    Finalize,
}

impl Preset {
    pub const ALL: [Preset; 9] = [
        Preset::Clean,
        Preset::Domain,
        Preset::Whatsapp,
        Preset::Images,
        Preset::CacheBust,
        Preset::Optimize,
        Preset::Advanced,
        Preset::Heavy,
        Preset::Finalize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Clean => "clean",
            Preset::Domain => "domain",
            Preset::Whatsapp => "whatsapp",
            Preset::Images => "images",
            Preset::CacheBust => "cache-bust",
            Preset::Optimize => "optimize",
            Preset::Advanced => "advanced",
            Preset::Heavy => "heavy",
            Preset::Finalize => "finalize",
        }
    }

    pub fn build(&self, config: &PatchConfig, params: &RunParams) -> Result<Pipeline, PresetError> {
        let pipeline = match self {
            Preset::Clean => clean::pipeline(config)?,
            Preset::Domain => domain::pipeline(config)?,
            Preset::Whatsapp => whatsapp::pipeline(config)?,
            Preset::Images => images::pipeline(config, params)?,
            Preset::CacheBust => cache::pipeline(config, params)?,
            Preset::Optimize => performance::optimize(config)?,
            Preset::Advanced => performance::advanced(config)?,
            Preset::Heavy => performance::heavy(config)?,
            Preset::Finalize => performance::finalize(config)?,
        };
        info!(preset = %self, rules = pipeline.len(), "Preset built");
        Ok(pipeline)
    }
}

/// Build and concatenate several presets, in order.
pub fn chain(
    presets: &[Preset],
    config: &PatchConfig,
    params: &RunParams,
) -> Result<Pipeline, PresetError> {
    let mut pipeline = Pipeline::new();
    for preset in presets {
        pipeline.append(preset.build(config, params)?);
    }
    Ok(pipeline)
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clean" => Ok(Preset::Clean),
            "domain" | "remove-domain" => Ok(Preset::Domain),
            "whatsapp" => Ok(Preset::Whatsapp),
            "images" | "fix-images" => Ok(Preset::Images),
            "cache-bust" | "cache_bust" | "cachebust" => Ok(Preset::CacheBust),
            "optimize" | "performance" => Ok(Preset::Optimize),
            "advanced" => Ok(Preset::Advanced),
            "heavy" => Ok(Preset::Heavy),
            "finalize" | "final" => Ok(Preset::Finalize),
            _ => Err(UnknownPreset(s.to_string())),
        }
    }
}

/// Escape a value for use inside a double-quoted HTML attribute.
pub(crate) fn attr_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
