//! Run parameters consumed by the presets.
//!
//! Every section has defaults tuned for a WordPress/Elementor export, so a
//! bare `PatchConfig::default()` is usable. The CLI
//! crate layers a YAML file, environment variables and flags on top.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::presets::Preset;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Site domain whose absolute URLs are rewritten or stripped.
    pub domain: Option<String>,
    pub whatsapp: WhatsappSection,
    pub cache: CacheSection,
    pub inventory: InventorySection,
    pub performance: PerformanceSection,
    pub output: OutputSection,
    /// Presets chained by `htmlpatch run` when none are given on the command line.
    pub pipeline: Vec<Preset>,
}

impl PatchConfig {
    pub fn trace_loaded(&self) {
        info!(
            domain = self.domain.as_deref().unwrap_or("-"),
            cache_resources = self.cache.resources.len(),
            pipeline = self.pipeline.len(),
            "Loaded PatchConfig"
        );
        debug!(?self, "PatchConfig loaded (full debug)");
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsappSection {
    /// Digits only, international format without `+`.
    pub number: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Fixed token; defaults to the Unix timestamp at the start of the run.
    pub token: Option<String>,
    /// Query parameter name appended to problematic resources.
    pub key: String,
    /// Resource name fragments that get the cache-busting parameter.
    pub resources: Vec<String>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            token: None,
            key: "cb".to_string(),
            resources: strings(&[
                "protection.js",
                "frontend-lite.min34a7.css",
                "jquery.minf43b.js",
                "base.min72ad.css",
                "chaty-front.min7bd6.css",
                "pa-frontend-dc36db04f.min8039.css",
                "fontawesome.min52d5.css",
                "wpforms-full.minbf90.css",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventorySection {
    /// Site root; defaults to the directory containing the target file.
    pub root: Option<PathBuf>,
    pub uploads_dir: PathBuf,
    pub extensions: Vec<String>,
}

impl Default for InventorySection {
    fn default() -> Self {
        Self {
            root: None,
            uploads_dir: PathBuf::from("wp-content/uploads"),
            extensions: strings(&["png", "jpg", "jpeg", "webp", "gif"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreloadLink {
    pub href: String,
    #[serde(rename = "as")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSection {
    /// Stylesheets deferred by `optimize`.
    pub defer_styles: Vec<String>,
    /// Scripts deferred by `optimize`.
    pub defer_scripts: Vec<String>,
    /// Icon font stylesheets, deferred with `crossorigin`.
    pub icon_styles: Vec<String>,
    /// Stylesheets deferred by `advanced`.
    pub extra_defer_styles: Vec<String>,
    /// Stylesheets deferred by `heavy`.
    pub heavy_styles: Vec<String>,
    /// Main library script (jQuery) fragment.
    pub core_script: String,
    /// Compatibility shim loaded after the core script.
    pub migrate_script: String,
    pub preload: Vec<PreloadLink>,
    pub dns_prefetch: Vec<String>,
    /// Resources prefetched by the injected scripts after load.
    pub prefetch: Vec<String>,
}

impl Default for PerformanceSection {
    fn default() -> Self {
        Self {
            defer_styles: strings(&[
                "widget",
                "woo-",
                "mod-",
                "opt-",
                "chaty",
                "premium-addons",
                "essential-addons",
            ]),
            defer_scripts: strings(&["jquery-migrate", "scrollBar", "device"]),
            icon_styles: strings(&["fontawesome", "elementor-icons"]),
            extra_defer_styles: strings(&["swiper", "wpforms", "brands.min", "solid.min"]),
            heavy_styles: strings(&["frontend-lite.min", "chaty", "wpforms", "premium-addons"]),
            core_script: "jquery.min".to_string(),
            migrate_script: "jquery-migrate".to_string(),
            preload: vec![
                PreloadLink {
                    href: "wp-content/themes/woodmart/css/parts/base.min72ad.css".to_string(),
                    kind: "style".to_string(),
                },
                PreloadLink {
                    href: "wp-includes/js/jquery/jquery.minf43b.js".to_string(),
                    kind: "script".to_string(),
                },
                PreloadLink {
                    href: "wp-content/plugins/elementor/assets/css/frontend-lite.min34a7.css"
                        .to_string(),
                    kind: "style".to_string(),
                },
            ],
            dns_prefetch: strings(&["fonts.googleapis.com", "fonts.gstatic.com"]),
            prefetch: strings(&[
                "wp-content/themes/woodmart/css/parts/base.min72ad.css",
                "wp-includes/js/jquery/jquery.minf43b.js",
            ]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Copy the target to `<file>.bak` before overwriting it.
    pub backup: bool,
}

/// Values fixed once at the start of a run and shared by every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub cache_token: String,
    pub site_root: PathBuf,
}

impl RunParams {
    /// Resolve the cache token (configured value or current Unix time) and the
    /// site root (configured value or the target's directory).
    pub fn resolve(config: &PatchConfig, target: &Path) -> Self {
        let cache_token = config.cache.token.clone().unwrap_or_else(unix_timestamp);
        let site_root = config.inventory.root.clone().unwrap_or_else(|| {
            target
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        });
        debug!(cache_token = %cache_token, site_root = %site_root.display(), "Run parameters resolved");
        Self {
            cache_token,
            site_root,
        }
    }
}

fn unix_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
