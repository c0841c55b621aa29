//! Blocks injected into documents. `{token}`, `{key}` and `{prefetch}` are
//! filled in by the presets.

pub const CRITICAL_INLINE: &str = include_str!("../../assets/critical-inline.html");
pub const CRITICAL_ADVANCED: &str = include_str!("../../assets/critical-advanced.html");
pub const CRITICAL_ABOVE_FOLD: &str = include_str!("../../assets/critical-above-fold.html");
pub const LAZY_IMAGES: &str = include_str!("../../assets/lazy-images.html");
pub const PROGRESSIVE_LOADING: &str = include_str!("../../assets/progressive-loading.html");
pub const DEPS_INIT: &str = include_str!("../../assets/deps-init.html");
pub const NO_CACHE_META: &str = include_str!("../../assets/no-cache-meta.html");
pub const CACHE_REFRESH: &str = include_str!("../../assets/cache-refresh.html");
