//! Pipeline Configuration
//!
//! Tunables for lazy loading, concurrency, and compression targets.

use std::time::Duration;

use crate::placeholder::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::resolve::ImageRole;

/// Compression quality target per image role, on a 0-100 scale.
#[derive(Debug, Clone)]
pub struct CompressionLevels {
    pub hero: u8,
    pub content: u8,
    pub thumbnail: u8,
    pub background: u8,
}

impl Default for CompressionLevels {
    fn default() -> Self {
        Self {
            hero: 90,
            content: 80,
            thumbnail: 70,
            background: 60,
        }
    }
}

impl CompressionLevels {
    /// Quality target for a role.
    pub fn quality(&self, role: ImageRole) -> u8 {
        match role {
            ImageRole::Hero => self.hero,
            ImageRole::Content => self.content,
            ImageRole::Thumbnail => self.thumbnail,
            ImageRole::Background => self.background,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Defer loads until slots approach the viewport.
    pub lazy_load_enabled: bool,

    /// Pre-trigger margin around the viewport, in logical pixels.
    pub root_margin: f32,

    /// Minimum visible fraction of a slot before its load is triggered.
    pub threshold: f32,

    /// Maximum overlapping in-flight image loads.
    pub max_concurrent_loads: usize,

    /// Bound on a single load attempt before it is treated as failed.
    pub load_timeout: Duration,

    /// Quality targets per image role.
    pub compression_levels: CompressionLevels,

    /// Placeholder dimensions for slots that declare none.
    pub placeholder_size: (u32, u32),

    /// Origin of the hosting page, for same-origin candidate rewriting.
    pub page_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lazy_load_enabled: true,
            root_margin: 50.0,
            threshold: 0.1,
            max_concurrent_loads: 6,
            load_timeout: Duration::from_secs(10),
            compression_levels: CompressionLevels::default(),
            placeholder_size: (DEFAULT_WIDTH, DEFAULT_HEIGHT),
            page_origin: "http://localhost".to_string(),
        }
    }
}

/// What the hosting environment can provide.
#[derive(Debug, Clone, Copy)]
pub struct Platform {
    /// Whether viewport-intersection tracking is available. Without it the
    /// pipeline loads every discovered slot eagerly.
    pub intersection_observer: bool,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            intersection_observer: true,
        }
    }
}
