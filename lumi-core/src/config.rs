//! Engine settings, loaded from a JSON5 file.

use std::{fs, path::Path, time::Duration};

use lumi_utils::SectionPos;
use serde::Deserialize;

use crate::{chunk::light_storage::MAX_LIGHT, error::ConfigError};

/// Lowest section y of the default world.
pub const DEFAULT_MIN_SECTION_Y: i32 = -4;

/// The bundled default config file.
pub const DEFAULT_CONFIG: &str = include_str!("../../package-content/lumi_config.json5");

/// Settings for the light engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Threads in the light worker pool. `0` means requests only drain through `run_pending`.
    pub worker_threads: usize,
    /// Maximum requests one worker takes from a section queue per claim.
    pub batch_size: usize,
    /// How long an in-order neighbour lock may be waited for before deferring.
    pub lock_wait_micros: u64,
    /// Initial capacity of the propagation frontiers.
    pub queue_capacity: usize,
    /// Whether the world has a sky light channel.
    pub has_sky: bool,
    /// Ambient sky light strength at sky-exposed blocks.
    pub sky_light_level: u8,
    /// Lowest section y in the world.
    pub min_section_y: i32,
    /// Highest section y in the world.
    pub max_section_y: i32,
    /// Horizontal world bound, in sections from the origin.
    pub max_section_xz: i32,
    /// Default log filter.
    pub log_filter: String,
}

impl LightConfig {
    /// Loads the config at `path`, writing the bundled default there first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let config_str = fs::read_to_string(path)?;
            serde_json5::from_str::<LightConfig>(&config_str)?
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            log::info!("Wrote default light config to {}", path.display());
            Self::default()
        };
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.batch_size == 0 {
            return Err("Batch size must be at least 1");
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be at least 1");
        }
        if self.sky_light_level > MAX_LIGHT {
            return Err("Sky light level must be in range 0..=15");
        }
        if self.min_section_y > self.max_section_y {
            return Err("Minimum section y must not exceed maximum section y");
        }
        if self.max_section_xz <= 0 {
            return Err("Horizontal section bound must be positive");
        }
        Ok(())
    }

    /// Whether `section` lies inside the configured world bounds.
    #[must_use]
    pub fn contains_section(&self, section: SectionPos) -> bool {
        (self.min_section_y..=self.max_section_y).contains(&section.0.y)
            && section.0.x.abs() <= self.max_section_xz
            && section.0.z.abs() <= self.max_section_xz
    }

    /// The bounded wait for in-order neighbour locks.
    #[must_use]
    pub fn lock_wait(&self) -> Duration {
        Duration::from_micros(self.lock_wait_micros)
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            batch_size: 256,
            lock_wait_micros: 500,
            queue_capacity: 4096,
            has_sky: true,
            sky_light_level: MAX_LIGHT,
            min_section_y: DEFAULT_MIN_SECTION_Y,
            max_section_y: 19,
            max_section_xz: 1_875_000,
            log_filter: "info".to_string(),
        }
    }
}
