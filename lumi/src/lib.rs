//! # Lumi
//!
//! Entry point for hosts embedding the light engine: config loading, logging setup and a
//! health check around [`ThreadedLevelLightEngine`].

use std::{path::Path, sync::Arc};

use anyhow::{Context, bail};
use lumi_core::{LightConfig, ThreadedLevelLightEngine, world::LumiWorld};

/// Log subscriber setup.
pub mod logger;

pub use lumi_core::{LightChannel, LightError, LightStorage, SectionState, world};
pub use lumi_utils::{BlockPos, SectionPos};

/// A light engine together with the config it was started from.
pub struct Lumi {
    engine: ThreadedLevelLightEngine,
    config: LightConfig,
}

impl Lumi {
    /// Starts an engine over `world`.
    pub fn new(world: Arc<dyn LumiWorld>, config: LightConfig) -> anyhow::Result<Self> {
        log::info!("Starting Lumi light engine");
        let engine = ThreadedLevelLightEngine::new(world, config.clone())?;
        Ok(Self { engine, config })
    }

    /// Loads the config at `path`, installs logging and starts an engine over `world`.
    ///
    /// A default config is written to `path` when none exists.
    pub fn from_config_file(world: Arc<dyn LumiWorld>, path: &Path) -> anyhow::Result<Self> {
        let config = LightConfig::load_or_create(path)
            .with_context(|| format!("failed to load light config from {}", path.display()))?;
        if let Err(err) = logger::init(&config.log_filter) {
            // Another subscriber is already installed, keep using it
            log::warn!("{err}");
        }
        Self::new(world, config)
    }

    /// The running engine.
    #[must_use]
    pub fn engine(&self) -> &ThreadedLevelLightEngine {
        &self.engine
    }

    /// The config the engine was started from.
    #[must_use]
    pub fn config(&self) -> &LightConfig {
        &self.config
    }

    /// Fails if a light worker has stopped on a fatal error.
    pub fn check_health(&self) -> anyhow::Result<()> {
        if let Some(err) = self.engine.take_fatal_error() {
            bail!("light worker failed: {err}");
        }
        Ok(())
    }

    /// Finishes all accepted work and stops the engine.
    pub fn shutdown(self) -> anyhow::Result<()> {
        self.engine.wait_until_idle();
        self.check_health()?;
        log::info!(
            "Light engine stopped with {} sections loaded",
            self.engine.loaded_sections().len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use lumi_core::world::{BlockLight, MemoryWorld};

    use super::*;

    #[test]
    fn test_from_config_file_writes_default() {
        let dir = env::temp_dir().join(format!("lumi-facade-{}", process::id()));
        let path = dir.join("lumi_config.json5");
        let _ = fs::remove_dir_all(&dir);

        let world = Arc::new(MemoryWorld::new(-64));
        let lumi = Lumi::from_config_file(world.clone(), &path).unwrap();
        assert!(path.exists());
        assert_eq!(lumi.config().sky_light_level, 15);

        let section = SectionPos::new(0, 0, 0);
        world.load_section(section);
        assert!(lumi.engine().notify_section_loaded(section));
        let pos = BlockPos::new(2, 2, 2);
        let old = world.set_block(pos, BlockLight::new(0, 7));
        assert!(lumi.engine().notify_block_changed(pos, old.opacity, old.emission));
        lumi.engine().wait_until_idle();

        assert_eq!(lumi.engine().query_light(pos, LightChannel::Block), Ok(7));
        lumi.check_health().unwrap();
        lumi.shutdown().unwrap();
        let _ = fs::remove_dir_all(&dir);
    }
}
