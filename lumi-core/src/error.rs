//! Error types for the light engine.

use lumi_utils::{BlockPos, SectionPos};
use thiserror::Error;

use crate::chunk::section::SectionState;

/// Conditions raised while reading, writing or scheduling light.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LightError {
    /// The coordinate is not inside a loaded section.
    #[error("block {0} is not in a loaded section")]
    NotLoaded(BlockPos),
    /// The coordinate is outside the configured world bounds.
    #[error("request targets {0}, which is outside the world bounds")]
    MalformedRequest(SectionPos),
    /// The section is locked by another light pass.
    #[error("{0} is locked by another light pass")]
    SectionBusy(SectionPos),
    /// A section lock was requested against the global lock order.
    #[error("lock order violation: waited for {requested} while holding {held}")]
    LockOrderViolation {
        /// The highest section held when the violation happened.
        held: SectionPos,
        /// The section whose lock was requested.
        requested: SectionPos,
    },
    /// A section lifecycle transition that the state machine does not allow.
    #[error("{section} cannot move from {from:?} to {to:?}")]
    IllegalTransition {
        /// The section being transitioned.
        section: SectionPos,
        /// The state the section was in.
        from: SectionState,
        /// The state that was requested.
        to: SectionState,
    },
}

/// Errors raised while loading the light configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read or written.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON5 for `LightConfig`.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
