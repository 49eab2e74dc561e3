//! Last known position

use std::sync::RwLock;

use crate::errors::{TrackError, TrackResult};
use crate::types::Estimate;

/// Single-slot holder for the most recent estimate; no history, no expiry
#[derive(Debug, Default)]
pub struct PositionCache {
    slot: RwLock<Option<Estimate>>,
}

impl PositionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored estimate
    pub fn set(&self, estimate: Estimate) -> TrackResult<()> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| TrackError::LockPoisoned { resource: "position cache" })?;
        *slot = Some(estimate);
        Ok(())
    }

    /// Last stored estimate, `None` before the first successful localization
    pub fn get(&self) -> TrackResult<Option<Estimate>> {
        self.slot
            .read()
            .map(|slot| *slot)
            .map_err(|_| TrackError::LockPoisoned { resource: "position cache" })
    }

    /// Forget the stored estimate
    pub fn clear(&self) -> TrackResult<()> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| TrackError::LockPoisoned { resource: "position cache" })?;
        *slot = None;
        Ok(())
    }
}
