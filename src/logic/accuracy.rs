//! Accuracy Control Store
//!
//! Process-wide degradation settings. Readers get a whole snapshot; writers
//! replace the whole snapshot. A rejected write leaves the stored value as-is.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::models::{AccuracySettings, ValidationError};

#[derive(Debug)]
pub struct AccuracyStore {
    current: RwLock<AccuracySettings>,
    revision: AtomicU64,
}

impl AccuracyStore {
    /// Create a store seeded with `initial`, which must itself be in bounds.
    pub fn new(initial: AccuracySettings) -> Result<Self, ValidationError> {
        initial.check()?;
        Ok(Self {
            current: RwLock::new(initial),
            revision: AtomicU64::new(0),
        })
    }

    /// Current snapshot
    pub fn get(&self) -> AccuracySettings {
        *self.current.read()
    }

    /// Validate and atomically replace the snapshot.
    pub fn set(&self, candidate: AccuracySettings) -> Result<AccuracySettings, ValidationError> {
        if let Err(err) = candidate.check() {
            tracing::warn!("Rejected accuracy settings write: {}", err);
            return Err(err);
        }

        let mut current = self.current.write();
        *current = candidate;
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        drop(current);

        tracing::info!(
            "Accuracy settings updated (rev {}): enabled={}, target={}, noise={:.2}, bias={:.2}",
            revision,
            candidate.enabled,
            candidate.target_percentage(),
            candidate.noise_factor,
            candidate.bias_factor,
        );

        Ok(candidate)
    }

    /// Number of accepted writes since start-up
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

impl Default for AccuracyStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(AccuracySettings::default()),
            revision: AtomicU64::new(0),
        }
    }
}
