// 🏥 Clinic - both registries plus the attention queue
//
// The registries stay independent (each link operation touches one side
// only). Clinic is where the two sides are updated together.

use std::fs;
use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ClinicConfig;
use crate::entities::{AnimalRegistry, OwnerRegistry};
use crate::error::{ClinicError, Result};
use crate::queue::AttentionQueue;

/// What a CSV import changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub animals_added: bool,
    pub vaccines_added: bool,
    /// false when at least one owner row was skipped
    pub owners_all_added: bool,
}

#[derive(Debug, Default)]
pub struct Clinic {
    animals: AnimalRegistry,
    owners: OwnerRegistry,
    queue: AttentionQueue,
}

impl Clinic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn animals(&self) -> &AnimalRegistry {
        &self.animals
    }

    /// Registry-level mutation; linking through here touches the animal side only
    pub fn animals_mut(&mut self) -> &mut AnimalRegistry {
        &mut self.animals
    }

    pub fn owners(&self) -> &OwnerRegistry {
        &self.owners
    }

    /// Registry-level mutation; linking through here touches the owner side only
    pub fn owners_mut(&mut self) -> &mut OwnerRegistry {
        &mut self.owners
    }

    /// Read-only: animals enter through `enqueue_for_appointment` and leave
    /// through `attend_next`
    pub fn queue(&self) -> &AttentionQueue {
        &self.queue
    }

    /// Link both sides of the relationship in one step.
    ///
    /// Animal and owner are resolved before either is mutated, so a NotFound
    /// on one side leaves the other untouched.
    pub fn link_animal_and_owner(&mut self, animal_id: Uuid, username: &str) -> Result<()> {
        let owner_id = self.owners.get_by_username(username)?.id();
        self.animals.get(animal_id)?;

        self.animals.link_owner(animal_id, owner_id)?;
        self.owners.link_animal(username, animal_id)?;

        info!("Linked animal {} with owner {}", animal_id, username);
        Ok(())
    }

    pub fn enqueue_for_appointment(&mut self, animal_id: Uuid) -> Result<bool> {
        self.animals.enqueue_for_appointment(animal_id, &mut self.queue)
    }

    /// Vaccinate the animal at the head of the queue
    pub fn attend_next(&mut self, brand: &str, volume_in_ml: i32) -> Result<Option<Uuid>> {
        self.animals
            .add_vaccine_to_queued_animal(&mut self.queue, brand, volume_in_ml)
    }

    pub fn owners_report(&self) -> Result<Vec<String>> {
        self.owners.owners_report(&self.animals)
    }

    pub fn animals_and_owners_report(&self) -> Result<Vec<String>> {
        self.animals.animals_and_owners_report(&self.owners)
    }

    // ========================================================================
    // CSV
    // ========================================================================

    /// Load animals, then their vaccines, then owners. A file that does not
    /// exist is skipped.
    pub fn import_csv(&mut self, config: &ClinicConfig) -> Result<ImportSummary> {
        let delimiter = delimiter_of(config)?;
        let mut summary = ImportSummary {
            owners_all_added: true,
            ..ImportSummary::default()
        };

        let animals_path = config.animals_csv_path();
        if exists_or_warn(&animals_path) {
            summary.animals_added = self.animals.load_csv(&animals_path, delimiter)?;
        }

        let vaccines_path = config.vaccines_csv_path();
        if exists_or_warn(&vaccines_path) {
            summary.vaccines_added = self.animals.load_vaccines_csv(&vaccines_path, delimiter)?;
        }

        let owners_path = config.owners_csv_path();
        if exists_or_warn(&owners_path) {
            summary.owners_all_added = self.owners.load_csv(&owners_path, delimiter)?;
        }

        Ok(summary)
    }

    /// Write animals, vaccines and owners as CSV
    pub fn export_csv(&self, config: &ClinicConfig) -> Result<()> {
        let delimiter = delimiter_of(config)?;
        ensure_dir(&config.data_dir)?;

        self.animals.save_csv(&config.animals_csv_path(), delimiter)?;
        self.animals
            .save_vaccines_csv(&config.vaccines_csv_path(), delimiter)?;
        self.owners.save_csv(&config.owners_csv_path(), delimiter)?;
        Ok(())
    }

    pub fn write_expired_report(&self, config: &ClinicConfig) -> Result<usize> {
        ensure_dir(&config.data_dir)?;
        self.animals
            .write_expired_report(&config.expired_report_path())
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    pub fn save_state(&self, config: &ClinicConfig) -> Result<()> {
        ensure_dir(&config.data_dir)?;
        self.animals.save_snapshot(&config.animals_snapshot_path())?;
        self.owners.save_snapshot(&config.owners_snapshot_path())?;
        Ok(())
    }

    /// Replace both registries from their snapshots. Neither is replaced
    /// unless both load. Queued ids are kept; ones that no longer resolve
    /// surface as NotFound when attended.
    pub fn load_state(&mut self, config: &ClinicConfig) -> Result<()> {
        let mut animals = AnimalRegistry::new();
        animals.load_snapshot(&config.animals_snapshot_path())?;

        let mut owners = OwnerRegistry::new();
        owners.load_snapshot(&config.owners_snapshot_path())?;

        self.animals = animals;
        self.owners = owners;
        Ok(())
    }
}

fn delimiter_of(config: &ClinicConfig) -> Result<u8> {
    config
        .delimiter_byte()
        .map_err(|e| ClinicError::format(0, e.to_string()))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ClinicError::io(dir, e))
}

fn exists_or_warn(path: &Path) -> bool {
    if path.exists() {
        return true;
    }
    warn!("Skipping {}: file not found", path.display());
    false
}

// ============================================================================
// TESTS
// ============================================================================
