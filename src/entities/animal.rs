// 🐾 Animal Entity - patient with vaccination history
//
// "Animal name is a VALUE (can change), Animal UUID is IDENTITY (never changes)"
//
// Relationships:
// - vaccines: ordered administration history (duplicates allowed)
// - owner_ids: set of Owner ids. Owner.animal_ids is kept separately and is
//   NOT synchronized from here; callers update both sides, or use
//   `Clinic::link_animal_and_owner` which does it in one step.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::owner::OwnerRegistry;
use super::vaccine::{today, Vaccine};
use crate::csv_codec;
use crate::error::{ClinicError, Result};
use crate::export::write_text_file;
use crate::queue::AttentionQueue;
use crate::snapshot::{self, SnapshotKind};
use crate::validation::{require_at_least, require_non_empty, ValidationError, ValidationResult};

pub const MINIMUM_AGE: i32 = 0;

// ============================================================================
// ANIMAL ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    // ========================================================================
    // IDENTITY - never changes
    // ========================================================================
    id: Uuid,

    // ========================================================================
    // VALUES - re-validated on every change
    // ========================================================================
    name: String,
    age: i32,

    // ========================================================================
    // RELATIONSHIPS
    // ========================================================================
    /// Administration order
    vaccines: Vec<Vaccine>,
    owner_ids: BTreeSet<Uuid>,
}

impl Animal {
    /// Create new animal with a fresh UUID
    pub fn new(name: &str, age: i32) -> std::result::Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), name, age)
    }

    /// Rebuild an animal whose identity already exists (CSV load)
    pub fn with_id(id: Uuid, name: &str, age: i32) -> std::result::Result<Self, ValidationError> {
        require_non_empty("name", name)?;
        require_at_least("age", age, MINIMUM_AGE)?;

        Ok(Animal {
            id,
            name: name.to_string(),
            age,
            vaccines: Vec::new(),
            owner_ids: BTreeSet::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn vaccines(&self) -> &[Vaccine] {
        &self.vaccines
    }

    pub fn owner_ids(&self) -> impl Iterator<Item = &Uuid> + '_ {
        self.owner_ids.iter()
    }

    pub fn has_owner(&self, owner_id: Uuid) -> bool {
        self.owner_ids.contains(&owner_id)
    }

    pub fn set_name(&mut self, name: &str) -> ValidationResult {
        require_non_empty("name", name)?;
        self.name = name.to_string();
        Ok(())
    }

    pub fn set_age(&mut self, age: i32) -> ValidationResult {
        require_at_least("age", age, MINIMUM_AGE)?;
        self.age = age;
        Ok(())
    }

    /// Returns false when the owner was already linked
    pub fn add_owner_id(&mut self, owner_id: Uuid) -> bool {
        self.owner_ids.insert(owner_id)
    }

    pub fn add_vaccine(&mut self, vaccine: Vaccine) {
        self.vaccines.push(vaccine);
    }

    pub fn add_vaccines<I: IntoIterator<Item = Vaccine>>(&mut self, vaccines: I) {
        self.vaccines.extend(vaccines);
    }

    /// Brands in first-administered order, without repeats
    pub fn unique_brands(&self) -> Vec<&str> {
        let mut brands: Vec<&str> = Vec::new();
        for vaccine in &self.vaccines {
            if !brands.contains(&vaccine.brand()) {
                brands.push(vaccine.brand());
            }
        }
        brands
    }

    /// Re-check invariants after a decode that bypassed the constructors
    pub fn validate(&self) -> ValidationResult {
        require_non_empty("name", &self.name)?;
        require_at_least("age", self.age, MINIMUM_AGE)?;
        self.vaccines.iter().try_for_each(Vaccine::validate)
    }
}

impl fmt::Display for Animal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id: {} name: '{}' age: {}", self.id, self.name, self.age)
    }
}

// ============================================================================
// ANIMAL REGISTRY
// ============================================================================

/// Owned collection of animals, kept in insertion order.
///
/// Lookups are linear scans; "first match wins" for names.
#[derive(Debug, Clone, Default)]
pub struct AnimalRegistry {
    animals: Vec<Animal>,
}

impl AnimalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, assign an id and append
    pub fn add(&mut self, name: &str, age: i32) -> Result<&Animal> {
        let animal = Animal::new(name, age)?;
        info!("Registered animal {} ({})", animal.name(), animal.id());

        let index = self.animals.len();
        self.animals.push(animal);
        Ok(&self.animals[index])
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<&Animal> {
        self.animals.iter().find(|a| a.id == id)
    }

    fn find_by_id_mut(&mut self, id: Uuid) -> Option<&mut Animal> {
        self.animals.iter_mut().find(|a| a.id == id)
    }

    /// First animal whose name matches exactly (case-sensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&Animal> {
        self.animals.iter().find(|a| a.name == name)
    }

    /// Every animal whose name matches ignoring case, in collection order
    pub fn search_by_name_ignore_case(&self, name: &str) -> Vec<&Animal> {
        let needle = name.to_lowercase();
        self.animals
            .iter()
            .filter(|a| a.name.to_lowercase() == needle)
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Result<&Animal> {
        self.find_by_id(id)
            .ok_or_else(|| ClinicError::not_found("Animal", id))
    }

    pub fn animals(&self) -> &[Animal] {
        &self.animals
    }

    /// Point-in-time ids for display and later selection
    pub fn animal_ids(&self) -> Vec<Uuid> {
        self.animals.iter().map(|a| a.id).collect()
    }

    pub fn len(&self) -> usize {
        self.animals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }

    // ========================================================================
    // VACCINATION
    // ========================================================================

    /// Apply a vaccine dated today to the first animal with this exact name
    pub fn add_vaccine_by_name(&mut self, name: &str, volume_in_ml: i32, brand: &str) -> Result<Uuid> {
        let vaccine = Vaccine::new(volume_in_ml, brand)?;
        let vaccine_id = vaccine.id();

        let animal = self
            .animals
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| ClinicError::not_found("Animal", name))?;
        animal.add_vaccine(vaccine);

        info!("Applied {} ({} ml) to {}", brand, volume_in_ml, name);
        Ok(vaccine_id)
    }

    /// Attend the head of the queue and apply a vaccine dated today.
    ///
    /// An empty queue is a no-op and returns `Ok(None)`. The vaccine is
    /// validated before the queue is touched; a queued id that no longer
    /// resolves is still removed from the queue and reported as NotFound.
    pub fn add_vaccine_to_queued_animal(
        &mut self,
        queue: &mut AttentionQueue,
        brand: &str,
        volume_in_ml: i32,
    ) -> Result<Option<Uuid>> {
        if queue.is_empty() {
            return Ok(None);
        }

        let vaccine = Vaccine::new(volume_in_ml, brand)?;
        let Some(animal_id) = queue.dequeue() else {
            return Ok(None);
        };

        let animal = self
            .find_by_id_mut(animal_id)
            .ok_or_else(|| ClinicError::not_found("Animal", animal_id))?;
        animal.add_vaccine(vaccine);

        info!("Attended {} from queue with {} ({} ml)", animal.name, brand, volume_in_ml);
        Ok(Some(animal_id))
    }

    // ========================================================================
    // LINKING & APPOINTMENTS
    // ========================================================================

    /// Add `owner_id` to the animal's owner set. Only this side of the
    /// relationship is touched.
    pub fn link_owner(&mut self, animal_id: Uuid, owner_id: Uuid) -> Result<Uuid> {
        let animal = self
            .find_by_id_mut(animal_id)
            .ok_or_else(|| ClinicError::not_found("Animal", animal_id))?;
        animal.add_owner_id(owner_id);
        Ok(animal.id)
    }

    /// Queue the animal unless it is already waiting
    pub fn enqueue_for_appointment(&self, animal_id: Uuid, queue: &mut AttentionQueue) -> Result<bool> {
        let animal = self.get(animal_id)?;
        if queue.contains(animal) {
            return Ok(false);
        }
        Ok(queue.enqueue(animal))
    }

    // ========================================================================
    // REPORTS
    // ========================================================================

    /// `"<name> Number of vaccines: <n>"` per animal
    pub fn vaccine_count_report(&self) -> Vec<String> {
        self.animals
            .iter()
            .map(|a| format!("{} Number of vaccines: {}", a.name, a.vaccines.len()))
            .collect()
    }

    /// Brands across all animals, first-seen order, no repeats
    pub fn unique_brands_report(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut brands = Vec::new();
        for animal in &self.animals {
            for brand in animal.unique_brands() {
                if seen.insert(brand) {
                    brands.push(brand.to_string());
                }
            }
        }
        brands
    }

    pub fn expired_vaccines_report(&self) -> Vec<String> {
        self.expired_vaccines_report_on(today())
    }

    /// One line per (animal, expired vaccine) pair as of `on`
    pub fn expired_vaccines_report_on(&self, on: NaiveDate) -> Vec<String> {
        self.animals
            .iter()
            .flat_map(|animal| {
                animal
                    .vaccines
                    .iter()
                    .filter(move |v| v.is_expired_on(on))
                    .map(move |v| {
                        format!(
                            "{} has {} of {} ml expired on {}",
                            animal.name,
                            v.brand(),
                            v.volume_in_ml(),
                            v.date_of_next_application()
                        )
                    })
            })
            .collect()
    }

    pub fn animal_names(&self) -> Vec<String> {
        self.animals.iter().map(|a| a.name.clone()).collect()
    }

    /// `"<name> Owners: <owner names>"` per animal. An owner id that does not
    /// resolve is a NotFound error, not a silent skip.
    pub fn animals_and_owners_report(&self, owners: &OwnerRegistry) -> Result<Vec<String>> {
        self.animals
            .iter()
            .map(|animal| -> Result<String> {
                let names = animal
                    .owner_ids
                    .iter()
                    .map(|id| owners.get_by_id(*id).map(|o| o.name().to_string()))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{} Owners: {}", animal.name, names.join(", ")))
            })
            .collect()
    }

    pub fn write_expired_report(&self, path: &Path) -> Result<usize> {
        write_text_file(path, self.expired_vaccines_report())
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Append animals from CSV. Rows whose id is already registered are
    /// skipped. Returns true iff the collection grew.
    pub fn load_csv(&mut self, path: &Path, delimiter: u8) -> Result<bool> {
        let loaded = csv_codec::read_animals(path, delimiter)?;
        let before = self.animals.len();

        for animal in loaded {
            if self.find_by_id(animal.id).is_some() {
                warn!("Skipping animal {} ({}): id already registered", animal.name, animal.id);
                continue;
            }
            self.animals.push(animal);
        }

        let added = self.animals.len() - before;
        info!("Loaded {} animals from {}", added, path.display());
        Ok(added > 0)
    }

    pub fn save_csv(&self, path: &Path, delimiter: u8) -> Result<usize> {
        let written = csv_codec::write_animals(path, delimiter, &self.animals)?;
        info!("Saved {} animals to {}", written, path.display());
        Ok(written)
    }

    /// Attach vaccines from CSV to already-loaded animals.
    ///
    /// The whole file is parsed before anything is applied. Vaccines are then
    /// applied per animal in first-seen order; an unknown animal id stops the
    /// load with NotFound and leaves earlier animals' vaccines in place.
    pub fn load_vaccines_csv(&mut self, path: &Path, delimiter: u8) -> Result<bool> {
        let rows = csv_codec::read_vaccines(path, delimiter)?;

        let mut grouped: Vec<(Uuid, Vec<Vaccine>)> = Vec::new();
        for (animal_id, vaccine) in rows {
            match grouped.iter_mut().find(|(id, _)| *id == animal_id) {
                Some((_, vaccines)) => vaccines.push(vaccine),
                None => grouped.push((animal_id, vec![vaccine])),
            }
        }

        let mut applied = 0;
        for (animal_id, vaccines) in grouped {
            let animal = self.find_by_id_mut(animal_id).ok_or_else(|| {
                ClinicError::not_found("Animal", format!("{} (referenced by vaccine rows)", animal_id))
            })?;
            applied += vaccines.len();
            animal.add_vaccines(vaccines);
        }

        info!("Loaded {} vaccines from {}", applied, path.display());
        Ok(applied > 0)
    }

    pub fn save_vaccines_csv(&self, path: &Path, delimiter: u8) -> Result<usize> {
        let written = csv_codec::write_vaccines(path, delimiter, &self.animals)?;
        info!("Saved {} vaccines to {}", written, path.display());
        Ok(written)
    }

    /// Replace the whole collection. Nothing changes unless every animal is
    /// valid and ids are unique.
    pub fn replace_all(&mut self, animals: Vec<Animal>) -> Result<()> {
        let mut ids = HashSet::with_capacity(animals.len());
        for animal in &animals {
            animal.validate()?;
            if !ids.insert(animal.id) {
                return Err(ClinicError::DuplicateId {
                    entity: "Animal",
                    id: animal.id,
                });
            }
        }

        self.animals = animals;
        Ok(())
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        snapshot::save_snapshot(path, SnapshotKind::Animals, &self.animals)?;
        info!("Saved snapshot of {} animals to {}", self.animals.len(), path.display());
        Ok(())
    }

    /// Replace the collection with a snapshot's contents
    pub fn load_snapshot(&mut self, path: &Path) -> Result<usize> {
        let animals: Vec<Animal> = snapshot::load_snapshot(path, SnapshotKind::Animals)?;
        self.replace_all(animals)?;
        info!("Loaded snapshot of {} animals from {}", self.animals.len(), path.display());
        Ok(self.animals.len())
    }
}

// ============================================================================
// TESTS
// ============================================================================
