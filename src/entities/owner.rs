// 👤 Owner Entity - client account with pets
//
// "Owner username is unique, Owner UUID is IDENTITY"
//
// Username uniqueness is NOT an entity rule: OwnerRegistry enforces it through
// its username index. animal_ids is a plain list (insertion order, no dedup);
// Animal.owner_ids is the other, independent side of the relationship.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::animal::AnimalRegistry;
use crate::csv_codec;
use crate::error::{ClinicError, Result};
use crate::snapshot::{self, SnapshotKind};
use crate::validation::{
    require_at_least, require_non_empty, validate_email, validate_password, validate_phone,
    validate_username, validate_zip, ValidationError, ValidationResult,
};

pub const MINIMUM_OWNER_AGE: i32 = 18;

/// Everything needed to register an owner, before an id exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerDetails {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub age: i32,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl OwnerDetails {
    /// Field checks in column order; the first violation wins
    pub fn validate(&self) -> ValidationResult {
        require_non_empty("name", &self.name)?;
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        require_at_least("age", self.age, MINIMUM_OWNER_AGE)?;
        validate_phone(&self.phone)?;
        require_non_empty("address", &self.address)?;
        require_non_empty("city", &self.city)?;
        require_non_empty("state", &self.state)?;
        validate_zip(&self.zip)?;
        require_non_empty("country", &self.country)
    }
}

// ============================================================================
// OWNER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    // IDENTITY
    id: Uuid,
    username: String,

    // VALUES
    name: String,
    email: String,
    password: String,
    age: i32,
    phone: String,
    address: String,
    city: String,
    state: String,
    zip: String,
    country: String,

    // RELATIONSHIPS
    animal_ids: Vec<Uuid>,
}

impl Owner {
    pub fn new(details: OwnerDetails) -> std::result::Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), details)
    }

    pub fn with_id(id: Uuid, details: OwnerDetails) -> std::result::Result<Self, ValidationError> {
        details.validate()?;

        let OwnerDetails {
            name,
            username,
            email,
            password,
            age,
            phone,
            address,
            city,
            state,
            zip,
            country,
        } = details;

        Ok(Owner {
            id,
            username,
            name,
            email,
            password,
            age,
            phone,
            address,
            city,
            state,
            zip,
            country,
            animal_ids: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn zip(&self) -> &str {
        &self.zip
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn animal_ids(&self) -> &[Uuid] {
        &self.animal_ids
    }

    pub fn set_name(&mut self, name: &str) -> ValidationResult {
        require_non_empty("name", name)?;
        self.name = name.to_string();
        Ok(())
    }

    pub fn set_email(&mut self, email: &str) -> ValidationResult {
        validate_email(email)?;
        self.email = email.to_string();
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> ValidationResult {
        validate_password(password)?;
        self.password = password.to_string();
        Ok(())
    }

    pub fn set_phone(&mut self, phone: &str) -> ValidationResult {
        validate_phone(phone)?;
        self.phone = phone.to_string();
        Ok(())
    }

    pub fn set_age(&mut self, age: i32) -> ValidationResult {
        require_at_least("age", age, MINIMUM_OWNER_AGE)?;
        self.age = age;
        Ok(())
    }

    pub fn add_animal_id(&mut self, animal_id: Uuid) {
        self.animal_ids.push(animal_id);
    }

    /// Drop the first occurrence; false when the id was not listed
    pub fn remove_animal_id(&mut self, animal_id: Uuid) -> bool {
        match self.animal_ids.iter().position(|id| *id == animal_id) {
            Some(index) => {
                self.animal_ids.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn details(&self) -> OwnerDetails {
        OwnerDetails {
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            age: self.age,
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip: self.zip.clone(),
            country: self.country.clone(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        self.details().validate()
    }
}

// ============================================================================
// OWNER REGISTRY
// ============================================================================

/// Owners indexed by id and by username.
///
/// Both indexes are updated together or not at all; `order` keeps insertion
/// order for listings and saves.
#[derive(Debug, Clone, Default)]
pub struct OwnerRegistry {
    by_id: HashMap<Uuid, Owner>,
    by_username: HashMap<String, Uuid>,
    order: Vec<Uuid>,
}

impl OwnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a new owner
    pub fn add(&mut self, details: OwnerDetails) -> Result<&Owner> {
        let owner = Owner::new(details)?;
        self.insert(owner)
    }

    /// Register an already-built owner. Username and id are both checked
    /// before either index is written.
    fn insert(&mut self, owner: Owner) -> Result<&Owner> {
        if self.by_username.contains_key(&owner.username) {
            return Err(ClinicError::UsernameTaken(owner.username.clone()));
        }
        if self.by_id.contains_key(&owner.id) {
            return Err(ClinicError::DuplicateId {
                entity: "Owner",
                id: owner.id,
            });
        }

        let id = owner.id;
        info!("Registered owner {} ({})", owner.username, id);
        self.by_username.insert(owner.username.clone(), id);
        self.order.push(id);
        let inserted = self.by_id.entry(id).or_insert(owner);
        Ok(&*inserted)
    }

    pub fn get_by_id(&self, id: Uuid) -> Result<&Owner> {
        self.by_id
            .get(&id)
            .ok_or_else(|| ClinicError::not_found("Owner", id))
    }

    pub fn get_by_username(&self, username: &str) -> Result<&Owner> {
        self.by_username
            .get(username)
            .and_then(|id| self.by_id.get(id))
            .ok_or_else(|| ClinicError::not_found("Owner", username))
    }

    fn get_by_username_mut(&mut self, username: &str) -> Result<&mut Owner> {
        let id = *self
            .by_username
            .get(username)
            .ok_or_else(|| ClinicError::not_found("Owner", username))?;
        self.by_id
            .get_mut(&id)
            .ok_or_else(|| ClinicError::not_found("Owner", username))
    }

    /// Remove from both indexes and return the removed owner
    pub fn delete_by_id(&mut self, id: Uuid) -> Result<Owner> {
        let owner = self
            .by_id
            .remove(&id)
            .ok_or_else(|| ClinicError::not_found("Owner", id))?;
        self.by_username.remove(&owner.username);
        self.order.retain(|existing| *existing != id);

        info!("Deleted owner {} ({})", owner.username, id);
        Ok(owner)
    }

    pub fn contains_username(&self, username: &str) -> bool {
        self.by_username.contains_key(username)
    }

    /// Owners in insertion order
    pub fn owners(&self) -> impl Iterator<Item = &Owner> + '_ {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    // ========================================================================
    // LINKING
    // ========================================================================

    /// Append `animal_id` to the owner's list. Only this side of the
    /// relationship is touched.
    pub fn link_animal(&mut self, username: &str, animal_id: Uuid) -> Result<()> {
        let owner = self.get_by_username_mut(username)?;
        owner.add_animal_id(animal_id);
        Ok(())
    }

    /// Returns false when the owner did not list the animal
    pub fn unlink_animal(&mut self, username: &str, animal_id: Uuid) -> Result<bool> {
        let owner = self.get_by_username_mut(username)?;
        Ok(owner.remove_animal_id(animal_id))
    }

    // ========================================================================
    // REPORTS
    // ========================================================================

    /// `"<name><username> owns :<animal names>"` per owner. An animal id that
    /// does not resolve is a NotFound error.
    pub fn owners_report(&self, animals: &AnimalRegistry) -> Result<Vec<String>> {
        self.owners()
            .map(|owner| -> Result<String> {
                let names = owner
                    .animal_ids
                    .iter()
                    .map(|id| animals.get(*id).map(|a| a.name().to_string()))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{}{} owns :{}", owner.name, owner.username, names.join(", ")))
            })
            .collect()
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Add every owner from CSV.
    ///
    /// A malformed or invalid row aborts before anything is inserted. Rows
    /// that collide (username or id) are skipped; the others still apply and
    /// the result is false. Loading does not stop at the first collision.
    pub fn load_csv(&mut self, path: &Path, delimiter: u8) -> Result<bool> {
        let loaded = csv_codec::read_owners(path, delimiter)?;

        let mut all_added = true;
        let mut added = 0;
        for owner in loaded {
            match self.insert(owner) {
                Ok(_) => added += 1,
                Err(e @ (ClinicError::UsernameTaken(_) | ClinicError::DuplicateId { .. })) => {
                    warn!("Skipping owner row from {}: {}", path.display(), e);
                    all_added = false;
                }
                Err(e) => return Err(e),
            }
        }

        info!("Loaded {} owners from {}", added, path.display());
        Ok(all_added)
    }

    pub fn save_csv(&self, path: &Path, delimiter: u8) -> Result<usize> {
        let written = csv_codec::write_owners(path, delimiter, self.owners())?;
        info!("Saved {} owners to {}", written, path.display());
        Ok(written)
    }

    /// Replace the registry. A fresh registry is built first, so any invalid
    /// or colliding owner leaves the current contents untouched.
    pub fn replace_all(&mut self, owners: Vec<Owner>) -> Result<()> {
        let mut fresh = OwnerRegistry::new();
        for owner in owners {
            owner.validate()?;
            fresh.insert(owner)?;
        }

        *self = fresh;
        Ok(())
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let owners: Vec<&Owner> = self.owners().collect();
        snapshot::save_snapshot(path, SnapshotKind::Owners, &owners)?;
        info!("Saved snapshot of {} owners to {}", owners.len(), path.display());
        Ok(())
    }

    pub fn load_snapshot(&mut self, path: &Path) -> Result<usize> {
        let owners: Vec<Owner> = snapshot::load_snapshot(path, SnapshotKind::Owners)?;
        self.replace_all(owners)?;
        info!("Loaded snapshot of {} owners from {}", self.len(), path.display());
        Ok(self.len())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn details(username: &str) -> OwnerDetails {
        OwnerDetails {
            name: "Ana Perez".to_string(),
            username: username.to_string(),
            email: "ana@clinic.com".to_string(),
            password: "Secret#123".to_string(),
            age: 34,
            phone: "5551234567".to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
            country: "US".to_string(),
        }
    }

    fn field_of(result: Result<&Owner>) -> String {
        match result {
            Err(ClinicError::Validation(e)) => e.field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_username_length_boundary() {
        let mut registry = OwnerRegistry::new();

        assert_eq!(field_of(registry.add(details("ab"))), "username");
        assert!(registry.add(details("abcdefgh")).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_first_violation_wins() {
        let mut registry = OwnerRegistry::new();

        let mut bad = details("anaperez1");
        bad.name = String::new();
        bad.email = "nope".to_string();
        assert_eq!(field_of(registry.add(bad)), "name");

        let mut bad = details("anaperez1");
        bad.email = "ana@clinic".to_string();
        bad.phone = "123".to_string();
        assert_eq!(field_of(registry.add(bad)), "email");
    }

    #[test]
    fn test_field_rules() {
        let mut registry = OwnerRegistry::new();

        let mut bad = details("anaperez1");
        bad.password = "password1".to_string();
        assert_eq!(field_of(registry.add(bad)), "password");

        let mut bad = details("anaperez1");
        bad.age = 17;
        assert_eq!(field_of(registry.add(bad)), "age");

        let mut bad = details("anaperez1");
        bad.phone = "555123456".to_string();
        assert_eq!(field_of(registry.add(bad)), "phone");

        let mut bad = details("anaperez1");
        bad.zip = "6270".to_string();
        assert_eq!(field_of(registry.add(bad)), "zip");

        let mut ok = details("anaperez1");
        ok.zip = "62701-1234".to_string();
        assert!(registry.add(ok).is_ok());
    }

    #[test]
    fn test_username_taken_leaves_indexes_consistent() {
        let mut registry = OwnerRegistry::new();
        let first = registry.add(details("anaperez1")).unwrap().id();

        let result = registry.add(details("anaperez1"));
        assert!(matches!(result, Err(ClinicError::UsernameTaken(_))));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_by_username("anaperez1").unwrap().id(), first);
    }

    #[test]
    fn test_username_uniqueness_is_case_sensitive() {
        let mut registry = OwnerRegistry::new();
        registry.add(details("anaperez1")).unwrap();

        assert!(registry.add(details("AnaPerez1")).is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookups_and_delete() {
        let mut registry = OwnerRegistry::new();
        let id = registry.add(details("anaperez1")).unwrap().id();

        assert_eq!(registry.get_by_id(id).unwrap().username(), "anaperez1");
        assert!(registry.get_by_id(Uuid::new_v4()).unwrap_err().is_not_found());
        assert!(registry.get_by_username("nobody123").unwrap_err().is_not_found());

        let removed = registry.delete_by_id(id).unwrap();
        assert_eq!(removed.username(), "anaperez1");
        assert!(registry.is_empty());
        assert!(!registry.contains_username("anaperez1"));
        assert!(registry.get_by_id(id).is_err());
        assert!(registry.delete_by_id(id).unwrap_err().is_not_found());

        // Username is free again after delete
        assert!(registry.add(details("anaperez1")).is_ok());
    }

    #[test]
    fn test_link_and_unlink_animal() {
        let mut registry = OwnerRegistry::new();
        registry.add(details("anaperez1")).unwrap();
        let animal = Uuid::new_v4();

        registry.link_animal("anaperez1", animal).unwrap();
        registry.link_animal("anaperez1", animal).unwrap();
        assert_eq!(registry.get_by_username("anaperez1").unwrap().animal_ids(), &[animal, animal]);

        assert!(registry.unlink_animal("anaperez1", animal).unwrap());
        assert_eq!(registry.get_by_username("anaperez1").unwrap().animal_ids(), &[animal]);

        assert!(registry.link_animal("nobody123", animal).unwrap_err().is_not_found());
    }

    #[test]
    fn test_owner_setters_revalidate() {
        let mut owner = Owner::new(details("anaperez1")).unwrap();

        assert!(owner.set_email("bad").is_err());
        assert!(owner.set_age(10).is_err());
        assert!(owner.set_phone("12").is_err());
        assert!(owner.set_password("short").is_err());
        assert_eq!(owner.email(), "ana@clinic.com");
        assert_eq!(owner.age(), 34);

        owner.set_name("Ana Maria").unwrap();
        owner.set_email("ana.maria@clinic.org").unwrap();
        assert_eq!(owner.name(), "Ana Maria");
        assert_eq!(owner.email(), "ana.maria@clinic.org");
    }

    #[test]
    fn test_owners_report() {
        let mut animals = AnimalRegistry::new();
        let firulais = animals.add("Firulais", 3).unwrap().id();
        let michi = animals.add("Michi", 2).unwrap().id();

        let mut registry = OwnerRegistry::new();
        registry.add(details("anaperez1")).unwrap();
        registry.link_animal("anaperez1", firulais).unwrap();
        registry.link_animal("anaperez1", michi).unwrap();

        assert_eq!(
            registry.owners_report(&animals).unwrap(),
            vec!["Ana Perezanaperez1 owns :Firulais, Michi"]
        );

        registry.link_animal("anaperez1", Uuid::new_v4()).unwrap();
        assert!(registry.owners_report(&animals).unwrap_err().is_not_found());
    }

    #[test]
    fn test_csv_duplicate_username_keeps_one_owner() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("owners.csv");

        let first = Owner::new(details("anaperez1")).unwrap();
        let mut second_details = details("anaperez1");
        second_details.name = "Someone Else".to_string();
        let second = Owner::new(second_details).unwrap();
        let third = Owner::new(details("luisgomez1")).unwrap();
        csv_codec::write_owners(&path, b';', [&first, &second, &third]).unwrap();

        let mut registry = OwnerRegistry::new();
        assert!(!registry.load_csv(&path, b';').unwrap());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_by_username("anaperez1").unwrap().id(), first.id());
        assert!(registry.get_by_username("luisgomez1").is_ok());
    }

    #[test]
    fn test_csv_duplicate_id_keeps_indexes_consistent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("owners.csv");

        let first = Owner::new(details("anaperez1")).unwrap();
        let clash = Owner::with_id(first.id(), details("luisgomez1")).unwrap();
        csv_codec::write_owners(&path, b';', [&first, &clash]).unwrap();

        let mut registry = OwnerRegistry::new();
        assert!(!registry.load_csv(&path, b';').unwrap());

        assert_eq!(registry.len(), 1);
        assert!(!registry.contains_username("luisgomez1"));
        assert!(registry.get_by_username("luisgomez1").unwrap_err().is_not_found());
        assert_eq!(registry.get_by_username("anaperez1").unwrap().id(), first.id());
        assert_eq!(registry.get_by_id(first.id()).unwrap().username(), "anaperez1");
        assert_eq!(registry.owners().count(), registry.len());
    }

    #[test]
    fn test_replace_all_rejects_duplicate_ids() {
        let mut registry = OwnerRegistry::new();
        registry.add(details("stalestale")).unwrap();

        let a = Owner::new(details("anaperez1")).unwrap();
        let b = Owner::with_id(a.id(), details("luisgomez1")).unwrap();
        assert!(matches!(
            registry.replace_all(vec![a, b]),
            Err(ClinicError::DuplicateId { entity: "Owner", .. })
        ));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains_username("stalestale"));
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("owners.csv");

        let mut source = OwnerRegistry::new();
        source.add(details("anaperez1")).unwrap();
        source.add(details("luisgomez1")).unwrap();
        source.link_animal("luisgomez1", Uuid::new_v4()).unwrap();
        assert_eq!(source.save_csv(&path, b';').unwrap(), 2);

        let mut registry = OwnerRegistry::new();
        assert!(registry.load_csv(&path, b';').unwrap());

        let expected: Vec<&Owner> = source.owners().collect();
        let actual: Vec<&Owner> = registry.owners().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_snapshot_replaces_registry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("owners.bin");

        let mut source = OwnerRegistry::new();
        source.add(details("anaperez1")).unwrap();
        source.link_animal("anaperez1", Uuid::new_v4()).unwrap();
        source.save_snapshot(&path).unwrap();

        let mut registry = OwnerRegistry::new();
        registry.add(details("stalestale")).unwrap();
        assert_eq!(registry.load_snapshot(&path).unwrap(), 1);

        assert!(!registry.contains_username("stalestale"));
        assert_eq!(
            registry.get_by_username("anaperez1").unwrap(),
            source.get_by_username("anaperez1").unwrap()
        );
    }

    #[test]
    fn test_replace_all_is_all_or_nothing() {
        let mut registry = OwnerRegistry::new();
        registry.add(details("stalestale")).unwrap();

        let a = Owner::new(details("anaperez1")).unwrap();
        let b = Owner::new(details("anaperez1")).unwrap();
        assert!(matches!(
            registry.replace_all(vec![a, b]),
            Err(ClinicError::UsernameTaken(_))
        ));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains_username("stalestale"));
    }
}
