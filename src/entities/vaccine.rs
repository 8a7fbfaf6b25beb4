// 💉 Vaccine Entity - one administered dose
//
// Identity: UUID assigned at construction
// Values: volume (ml), brand, application date
// Derived: next application = application date + 6 calendar months

use chrono::{Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{require_at_least, require_non_empty, ValidationError, ValidationResult};

/// Date format used by the vaccine CSV column (`dd/MM/yyyy`)
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Months between two applications of the same vaccine
pub const MONTHS_BETWEEN_APPLICATIONS: u32 = 6;

/// Smallest accepted volume; 0 ml entries are valid
pub const MINIMUM_VOLUME_IN_ML: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vaccine {
    id: Uuid,
    volume_in_ml: i32,
    brand: String,
    date_of_application: NaiveDate,
}

impl Vaccine {
    /// Vaccine applied today
    pub fn new(volume_in_ml: i32, brand: &str) -> Result<Self, ValidationError> {
        Self::applied_on(volume_in_ml, brand, today())
    }

    /// Vaccine applied on a given date, with a fresh id
    pub fn applied_on(
        volume_in_ml: i32,
        brand: &str,
        date_of_application: NaiveDate,
    ) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), volume_in_ml, brand, date_of_application)
    }

    /// Rebuild a vaccine whose identity already exists (CSV load)
    pub fn with_id(
        id: Uuid,
        volume_in_ml: i32,
        brand: &str,
        date_of_application: NaiveDate,
    ) -> Result<Self, ValidationError> {
        require_at_least("volume_in_ml", volume_in_ml, MINIMUM_VOLUME_IN_ML)?;
        require_non_empty("brand", brand)?;

        Ok(Vaccine {
            id,
            volume_in_ml,
            brand: brand.to_string(),
            date_of_application,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn volume_in_ml(&self) -> i32 {
        self.volume_in_ml
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn date_of_application(&self) -> NaiveDate {
        self.date_of_application
    }

    pub fn set_volume_in_ml(&mut self, volume_in_ml: i32) -> ValidationResult {
        require_at_least("volume_in_ml", volume_in_ml, MINIMUM_VOLUME_IN_ML)?;
        self.volume_in_ml = volume_in_ml;
        Ok(())
    }

    pub fn set_brand(&mut self, brand: &str) -> ValidationResult {
        require_non_empty("brand", brand)?;
        self.brand = brand.to_string();
        Ok(())
    }

    pub fn set_date_of_application(&mut self, date: NaiveDate) {
        self.date_of_application = date;
    }

    /// Application date plus six calendar months.
    ///
    /// Month arithmetic clamps to the last valid day, so 31/08 rolls to 28/02
    /// (or 29/02 in a leap year).
    pub fn date_of_next_application(&self) -> NaiveDate {
        self.date_of_application
            .checked_add_months(Months::new(MONTHS_BETWEEN_APPLICATIONS))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Expired when `on` is strictly after the next application date
    pub fn is_expired_on(&self, on: NaiveDate) -> bool {
        on > self.date_of_next_application()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_on(today())
    }

    /// Re-check the invariants of a vaccine that bypassed the constructors
    /// (snapshot decode)
    pub fn validate(&self) -> ValidationResult {
        require_at_least("volume_in_ml", self.volume_in_ml, MINIMUM_VOLUME_IN_ML)?;
        require_non_empty("brand", &self.brand)
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// TESTS
// ============================================================================
