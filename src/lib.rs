// Vet Records - Core Library
// Animals, owners, vaccination history and the attention queue, plus their
// CSV / snapshot persistence. The CLI in main.rs is a thin runner on top.

pub mod validation;
pub mod error;
pub mod entities;        // Animal, Owner, Vaccine + registries
pub mod queue;           // Attention queue (FIFO of animal ids)
pub mod csv_codec;       // Headerless CSV rows with brace-set id columns
pub mod snapshot;        // Versioned whole-collection binary snapshots
pub mod export;          // Plain text report writer
pub mod config;
pub mod clinic;          // Both registries + queue, two-sided linking

// Re-export commonly used types
pub use validation::{ValidationError, ValidationResult};
pub use error::{ClinicError, Result};
pub use entities::{
    Animal, AnimalRegistry,
    Owner, OwnerDetails, OwnerRegistry,
    Vaccine,
};
pub use queue::AttentionQueue;
pub use snapshot::SnapshotKind;
pub use config::{ClinicConfig, ConfigError};
pub use clinic::{Clinic, ImportSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
