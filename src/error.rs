// Error taxonomy shared by entities, registries and persistence.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

pub use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum ClinicError {
    /// Malformed or out-of-range field; the entity was not touched
    #[error("Validation failed for {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Username {0} is already taken")]
    UsernameTaken(String),

    #[error("{entity} with id {id} already exists")]
    DuplicateId { entity: &'static str, id: Uuid },

    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Format error at line {line}: {message}")]
    Format { line: usize, message: String },
}

impl ClinicError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ClinicError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ClinicError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(line: usize, message: impl Into<String>) -> Self {
        ClinicError::Format {
            line,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClinicError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ClinicError>;
