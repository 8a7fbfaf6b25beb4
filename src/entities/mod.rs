// Entity Models
// "Identity persists, values change"
//
// Each entity has:
// - Stable identity (UUID) that NEVER changes
// - Values that are re-validated on every change
// - A registry owning the collection and its lookups (vaccines live inside
//   their animal, so they have none)

pub mod animal;
pub mod owner;
pub mod vaccine;

pub use animal::{Animal, AnimalRegistry};
pub use owner::{Owner, OwnerDetails, OwnerRegistry};
pub use vaccine::Vaccine;
