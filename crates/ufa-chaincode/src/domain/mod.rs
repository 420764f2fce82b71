//! # Domain Layer (Inner Hexagon)
//!
//! Agreement records, validation and reconciliation rules.
//! NO storage access; the service layer feeds these functions.

pub mod entities;
pub mod reconciliation;
pub mod validation;
pub mod value_objects;

pub use entities::*;
pub use reconciliation::*;
pub use validation::*;
pub use value_objects::*;
