//! Deterministic plugin pipeline scheduling for legal-markdown processing.
//!

pub use ordinance_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use ordinance_internal::prelude::*;
}
