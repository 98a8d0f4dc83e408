//! Catalog services on top of the database: photo record building, species
//! reconciliation and the identification pipeline.

pub mod identify;
pub mod import;
pub mod names;
pub mod photos;
pub mod species;

pub use identify::{BatchError, BatchItem, BatchOutcome, Identification, Identifier};
pub use import::ImportSummary;
pub use photos::build_photo_record;
pub use species::reconcile_species;
