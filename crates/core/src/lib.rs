//! # Cabinet Core
//!
//! Core business logic for the Cabinet practice management system.
//!
//! This crate contains pure domain operations and flat-file persistence:
//! - Consultation intake validation and record assembly
//! - Reference catalogs with filtered, category-grouped views
//! - Patient registration with dossier numbering
//! - The practice store, one JSON file per collection
//!
//! **No API concerns**: HTTP servers, DTO mapping, and OpenAPI documentation
//! belong in `api-rest`.

pub mod catalogue;
pub mod config;
pub mod consultation;
pub mod error;
pub mod patient;
pub mod reference;
pub mod store;
pub mod validation;

pub use cabinet_types::{GafScore, NonEmptyText};
pub use config::CoreConfig;
pub use error::{StoreError, StoreResult};
pub use store::CabinetStore;
pub use validation::{FieldError, ValidationErrors};

/// Default data directory when none is configured.
pub const DEFAULT_DATA_DIR: &str = "./cabinet_data";
