//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the
//! store. Reading process-wide environment variables during request handling
//! leads to inconsistent behaviour in multi-threaded runtimes and test
//! harnesses, so none of the core does it.

use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at the given data directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn patients_file(&self) -> PathBuf {
        self.data_dir.join("patients.json")
    }

    pub fn consultations_file(&self) -> PathBuf {
        self.data_dir.join("consultations.json")
    }

    pub fn references_file(&self) -> PathBuf {
        self.data_dir.join("references.json")
    }

    pub fn catalogues_dir(&self) -> PathBuf {
        self.data_dir.join("catalogues")
    }
}
