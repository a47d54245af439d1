use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::models::{Doctor, Plan};

/// Errors that can occur while loading the seed catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Seed data for the in-memory backend
///
/// ```toml
/// [[plans]]
/// id = "patient-monthly"
/// kind = "subscription"
/// name = "Monthly subscription"
/// durationDays = 30
/// priceCents = 1999
///
/// [[doctors]]
/// id = "doc-1"
/// name = "Dr. Ada Moreno"
/// specialty = "Cardiology"
/// location = "Boston, MA"
/// rating = 4.8
/// isBoosted = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub plans: Vec<Plan>,
    #[serde(default)]
    pub doctors: Vec<Doctor>,
}

impl SeedCatalog {
    pub fn from_toml(source: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&source)
    }
}
