//! Named raster storage for one interpreter session.
//!
//! A name maps to exactly one raster at a time. `put` overwrites, `remove`
//! is the only way an entry goes away.

use crate::error::ErrorKind;
use crate::raster::Raster;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No image named '{0}'")]
    NotFound(String),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Registry {
    images: HashMap<String, Raster>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `raster` under `name`, returning whatever was there before.
    pub fn put(&mut self, name: impl Into<String>, raster: Raster) -> Option<Raster> {
        self.images.insert(name.into(), raster)
    }

    pub fn get(&self, name: &str) -> Result<&Raster, RegistryError> {
        self.images
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Result<Raster, RegistryError> {
        self.images
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.images.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
