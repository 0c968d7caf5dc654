//! Shared test fixtures.

#![allow(dead_code)]

use pagestore::{Patch, StateData};

/// Application data payload used across the integration tests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profile {
    pub name: Option<String>,
    pub visits: u32,
}

impl StateData for Profile {
    fn reset(&self) -> Self {
        Self::default()
    }
}

impl Profile {
    /// Copy-with in the style application data types are expected to
    /// provide: `Patch` for nullable fields, `Option` for the rest.
    pub fn copy_with(&self, name: Patch<String>, visits: Option<u32>) -> Self {
        Self {
            name: name.apply(self.name.clone()),
            visits: visits.unwrap_or(self.visits),
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
