//! The loaded, normalized address set shared by all sessions

use canvass_common::Address;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::info;

use crate::ingest::{LoadNotice, LoadOutcome, LoadedFrom};
use crate::normalize::normalize_all;

/// Normalized addresses plus provenance of the load that produced them
#[derive(Debug, Clone)]
pub struct Dataset {
    addresses: Vec<Address>,
    /// Parcel id → position of its first occurrence
    index: HashMap<String, usize>,
    pub loaded_from: LoadedFrom,
    pub notices: Vec<LoadNotice>,
    pub loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Normalize a loader outcome into a dataset
    pub fn from_outcome(outcome: LoadOutcome) -> Self {
        let addresses = normalize_all(outcome.records);

        let mut index = HashMap::with_capacity(addresses.len());
        for (i, address) in addresses.iter().enumerate() {
            index.entry(address.parcel_number.clone()).or_insert(i);
        }

        info!(
            count = addresses.len(),
            source = ?outcome.loaded_from.kind,
            location = %outcome.loaded_from.location,
            "Dataset ready"
        );

        Self {
            addresses,
            index,
            loaded_from: outcome.loaded_from,
            notices: outcome.notices,
            loaded_at: outcome.loaded_at,
        }
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// First address carrying this parcel id
    pub fn get(&self, id: &str) -> Option<&Address> {
        self.index.get(id).map(|&i| &self.addresses[i])
    }

    /// Loaded addresses assigned to a precinct
    pub fn count_in_precinct(&self, precinct_id: &str) -> usize {
        self.addresses
            .iter()
            .filter(|a| a.precinct == precinct_id)
            .count()
    }
}
