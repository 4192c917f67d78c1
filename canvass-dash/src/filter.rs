//! Address filtering and free-text search

use canvass_common::{Address, PropertyUse, Section};
use serde::Deserialize;
use std::collections::HashSet;
use std::str::FromStr;

/// Property-type selector, parsed case-insensitively
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum PropertyTypeFilter {
    #[default]
    All,
    Residential,
    Business,
}

impl FromStr for PropertyTypeFilter {
    type Err = canvass_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(PropertyTypeFilter::All),
            "residential" => Ok(PropertyTypeFilter::Residential),
            "business" => Ok(PropertyTypeFilter::Business),
            other => Err(canvass_common::Error::InvalidInput(format!(
                "Unknown property type: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for PropertyTypeFilter {
    type Error = canvass_common::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl PropertyTypeFilter {
    fn admits(self, property_use: PropertyUse) -> bool {
        match self {
            PropertyTypeFilter::All => true,
            PropertyTypeFilter::Residential => property_use == PropertyUse::Residential,
            PropertyTypeFilter::Business => property_use == PropertyUse::Business,
        }
    }
}

/// Active predicates for an address listing; every one must match
#[derive(Debug, Clone)]
pub struct AddressFilter {
    pub query: Option<String>,
    pub show_visited: bool,
    pub show_not_visited: bool,
    pub property_type: PropertyTypeFilter,
    pub section: Option<Section>,
    pub precinct: Option<String>,
}

impl Default for AddressFilter {
    fn default() -> Self {
        Self {
            query: None,
            show_visited: true,
            show_not_visited: true,
            property_type: PropertyTypeFilter::All,
            section: None,
            precinct: None,
        }
    }
}

impl AddressFilter {
    /// Matching addresses in input order
    pub fn apply<'a>(&self, addresses: &'a [Address], visited: &HashSet<String>) -> Vec<&'a Address> {
        let needle = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        addresses
            .iter()
            .filter(|a| {
                let is_visited = visited.contains(a.id());
                (is_visited && self.show_visited) || (!is_visited && self.show_not_visited)
            })
            .filter(|a| self.property_type.admits(a.property_use))
            .filter(|a| self.section.map_or(true, |s| a.section == s))
            .filter(|a| self.precinct.as_deref().map_or(true, |p| a.precinct == p))
            .filter(|a| needle.as_deref().map_or(true, |n| a.matches_query(n)))
            .collect()
    }
}
