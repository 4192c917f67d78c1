//! Display grouping of filtered addresses
//!
//! Building grouping collapses multi-unit properties into one entry and
//! gathers single homes by street. Proximity grouping buckets coordinates
//! into a grid of roughly 100 m cells. Both order groups by descending size,
//! ties in first-seen order.

use canvass_common::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::str::FromStr;

/// Coordinates are multiplied by this and rounded to form a grid cell
const CELL_SCALE: f64 = 1000.0;

/// Street names listed in a proximity label
const MAX_LABEL_STREETS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum GroupingMode {
    Building,
    Proximity,
}

impl FromStr for GroupingMode {
    type Err = canvass_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "building" => Ok(GroupingMode::Building),
            "proximity" => Ok(GroupingMode::Proximity),
            other => Err(canvass_common::Error::InvalidInput(format!(
                "Unknown grouping mode: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for GroupingMode {
    type Error = canvass_common::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Units sharing street number, street name and building name
    Building,
    /// Single homes on one street
    Street,
    /// Several addresses in one grid cell
    Proximity,
    /// Lone address in its grid cell
    Single,
}

/// One display group; members borrow from the dataset
#[derive(Debug, Clone)]
pub struct AddressGroup<'a> {
    pub label: String,
    pub kind: GroupKind,
    pub members: Vec<&'a Address>,
}

/// Bucket by key, keeping first-seen order, then stable-sort by size
fn bucket<'a, K, F>(addresses: &[&'a Address], key_of: F) -> Vec<(K, Vec<&'a Address>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&Address) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<(K, Vec<&'a Address>)> = Vec::new();

    for &address in addresses {
        let key = key_of(address);
        match slots.get(&key) {
            Some(&slot) => buckets[slot].1.push(address),
            None => {
                slots.insert(key.clone(), buckets.len());
                buckets.push((key, vec![address]));
            }
        }
    }

    buckets.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    buckets
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum BuildingKey {
    Building {
        number: Option<u32>,
        street: String,
        building: String,
    },
    Street(String),
}

pub fn group_by_building<'a>(addresses: &[&'a Address]) -> Vec<AddressGroup<'a>> {
    bucket(addresses, |a| match &a.building_name {
        Some(building) => BuildingKey::Building {
            number: a.street_number,
            street: a.street_name.clone(),
            building: building.clone(),
        },
        None => BuildingKey::Street(a.street_name.clone()),
    })
    .into_iter()
    .map(|(key, members)| {
        let n = members.len();
        match key {
            BuildingKey::Building {
                number,
                street,
                building,
            } => {
                let street_line = match number {
                    Some(number) => format!("{} {}", number, street),
                    None => street,
                };
                let label = if street_line == building {
                    format!("{} ({} units)", building, n)
                } else {
                    format!("{} - {} ({} units)", street_line, building, n)
                };
                AddressGroup {
                    label,
                    kind: GroupKind::Building,
                    members,
                }
            }
            BuildingKey::Street(street) => AddressGroup {
                label: format!("{} homes ({} addresses)", street, n),
                kind: GroupKind::Street,
                members,
            },
        }
    })
    .collect()
}

fn grid_cell(address: &Address) -> (i64, i64) {
    (
        (address.lat * CELL_SCALE).round() as i64,
        (address.lon * CELL_SCALE).round() as i64,
    )
}

pub fn group_by_proximity<'a>(addresses: &[&'a Address]) -> Vec<AddressGroup<'a>> {
    bucket(addresses, grid_cell)
        .into_iter()
        .map(|(_, members)| {
            if members.len() == 1 {
                return AddressGroup {
                    label: members[0].site_address.clone(),
                    kind: GroupKind::Single,
                    members,
                };
            }

            let mut streets: Vec<&str> = Vec::new();
            for member in &members {
                let street = member.street_name.as_str();
                if !streets.contains(&street) {
                    streets.push(street);
                }
            }
            streets.truncate(MAX_LABEL_STREETS);

            AddressGroup {
                label: format!("Near {} ({} addresses)", streets.join(" / "), members.len()),
                kind: GroupKind::Proximity,
                members,
            }
        })
        .collect()
}

pub fn group<'a>(addresses: &[&'a Address], mode: GroupingMode) -> Vec<AddressGroup<'a>> {
    match mode {
        GroupingMode::Building => group_by_building(addresses),
        GroupingMode::Proximity => group_by_proximity(addresses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvass_common::{PropertyUse, Section};

    fn address(id: &str, number: u32, street: &str, building: Option<&str>) -> Address {
        Address {
            parcel_number: id.to_string(),
            owner1: "OWNER".to_string(),
            owner2: None,
            site_address: format!("{} {}", number, street),
            site_cityzip: "ST PETERSBURG, FL 33701".to_string(),
            street_number: Some(number),
            street_name: street.to_string(),
            unit: None,
            zip: "33701".to_string(),
            homestead: false,
            property_use: PropertyUse::Residential,
            precinct: "125".to_string(),
            section: Section::East,
            lat: 27.7700,
            lon: -82.6400,
            building_name: building.map(str::to_string),
            multi_family: building.is_some(),
        }
    }

    #[test]
    fn test_identical_building_keys_form_one_leading_group() {
        let mut addresses = vec![
            address("H1", 10, "1ST AVE N", None),
            address("H2", 12, "1ST AVE N", None),
        ];
        for i in 0..12 {
            addresses.push(address(&format!("U{}", i), 200, "BEACH DR NE", Some("200 BEACH DR NE")));
        }
        addresses.push(address("H3", 30, "5TH AVE S", None));
        let refs: Vec<&Address> = addresses.iter().collect();

        let groups = group_by_building(&refs);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].kind, GroupKind::Building);
        assert_eq!(groups[0].members.len(), 12);
        assert_eq!(groups[0].label, "200 BEACH DR NE (12 units)");
        assert_eq!(groups[1].label, "1ST AVE N homes (2 addresses)");
        assert_eq!(groups[2].label, "5TH AVE S homes (1 addresses)");
    }

    #[test]
    fn test_named_building_label_includes_street() {
        let a = address("U1", 400, "BEACH DR NE", Some("BAYFRONT TOWER"));
        let groups = group_by_building(&[&a]);
        assert_eq!(groups[0].label, "400 BEACH DR NE - BAYFRONT TOWER (1 units)");
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let a = address("A", 1, "A ST", None);
        let b = address("B", 1, "B ST", None);
        let c = address("C", 1, "C ST", None);
        let groups = group_by_building(&[&b, &a, &c]);
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["B ST homes (1 addresses)", "A ST homes (1 addresses)", "C ST homes (1 addresses)"]
        );
    }

    #[test]
    fn test_proximity_cells_and_singletons() {
        let near_a = address("N1", 1, "A ST", None);
        let mut near_b = address("N2", 2, "B ST", None);
        near_b.lat += 0.0001;
        let mut far = address("F1", 3, "C ST", None);
        far.lat += 0.01;

        let groups = group_by_proximity(&[&far, &near_a, &near_b]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, GroupKind::Proximity);
        assert_eq!(groups[0].label, "Near A ST / B ST (2 addresses)");
        assert_eq!(groups[1].kind, GroupKind::Single);
        assert_eq!(groups[1].label, "3 C ST");
    }

    #[test]
    fn test_grouping_mode_parses_any_case() {
        assert_eq!("Building".parse::<GroupingMode>().unwrap(), GroupingMode::Building);
        assert_eq!("PROXIMITY".parse::<GroupingMode>().unwrap(), GroupingMode::Proximity);
        assert!("street".parse::<GroupingMode>().is_err());
    }
}
