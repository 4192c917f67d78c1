//! Address normalization
//!
//! Turns raw records into [`Address`] values. Every missing field is filled
//! deterministically from ZIP, street number and street name, so running the
//! normalizer twice over the same input yields identical output.

use canvass_common::precincts::{self, infer_precinct};
use canvass_common::{Address, AddressRecord, PropertyUse, Section};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Base coordinate (downtown St. Petersburg) that synthetic positions orbit
pub const BASE_LAT: f64 = 27.773056;
pub const BASE_LON: f64 = -82.639999;

/// Distance of a section's center from the base coordinate, in degrees
const SECTION_OFFSET: f64 = 0.025;
/// Width of the jitter square around a section center, in degrees
const JITTER_SPAN: f64 = 0.02;

/// The demo record that must always be present
pub const FIXED_STREET_NUMBER: u32 = 315;
pub const FIXED_STREET_KEYWORD: &str = "TAYLOR";
pub const FIXED_ZIP: &str = "33705";
pub const FIXED_PRECINCT: &str = "106";
pub const FIXED_OWNER: &str = "FERNANDEZ, ARIEL";

const BUSINESS_KEYWORDS: &[&str] = &[
    "COMMERCIAL",
    "BUSINESS",
    "OFFICE",
    "STORE",
    "RETAIL",
    "RESTAURANT",
    "INDUSTRIAL",
    "WAREHOUSE",
    "HOTEL",
    "MOTEL",
    "BANK",
    "SERVICE STATION",
    "SHOPPING",
];

const MULTI_FAMILY_KEYWORDS: &[&str] = &[
    "MULTI",
    "CONDO",
    "APARTMENT",
    "DUPLEX",
    "TRIPLEX",
    "QUADRUPLEX",
];

/// The fixed demo record as it appears in synthetic data
pub fn fixed_example_record() -> AddressRecord {
    AddressRecord {
        parcel_number: Some("DEMO-315-TAYLOR".to_string()),
        owner1: Some(FIXED_OWNER.to_string()),
        site_address: Some("315 TAYLOR AVE N".to_string()),
        site_cityzip: Some(format!("ST PETERSBURG, FL {}", FIXED_ZIP)),
        property_use: Some("Single Family".to_string()),
        str_num: Some(FIXED_STREET_NUMBER),
        str_name: Some("TAYLOR AVE N".to_string()),
        str_zip: Some(FIXED_ZIP.to_string()),
        hx_yn: Some(true),
        precinct: Some(FIXED_PRECINCT.to_string()),
        ..AddressRecord::default()
    }
}

/// Street number and name, falling back to splitting `SITE_ADDRESS`
fn street_parts(record: &AddressRecord) -> (Option<u32>, Option<String>) {
    let mut number = record.str_num;
    let mut name = record.str_name.clone();

    if let Some(site) = record.site_address.as_deref() {
        let mut tokens = site.splitn(2, char::is_whitespace);
        let head = tokens.next().unwrap_or_default();
        let tail = tokens.next().map(str::trim).filter(|t| !t.is_empty());
        if let Ok(parsed) = head.parse::<u32>() {
            number = number.or(Some(parsed));
            if name.is_none() {
                name = tail.map(str::to_string);
            }
        } else if name.is_none() {
            name = Some(site.to_string());
        }
    }

    (number, name)
}

/// Five-digit ZIP from `STR_ZIP`, else the last ZIP-looking token of `SITE_CITYZIP`
fn zip_of(record: &AddressRecord) -> Option<String> {
    if let Some(zip) = record.str_zip.as_deref() {
        let zip5: String = zip.chars().take(5).collect();
        if !zip5.is_empty() {
            return Some(zip5);
        }
    }
    record.site_cityzip.as_deref().and_then(|line| {
        line.split(|c: char| !c.is_ascii_digit() && c != '-')
            .filter_map(|token| {
                let zip5: String = token.chars().take(5).collect();
                (zip5.len() == 5 && zip5.chars().all(|c| c.is_ascii_digit())).then_some(zip5)
            })
            .last()
    })
}

/// Whether a raw record is the fixed demo record
pub fn is_fixed_example(record: &AddressRecord) -> bool {
    let (number, name) = street_parts(record);
    number == Some(FIXED_STREET_NUMBER)
        && name.is_some_and(|n| n.to_uppercase().contains(FIXED_STREET_KEYWORD))
        && zip_of(record).as_deref() == Some(FIXED_ZIP)
}

/// Collapse a free-form property-use description to Residential/Business
pub fn classify_property_use(raw: Option<&str>) -> PropertyUse {
    let Some(raw) = raw else {
        return PropertyUse::Residential;
    };
    let upper = raw.to_uppercase();
    if BUSINESS_KEYWORDS.iter().any(|k| upper.contains(k)) {
        PropertyUse::Business
    } else {
        PropertyUse::Residential
    }
}

/// Multi-family: a multi-unit property-use description or a unit number
pub fn is_multi_family(raw_use: Option<&str>, unit: Option<&str>) -> bool {
    let by_use = raw_use.is_some_and(|u| {
        let upper = u.to_uppercase();
        MULTI_FAMILY_KEYWORDS.iter().any(|k| upper.contains(k))
    });
    by_use || unit.is_some_and(|u| !u.trim().is_empty())
}

/// Synthetic map position.
///
/// A pure function of its inputs: the section picks a quadrant around the
/// base coordinate and a SHA-256 of (parcel id, street number, street name)
/// jitters the point inside it. Not geographically meaningful.
pub fn synthetic_coordinates(
    parcel_number: &str,
    street_number: Option<u32>,
    street_name: &str,
    section: Section,
) -> (f64, f64) {
    let (d_lat, d_lon) = match section {
        Section::North => (SECTION_OFFSET, 0.0),
        Section::South => (-SECTION_OFFSET, 0.0),
        Section::East => (0.0, SECTION_OFFSET),
        Section::West => (0.0, -SECTION_OFFSET),
    };

    let mut hasher = Sha256::new();
    hasher.update(parcel_number.as_bytes());
    hasher.update(b"|");
    hasher.update(street_number.unwrap_or(0).to_le_bytes());
    hasher.update(b"|");
    hasher.update(street_name.to_uppercase().as_bytes());
    let digest = hasher.finalize();

    let unit = |bytes: &[u8]| -> f64 {
        let mut word = [0u8; 4];
        word.copy_from_slice(bytes);
        f64::from(u32::from_le_bytes(word)) / f64::from(u32::MAX)
    };
    let lat_jitter = (unit(&digest[0..4]) - 0.5) * JITTER_SPAN;
    let lon_jitter = (unit(&digest[4..8]) - 0.5) * JITTER_SPAN;

    (BASE_LAT + d_lat + lat_jitter, BASE_LON + d_lon + lon_jitter)
}

fn usable_coordinate(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

/// Normalize one record. `index` only seeds the fallback parcel id.
pub fn normalize_record(record: AddressRecord, index: usize) -> Address {
    let (street_number, street_name) = street_parts(&record);
    let street_name = street_name.unwrap_or_else(|| "Unknown".to_string());
    let zip = zip_of(&record).unwrap_or_default();
    let unit = record.str_unit.clone();

    let property_use = classify_property_use(record.property_use.as_deref());
    let multi_family = is_multi_family(record.property_use.as_deref(), unit.as_deref());

    let precinct = record
        .precinct
        .clone()
        .unwrap_or_else(|| infer_precinct(&zip, street_number).to_string());

    let section = record
        .section
        .as_deref()
        .and_then(|s| s.parse::<Section>().ok())
        .unwrap_or_else(|| precincts::section_for(&precinct));

    let raw_parcel = record.parcel_number.clone().unwrap_or_default();
    let (lat, lon) = match (usable_coordinate(record.lat), usable_coordinate(record.lon)) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => synthetic_coordinates(&raw_parcel, street_number, &street_name, section),
    };

    let building_name = record.building_name.clone().or_else(|| {
        multi_family.then(|| match street_number {
            Some(n) => format!("{} {}", n, street_name),
            None => street_name.clone(),
        })
    });

    let site_address = record.site_address.clone().unwrap_or_else(|| {
        let mut line = match street_number {
            Some(n) => format!("{} {}", n, street_name),
            None => street_name.clone(),
        };
        if let Some(u) = &unit {
            line.push_str(&format!(" #{}", u));
        }
        line
    });

    let site_cityzip = record.site_cityzip.clone().unwrap_or_else(|| {
        if zip.is_empty() {
            "ST PETERSBURG, FL".to_string()
        } else {
            format!("ST PETERSBURG, FL {}", zip)
        }
    });

    Address {
        parcel_number: record
            .parcel_number
            .unwrap_or_else(|| format!("ADDR-{:05}", index)),
        owner1: record.owner1.unwrap_or_else(|| "Unknown".to_string()),
        owner2: record.owner2,
        site_address,
        site_cityzip,
        street_number,
        street_name,
        unit,
        zip,
        homestead: record.hx_yn.unwrap_or(false),
        property_use,
        precinct,
        section,
        lat,
        lon,
        building_name,
        multi_family,
    }
}

/// Normalize a whole load.
///
/// Record order is preserved. The fixed demo record is forced to its
/// precinct and owner; only its first occurrence is kept, and it is
/// appended when the input lacks it. No other deduplication happens.
pub fn normalize_all(records: Vec<AddressRecord>) -> Vec<Address> {
    let mut out = Vec::with_capacity(records.len() + 1);
    let mut seen_fixed = false;

    for (index, mut record) in records.into_iter().enumerate() {
        if is_fixed_example(&record) {
            if seen_fixed {
                debug!(index, "Dropping repeated fixed demo record");
                continue;
            }
            seen_fixed = true;
            record.precinct = Some(FIXED_PRECINCT.to_string());
            record.owner1 = Some(FIXED_OWNER.to_string());
        }
        out.push(normalize_record(record, index));
    }

    if !seen_fixed {
        debug!("Fixed demo record absent, appending");
        let index = out.len();
        out.push(normalize_record(fixed_example_record(), index));
    }

    out
}
