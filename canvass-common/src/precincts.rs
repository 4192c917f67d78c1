//! Static precinct reference table
//!
//! Precincts are read-only reference data: they are not derived from the
//! loaded address set. The ZIP → street-number range rules assign a precinct
//! to records that arrive without one.

use crate::model::Section;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Precinct assigned when neither the record nor the rule table knows better
pub const FALLBACK_PRECINCT: &str = "130";

/// Voting precinct reference entry
#[derive(Debug, Clone, Serialize)]
pub struct Precinct {
    pub id: &'static str,
    pub name: &'static str,
    /// Registered addresses per the county roll
    pub registered_addresses: u32,
    /// Turnout in the last municipal election (percent)
    pub turnout_pct: f64,
    pub zips: &'static [&'static str],
    pub section: Section,
}

pub static PRECINCTS: &[Precinct] = &[
    Precinct { id: "106", name: "Roser Park", registered_addresses: 1850, turnout_pct: 41.2, zips: &["33705"], section: Section::South },
    Precinct { id: "107", name: "Bartlett Park", registered_addresses: 2140, turnout_pct: 35.8, zips: &["33705"], section: Section::South },
    Precinct { id: "108", name: "Campbell Park", registered_addresses: 1975, turnout_pct: 33.1, zips: &["33705", "33712"], section: Section::South },
    Precinct { id: "109", name: "Lake Maggiore", registered_addresses: 2310, turnout_pct: 38.4, zips: &["33705"], section: Section::South },
    Precinct { id: "110", name: "Palmetto Park", registered_addresses: 1690, turnout_pct: 36.9, zips: &["33711"], section: Section::West },
    Precinct { id: "111", name: "Childs Park", registered_addresses: 2420, turnout_pct: 31.7, zips: &["33711"], section: Section::West },
    Precinct { id: "112", name: "Midtown", registered_addresses: 2055, turnout_pct: 34.5, zips: &["33712"], section: Section::East },
    Precinct { id: "113", name: "Jordan Park", registered_addresses: 1780, turnout_pct: 32.8, zips: &["33712"], section: Section::East },
    Precinct { id: "116", name: "Highland Oaks", registered_addresses: 1920, turnout_pct: 45.3, zips: &["33712"], section: Section::East },
    Precinct { id: "117", name: "Central Oak Park", registered_addresses: 2210, turnout_pct: 47.6, zips: &["33713"], section: Section::North },
    Precinct { id: "119", name: "Historic Kenwood", registered_addresses: 2380, turnout_pct: 52.1, zips: &["33713"], section: Section::North },
    Precinct { id: "125", name: "Downtown", registered_addresses: 2650, turnout_pct: 44.7, zips: &["33701"], section: Section::East },
    Precinct { id: "126", name: "Old Southeast", registered_addresses: 1540, turnout_pct: 49.8, zips: &["33701"], section: Section::South },
    Precinct { id: "130", name: "Uptown", registered_addresses: 2890, turnout_pct: 46.2, zips: &["33701"], section: Section::North },
];

/// One street-number band within a ZIP: numbers below `below` (or any number
/// when `below` is `None`) belong to `precinct`.
struct RangeRule {
    below: Option<u32>,
    precinct: &'static str,
}

const fn band(below: u32, precinct: &'static str) -> RangeRule {
    RangeRule { below: Some(below), precinct }
}

const fn rest(precinct: &'static str) -> RangeRule {
    RangeRule { below: None, precinct }
}

/// Bands must be listed in ascending order and end with `rest`
static ZIP_RULES: &[(&str, &[RangeRule])] = &[
    ("33701", &[band(1000, "125"), band(2000, "126"), rest("130")]),
    ("33705", &[band(500, "106"), band(1500, "107"), band(3000, "108"), rest("109")]),
    ("33711", &[band(2000, "110"), rest("111")]),
    ("33712", &[band(1500, "112"), band(3000, "113"), rest("116")]),
    ("33713", &[band(2000, "117"), rest("119")]),
];

static BY_ID: Lazy<HashMap<&'static str, &'static Precinct>> =
    Lazy::new(|| PRECINCTS.iter().map(|p| (p.id, p)).collect());

/// Look up a precinct by id
pub fn find(id: &str) -> Option<&'static Precinct> {
    BY_ID.get(id.trim()).copied()
}

/// Section for a precinct; `North` when the precinct is unknown
pub fn section_for(precinct_id: &str) -> Section {
    find(precinct_id).map(|p| p.section).unwrap_or(Section::North)
}

/// Assign a precinct from ZIP and street number.
///
/// Only the first five characters of the ZIP are considered. A missing
/// street number falls into the lowest band. Unknown ZIPs map to
/// [`FALLBACK_PRECINCT`].
pub fn infer_precinct(zip: &str, street_number: Option<u32>) -> &'static str {
    let zip5: String = zip.trim().chars().take(5).collect();
    let number = street_number.unwrap_or(0);

    ZIP_RULES
        .iter()
        .find(|(z, _)| *z == zip5)
        .and_then(|(_, rules)| {
            rules
                .iter()
                .find(|r| r.below.map_or(true, |below| number < below))
        })
        .map(|r| r.precinct)
        .unwrap_or(FALLBACK_PRECINCT)
}

/// Street-number band a precinct owns: `(zip, low, high_exclusive)`.
///
/// The open-ended last band of a ZIP is capped at 2000 numbers above its
/// lower bound.
pub fn street_band(precinct_id: &str) -> Option<(&'static str, u32, u32)> {
    for (zip, rules) in ZIP_RULES {
        let mut low = 1;
        for rule in rules.iter() {
            let high = rule.below.unwrap_or(low + 2000);
            if rule.precinct == precinct_id {
                return Some((*zip, low, high));
            }
            low = high;
        }
    }
    None
}
