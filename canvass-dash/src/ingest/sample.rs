//! Deterministic sample data, the last tier of the source chain

use canvass_common::precincts::{street_band, PRECINCTS};
use canvass_common::AddressRecord;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::normalize::fixed_example_record;

const SEED: u64 = 0x5EED_0315;

const STREETS: &[&str] = &[
    "1ST AVE N", "3RD ST S", "5TH AVE S", "9TH ST N", "16TH ST S", "22ND AVE S",
    "BEACH DR NE", "CENTRAL AVE", "DR M L KING JR ST N", "EMERSON AVE S",
    "FAIRFIELD AVE S", "HIGHLAND ST S", "LAKEVIEW AVE S", "MIRROR LAKE DR N",
    "PRESTON AVE S", "QUEENSBORO AVE S", "ROSER PARK DR S", "YALE ST S",
];

const SURNAMES: &[&str] = &[
    "SMITH", "JOHNSON", "WILLIAMS", "BROWN", "JONES", "GARCIA", "MILLER", "DAVIS",
    "RODRIGUEZ", "MARTINEZ", "HERNANDEZ", "LOPEZ", "WILSON", "ANDERSON", "THOMAS",
    "TAYLOR", "MOORE", "JACKSON", "WHITE", "HARRIS",
];

const GIVEN_NAMES: &[&str] = &[
    "JAMES", "MARY", "ROBERT", "PATRICIA", "JOHN", "JENNIFER", "MICHAEL", "LINDA",
    "DAVID", "ELIZABETH", "MARIA", "CARLOS", "ANGELA", "KEVIN", "TANYA", "ANDRE",
];

const BUSINESS_NAMES: &[&str] = &[
    "SUNCOAST HOLDINGS LLC", "BAYSIDE RETAIL INC", "GULF PROPERTIES LLC",
    "TAMPA BAY OFFICE PARTNERS", "CENTRAL AVE VENTURES LLC",
];

const RESIDENTIAL_USES: &[&str] = &["Single Family", "Single Family", "Single Family", "Duplex"];
const BUSINESS_USES: &[&str] = &["Retail Store", "Office Building", "Restaurant"];

/// Units per synthetic apartment building
const UNITS_PER_BUILDING: u32 = 6;

fn pick<'a>(rng: &mut StdRng, items: &'a [&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn owner(rng: &mut StdRng) -> String {
    format!("{}, {}", pick(rng, SURNAMES), pick(rng, GIVEN_NAMES))
}

/// Fabricate `per_precinct` records for every precinct plus the fixed demo record.
///
/// Street numbers fall inside each precinct's rule band so the ZIP rules
/// agree with the explicit precinct. Roughly one record in ten is a
/// business and each precinct gets one small apartment building.
pub fn generate_sample_addresses(per_precinct: usize) -> Vec<AddressRecord> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut records = Vec::with_capacity(PRECINCTS.len() * per_precinct + 1);

    for precinct in PRECINCTS {
        let Some((zip, low, high)) = street_band(precinct.id) else {
            continue;
        };

        let building_units = if per_precinct >= 2 * UNITS_PER_BUILDING as usize {
            UNITS_PER_BUILDING as usize
        } else {
            0
        };
        let building_number = rng.gen_range(low..high);
        let building_street = pick(&mut rng, STREETS);

        for i in 0..per_precinct {
            let parcel_number = format!("SAMPLE-{}-{:03}", precinct.id, i);
            let record = if i < building_units {
                let unit = (101 + i).to_string();
                AddressRecord {
                    parcel_number: Some(parcel_number),
                    owner1: Some(owner(&mut rng)),
                    property_use: Some("Multi-Family Condominium".to_string()),
                    str_num: Some(building_number),
                    str_name: Some(building_street.to_string()),
                    str_unit: Some(unit),
                    str_zip: Some(zip.to_string()),
                    hx_yn: Some(rng.gen_bool(0.4)),
                    precinct: Some(precinct.id.to_string()),
                    ..AddressRecord::default()
                }
            } else if rng.gen_bool(0.1) {
                AddressRecord {
                    parcel_number: Some(parcel_number),
                    owner1: Some(pick(&mut rng, BUSINESS_NAMES).to_string()),
                    property_use: Some(pick(&mut rng, BUSINESS_USES).to_string()),
                    str_num: Some(rng.gen_range(low..high)),
                    str_name: Some(pick(&mut rng, STREETS).to_string()),
                    str_zip: Some(zip.to_string()),
                    hx_yn: Some(false),
                    precinct: Some(precinct.id.to_string()),
                    ..AddressRecord::default()
                }
            } else {
                AddressRecord {
                    parcel_number: Some(parcel_number),
                    owner1: Some(owner(&mut rng)),
                    owner2: rng.gen_bool(0.3).then(|| owner(&mut rng)),
                    property_use: Some(pick(&mut rng, RESIDENTIAL_USES).to_string()),
                    str_num: Some(rng.gen_range(low..high)),
                    str_name: Some(pick(&mut rng, STREETS).to_string()),
                    str_zip: Some(zip.to_string()),
                    hx_yn: Some(rng.gen_bool(0.6)),
                    precinct: Some(precinct.id.to_string()),
                    ..AddressRecord::default()
                }
            };
            records.push(record);
        }
    }

    records.push(fixed_example_record());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvass_common::precincts::infer_precinct;

    #[test]
    fn test_sample_is_deterministic_and_complete() {
        let first = generate_sample_addresses(24);
        let second = generate_sample_addresses(24);

        assert_eq!(first, second);
        assert_eq!(first.len(), PRECINCTS.len() * 24 + 1);
    }

    #[test]
    fn test_sample_covers_every_precinct_consistently() {
        let records = generate_sample_addresses(12);
        for precinct in PRECINCTS {
            let mine: Vec<_> = records
                .iter()
                .filter(|r| r.precinct.as_deref() == Some(precinct.id))
                .filter(|r| !crate::normalize::is_fixed_example(r))
                .collect();
            assert_eq!(mine.len(), 12, "precinct {}", precinct.id);
            for r in mine {
                let zip = r.str_zip.as_deref().unwrap();
                assert_eq!(infer_precinct(zip, r.str_num), precinct.id);
            }
        }
    }

    #[test]
    fn test_sample_contains_fixed_record_once() {
        let records = generate_sample_addresses(1);
        let fixed = records
            .iter()
            .filter(|r| crate::normalize::is_fixed_example(r))
            .count();
        assert_eq!(fixed, 1);
    }
}
